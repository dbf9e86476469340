mod tombstones;

pub(crate) use tombstones::ChangeTracker;
