mod site_snapshot;

pub(crate) use site_snapshot::SiteSnapshot;
