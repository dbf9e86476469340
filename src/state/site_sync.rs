use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, SiteBackend};
use crate::models::{EntityId, PendingId};
use crate::state::diff::{diff_page, Directive, ParentRef};
use crate::state::session::EditorSession;
use crate::util::now_ms;

/// Where the save button stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SyncState {
    #[default]
    Idle,
    /// `next` directives of `total` have been written.
    Saving { next: usize, total: usize },
    Failed {
        failed_at: usize,
        total: usize,
        message: String,
    },
}

impl SyncState {
    pub fn label(&self) -> String {
        match self {
            SyncState::Idle => "Save".to_string(),
            SyncState::Saving { next, total } => format!("Saving {next}/{total}"),
            SyncState::Failed { .. } => "Retry save".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SyncError {
    #[error("A save is already running.")]
    AlreadySaving,
    #[error("Open a page first.")]
    NoActivePage,
    #[error("This page was never loaded from the server.")]
    PageNotInSnapshot,
    #[error("Parent {0} has not been saved.")]
    UnresolvedParent(EntityId),
    #[error("Save stopped at change {}: {source}", .index + 1)]
    Directive { index: usize, source: ApiError },
    #[error("Saved, but reloading failed: {0}")]
    Reload(ApiError),
    #[error("The website no longer exists.")]
    WebsiteGone,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SaveReport {
    pub deleted: usize,
    pub failed_deletes: usize,
    pub created: usize,
    pub updated: usize,
    pub navbar_updated: bool,
}

impl SaveReport {
    pub fn writes(&self) -> usize {
        self.deleted + self.created + self.updated + usize::from(self.navbar_updated)
    }
}

fn resolve_parent(
    parent: ParentRef,
    created: &HashMap<PendingId, Uuid>,
) -> Result<Uuid, SyncError> {
    match parent {
        ParentRef::Page(id) => Ok(id),
        ParentRef::Node(EntityId::Persisted(id)) => Ok(id),
        ParentRef::Node(pending @ EntityId::Pending(p)) => created
            .get(&p)
            .copied()
            .ok_or(SyncError::UnresolvedParent(pending)),
    }
}

/// Send tombstoned deletes together. Failures are logged and dropped.
async fn flush_deletes<B: SiteBackend + ?Sized>(
    backend: &B,
    session: &mut EditorSession,
    report: &mut SaveReport,
) {
    let tombstones = session.tracker.take();
    if tombstones.is_empty() {
        return;
    }
    let results = join_all(
        tombstones
            .iter()
            .map(|t| backend.delete_node(t.kind, t.id)),
    )
    .await;

    for (tombstone, result) in tombstones.iter().zip(results) {
        match result {
            Ok(()) => {
                session.snapshot.forget(tombstone.id);
                report.deleted += 1;
            }
            Err(e) => {
                warn!(kind = %tombstone.kind, id = %tombstone.id, error = %e, "delete failed");
                report.failed_deletes += 1;
            }
        }
    }
}

/// Write one directive and fold its result into the session.
async fn apply<B: SiteBackend + ?Sized>(
    backend: &B,
    session: &mut EditorSession,
    page_id: Uuid,
    index: usize,
    directive: Directive,
    created: &mut HashMap<PendingId, Uuid>,
    report: &mut SaveReport,
) -> Result<(), SyncError> {
    match directive {
        Directive::Create {
            target,
            parent,
            position,
            payload,
        } => {
            let parent = resolve_parent(parent, created)?;
            let id = backend
                .create_node(parent, position, &payload)
                .await
                .map_err(|source| SyncError::Directive { index, source })?;
            debug!(kind = %payload.kind(), %target, %id, "node created");

            if let Some(p) = target.pending() {
                created.insert(p, id);
            }
            if let Some(page) = session.website.pages.iter_mut().find(|p| p.id == page_id) {
                Arc::make_mut(page).replace_id(target, id.into());
            }
            session.selection = session.selection.renamed(target, id.into());
            session.snapshot.record(id, position, payload);
            report.created += 1;
        }
        Directive::Update {
            id,
            position,
            payload,
        } => {
            backend
                .update_node(id, position, &payload)
                .await
                .map_err(|source| SyncError::Directive { index, source })?;
            session.snapshot.record(id, position, payload);
            report.updated += 1;
        }
        Directive::UpdateNavbar { id, properties } => {
            backend
                .update_navbar(id, &properties)
                .await
                .map_err(|source| SyncError::Directive { index, source })?;
            session.snapshot.set_navbar(id, properties);
            report.navbar_updated = true;
        }
    }
    Ok(())
}

/// Persist the active page and the navbar.
///
/// Deletions go first, then the diffed writes one at a time in tree order so
/// that every parent exists before its children. Each successful write is
/// folded into the snapshot straight away, so a retry after a failure resumes
/// where the last attempt stopped. Finishes with a reload.
pub(crate) async fn save<B: SiteBackend + ?Sized>(
    backend: &B,
    session: &mut EditorSession,
    progress: Option<&dyn Fn(&SyncState)>,
) -> Result<SaveReport, SyncError> {
    if session.is_saving() {
        return Err(SyncError::AlreadySaving);
    }
    let page = session
        .active_page()
        .cloned()
        .ok_or(SyncError::NoActivePage)?;
    if !session.snapshot.has_page(page.id) {
        return Err(SyncError::PageNotInSnapshot);
    }

    let started = now_ms();
    let mut report = SaveReport::default();
    let notify = |state: &SyncState| {
        if let Some(f) = progress {
            f(state);
        }
    };

    session.sync = SyncState::Saving { next: 0, total: 0 };
    notify(&session.sync);
    flush_deletes(backend, session, &mut report).await;

    let directives = diff_page(&page, &session.website.navbar, &session.snapshot);
    let total = directives.len();
    info!(page = %page.id, total, deleted = report.deleted, "saving");

    let mut created = HashMap::new();
    for (index, directive) in directives.into_iter().enumerate() {
        session.sync = SyncState::Saving { next: index, total };
        notify(&session.sync);

        if let Err(e) = apply(backend, session, page.id, index, directive, &mut created, &mut report).await {
            warn!(index, total, error = %e, "save aborted");
            session.sync = SyncState::Failed {
                failed_at: index,
                total,
                message: e.to_string(),
            };
            notify(&session.sync);
            return Err(e);
        }
    }

    let reloaded = match backend.load_website().await {
        Ok(Some(website)) => Ok(website),
        Ok(None) => Err(SyncError::WebsiteGone),
        Err(e) => Err(SyncError::Reload(e)),
    };
    let website = match reloaded {
        Ok(website) => website,
        Err(e) => {
            session.sync = SyncState::Failed {
                failed_at: total,
                total,
                message: e.to_string(),
            };
            notify(&session.sync);
            return Err(e);
        }
    };
    session.replace_website(website);
    session.sync = SyncState::Idle;
    notify(&session.sync);

    info!(
        created = report.created,
        updated = report.updated,
        deleted = report.deleted,
        elapsed_ms = now_ms() - started,
        "save finished"
    );
    Ok(report)
}
