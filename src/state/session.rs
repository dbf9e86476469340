use std::sync::Arc;

use futures::join;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, SiteBackend};
use crate::cache::SiteSnapshot;
use crate::drafts::ChangeTracker;
use crate::editor::{self, Direction, EditRefusal};
use crate::models::{
    Category, ElementProps, EntityId, IdAllocator, Location, NodeKind, Page, PropsPatch,
    RestaurantSummary, Website,
};
use crate::selection::Selection;
use crate::state::site_sync::SyncState;
use crate::util::{slugify, unique_slug, ROOT_SLUG};

/// Failure of an editor action that writes through immediately.
#[derive(Debug, Error)]
pub(crate) enum ActionError {
    #[error(transparent)]
    Refused(#[from] EditRefusal),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("The website no longer exists.")]
    WebsiteGone,
}

/// Everything the builder edits, owned by one editor.
#[derive(Clone, Debug)]
pub(crate) struct EditorSession {
    pub website: Website,
    pub snapshot: SiteSnapshot,
    pub tracker: ChangeTracker,
    pub selection: Selection,
    pub active_page: Option<Uuid>,
    pub ids: IdAllocator,
    pub sync: SyncState,
}

impl EditorSession {
    /// Start editing `website`, reopening `remembered_page` if it still exists.
    pub fn new(website: Website, remembered_page: Option<Uuid>) -> Self {
        let active_page = remembered_page
            .filter(|id| website.page(*id).is_some())
            .or_else(|| website.first_page_id());

        Self {
            snapshot: SiteSnapshot::capture(&website),
            website,
            tracker: ChangeTracker::default(),
            selection: Selection::None,
            active_page,
            ids: IdAllocator::default(),
            sync: SyncState::Idle,
        }
    }

    pub fn active_page(&self) -> Option<&Arc<Page>> {
        self.active_page.and_then(|id| self.website.page(id))
    }

    pub fn set_active_page(&mut self, id: Uuid) -> Result<(), EditRefusal> {
        if self.website.page(id).is_none() {
            return Err(EditRefusal::Unresolved);
        }
        self.active_page = Some(id);
        self.selection = Selection::None;
        Ok(())
    }

    /// Selecting a node replaces any previous selection.
    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.sync, SyncState::Saving { .. })
    }

    /// Unsaved deletions or edits on the active page or navbar.
    pub fn is_dirty(&self) -> bool {
        if !self.tracker.is_empty() {
            return true;
        }
        self.active_page().is_some_and(|page| {
            !super::diff::diff_page(page, &self.website.navbar, &self.snapshot).is_empty()
        })
    }

    fn guard(&self) -> Result<(), EditRefusal> {
        if self.is_saving() {
            return Err(EditRefusal::SaveInProgress);
        }
        Ok(())
    }

    fn current_page(&self) -> Result<Arc<Page>, EditRefusal> {
        self.guard()?;
        self.active_page().cloned().ok_or(EditRefusal::NoActivePage)
    }

    fn commit_page(&mut self, page: Page) {
        self.website.replace_page(page);
    }

    pub fn add_section(&mut self) -> Result<EntityId, EditRefusal> {
        let page = self.current_page()?;
        let (next, id) = editor::add_section(&page, &mut self.ids);
        self.commit_page(next);
        Ok(id)
    }

    pub fn add_subsection(&mut self, section_id: EntityId) -> Result<EntityId, EditRefusal> {
        let page = self.current_page()?;
        let (next, id) = editor::add_subsection(&page, section_id, &mut self.ids)?;
        self.commit_page(next);
        Ok(id)
    }

    pub fn add_element(
        &mut self,
        subsection_id: EntityId,
        properties: ElementProps,
        ai_payload: Option<Value>,
    ) -> Result<EntityId, EditRefusal> {
        let page = self.current_page()?;
        let (next, id) =
            editor::add_element(&page, subsection_id, properties, ai_payload, &mut self.ids)?;
        self.commit_page(next);
        Ok(id)
    }

    /// Palette action: add to the selected layout block.
    pub fn add_element_to_selection(
        &mut self,
        properties: ElementProps,
        ai_payload: Option<Value>,
    ) -> Result<EntityId, EditRefusal> {
        match self.selection {
            Selection::Subsection(id) => self.add_element(id, properties, ai_payload),
            _ => Err(EditRefusal::SelectLayoutBlock),
        }
    }

    pub fn update_properties(&mut self, patch: &PropsPatch) -> Result<(), EditRefusal> {
        self.guard()?;
        match self.selection {
            Selection::Navbar(id) if id == self.website.navbar.id => {
                let navbar = editor::update_navbar_properties(&self.website.navbar, patch)?;
                self.website.navbar = Arc::new(navbar);
                Ok(())
            }
            Selection::Navbar(_) => Err(EditRefusal::Unresolved),
            Selection::NavbarItem(_) => Err(EditRefusal::NoPropertyBag),
            selection => {
                let page = self.current_page()?;
                let next = editor::update_properties(&page, selection, patch)?;
                self.commit_page(next);
                Ok(())
            }
        }
    }

    /// Remove the selection from the tree and remember it for the next save.
    pub fn delete_selected(&mut self) -> Result<(), EditRefusal> {
        self.guard()?;
        match self.selection {
            Selection::None => return Err(EditRefusal::NothingSelected),
            Selection::Navbar(_) | Selection::NavbarItem(_) => {
                let (navbar, id) =
                    editor::delete_navbar_entity(&self.website.navbar, self.selection)?;
                self.website.navbar = Arc::new(navbar);
                self.tracker.record_persisted(NodeKind::NavbarItem, id);
            }
            selection => {
                let kind = selection.kind().ok_or(EditRefusal::NothingSelected)?;
                let page = self.current_page()?;
                let (next, removed) = editor::delete_entity(&page, selection)?;
                self.commit_page(next);
                self.tracker.record(kind, removed);
            }
        }
        self.selection = Selection::None;
        Ok(())
    }

    pub fn move_selected(&mut self, dir: Direction) -> Result<(), EditRefusal> {
        let page = self.current_page()?;
        let next = editor::move_entity(&page, self.selection, dir)?;
        self.commit_page(next);
        Ok(())
    }

    /// Swap in a freshly loaded website and re-baseline the snapshot.
    ///
    /// The active page and selection survive when they still exist.
    pub fn replace_website(&mut self, website: Website) {
        self.snapshot = SiteSnapshot::capture(&website);
        self.active_page = self
            .active_page
            .filter(|id| website.page(*id).is_some())
            .or_else(|| website.first_page_id());
        self.website = website;
        if self.selection.resolve(&self.website).is_none() {
            self.selection = Selection::None;
        }
    }

    /// Bring in one page from `fresh` along with the refreshed navbar items,
    /// leaving unsaved edits on every other page alone.
    fn merge_new_page(&mut self, fresh: &Website, page_id: Uuid) -> bool {
        let Some(page) = fresh.page(page_id) else {
            return false;
        };
        self.snapshot.capture_page(page);
        self.website.pages.push(page.clone());

        let navbar = Arc::make_mut(&mut self.website.navbar);
        navbar.items = fresh.navbar.items.clone();
        true
    }

    /// Create a page with a unique slug and make it the active page.
    pub async fn add_page<B: SiteBackend + ?Sized>(
        &mut self,
        backend: &B,
        title: &str,
    ) -> Result<Uuid, ActionError> {
        self.guard()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(EditRefusal::EmptyTitle.into());
        }

        let slug = unique_slug(
            &slugify(title),
            self.website.pages.iter().map(|p| p.slug.as_str()),
        );
        let page_id = backend.create_page(self.website.id, title, &slug).await?;
        info!(page = %page_id, %slug, "page created");

        let fresh = backend
            .load_website()
            .await?
            .ok_or(ActionError::WebsiteGone)?;
        if !self.merge_new_page(&fresh, page_id) {
            warn!(page = %page_id, "created page missing from reload");
            return Err(ActionError::WebsiteGone);
        }

        self.active_page = Some(page_id);
        self.selection = Selection::None;
        Ok(page_id)
    }

    /// Rename a navbar item, relinking it and its page to the new slug. Written immediately.
    pub async fn rename_navbar_item<B: SiteBackend + ?Sized>(
        &mut self,
        backend: &B,
        item_id: Uuid,
        text: &str,
    ) -> Result<(), ActionError> {
        self.guard()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(EditRefusal::EmptyTitle.into());
        }
        let item = self
            .website
            .nav_item(item_id)
            .cloned()
            .ok_or(EditRefusal::Unresolved)?;

        let link_url = if item.link_url == ROOT_SLUG {
            ROOT_SLUG.to_string()
        } else {
            let others = self
                .website
                .pages
                .iter()
                .filter(|p| p.slug != item.link_url)
                .map(|p| p.slug.as_str());
            unique_slug(&slugify(text), others)
        };

        backend.update_navbar_item(item_id, text, &link_url).await?;
        debug!(item = %item_id, %link_url, "navbar item renamed");

        let navbar = Arc::make_mut(&mut self.website.navbar);
        if let Some(slot) = navbar.items.iter_mut().find(|i| i.id == item_id) {
            slot.text = text.to_string();
            slot.link_url = link_url.clone();
        }
        for page in self.website.pages.iter_mut() {
            if page.slug == item.link_url {
                let page = Arc::make_mut(page);
                page.title = text.to_string();
                page.slug = link_url.clone();
            }
        }
        Ok(())
    }
}

/// What the builder needs on entry.
#[derive(Clone, Debug, Default)]
pub(crate) struct BuilderData {
    pub website: Option<Website>,
    pub locations: Vec<Location>,
    pub restaurant: RestaurantSummary,
    pub categories: Vec<Category>,
}

/// Load the website with the restaurant data alongside it.
///
/// Only the website load is fatal; the rest degrades to empty.
pub(crate) async fn bootstrap<B: SiteBackend + ?Sized>(backend: &B) -> Result<BuilderData, ApiError> {
    let (website, locations, restaurant) = join!(
        backend.load_website(),
        backend.load_locations(),
        backend.load_restaurant()
    );

    let locations = locations.unwrap_or_else(|e| {
        warn!(error = %e, "locations unavailable");
        Vec::new()
    });
    let restaurant = restaurant.unwrap_or_else(|e| {
        warn!(error = %e, "restaurant summary unavailable");
        RestaurantSummary::default()
    });

    let categories = match restaurant.restaurant_id.as_deref() {
        Some(id) if restaurant.has_restaurant => {
            backend.load_categories(id).await.unwrap_or_else(|e| {
                warn!(error = %e, "categories unavailable");
                Vec::new()
            })
        }
        _ => Vec::new(),
    };

    Ok(BuilderData {
        website: website?,
        locations,
        restaurant,
        categories,
    })
}
