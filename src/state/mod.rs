pub(crate) mod diff;
pub(crate) mod session;
pub(crate) mod site_sync;
#[cfg(test)]
pub(crate) mod test_support;

use leptos::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, EnvConfig, SiteBackend};
use crate::editor::EditRefusal;
use crate::models::{Category, Location, RestaurantSummary};
use crate::storage::{load_active_page, save_active_page};
pub(crate) use session::{bootstrap, ActionError, EditorSession};
pub(crate) use site_sync::SyncState;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// `None` until the website has loaded (or when the account has none yet).
    pub session: RwSignal<Option<EditorSession>>,
    pub loading: RwSignal<bool>,
    pub load_error: RwSignal<Option<String>>,

    /// Mirrors the save progress while the session is checked out by a save.
    pub sync: RwSignal<SyncState>,
    /// Last refusal or status message shown above the canvas.
    pub notice: RwSignal<Option<String>>,

    pub locations: RwSignal<Vec<Location>>,
    pub restaurant: RwSignal<RestaurantSummary>,
    pub categories: RwSignal<Vec<Category>>,
}

impl AppState {
    pub fn new() -> Self {
        let stored_client = ApiClient::load_from_storage(&EnvConfig::new());

        Self {
            api_client: RwSignal::new(stored_client),
            session: RwSignal::new(None),
            loading: RwSignal::new(false),
            load_error: RwSignal::new(None),
            sync: RwSignal::new(SyncState::Idle),
            notice: RwSignal::new(None),
            locations: RwSignal::new(vec![]),
            restaurant: RwSignal::new(RestaurantSummary::default()),
            categories: RwSignal::new(vec![]),
        }
    }

    /// Run a synchronous edit against the live session, surfacing refusals.
    pub fn edit<T>(
        &self,
        f: impl FnOnce(&mut EditorSession) -> Result<T, EditRefusal>,
    ) -> Option<T> {
        let mut outcome = None;
        self.session.update(|s| {
            if let Some(session) = s.as_mut() {
                outcome = Some(f(session));
            }
        });
        match outcome? {
            Ok(v) => {
                self.notice.set(None);
                Some(v)
            }
            Err(refusal) => {
                self.notice.set(Some(refusal.to_string()));
                None
            }
        }
    }

    pub fn open_page(&self, page_id: Uuid) {
        let website_id = self.edit(|s| {
            s.set_active_page(page_id)?;
            Ok(s.website.id)
        });
        if let Some(website_id) = website_id {
            save_active_page(website_id, page_id);
        }
    }

    fn start_session(&self, website: crate::models::Website) {
        let remembered = load_active_page(website.id);
        self.session.set(Some(EditorSession::new(website, remembered)));
    }

    /// Load the website and the restaurant data it is built from.
    pub async fn load(&self) {
        let client = self.api_client.get_untracked();
        self.loading.set(true);
        self.load_error.set(None);

        match bootstrap(&client).await {
            Ok(data) => {
                self.locations.set(data.locations);
                self.restaurant.set(data.restaurant);
                self.categories.set(data.categories);
                match data.website {
                    Some(website) => self.start_session(website),
                    None => info!("no website yet"),
                }
            }
            Err(e) => {
                warn!(error = %e, "bootstrap failed");
                if matches!(e, ApiError::Unauthorized) {
                    self.api_client.update(|c| c.logout());
                }
                self.load_error.set(Some(describe(&e)));
            }
        }
        self.loading.set(false);
    }

    pub async fn create_website(&self, subdomain: Option<String>) {
        let client = self.api_client.get_untracked();
        self.loading.set(true);
        match client.create_website(subdomain.as_deref()).await {
            Ok(website) => {
                info!(website = %website.id, "website created");
                self.start_session(website);
            }
            Err(e) => self.load_error.set(Some(describe(&e))),
        }
        self.loading.set(false);
    }

    /// Take a copy of the session for an async action and lock the live one.
    fn check_out(&self) -> Option<EditorSession> {
        let session = self.session.get_untracked()?;
        if session.is_saving() {
            self.notice.set(Some(EditRefusal::SaveInProgress.to_string()));
            return None;
        }
        self.session.update(|s| {
            if let Some(live) = s.as_mut() {
                live.sync = SyncState::Saving { next: 0, total: 0 };
            }
        });
        Some(session)
    }

    fn check_in(&self, session: EditorSession) {
        self.sync.set(session.sync.clone());
        self.session.set(Some(session));
    }

    pub async fn save(&self) {
        let Some(mut session) = self.check_out() else {
            return;
        };
        let client = self.api_client.get_untracked();
        let sync = self.sync;
        let progress = move |state: &SyncState| sync.set(state.clone());

        let result = site_sync::save(&client, &mut session, Some(&progress)).await;
        self.check_in(session);
        match result {
            Ok(report) => self.notice.set(Some(format!(
                "Saved ({} changes).",
                report.writes()
            ))),
            Err(e) => self.notice.set(Some(e.to_string())),
        }
    }

    pub async fn add_page(&self, title: String) {
        let Some(mut session) = self.check_out() else {
            return;
        };
        let client = self.api_client.get_untracked();

        let result = session.add_page(&client, &title).await;
        let website_id = session.website.id;
        self.check_in(session);
        match result {
            Ok(page_id) => {
                save_active_page(website_id, page_id);
                self.notice.set(None);
            }
            Err(e) => self.notice.set(Some(describe_action(&e))),
        }
    }

    pub async fn rename_navbar_item(&self, item_id: Uuid, text: String) {
        let Some(mut session) = self.check_out() else {
            return;
        };
        let client = self.api_client.get_untracked();

        let result = session.rename_navbar_item(&client, item_id, &text).await;
        self.check_in(session);
        if let Err(e) = result {
            self.notice.set(Some(describe_action(&e)));
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(e: &ApiError) -> String {
    match e {
        ApiError::Unauthorized => "Your session has expired. Sign in again.".to_string(),
        other => other.to_string(),
    }
}

fn describe_action(e: &ActionError) -> String {
    match e {
        ActionError::Api(api) => describe(api),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
