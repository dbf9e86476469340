pub(crate) mod wire;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    parse_persisted, Category, Location, MenuEntry, NavbarProps, NodeKind, NodePayload,
    PropertyBag, RestaurantSummary, Website,
};
use crate::storage::{load_string_from_storage, remove_from_storage, save_string_to_storage, TOKEN_KEY};
use wire::{
    CreateElementRequest, CreatePageRequest, CreateSectionRequest, CreateSubsectionRequest,
    CreateWebsiteRequest, CreatedElement, CreatedPage, CreatedSection, CreatedSubsection,
    UpdateElementRequest, UpdateNavbarItemRequest, UpdateNavbarRequest, UpdateNodeRequest,
    WebsiteDto, WireError,
};

#[derive(Clone, Debug, Error)]
pub(crate) enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        ApiError::Parse(e.to_string())
    }

    fn from_status(status: StatusCode, path: &str, body: String) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(path.to_string()),
            _ => ApiError::Http {
                status: status.as_u16(),
                body,
            },
        }
    }
}

impl From<WireError> for ApiError {
    fn from(e: WireError) -> Self {
        ApiError::parse(e)
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Runtime configuration injected by the hosting page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
}

impl EnvConfig {
    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8000";
    pub const DEFAULT_LOG_LEVEL: &'static str = "info";

    /// Build from any key lookup. Upper-case keys win over their lower-case aliases.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |upper: &str, lower: &str, default: &str| {
            get(upper)
                .or_else(|| get(lower))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            api_url: pick("API_URL", "api_url", Self::DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            log_level: pick("LOG_LEVEL", "log_level", Self::DEFAULT_LOG_LEVEL),
        }
    }

    pub fn new() -> Self {
        Self::from_lookup(window_env)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
fn window_env(key: &str) -> Option<String> {
    let env = web_sys::window()?.get("ENV")?;
    if env.is_undefined() || !env.is_object() {
        return None;
    }
    js_sys::Reflect::get(&env, &key.into()).ok()?.as_string()
}

#[cfg(not(target_arch = "wasm32"))]
fn window_env(_key: &str) -> Option<String> {
    None
}

/// Persistence service for the builder: the website tree plus the restaurant
/// data used to seed elements.
#[async_trait(?Send)]
pub(crate) trait SiteBackend {
    /// `None` when the account has no website yet.
    async fn load_website(&self) -> ApiResult<Option<Website>>;
    /// Creates the website with a seeded Home page, navbar and Home item.
    async fn create_website(&self, subdomain: Option<&str>) -> ApiResult<Website>;
    async fn load_public_website(&self, subdomain: &str) -> ApiResult<Option<Website>>;

    async fn load_locations(&self) -> ApiResult<Vec<Location>>;
    async fn load_restaurant(&self) -> ApiResult<RestaurantSummary>;
    async fn load_categories(&self, restaurant_id: &str) -> ApiResult<Vec<Category>>;
    async fn load_menu(&self, location_id: &str) -> ApiResult<Vec<MenuEntry>>;

    /// Also creates the page's navbar item server-side.
    async fn create_page(&self, website_id: Uuid, title: &str, slug: &str) -> ApiResult<Uuid>;

    async fn create_node(
        &self,
        parent: Uuid,
        position: usize,
        payload: &NodePayload,
    ) -> ApiResult<Uuid>;
    async fn update_node(&self, id: Uuid, position: usize, payload: &NodePayload)
        -> ApiResult<()>;
    async fn delete_node(&self, kind: NodeKind, id: Uuid) -> ApiResult<()>;

    async fn update_navbar(&self, id: Uuid, properties: &NavbarProps) -> ApiResult<()>;
    async fn update_navbar_item(&self, id: Uuid, text: &str, link_url: &str) -> ApiResult<()>;
}

/// `/builder/{kind}s/{id}`
pub(crate) fn node_path(kind: NodeKind, id: Uuid) -> String {
    format!("/builder/{kind}s/{id}")
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    pub fn load_from_storage(config: &EnvConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            token: load_string_from_storage(TOKEN_KEY),
        }
    }

    pub fn save_to_storage(&self) {
        if let Some(token) = &self.token {
            save_string_to_storage(TOKEN_KEY, token);
        }
    }

    pub fn clear_storage() {
        remove_from_storage(TOKEN_KEY);
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn get_auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    /// Forget a token the service no longer accepts.
    pub fn logout(&mut self) {
        self.token = None;
        Self::clear_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<reqwest::Response> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");

        let mut req = client.request(method, url);
        if let Some(header) = self.get_auth_header() {
            req = req.header("Authorization", header);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;
        if res.status().is_success() {
            Ok(res)
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, path, body))
        }
    }

    async fn request_api<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<T> {
        self.send(method, path, body)
            .await?
            .json()
            .await
            .map_err(ApiError::parse)
    }

    /// For writes whose response body is not needed.
    async fn request_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> ApiResult<()> {
        self.send(method, path, body).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_api(Method::GET, path, None::<&()>).await
    }

    async fn load_tree(&self, path: &str) -> ApiResult<Option<Website>> {
        match self.get::<WebsiteDto>(path).await {
            Ok(dto) => Ok(Some(Website::try_from(dto)?)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait(?Send)]
impl SiteBackend for ApiClient {
    async fn load_website(&self) -> ApiResult<Option<Website>> {
        self.load_tree("/builder/website").await
    }

    async fn create_website(&self, subdomain: Option<&str>) -> ApiResult<Website> {
        let dto: WebsiteDto = self
            .request_api(
                Method::POST,
                "/builder/website",
                Some(&CreateWebsiteRequest { subdomain }),
            )
            .await?;
        Ok(Website::try_from(dto)?)
    }

    async fn load_public_website(&self, subdomain: &str) -> ApiResult<Option<Website>> {
        let path = format!("/builder/public/{}", urlencoding::encode(subdomain));
        self.load_tree(&path).await
    }

    async fn load_locations(&self) -> ApiResult<Vec<Location>> {
        self.get("/locations/has-location").await
    }

    async fn load_restaurant(&self) -> ApiResult<RestaurantSummary> {
        self.get("/restaurants/has-restaurant").await
    }

    async fn load_categories(&self, restaurant_id: &str) -> ApiResult<Vec<Category>> {
        let path = format!("/restaurants/categories/{}", urlencoding::encode(restaurant_id));
        self.get(&path).await
    }

    async fn load_menu(&self, location_id: &str) -> ApiResult<Vec<MenuEntry>> {
        let path = format!("/locations/{}/menu", urlencoding::encode(location_id));
        self.get(&path).await
    }

    async fn create_page(&self, website_id: Uuid, title: &str, slug: &str) -> ApiResult<Uuid> {
        let created: CreatedPage = self
            .request_api(
                Method::POST,
                "/builder/pages",
                Some(&CreatePageRequest {
                    website_id,
                    title,
                    slug,
                }),
            )
            .await?;
        parse_persisted(&created.page_id).map_err(ApiError::parse)
    }

    async fn create_node(
        &self,
        parent: Uuid,
        position: usize,
        payload: &NodePayload,
    ) -> ApiResult<Uuid> {
        let raw_id = match payload {
            NodePayload::Section {
                section_type,
                properties,
            } => {
                let created: CreatedSection = self
                    .request_api(
                        Method::POST,
                        "/builder/sections",
                        Some(&CreateSectionRequest {
                            page_id: parent,
                            section_type,
                            position,
                            properties: properties.to_json(),
                        }),
                    )
                    .await?;
                created.section_id
            }
            NodePayload::Subsection { properties } => {
                let created: CreatedSubsection = self
                    .request_api(
                        Method::POST,
                        "/builder/subsections",
                        Some(&CreateSubsectionRequest {
                            section_id: parent,
                            position,
                            properties: properties.to_json(),
                        }),
                    )
                    .await?;
                created.subsection_id
            }
            NodePayload::Element {
                properties,
                ai_payload,
            } => {
                let created: CreatedElement = self
                    .request_api(
                        Method::POST,
                        "/builder/elements",
                        Some(&CreateElementRequest {
                            subsection_id: parent,
                            element_type: properties.type_tag(),
                            position,
                            properties: properties.to_json(),
                            ai_payload: ai_payload.as_ref(),
                        }),
                    )
                    .await?;
                created.element_id
            }
        };
        parse_persisted(&raw_id).map_err(ApiError::parse)
    }

    async fn update_node(
        &self,
        id: Uuid,
        position: usize,
        payload: &NodePayload,
    ) -> ApiResult<()> {
        let path = node_path(payload.kind(), id);
        match payload {
            NodePayload::Section { properties, .. } => {
                let body = UpdateNodeRequest {
                    position,
                    properties: properties.to_json(),
                };
                self.request_unit(Method::PUT, &path, Some(&body)).await
            }
            NodePayload::Subsection { properties } => {
                let body = UpdateNodeRequest {
                    position,
                    properties: properties.to_json(),
                };
                self.request_unit(Method::PUT, &path, Some(&body)).await
            }
            NodePayload::Element {
                properties,
                ai_payload,
            } => {
                let body = UpdateElementRequest {
                    position,
                    properties: properties.to_json(),
                    ai_payload: ai_payload.as_ref(),
                };
                self.request_unit(Method::PUT, &path, Some(&body)).await
            }
        }
    }

    async fn delete_node(&self, kind: NodeKind, id: Uuid) -> ApiResult<()> {
        self.request_unit(Method::DELETE, &node_path(kind, id), None::<&()>)
            .await
    }

    async fn update_navbar(&self, id: Uuid, properties: &NavbarProps) -> ApiResult<()> {
        let body = UpdateNavbarRequest {
            properties: properties.to_json(),
        };
        self.request_unit(Method::PUT, &node_path(NodeKind::Navbar, id), Some(&body))
            .await
    }

    async fn update_navbar_item(&self, id: Uuid, text: &str, link_url: &str) -> ApiResult<()> {
        let body = UpdateNavbarItemRequest { text, link_url };
        self.request_unit(
            Method::PUT,
            &node_path(NodeKind::NavbarItem, id),
            Some(&body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_env_config_defaults() {
        let cfg = EnvConfig::from_lookup(|_| None);
        assert_eq!(cfg.api_url, "http://127.0.0.1:8000");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_env_config_prefers_upper_case_keys() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("API_URL", "https://api.example.com/"),
            ("api_url", "http://legacy"),
            ("log_level", "debug"),
        ]);
        let cfg = EnvConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_url, "https://api.example.com");
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_node_paths() {
        let id = Uuid::from_u128(9);
        assert_eq!(
            node_path(NodeKind::NavbarItem, id),
            "/builder/navbar_items/00000000-0000-0000-0000-000000000009"
        );
        assert_eq!(
            node_path(NodeKind::Subsection, id),
            "/builder/subsections/00000000-0000-0000-0000-000000000009"
        );
    }

    #[test]
    fn test_api_error_from_status() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "/x", String::new()),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "/builder/website", String::new()),
            ApiError::NotFound(path) if path == "/builder/website"
        ));
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "/x", "bad".to_string());
        assert_eq!(err.to_string(), "Request failed (400): bad");
    }

    #[test]
    fn test_api_client_auth_header() {
        let mut client = ApiClient::load_from_storage(&EnvConfig::from_lookup(|_| None));
        assert!(client.get_auth_header().is_none());
        assert!(!client.is_authenticated());

        client.set_token("my-jwt-token".to_string());
        assert_eq!(client.get_auth_header().as_deref(), Some("Bearer my-jwt-token"));
        assert!(client.is_authenticated());

        client.logout();
        assert!(client.get_auth_header().is_none());
        assert!(!client.is_authenticated());
    }
}
