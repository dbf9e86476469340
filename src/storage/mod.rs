use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bearer token, written by the login flow that hosts the builder.
pub(crate) const TOKEN_KEY: &str = "menusite_token";
const ACTIVE_PAGE_KEY_PREFIX: &str = "menusite_active_page";

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

// No browser storage outside wasm; reads miss and writes are dropped.
#[cfg(not(target_arch = "wasm32"))]
fn local_storage() -> Option<web_sys::Storage> {
    None
}

pub(crate) fn load_string_from_storage(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

pub(crate) fn save_string_to_storage(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

pub(crate) fn remove_from_storage(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let json = load_string_from_storage(key)?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        save_string_to_storage(key, &json);
    }
}

fn active_page_key(website_id: Uuid) -> String {
    format!("{ACTIVE_PAGE_KEY_PREFIX}::{website_id}")
}

pub(crate) fn load_active_page(website_id: Uuid) -> Option<Uuid> {
    load_json_from_storage(&active_page_key(website_id))
}

pub(crate) fn save_active_page(website_id: Uuid, page_id: Uuid) {
    save_json_to_storage(&active_page_key(website_id), &page_id);
}
