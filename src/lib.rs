mod api;
mod app;
mod cache;
mod components;
mod drafts;
mod editor;
mod logging;
mod models;
mod pages;
mod selection;
mod state;
mod storage;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

pub use app::App;


// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(&api::EnvConfig::new());
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use crate::api::wire::WebsiteDto;
    use crate::editor::palette::default_props;
    use crate::models::{ElementType, Website};
    use crate::selection::Selection;
    use crate::state::diff::{diff_page, Directive};
    use crate::state::EditorSession;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn loaded_site() -> Website {
        let body = json!({
            "website_id": "7b0c1a52-8f0e-4c4e-9a57-1f2d5b7a9e01",
            "restaurant_id": 42,
            "subdomain": "bistro",
            "pages": [{
                "page_id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "title": "Home",
                "slug": "/",
                "sections": [{
                    "section_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                    "section_type": "default",
                    "position": 0,
                    "properties": {"display": "flex", "gap": "1rem"},
                    "subsections": [{
                        "subsection_id": "16fd2706-8baf-433b-82eb-8c7fada847da",
                        "position": 3,
                        "properties": {"display": "grid", "gridColumns": 2},
                        "elements": [{
                            "element_id": "886313e1-3b8a-5372-9b90-0c9aee199e5d",
                            "element_type": "TEXT",
                            "position": 0,
                            "properties": {"content": "Welcome", "style": {"color": "#111"}}
                        }]
                    }]
                }]
            }],
            "navbar": {
                "navbar_id": "a8098c1a-f86e-11da-bd1a-00112444be1e",
                "properties": {"backgroundColor": "#fff", "itemStyle": {}},
                "items": [{
                    "item_id": "6fa459ea-ee8a-3ca4-894e-db77e160355e",
                    "text": "Home",
                    "link_url": "/",
                    "position": 1
                }]
            }
        });
        let dto: WebsiteDto = serde_json::from_value(body).unwrap();
        Website::try_from(dto).unwrap()
    }

    #[test]
    fn test_loaded_website_opens_on_first_page() {
        let site = loaded_site();
        let session = EditorSession::new(site, None);

        assert_eq!(session.website.restaurant_id.as_deref(), Some("42"));
        assert_eq!(session.active_page().unwrap().title, "Home");
        assert_eq!(session.snapshot.len(), 3);
    }

    #[test]
    fn test_server_position_gap_is_repaired_on_next_save() {
        let site = loaded_site();
        let session = EditorSession::new(site.clone(), None);
        let page = session.active_page().unwrap();

        // the subsection sits at index 0 but the server says 3
        let directives = diff_page(page, &site.navbar, &session.snapshot);
        assert_eq!(directives.len(), 1);
        assert!(matches!(directives[0], Directive::Update { position: 0, .. }));
    }

    #[test]
    fn test_edit_then_diff_creates_under_persisted_parent() {
        let mut session = EditorSession::new(loaded_site(), None);
        let sub = session.active_page().unwrap().sections[0].subsections[0].id;
        session.select(Selection::Subsection(sub));
        session
            .add_element_to_selection(default_props(ElementType::Button).unwrap(), None)
            .unwrap();

        let page = session.active_page().unwrap();
        let creates: Vec<_> = diff_page(page, &session.website.navbar, &session.snapshot)
            .into_iter()
            .filter(Directive::is_create)
            .collect();
        assert_eq!(creates.len(), 1);
        assert!(matches!(
            &creates[0],
            Directive::Create { position: 1, .. }
        ));
    }
}
