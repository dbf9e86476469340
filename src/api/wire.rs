//! JSON shapes exchanged with the `/builder` endpoints and their mapping onto the tree.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::props::{nullable, LayoutBag};
use crate::models::restaurant::opt_id_string;
use crate::models::{
    parse_persisted, Element, ElementProps, EntityId, IdError, Navbar, NavbarItem, Page, Section,
    Subsection, Website,
};

#[derive(Debug, Error)]
pub(crate) enum WireError {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("website {0} has no navbar")]
    MissingNavbar(String),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct WebsiteDto {
    pub website_id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageDto>,
    #[serde(default)]
    pub navbar: Option<NavbarDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct PageDto {
    pub page_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub sections: Vec<SectionDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SectionDto {
    pub section_id: String,
    #[serde(default)]
    pub section_type: String,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub subsections: Vec<SubsectionDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct SubsectionDto {
    pub subsection_id: String,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub elements: Vec<ElementDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct ElementDto {
    pub element_id: String,
    pub element_type: String,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub properties: Value,
    // Older rows carry it under the camelCase key.
    #[serde(default, alias = "aiPayload")]
    pub ai_payload: Option<Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NavbarDto {
    pub navbar_id: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub items: Vec<NavbarItemDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct NavbarItemDto {
    pub item_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub link_url: String,
    #[serde(default)]
    pub position: usize,
}

/// A bag written by another editor version must not take the whole site down.
fn layout_props<T: LayoutBag>(id: &str, raw: Value) -> T {
    let (props, kept) = T::from_json_lossy(raw);
    if !kept.is_empty() {
        warn!(node = id, keys = ?kept, "properties kept verbatim");
    }
    props
}

fn element_props(id: &str, element_type: &str, raw: Value) -> ElementProps {
    ElementProps::from_wire(element_type, raw.clone()).unwrap_or_else(|error| {
        warn!(element = id, %error, "element properties kept as raw JSON");
        ElementProps::Other {
            element_type: element_type.to_string(),
            properties: raw,
        }
    })
}

/// Children come back in insertion order; the tree keeps them in position order.
fn by_position<T>(mut items: Vec<T>, position: impl Fn(&T) -> usize) -> Vec<T> {
    items.sort_by_key(|item| position(item));
    items
}

impl TryFrom<WebsiteDto> for Website {
    type Error = WireError;

    fn try_from(dto: WebsiteDto) -> Result<Self, Self::Error> {
        let navbar = dto
            .navbar
            .ok_or_else(|| WireError::MissingNavbar(dto.website_id.clone()))?;

        Ok(Website {
            id: parse_persisted(&dto.website_id)?,
            restaurant_id: dto.restaurant_id,
            subdomain: dto.subdomain,
            pages: dto
                .pages
                .into_iter()
                .map(|p| Page::try_from(p).map(Arc::new))
                .collect::<Result<_, _>>()?,
            navbar: Arc::new(Navbar::try_from(navbar)?),
        })
    }
}

impl TryFrom<PageDto> for Page {
    type Error = WireError;

    fn try_from(dto: PageDto) -> Result<Self, Self::Error> {
        Ok(Page {
            id: parse_persisted(&dto.page_id)?,
            title: dto.title,
            slug: dto.slug,
            sections: by_position(dto.sections, |s| s.position)
                .into_iter()
                .map(|s| Section::try_from(s).map(Arc::new))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<SectionDto> for Section {
    type Error = WireError;

    fn try_from(dto: SectionDto) -> Result<Self, Self::Error> {
        Ok(Section {
            id: EntityId::Persisted(parse_persisted(&dto.section_id)?),
            properties: layout_props(&dto.section_id, dto.properties),
            section_type: dto.section_type,
            position: dto.position,
            subsections: by_position(dto.subsections, |s| s.position)
                .into_iter()
                .map(|s| Subsection::try_from(s).map(Arc::new))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<SubsectionDto> for Subsection {
    type Error = WireError;

    fn try_from(dto: SubsectionDto) -> Result<Self, Self::Error> {
        Ok(Subsection {
            id: EntityId::Persisted(parse_persisted(&dto.subsection_id)?),
            properties: layout_props(&dto.subsection_id, dto.properties),
            position: dto.position,
            elements: by_position(dto.elements, |e| e.position)
                .into_iter()
                .map(|e| Element::try_from(e).map(Arc::new))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<ElementDto> for Element {
    type Error = WireError;

    fn try_from(dto: ElementDto) -> Result<Self, Self::Error> {
        Ok(Element {
            id: EntityId::Persisted(parse_persisted(&dto.element_id)?),
            properties: element_props(&dto.element_id, &dto.element_type, dto.properties),
            position: dto.position,
            ai_payload: dto.ai_payload.filter(|v| !v.is_null()),
        })
    }
}

impl TryFrom<NavbarDto> for Navbar {
    type Error = WireError;

    fn try_from(dto: NavbarDto) -> Result<Self, Self::Error> {
        Ok(Navbar {
            id: parse_persisted(&dto.navbar_id)?,
            properties: layout_props(&dto.navbar_id, dto.properties),
            items: by_position(dto.items, |i| i.position)
                .into_iter()
                .map(|i| {
                    Ok(NavbarItem {
                        id: parse_persisted(&i.item_id)?,
                        text: i.text,
                        link_url: i.link_url,
                        position: i.position,
                    })
                })
                .collect::<Result<_, WireError>>()?,
        })
    }
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateWebsiteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<&'a str>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreatePageRequest<'a> {
    pub website_id: Uuid,
    pub title: &'a str,
    pub slug: &'a str,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateSectionRequest<'a> {
    pub page_id: Uuid,
    pub section_type: &'a str,
    pub position: usize,
    pub properties: Value,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateSubsectionRequest {
    pub section_id: Uuid,
    pub position: usize,
    pub properties: Value,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CreateElementRequest<'a> {
    pub subsection_id: Uuid,
    pub element_type: String,
    pub position: usize,
    pub properties: Value,
    #[serde(rename = "aiPayload", skip_serializing_if = "Option::is_none")]
    pub ai_payload: Option<&'a Value>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct UpdateNodeRequest {
    pub position: usize,
    pub properties: Value,
}

/// Always sends `aiPayload` so a cleared payload reaches the server as `null`.
#[derive(Serialize, Clone, Debug)]
pub(crate) struct UpdateElementRequest<'a> {
    pub position: usize,
    pub properties: Value,
    #[serde(rename = "aiPayload")]
    pub ai_payload: Option<&'a Value>,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct UpdateNavbarRequest {
    pub properties: Value,
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct UpdateNavbarItemRequest<'a> {
    pub text: &'a str,
    pub link_url: &'a str,
}

/// Create responses echo the whole row; only the id is read.
#[derive(Deserialize, Clone, Debug)]
pub(crate) struct CreatedPage {
    pub page_id: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct CreatedSection {
    pub section_id: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct CreatedSubsection {
    pub subsection_id: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct CreatedElement {
    pub element_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ElementType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SITE: &str = r##"{
        "website_id": "00000000-0000-0000-0000-000000000001",
        "restaurant_id": "00000000-0000-0000-0000-0000000000aa",
        "subdomain": "bistro",
        "pages": [{
            "page_id": "00000000-0000-0000-0000-00000000000a",
            "title": "Home",
            "slug": "/",
            "sections": [
                {"section_id": "00000000-0000-0000-0000-000000000015", "section_type": "hero",
                 "position": 1, "properties": {}, "subsections": []},
                {"section_id": "00000000-0000-0000-0000-000000000014", "section_type": "default",
                 "position": 0, "properties": {"gap": "1rem"},
                 "subsections": [{
                    "subsection_id": "00000000-0000-0000-0000-00000000001e",
                    "position": 0,
                    "properties": {"display": "grid", "gridColumns": 3},
                    "elements": [{
                        "element_id": "00000000-0000-0000-0000-000000000028",
                        "element_type": "TEXT",
                        "position": 0,
                        "properties": {"content": "Welcome", "style": {"color": "#000"}},
                        "aiPayload": null
                    }]
                 }]}
            ]
        }],
        "navbar": {
            "navbar_id": "00000000-0000-0000-0000-000000000002",
            "properties": {"backgroundColor": "#111", "itemStyle": {"color": "#fff"}},
            "items": [{"item_id": "00000000-0000-0000-0000-0000000003f2",
                       "text": "Home", "link_url": "/", "position": 0}]
        }
    }"##;

    #[test]
    fn test_website_response_contract_deserialize() {
        let dto: WebsiteDto = serde_json::from_str(SITE).expect("website response should parse");
        let site = Website::try_from(dto).expect("website should map onto the tree");

        assert_eq!(site.id, Uuid::from_u128(1));
        assert_eq!(site.subdomain.as_deref(), Some("bistro"));
        let page = &site.pages[0];
        assert_eq!(page.slug, "/");

        // sorted by position
        assert_eq!(page.sections[0].id, EntityId::from(Uuid::from_u128(0x14)));
        assert_eq!(page.sections[1].section_type, "hero");

        let sub = &page.sections[0].subsections[0];
        assert_eq!(sub.properties.grid_columns, Some(3));
        let el = &sub.elements[0];
        assert_eq!(el.properties.element_type(), Some(ElementType::Text));
        assert!(el.ai_payload.is_none());

        assert_eq!(site.navbar.properties.background_color.as_deref(), Some("#111"));
        assert_eq!(site.navbar.items[0].link_url, "/");
    }

    #[test]
    fn test_property_shapes_from_the_web_editor_still_load() {
        let dto: WebsiteDto = serde_json::from_value(json!({
            "website_id": "00000000-0000-0000-0000-000000000001",
            "pages": [{
                "page_id": "00000000-0000-0000-0000-00000000000a",
                "title": null,
                "slug": "/",
                "sections": [{
                    "section_id": "00000000-0000-0000-0000-000000000014",
                    "position": 0,
                    "properties": {"display": "inline-flex", "gap": "1rem"},
                    "subsections": [
                        {"subsection_id": "00000000-0000-0000-0000-00000000001e", "position": 0,
                         "properties": {"display": "grid", "gridColumns": "3"}},
                        {"subsection_id": "00000000-0000-0000-0000-00000000001f", "position": 1,
                         "properties": {"gridColumns": ""},
                         "elements": [{
                            "element_id": "00000000-0000-0000-0000-000000000028",
                            "element_type": "LIST",
                            "position": 0,
                            "properties": {"items": "Soup, Salad"}
                         }]}
                    ]
                }]
            }],
            "navbar": {"navbar_id": "00000000-0000-0000-0000-000000000002"}
        }))
        .unwrap();
        let site = Website::try_from(dto).expect("site should load");

        let page = &site.pages[0];
        assert_eq!(page.title, "");
        let section = &page.sections[0];
        assert_eq!(section.properties.gap.as_deref(), Some("1rem"));
        assert_eq!(section.properties.extra.get("display"), Some(&json!("inline-flex")));

        assert_eq!(section.subsections[0].properties.grid_columns, Some(3));
        assert_eq!(section.subsections[1].properties.grid_columns, None);

        let el = &section.subsections[1].elements[0];
        assert_eq!(el.properties.type_tag(), "LIST");
        assert_eq!(el.properties.to_json(), json!({"items": "Soup, Salad"}));
    }

    #[test]
    fn test_temporary_ids_from_server_are_rejected() {
        let dto: WebsiteDto = serde_json::from_value(json!({
            "website_id": "00000000-0000-0000-0000-000000000001",
            "pages": [{"page_id": "page_1718000000000", "title": "x", "slug": "/x"}],
            "navbar": {"navbar_id": "00000000-0000-0000-0000-000000000002"}
        }))
        .unwrap();
        assert!(matches!(Website::try_from(dto), Err(WireError::Id(_))));
    }

    #[test]
    fn test_missing_navbar_is_an_error() {
        let dto: WebsiteDto = serde_json::from_value(json!({
            "website_id": "00000000-0000-0000-0000-000000000001"
        }))
        .unwrap();
        assert!(matches!(Website::try_from(dto), Err(WireError::MissingNavbar(_))));
    }

    #[test]
    fn test_create_element_request_uses_camel_case_payload_key() {
        let payload = json!({"html": "<p/>"});
        let req = CreateElementRequest {
            subsection_id: Uuid::from_u128(3),
            element_type: "AI".to_string(),
            position: 2,
            properties: json!({}),
            ai_payload: Some(&payload),
        };
        let v = serde_json::to_value(req).unwrap();
        assert_eq!(v["aiPayload"], payload);
        assert_eq!(v["subsection_id"], "00000000-0000-0000-0000-000000000003");
    }

    #[test]
    fn test_update_element_request_sends_null_payload() {
        let req = UpdateElementRequest {
            position: 0,
            properties: json!({"content": "x"}),
            ai_payload: None,
        };
        let v = serde_json::to_value(req).unwrap();
        assert!(v.as_object().unwrap().contains_key("aiPayload"));
        assert!(v["aiPayload"].is_null());
    }
}
