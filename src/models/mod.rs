pub(crate) mod element;
pub(crate) mod id;
pub(crate) mod props;
pub(crate) mod restaurant;

use std::sync::Arc;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

pub(crate) use element::{ElementProps, ElementType};
pub(crate) use id::{parse_persisted, EntityId, IdAllocator, IdError, PendingId};
pub(crate) use props::{NavbarProps, PropertyBag, PropsPatch, SectionProps, SubsectionProps};
pub(crate) use restaurant::{Category, Location, MenuEntry, RestaurantSummary};

/// Kinds of node that can be selected, written or deleted individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum NodeKind {
    Section,
    Subsection,
    Element,
    Navbar,
    NavbarItem,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Website {
    pub id: Uuid,
    pub restaurant_id: Option<String>,
    pub subdomain: Option<String>,
    pub pages: Vec<Arc<Page>>,
    pub navbar: Arc<Navbar>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub sections: Vec<Arc<Section>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Section {
    pub id: EntityId,
    pub section_type: String,
    pub position: usize,
    pub properties: SectionProps,
    pub subsections: Vec<Arc<Subsection>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Subsection {
    pub id: EntityId,
    pub position: usize,
    pub properties: SubsectionProps,
    pub elements: Vec<Arc<Element>>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Element {
    pub id: EntityId,
    pub position: usize,
    pub properties: ElementProps,
    /// Opaque rendering payload for generated blocks.
    pub ai_payload: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Navbar {
    pub id: Uuid,
    pub properties: NavbarProps,
    pub items: Vec<NavbarItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NavbarItem {
    pub id: Uuid,
    pub text: String,
    pub link_url: String,
    pub position: usize,
}

impl Website {
    pub fn page(&self, id: Uuid) -> Option<&Arc<Page>> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn first_page_id(&self) -> Option<Uuid> {
        self.pages.first().map(|p| p.id)
    }

    /// Swap in a new version of an existing page. Returns false if the page is gone.
    pub fn replace_page(&mut self, page: Page) -> bool {
        match self.pages.iter_mut().find(|p| p.id == page.id) {
            Some(slot) => {
                *slot = Arc::new(page);
                true
            }
            None => false,
        }
    }

    /// Exact slug, then the root page, then the first page.
    pub fn page_for_path(&self, path: &str) -> Option<&Arc<Page>> {
        let path = normalize_path(path);
        self.pages
            .iter()
            .find(|p| p.slug == path)
            .or_else(|| self.pages.iter().find(|p| p.slug == "/"))
            .or_else(|| self.pages.first())
    }

    /// Navbar items that link to an existing page, in position order.
    pub fn visible_nav_items(&self) -> Vec<&NavbarItem> {
        let mut items: Vec<&NavbarItem> = self
            .navbar
            .items
            .iter()
            .filter(|item| self.pages.iter().any(|p| p.slug == item.link_url))
            .collect();
        items.sort_by_key(|item| item.position);
        items
    }

    pub fn nav_item(&self, id: Uuid) -> Option<&NavbarItem> {
        self.navbar.items.iter().find(|i| i.id == id)
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl Page {
    pub fn section(&self, id: EntityId) -> Option<&Arc<Section>> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn subsection(&self, id: EntityId) -> Option<&Arc<Subsection>> {
        self.sections
            .iter()
            .flat_map(|s| s.subsections.iter())
            .find(|sub| sub.id == id)
    }

    pub fn element(&self, id: EntityId) -> Option<&Arc<Element>> {
        self.sections
            .iter()
            .flat_map(|s| s.subsections.iter())
            .flat_map(|sub| sub.elements.iter())
            .find(|el| el.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.section(id).is_some() || self.subsection(id).is_some() || self.element(id).is_some()
    }

    /// Replace a node's id in place, cloning only the nodes on its path.
    pub fn replace_id(&mut self, from: EntityId, to: EntityId) -> bool {
        for section in self.sections.iter_mut() {
            if section.id == from {
                Arc::make_mut(section).id = to;
                return true;
            }
            if !section.contains(from) {
                continue;
            }
            let section = Arc::make_mut(section);
            for sub in section.subsections.iter_mut() {
                if sub.id == from {
                    Arc::make_mut(sub).id = to;
                    return true;
                }
                if let Some(idx) = sub.elements.iter().position(|el| el.id == from) {
                    let sub = Arc::make_mut(sub);
                    Arc::make_mut(&mut sub.elements[idx]).id = to;
                    return true;
                }
            }
        }
        false
    }
}

impl Section {
    pub fn contains(&self, id: EntityId) -> bool {
        self.subsections
            .iter()
            .any(|sub| sub.id == id || sub.elements.iter().any(|el| el.id == id))
    }

    pub fn payload(&self) -> NodePayload {
        NodePayload::Section {
            section_type: self.section_type.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl Subsection {
    pub fn payload(&self) -> NodePayload {
        NodePayload::Subsection {
            properties: self.properties.clone(),
        }
    }
}

impl Element {
    pub fn payload(&self) -> NodePayload {
        NodePayload::Element {
            properties: self.properties.clone(),
            ai_payload: self.ai_payload.clone(),
        }
    }
}

/// The writable content of a section, subsection or element, without position or children.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodePayload {
    Section {
        section_type: String,
        properties: SectionProps,
    },
    Subsection {
        properties: SubsectionProps,
    },
    Element {
        properties: ElementProps,
        ai_payload: Option<Value>,
    },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Section { .. } => NodeKind::Section,
            NodePayload::Subsection { .. } => NodeKind::Subsection,
            NodePayload::Element { .. } => NodeKind::Element,
        }
    }
}
