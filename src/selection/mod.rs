use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    Element, EntityId, Navbar, NavbarItem, NodeKind, PropertyBag, Section, Subsection, Website,
};

/// Editing focus: at most one node at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum Selection {
    #[default]
    None,
    Section(EntityId),
    Subsection(EntityId),
    Element(EntityId),
    Navbar(Uuid),
    NavbarItem(Uuid),
}

/// Borrowed view of the node a selection points at.
#[derive(Clone, Copy, Debug)]
pub(crate) enum NodeRef<'a> {
    Section(&'a Section),
    Subsection(&'a Subsection),
    Element(&'a Element),
    Navbar(&'a Navbar),
    NavbarItem(&'a NavbarItem),
}

impl NodeRef<'_> {
    /// Heading for the inspector.
    pub fn title(&self) -> String {
        match self {
            NodeRef::Section(s) => format!("Section {}", s.position + 1),
            NodeRef::Subsection(s) => format!("Layout block {}", s.position + 1),
            NodeRef::Element(e) => e.properties.type_tag(),
            NodeRef::Navbar(_) => "Navbar".to_string(),
            NodeRef::NavbarItem(i) => format!("Link: {}", i.text),
        }
    }

    /// The editable property bag as JSON. Navbar items have none.
    pub fn properties(&self) -> Option<Value> {
        match self {
            NodeRef::Section(s) => Some(s.properties.to_json()),
            NodeRef::Subsection(s) => Some(s.properties.to_json()),
            NodeRef::Element(e) => {
                let mut props = e.properties.to_json();
                if let (Some(obj), Some(payload)) = (props.as_object_mut(), &e.ai_payload) {
                    obj.insert("aiPayload".to_string(), payload.clone());
                }
                Some(props)
            }
            NodeRef::Navbar(n) => Some(n.properties.to_json()),
            NodeRef::NavbarItem(_) => None,
        }
    }
}

impl Selection {
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Selection::None => None,
            Selection::Section(_) => Some(NodeKind::Section),
            Selection::Subsection(_) => Some(NodeKind::Subsection),
            Selection::Element(_) => Some(NodeKind::Element),
            Selection::Navbar(_) => Some(NodeKind::Navbar),
            Selection::NavbarItem(_) => Some(NodeKind::NavbarItem),
        }
    }

    /// Follow an id replacement so a freshly saved node stays selected.
    pub fn renamed(self, from: EntityId, to: EntityId) -> Self {
        match self {
            Selection::Section(id) if id == from => Selection::Section(to),
            Selection::Subsection(id) if id == from => Selection::Subsection(to),
            Selection::Element(id) if id == from => Selection::Element(to),
            other => other,
        }
    }

    /// First matching node across all pages, or the navbar.
    pub fn resolve<'a>(&self, site: &'a Website) -> Option<NodeRef<'a>> {
        match *self {
            Selection::None => None,
            Selection::Section(id) => site
                .pages
                .iter()
                .find_map(|p| p.section(id))
                .map(|s| NodeRef::Section(s)),
            Selection::Subsection(id) => site
                .pages
                .iter()
                .find_map(|p| p.subsection(id))
                .map(|s| NodeRef::Subsection(s)),
            Selection::Element(id) => site
                .pages
                .iter()
                .find_map(|p| p.element(id))
                .map(|e| NodeRef::Element(e)),
            Selection::Navbar(id) => {
                (site.navbar.id == id).then(|| NodeRef::Navbar(&site.navbar))
            }
            Selection::NavbarItem(id) => site.nav_item(id).map(NodeRef::NavbarItem),
        }
    }
}
