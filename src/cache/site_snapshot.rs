use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{NavbarProps, NodePayload, Page, Website};

/// What the server held for one node at the last load or write.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SnapshotEntry {
    pub position: usize,
    pub payload: NodePayload,
}

/// Pristine copy of the website, flattened by id regardless of nesting level.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SiteSnapshot {
    nodes: HashMap<Uuid, SnapshotEntry>,
    pages: HashSet<Uuid>,
    navbar: Option<(Uuid, NavbarProps)>,
}

impl SiteSnapshot {
    pub fn capture(site: &Website) -> Self {
        let mut snap = SiteSnapshot {
            navbar: Some((site.navbar.id, site.navbar.properties.clone())),
            ..Default::default()
        };
        for page in &site.pages {
            snap.capture_page(page);
        }
        snap
    }

    /// Index one page's persisted nodes. Pending nodes are skipped.
    pub fn capture_page(&mut self, page: &Page) {
        self.pages.insert(page.id);
        for section in &page.sections {
            if let Some(id) = section.id.persisted() {
                self.record(id, section.position, section.payload());
            }
            for sub in &section.subsections {
                if let Some(id) = sub.id.persisted() {
                    self.record(id, sub.position, sub.payload());
                }
                for el in &sub.elements {
                    if let Some(id) = el.id.persisted() {
                        self.record(id, el.position, el.payload());
                    }
                }
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&SnapshotEntry> {
        self.nodes.get(&id)
    }

    pub fn record(&mut self, id: Uuid, position: usize, payload: NodePayload) {
        self.nodes.insert(id, SnapshotEntry { position, payload });
    }

    pub fn forget(&mut self, id: Uuid) {
        self.nodes.remove(&id);
    }

    pub fn has_page(&self, id: Uuid) -> bool {
        self.pages.contains(&id)
    }

    pub fn navbar_props(&self) -> Option<&NavbarProps> {
        self.navbar.as_ref().map(|(_, props)| props)
    }

    pub fn set_navbar(&mut self, id: Uuid, props: NavbarProps) {
        self.navbar = Some((id, props));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
