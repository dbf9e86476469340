use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::{ApiError, ApiResult, SiteBackend};
use crate::models::{
    Category, Element, EntityId, Location, MenuEntry, Navbar, NavbarItem, NavbarProps, NodeKind,
    NodePayload, Page, RestaurantSummary, Section, Subsection, Website,
};

#[derive(Default)]
struct FakeState {
    website: Option<Website>,
    restaurant: RestaurantSummary,
    calls: Vec<String>,
    next_id: u128,
    writes: usize,
    fail_write: Option<usize>,
    failing_reads: HashSet<&'static str>,
}

/// In-memory server: keeps one website, hands out sequential ids and logs every write.
pub(crate) struct FakeBackend {
    state: RefCell<FakeState>,
}

impl FakeBackend {
    pub fn new(website: Website) -> Self {
        let backend = Self::empty();
        backend.state.borrow_mut().website = Some(website);
        backend
    }

    pub fn empty() -> Self {
        Self {
            state: RefCell::new(FakeState {
                next_id: 5000,
                ..Default::default()
            }),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn website(&self) -> Option<Website> {
        self.state.borrow().website.clone()
    }

    /// The write with this zero-based index (counted from now) fails once.
    pub fn fail_write_in(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        state.fail_write = Some(state.writes + n);
    }

    pub fn fail_reads_of(&self, name: &'static str) {
        self.state.borrow_mut().failing_reads.insert(name);
    }

    pub fn set_restaurant(&self, summary: RestaurantSummary) {
        self.state.borrow_mut().restaurant = summary;
    }

    /// Id the next create will hand out.
    pub fn peek_next_id(&self, offset: u128) -> Uuid {
        Uuid::from_u128(self.state.borrow().next_id + offset)
    }

    fn read(&self, name: &'static str) -> ApiResult<()> {
        if self.state.borrow().failing_reads.contains(name) {
            return Err(ApiError::Network(format!("{name} unreachable")));
        }
        Ok(())
    }

    fn write(&self, call: String) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        let index = state.writes;
        state.writes += 1;
        if state.fail_write == Some(index) {
            state.fail_write = None;
            return Err(ApiError::Http {
                status: 500,
                body: format!("injected failure on {call}"),
            });
        }
        state.calls.push(call);
        Ok(())
    }

    fn allocate(&self) -> Uuid {
        let mut state = self.state.borrow_mut();
        let id = Uuid::from_u128(state.next_id);
        state.next_id += 1;
        id
    }

    fn with_site<T>(&self, f: impl FnOnce(&mut Website) -> T) -> ApiResult<T> {
        let mut state = self.state.borrow_mut();
        let site = state
            .website
            .as_mut()
            .ok_or_else(|| ApiError::NotFound("/builder/website".to_string()))?;
        Ok(f(site))
    }
}

fn sections_mut(site: &mut Website) -> impl Iterator<Item = &mut Arc<Section>> {
    site.pages
        .iter_mut()
        .flat_map(|p| Arc::make_mut(p).sections.iter_mut())
}

fn subsections_mut(site: &mut Website) -> impl Iterator<Item = &mut Arc<Subsection>> {
    sections_mut(site).flat_map(|s| Arc::make_mut(s).subsections.iter_mut())
}

fn insert_node(site: &mut Website, parent: Uuid, id: Uuid, position: usize, payload: &NodePayload) -> bool {
    let parent_id = EntityId::from(parent);
    match payload.clone() {
        NodePayload::Section {
            section_type,
            properties,
        } => {
            let Some(page) = site.pages.iter_mut().find(|p| p.id == parent) else {
                return false;
            };
            let page = Arc::make_mut(page);
            page.sections.push(Arc::new(Section {
                id: id.into(),
                section_type,
                position,
                properties,
                subsections: Vec::new(),
            }));
            page.sections.sort_by_key(|s| s.position);
            true
        }
        NodePayload::Subsection { properties } => {
            let Some(section) = sections_mut(site).find(|s| s.id == parent_id) else {
                return false;
            };
            let section = Arc::make_mut(section);
            section.subsections.push(Arc::new(Subsection {
                id: id.into(),
                position,
                properties,
                elements: Vec::new(),
            }));
            section.subsections.sort_by_key(|s| s.position);
            true
        }
        NodePayload::Element {
            properties,
            ai_payload,
        } => {
            let Some(sub) = subsections_mut(site).find(|s| s.id == parent_id) else {
                return false;
            };
            let sub = Arc::make_mut(sub);
            sub.elements.push(Arc::new(Element {
                id: id.into(),
                position,
                properties,
                ai_payload,
            }));
            sub.elements.sort_by_key(|e| e.position);
            true
        }
    }
}

fn update_node(site: &mut Website, id: Uuid, position: usize, payload: &NodePayload) -> bool {
    let id = EntityId::from(id);
    let mut found = false;
    for page in site.pages.iter_mut() {
        let page = Arc::make_mut(page);
        for section in page.sections.iter_mut() {
            let section = Arc::make_mut(section);
            if let (true, NodePayload::Section { properties, .. }) = (section.id == id, payload) {
                section.position = position;
                section.properties = properties.clone();
                found = true;
            }
            for sub in section.subsections.iter_mut() {
                let sub = Arc::make_mut(sub);
                if let (true, NodePayload::Subsection { properties }) = (sub.id == id, payload) {
                    sub.position = position;
                    sub.properties = properties.clone();
                    found = true;
                }
                for el in sub.elements.iter_mut() {
                    if let (true, NodePayload::Element { properties, ai_payload }) = (el.id == id, payload) {
                        let el = Arc::make_mut(el);
                        el.position = position;
                        el.properties = properties.clone();
                        el.ai_payload = ai_payload.clone();
                        found = true;
                    }
                }
                sub.elements.sort_by_key(|e| e.position);
            }
            section.subsections.sort_by_key(|s| s.position);
        }
        page.sections.sort_by_key(|s| s.position);
    }
    found
}

fn remove_node(site: &mut Website, kind: NodeKind, id: Uuid) -> bool {
    let entity = EntityId::from(id);
    let before = count_nodes(site);
    match kind {
        NodeKind::Section => {
            for page in site.pages.iter_mut() {
                Arc::make_mut(page).sections.retain(|s| s.id != entity);
            }
        }
        NodeKind::Subsection => {
            for section in sections_mut(site) {
                Arc::make_mut(section).subsections.retain(|s| s.id != entity);
            }
        }
        NodeKind::Element => {
            for sub in subsections_mut(site) {
                Arc::make_mut(sub).elements.retain(|e| e.id != entity);
            }
        }
        NodeKind::NavbarItem => {
            let navbar = Arc::make_mut(&mut site.navbar);
            let len = navbar.items.len();
            navbar.items.retain(|i| i.id != id);
            return navbar.items.len() != len;
        }
        NodeKind::Navbar => return false,
    }
    count_nodes(site) != before
}

fn count_nodes(site: &Website) -> usize {
    site.pages
        .iter()
        .flat_map(|p| p.sections.iter())
        .map(|s| 1 + s.subsections.iter().map(|sub| 1 + sub.elements.len()).sum::<usize>())
        .sum()
}

#[async_trait(?Send)]
impl SiteBackend for FakeBackend {
    async fn load_website(&self) -> ApiResult<Option<Website>> {
        self.read("load_website")?;
        Ok(self.website())
    }

    async fn create_website(&self, subdomain: Option<&str>) -> ApiResult<Website> {
        let home_id = self.allocate();
        let navbar_id = self.allocate();
        let item_id = self.allocate();
        let site = Website {
            id: self.allocate(),
            restaurant_id: None,
            subdomain: subdomain.map(str::to_string),
            pages: vec![Arc::new(Page {
                id: home_id,
                title: "Home".to_string(),
                slug: "/".to_string(),
                sections: Vec::new(),
            })],
            navbar: Arc::new(Navbar {
                id: navbar_id,
                properties: NavbarProps::default(),
                items: vec![NavbarItem {
                    id: item_id,
                    text: "Home".to_string(),
                    link_url: "/".to_string(),
                    position: 1,
                }],
            }),
        };
        self.write("create_website".to_string())?;
        self.state.borrow_mut().website = Some(site.clone());
        Ok(site)
    }

    async fn load_public_website(&self, subdomain: &str) -> ApiResult<Option<Website>> {
        self.read("load_public_website")?;
        Ok(self
            .website()
            .filter(|w| w.subdomain.as_deref() == Some(subdomain)))
    }

    async fn load_locations(&self) -> ApiResult<Vec<Location>> {
        self.read("load_locations")?;
        Ok(vec![Location {
            location_id: "loc-1".to_string(),
            location_name: "Downtown".to_string(),
            address: Some("1 Main St".to_string()),
            maps_link: None,
        }])
    }

    async fn load_restaurant(&self) -> ApiResult<RestaurantSummary> {
        self.read("load_restaurant")?;
        Ok(self.state.borrow().restaurant.clone())
    }

    async fn load_categories(&self, _restaurant_id: &str) -> ApiResult<Vec<Category>> {
        self.read("load_categories")?;
        Ok(vec![Category {
            id: "cat-1".to_string(),
            name: "Starters".to_string(),
            image_url: None,
        }])
    }

    async fn load_menu(&self, _location_id: &str) -> ApiResult<Vec<MenuEntry>> {
        self.read("load_menu")?;
        Ok(Vec::new())
    }

    async fn create_page(&self, website_id: Uuid, title: &str, slug: &str) -> ApiResult<Uuid> {
        self.write(format!("create_page {title} {slug}"))?;
        let page_id = self.allocate();
        let item_id = self.allocate();
        self.with_site(|site| {
            debug_assert_eq!(site.id, website_id);
            site.pages.push(Arc::new(Page {
                id: page_id,
                title: title.to_string(),
                slug: slug.to_string(),
                sections: Vec::new(),
            }));
            let navbar = Arc::make_mut(&mut site.navbar);
            navbar.items.push(NavbarItem {
                id: item_id,
                text: title.to_string(),
                link_url: slug.to_string(),
                position: navbar.items.len() + 1,
            });
        })?;
        Ok(page_id)
    }

    async fn create_node(
        &self,
        parent: Uuid,
        position: usize,
        payload: &NodePayload,
    ) -> ApiResult<Uuid> {
        self.write(format!("create {} under {parent} at {position}", payload.kind()))?;
        let id = self.allocate();
        if self.with_site(|site| insert_node(site, parent, id, position, payload))? {
            Ok(id)
        } else {
            Err(ApiError::NotFound(format!("parent {parent}")))
        }
    }

    async fn update_node(
        &self,
        id: Uuid,
        position: usize,
        payload: &NodePayload,
    ) -> ApiResult<()> {
        self.write(format!("update {} {id} at {position}", payload.kind()))?;
        if self.with_site(|site| update_node(site, id, position, payload))? {
            Ok(())
        } else {
            Err(ApiError::NotFound(id.to_string()))
        }
    }

    async fn delete_node(&self, kind: NodeKind, id: Uuid) -> ApiResult<()> {
        self.write(format!("delete {kind} {id}"))?;
        if self.with_site(|site| remove_node(site, kind, id))? {
            Ok(())
        } else {
            Err(ApiError::NotFound(id.to_string()))
        }
    }

    async fn update_navbar(&self, id: Uuid, properties: &NavbarProps) -> ApiResult<()> {
        self.write(format!("update_navbar {id}"))?;
        self.with_site(|site| Arc::make_mut(&mut site.navbar).properties = properties.clone())
    }

    async fn update_navbar_item(&self, id: Uuid, text: &str, link_url: &str) -> ApiResult<()> {
        self.write(format!("update_navbar_item {id} {text} {link_url}"))?;
        self.with_site(|site| {
            let navbar = Arc::make_mut(&mut site.navbar);
            if let Some(item) = navbar.items.iter_mut().find(|i| i.id == id) {
                item.text = text.to_string();
                item.link_url = link_url.to_string();
            }
        })
    }
}
