mod outline;
pub(crate) mod palette;

pub(crate) use outline::{Inspector, Outline};

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Element, ElementProps, EntityId, IdAllocator, Navbar, NavbarProps, Page, PropertyBag,
    PropsPatch, Section, SectionProps, Subsection, SubsectionProps,
};
use crate::selection::Selection;

/// Why an edit was declined. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum EditRefusal {
    #[error("Select an item first.")]
    NothingSelected,
    #[error("The selected item no longer exists.")]
    Unresolved,
    #[error("The main navbar container cannot be deleted.")]
    NavbarNotDeletable,
    #[error("Open a page first.")]
    NoActivePage,
    #[error("This item has no editable properties.")]
    NoPropertyBag,
    #[error("Those properties do not fit this item: {0}")]
    InvalidPatch(String),
    #[error("Enter a title first.")]
    EmptyTitle,
    #[error("Please select a layout block first.")]
    SelectLayoutBlock,
    #[error("Wait for the save to finish.")]
    SaveInProgress,
}

impl EditRefusal {
    fn invalid(e: serde_json::Error) -> Self {
        EditRefusal::InvalidPatch(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
}

/// Section type tag given to sections added from the editor.
pub(crate) const DEFAULT_SECTION_TYPE: &str = "default";

trait Positioned: Clone {
    fn position(&self) -> usize;
    fn set_position(&mut self, position: usize);
}

macro_rules! positioned {
    ($($ty:ty),*) => {
        $(impl Positioned for $ty {
            fn position(&self) -> usize {
                self.position
            }
            fn set_position(&mut self, position: usize) {
                self.position = position;
            }
        })*
    };
}

positioned!(Section, Subsection, Element);

/// Make positions `0..n-1` in array order. Nodes already in place stay shared.
fn renumber<T: Positioned>(list: &mut [Arc<T>]) {
    for (idx, node) in list.iter_mut().enumerate() {
        if node.position() != idx {
            Arc::make_mut(node).set_position(idx);
        }
    }
}

fn swap_neighbour<T: Positioned>(list: &mut [Arc<T>], idx: usize, dir: Direction) -> bool {
    let other = match dir {
        Direction::Up if idx > 0 => idx - 1,
        Direction::Down if idx + 1 < list.len() => idx + 1,
        _ => return false,
    };
    list.swap(idx, other);
    renumber(list);
    true
}

fn section_idx(page: &Page, id: EntityId) -> Option<usize> {
    page.sections.iter().position(|s| s.id == id)
}

fn subsection_path(page: &Page, id: EntityId) -> Option<(usize, usize)> {
    page.sections.iter().enumerate().find_map(|(si, s)| {
        s.subsections
            .iter()
            .position(|sub| sub.id == id)
            .map(|ui| (si, ui))
    })
}

fn element_path(page: &Page, id: EntityId) -> Option<(usize, usize, usize)> {
    page.sections.iter().enumerate().find_map(|(si, s)| {
        s.subsections.iter().enumerate().find_map(|(ui, sub)| {
            sub.elements
                .iter()
                .position(|el| el.id == id)
                .map(|ei| (si, ui, ei))
        })
    })
}

pub(crate) fn add_section(page: &Page, ids: &mut IdAllocator) -> (Page, EntityId) {
    let id = ids.next_id();
    let mut next = page.clone();
    next.sections.push(Arc::new(Section {
        id,
        section_type: DEFAULT_SECTION_TYPE.to_string(),
        position: next.sections.len(),
        properties: SectionProps::new_default(),
        subsections: Vec::new(),
    }));
    renumber(&mut next.sections);
    debug!(page = %page.id, section = %id, "section added");
    (next, id)
}

pub(crate) fn add_subsection(
    page: &Page,
    section_id: EntityId,
    ids: &mut IdAllocator,
) -> Result<(Page, EntityId), EditRefusal> {
    let si = section_idx(page, section_id).ok_or(EditRefusal::Unresolved)?;
    let id = ids.next_id();

    let mut next = page.clone();
    let section = Arc::make_mut(&mut next.sections[si]);
    section.subsections.push(Arc::new(Subsection {
        id,
        position: section.subsections.len(),
        properties: SubsectionProps::new_default(),
        elements: Vec::new(),
    }));
    renumber(&mut section.subsections);
    debug!(section = %section_id, subsection = %id, "subsection added");
    Ok((next, id))
}

pub(crate) fn add_element(
    page: &Page,
    subsection_id: EntityId,
    properties: ElementProps,
    ai_payload: Option<Value>,
    ids: &mut IdAllocator,
) -> Result<(Page, EntityId), EditRefusal> {
    let (si, ui) = subsection_path(page, subsection_id).ok_or(EditRefusal::Unresolved)?;
    let id = ids.next_id();

    let mut next = page.clone();
    let section = Arc::make_mut(&mut next.sections[si]);
    let sub = Arc::make_mut(&mut section.subsections[ui]);
    // One past the last sibling; equal to the dense index it lands on.
    let position = sub.elements.len();
    sub.elements.push(Arc::new(Element {
        id,
        position,
        properties,
        ai_payload,
    }));
    renumber(&mut sub.elements);
    debug!(subsection = %subsection_id, element = %id, "element added");
    Ok((next, id))
}

/// Merge `patch` into the selected node's property bag.
///
/// For elements an `aiPayload` key replaces the rendering payload instead of
/// being merged into the properties.
pub(crate) fn update_properties(
    page: &Page,
    selection: Selection,
    patch: &PropsPatch,
) -> Result<Page, EditRefusal> {
    let mut next = page.clone();
    match selection {
        Selection::None => return Err(EditRefusal::NothingSelected),
        Selection::Navbar(_) | Selection::NavbarItem(_) => return Err(EditRefusal::Unresolved),
        Selection::Section(id) => {
            let si = section_idx(page, id).ok_or(EditRefusal::Unresolved)?;
            let merged = page.sections[si]
                .properties
                .merged(patch)
                .map_err(EditRefusal::invalid)?;
            Arc::make_mut(&mut next.sections[si]).properties = merged;
        }
        Selection::Subsection(id) => {
            let (si, ui) = subsection_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let merged = page.sections[si].subsections[ui]
                .properties
                .merged(patch)
                .map_err(EditRefusal::invalid)?;
            let section = Arc::make_mut(&mut next.sections[si]);
            Arc::make_mut(&mut section.subsections[ui]).properties = merged;
        }
        Selection::Element(id) => {
            let (si, ui, ei) = element_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let mut patch = patch.clone();
            let payload = patch.remove("aiPayload");
            let merged = page.sections[si].subsections[ui].elements[ei]
                .properties
                .merged(&patch)
                .map_err(EditRefusal::invalid)?;

            let section = Arc::make_mut(&mut next.sections[si]);
            let sub = Arc::make_mut(&mut section.subsections[ui]);
            let el = Arc::make_mut(&mut sub.elements[ei]);
            el.properties = merged;
            if let Some(payload) = payload {
                el.ai_payload = (!payload.is_null()).then_some(payload);
            }
        }
    }
    debug!(page = %page.id, ?selection, "properties updated");
    Ok(next)
}

pub(crate) fn update_navbar_properties(
    navbar: &Navbar,
    patch: &PropsPatch,
) -> Result<Navbar, EditRefusal> {
    let properties: NavbarProps = navbar.properties.merged(patch).map_err(EditRefusal::invalid)?;
    Ok(Navbar {
        properties,
        ..navbar.clone()
    })
}

/// Remove the selected node and its descendants. Returns the removed node's id.
pub(crate) fn delete_entity(
    page: &Page,
    selection: Selection,
) -> Result<(Page, EntityId), EditRefusal> {
    let mut next = page.clone();
    let removed = match selection {
        Selection::None => return Err(EditRefusal::NothingSelected),
        Selection::Navbar(_) => return Err(EditRefusal::NavbarNotDeletable),
        Selection::NavbarItem(_) => return Err(EditRefusal::Unresolved),
        Selection::Section(id) => {
            let si = section_idx(page, id).ok_or(EditRefusal::Unresolved)?;
            next.sections.remove(si);
            renumber(&mut next.sections);
            id
        }
        Selection::Subsection(id) => {
            let (si, ui) = subsection_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let section = Arc::make_mut(&mut next.sections[si]);
            section.subsections.remove(ui);
            renumber(&mut section.subsections);
            id
        }
        Selection::Element(id) => {
            let (si, ui, ei) = element_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let section = Arc::make_mut(&mut next.sections[si]);
            let sub = Arc::make_mut(&mut section.subsections[ui]);
            sub.elements.remove(ei);
            renumber(&mut sub.elements);
            id
        }
    };
    debug!(page = %page.id, ?selection, "node deleted");
    Ok((next, removed))
}

/// Remove a navbar item. The navbar container itself is refused.
pub(crate) fn delete_navbar_entity(
    navbar: &Navbar,
    selection: Selection,
) -> Result<(Navbar, Uuid), EditRefusal> {
    let id = match selection {
        Selection::None => return Err(EditRefusal::NothingSelected),
        Selection::Navbar(_) => return Err(EditRefusal::NavbarNotDeletable),
        Selection::NavbarItem(id) => id,
        _ => return Err(EditRefusal::Unresolved),
    };
    let idx = navbar
        .items
        .iter()
        .position(|i| i.id == id)
        .ok_or(EditRefusal::Unresolved)?;

    let mut next = navbar.clone();
    next.items.remove(idx);
    for (pos, item) in next.items.iter_mut().enumerate() {
        item.position = pos;
    }
    debug!(item = %id, "navbar item deleted");
    Ok((next, id))
}

/// Swap the selected node with its neighbour. Moving past either end is a no-op.
pub(crate) fn move_entity(
    page: &Page,
    selection: Selection,
    dir: Direction,
) -> Result<Page, EditRefusal> {
    let mut next = page.clone();
    let moved = match selection {
        Selection::None => return Err(EditRefusal::NothingSelected),
        Selection::Navbar(_) | Selection::NavbarItem(_) => return Err(EditRefusal::Unresolved),
        Selection::Section(id) => {
            let si = section_idx(page, id).ok_or(EditRefusal::Unresolved)?;
            swap_neighbour(&mut next.sections, si, dir)
        }
        Selection::Subsection(id) => {
            let (si, ui) = subsection_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let section = &page.sections[si];
            if !can_move(section.subsections.len(), ui, dir) {
                return Ok(next);
            }
            swap_neighbour(&mut Arc::make_mut(&mut next.sections[si]).subsections, ui, dir)
        }
        Selection::Element(id) => {
            let (si, ui, ei) = element_path(page, id).ok_or(EditRefusal::Unresolved)?;
            let len = page.sections[si].subsections[ui].elements.len();
            if !can_move(len, ei, dir) {
                return Ok(next);
            }
            let section = Arc::make_mut(&mut next.sections[si]);
            swap_neighbour(&mut Arc::make_mut(&mut section.subsections[ui]).elements, ei, dir)
        }
    };
    if moved {
        debug!(page = %page.id, ?selection, ?dir, "node moved");
    }
    Ok(next)
}

fn can_move(len: usize, idx: usize, dir: Direction) -> bool {
    match dir {
        Direction::Up => idx > 0,
        Direction::Down => idx + 1 < len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use crate::models::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn positions_dense(page: &Page) -> bool {
        let dense = |ps: Vec<usize>| ps.iter().enumerate().all(|(i, p)| i == *p);
        dense(page.sections.iter().map(|s| s.position).collect())
            && page.sections.iter().all(|s| {
                dense(s.subsections.iter().map(|u| u.position).collect())
                    && s
                        .subsections
                        .iter()
                        .all(|u| dense(u.elements.iter().map(|e| e.position).collect()))
            })
    }

    fn text(content: &str) -> ElementProps {
        ElementProps::from_wire("TEXT", json!({"content": content, "style": {"color": "#000"}}))
            .unwrap()
    }

    #[test]
    fn test_positions_stay_dense_across_adds_and_deletes() {
        let mut ids = IdAllocator::default();
        let mut page = page(10, "/", vec![]);

        let mut sections = Vec::new();
        for _ in 0..3 {
            let (next, id) = add_section(&page, &mut ids);
            page = next;
            sections.push(id);
            assert!(positions_dense(&page));
        }

        let (next, sub) = add_subsection(&page, sections[1], &mut ids).unwrap();
        page = next;
        let mut elements = Vec::new();
        for i in 0..4 {
            let (next, el) = add_element(&page, sub, text(&i.to_string()), None, &mut ids).unwrap();
            page = next;
            elements.push(el);
            assert!(positions_dense(&page));
        }

        page = delete_entity(&page, Selection::Element(elements[1])).unwrap().0;
        assert!(positions_dense(&page));
        page = delete_entity(&page, Selection::Section(sections[0])).unwrap().0;
        assert!(positions_dense(&page));

        let remaining: Vec<_> = page.subsection(sub).unwrap().elements.iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![elements[0], elements[2], elements[3]]);
        assert_eq!(page.sections.len(), 2);
    }

    #[test]
    fn test_new_element_position_is_past_existing_siblings() {
        let mut ids = IdAllocator::default();
        let site = seeded_website();
        let (page, id) =
            add_element(&site.pages[0], uuid(30).into(), text("more"), None, &mut ids).unwrap();
        let el = page.element(id).unwrap();
        assert_eq!(el.position, 1);
        assert!(el.id.is_pending());
    }

    #[test]
    fn test_add_to_missing_parent_is_refused() {
        let mut ids = IdAllocator::default();
        let site = seeded_website();
        assert_eq!(
            add_subsection(&site.pages[0], uuid(999).into(), &mut ids).unwrap_err(),
            EditRefusal::Unresolved
        );
        assert_eq!(
            add_element(&site.pages[0], uuid(20).into(), text("x"), None, &mut ids).unwrap_err(),
            EditRefusal::Unresolved
        );
    }

    #[test]
    fn test_update_element_style_merges() {
        let mut ids = IdAllocator::default();
        let site = seeded_website();
        let (page, id) =
            add_element(&site.pages[0], uuid(30).into(), text("Hi"), None, &mut ids).unwrap();

        let patch = json!({"style": {"fontSize": "2rem"}});
        let page = update_properties(&page, Selection::Element(id), patch.as_object().unwrap())
            .unwrap();

        assert_eq!(
            page.element(id).unwrap().properties.to_json()["style"],
            json!({"color": "#000", "fontSize": "2rem"})
        );
    }

    #[test]
    fn test_update_leaves_untouched_sections_shared() {
        let site = seeded_website();
        let mut ids = IdAllocator::default();
        let (page, new_section) = add_section(&site.pages[0], &mut ids);

        let patch = json!({"padding": "4rem"});
        let next =
            update_properties(&page, Selection::Section(new_section), patch.as_object().unwrap())
                .unwrap();

        assert!(Arc::ptr_eq(&page.sections[0], &next.sections[0]));
        assert_eq!(next.sections[1].properties.padding.as_deref(), Some("4rem"));
        assert_eq!(page.sections[1].properties.padding.as_deref(), Some("2rem"));
    }

    #[test]
    fn test_update_element_ai_payload() {
        let site = seeded_website();
        let patch = json!({"aiPayload": {"html": "<b>x</b>"}});
        let page = update_properties(
            &site.pages[0],
            Selection::Element(uuid(40).into()),
            patch.as_object().unwrap(),
        )
        .unwrap();
        let el = page.element(uuid(40).into()).unwrap();
        assert_eq!(el.ai_payload, Some(json!({"html": "<b>x</b>"})));
        assert_eq!(el.properties, site.pages[0].element(uuid(40).into()).unwrap().properties);
    }

    #[test]
    fn test_ill_typed_patch_leaves_tree_unchanged() {
        let site = seeded_website();
        let patch = json!({"gridColumns": "three"});
        let err = update_properties(
            &site.pages[0],
            Selection::Subsection(uuid(30).into()),
            patch.as_object().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, EditRefusal::InvalidPatch(_)));
    }

    #[test]
    fn test_navbar_container_is_not_deletable() {
        let site = seeded_website();
        assert_eq!(
            delete_navbar_entity(&site.navbar, Selection::Navbar(site.navbar.id)).unwrap_err(),
            EditRefusal::NavbarNotDeletable
        );
        assert_eq!(
            delete_entity(&site.pages[0], Selection::Navbar(site.navbar.id)).unwrap_err(),
            EditRefusal::NavbarNotDeletable
        );
        assert_eq!(
            EditRefusal::NavbarNotDeletable.to_string(),
            "The main navbar container cannot be deleted."
        );
    }

    #[test]
    fn test_delete_navbar_item_renumbers() {
        let site = website(vec![page(10, "/", vec![]), page(11, "/menu", vec![]), page(12, "/about", vec![])]);
        let (navbar, id) =
            delete_navbar_entity(&site.navbar, Selection::NavbarItem(uuid(1010))).unwrap();
        assert_eq!(id, uuid(1010));
        let positions: Vec<_> = navbar.items.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_delete_cascades_descendants() {
        let site = seeded_website();
        let (page, removed) =
            delete_entity(&site.pages[0], Selection::Section(uuid(20).into())).unwrap();
        assert_eq!(removed, EntityId::from(uuid(20)));
        assert!(!page.contains(uuid(30).into()));
        assert!(!page.contains(uuid(40).into()));
        assert_eq!(Selection::Section(removed).kind(), Some(NodeKind::Section));
    }

    #[test]
    fn test_move_swaps_and_ignores_edges() {
        let mut ids = IdAllocator::default();
        let site = seeded_website();
        let (page, added) = add_section(&site.pages[0], &mut ids);

        let moved = move_entity(&page, Selection::Section(added), Direction::Up).unwrap();
        assert_eq!(moved.sections[0].id, added);
        assert_eq!(moved.sections[1].id, EntityId::from(uuid(20)));
        assert!(positions_dense(&moved));

        let unchanged = move_entity(&moved, Selection::Section(added), Direction::Up).unwrap();
        assert_eq!(unchanged, moved);

        let single = move_entity(&page, Selection::Element(uuid(40).into()), Direction::Down).unwrap();
        assert_eq!(single, page);
    }
}
