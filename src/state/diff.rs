use uuid::Uuid;

use crate::cache::SiteSnapshot;
use crate::models::{EntityId, Navbar, NavbarProps, NodeKind, NodePayload, Page};

/// Where a created node hangs. Pending parents are resolved while the save runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParentRef {
    Page(Uuid),
    Node(EntityId),
}

/// One network write decided by [`diff_page`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Directive {
    Create {
        target: EntityId,
        parent: ParentRef,
        position: usize,
        payload: NodePayload,
    },
    Update {
        id: Uuid,
        position: usize,
        payload: NodePayload,
    },
    UpdateNavbar {
        id: Uuid,
        properties: NavbarProps,
    },
}

impl Directive {
    pub fn kind(&self) -> NodeKind {
        match self {
            Directive::Create { payload, .. } | Directive::Update { payload, .. } => {
                payload.kind()
            }
            Directive::UpdateNavbar { .. } => NodeKind::Navbar,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Directive::Create { .. })
    }
}

fn node_directive(
    id: EntityId,
    parent: ParentRef,
    index: usize,
    payload: NodePayload,
    snapshot: &SiteSnapshot,
) -> Option<Directive> {
    let id = match id {
        EntityId::Pending(_) => {
            return Some(Directive::Create {
                target: id,
                parent,
                position: index,
                payload,
            })
        }
        EntityId::Persisted(id) => id,
    };

    // Absent from the snapshot: already deleted remotely, nothing to write.
    let pristine = snapshot.get(id)?;
    if pristine.position == index && pristine.payload == payload {
        return None;
    }
    Some(Directive::Update {
        id,
        position: index,
        payload,
    })
}

/// Writes needed to bring the server in line with `page` and `navbar`.
///
/// Directives come out in tree order: each section, then its subsections, each
/// followed by its elements. Positions are compared by array index.
pub(crate) fn diff_page(page: &Page, navbar: &Navbar, snapshot: &SiteSnapshot) -> Vec<Directive> {
    let mut out = Vec::new();

    for (s_idx, section) in page.sections.iter().enumerate() {
        out.extend(node_directive(
            section.id,
            ParentRef::Page(page.id),
            s_idx,
            section.payload(),
            snapshot,
        ));

        for (sub_idx, sub) in section.subsections.iter().enumerate() {
            out.extend(node_directive(
                sub.id,
                ParentRef::Node(section.id),
                sub_idx,
                sub.payload(),
                snapshot,
            ));

            for (el_idx, el) in sub.elements.iter().enumerate() {
                out.extend(node_directive(
                    el.id,
                    ParentRef::Node(sub.id),
                    el_idx,
                    el.payload(),
                    snapshot,
                ));
            }
        }
    }

    if snapshot.navbar_props() != Some(&navbar.properties) {
        out.push(Directive::UpdateNavbar {
            id: navbar.id,
            properties: navbar.properties.clone(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{self, Direction};
    use crate::models::fixtures::*;
    use crate::models::{IdAllocator, PropsPatch};
    use crate::selection::Selection;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn patch(v: serde_json::Value) -> PropsPatch {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_identical_tree_yields_no_directives() {
        let site = seeded_website();
        let snap = SiteSnapshot::capture(&site);
        assert!(diff_page(&site.pages[0], &site.navbar, &snap).is_empty());
    }

    #[test]
    fn test_property_change_yields_single_update() {
        let site = seeded_website();
        let snap = SiteSnapshot::capture(&site);
        let page = editor::update_properties(
            &site.pages[0],
            Selection::Element(uuid(40).into()),
            &patch(json!({"content": "Hello"})),
        )
        .unwrap();

        let directives = diff_page(&page, &site.navbar, &snap);
        assert_eq!(directives.len(), 1);
        assert!(matches!(
            &directives[0],
            Directive::Update { id, position: 0, .. } if *id == uuid(40)
        ));
    }

    #[test]
    fn test_rewriting_same_value_is_not_a_change() {
        let site = seeded_website();
        let snap = SiteSnapshot::capture(&site);
        let page = editor::update_properties(
            &site.pages[0],
            Selection::Section(uuid(20).into()),
            &patch(json!({"gap": "1rem"})),
        )
        .unwrap();
        assert!(diff_page(&page, &site.navbar, &snap).is_empty());
    }

    #[test]
    fn test_reorder_detected_by_index_shift() {
        let el_a = text_element(uuid(40).into(), 0, "a");
        let el_b = text_element(uuid(41).into(), 1, "b");
        let sub = subsection(uuid(30).into(), 0, vec![el_a, el_b]);
        let site = website(vec![page(10, "/", vec![section(uuid(20).into(), 0, vec![sub])])]);
        let snap = SiteSnapshot::capture(&site);

        let moved = editor::move_entity(
            &site.pages[0],
            Selection::Element(uuid(41).into()),
            Direction::Up,
        )
        .unwrap();

        let ids: Vec<_> = diff_page(&moved, &site.navbar, &snap)
            .into_iter()
            .map(|d| match d {
                Directive::Update { id, position, .. } => (id, position),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![(uuid(41), 0), (uuid(40), 1)]);
    }

    #[test]
    fn test_new_nodes_are_created_top_down() {
        let mut ids = IdAllocator::default();
        let site = seeded_website();
        let snap = SiteSnapshot::capture(&site);

        let (page, sec) = editor::add_section(&site.pages[0], &mut ids);
        let (page, sub) = editor::add_subsection(&page, sec, &mut ids).unwrap();
        let props = crate::editor::palette::default_props(crate::models::ElementType::Text).unwrap();
        let (page, el) = editor::add_element(&page, sub, props, None, &mut ids).unwrap();

        let directives = diff_page(&page, &site.navbar, &snap);
        assert_eq!(directives.len(), 3);
        assert_eq!(
            directives
                .iter()
                .map(|d| match d {
                    Directive::Create { target, parent, position, .. } => (*target, *parent, *position),
                    other => panic!("unexpected {other:?}"),
                })
                .collect::<Vec<_>>(),
            vec![
                (sec, ParentRef::Page(uuid(10)), 1),
                (sub, ParentRef::Node(sec), 0),
                (el, ParentRef::Node(sub), 0),
            ]
        );
    }

    #[test]
    fn test_navbar_update_only_when_properties_differ() {
        let mut site = seeded_website();
        let snap = SiteSnapshot::capture(&site);

        let navbar = editor::update_navbar_properties(
            &site.navbar,
            &patch(json!({"itemStyle": {"color": "#fff"}})),
        )
        .unwrap();
        site.navbar = std::sync::Arc::new(navbar);

        let directives = diff_page(&site.pages[0], &site.navbar, &snap);
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].kind(), NodeKind::Navbar);
    }

    #[test]
    fn test_persisted_id_missing_from_snapshot_is_skipped() {
        let site = seeded_website();
        let mut snap = SiteSnapshot::capture(&site);
        snap.forget(uuid(40));
        let page = editor::update_properties(
            &site.pages[0],
            Selection::Element(uuid(40).into()),
            &patch(json!({"content": "changed"})),
        )
        .unwrap();
        assert!(diff_page(&page, &site.navbar, &snap).is_empty());
    }
}
