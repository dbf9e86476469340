use icons::{ChevronDown, ChevronUp, X};
use leptos::prelude::*;
use leptos::task::spawn_local;
use serde_json::{Map, Value};

use crate::components::ui::{
    Button, ButtonSize, ButtonVariant, Field, Input, Panel, PanelBody, PanelFooter, PanelHeader,
    PanelTitle, Spinner, TextArea, TreeList, TreeRow,
};
use crate::editor::{palette, Direction};
use crate::models::{ElementType, MenuEntry, Page, PropsPatch};
use crate::selection::Selection;
use crate::state::{AppContext, AppState, EditorSession};

/// One line of the layout tree: indent depth, what clicking it selects, and its label.
pub(crate) type OutlineRow = (usize, Selection, String);

pub(crate) fn outline_rows(page: &Page) -> Vec<OutlineRow> {
    let mut rows = Vec::new();
    for section in &page.sections {
        rows.push((
            0,
            Selection::Section(section.id),
            format!("Section {}", section.position + 1),
        ));
        for sub in &section.subsections {
            rows.push((
                1,
                Selection::Subsection(sub.id),
                format!("Layout block {}", sub.position + 1),
            ));
            for el in &sub.elements {
                let label = el.properties.label();
                let label = if label.trim().is_empty() {
                    el.properties.type_tag()
                } else {
                    label
                };
                rows.push((2, Selection::Element(el.id), label));
            }
        }
    }
    rows
}

/// Patches typed into the inspector must be a JSON object.
pub(crate) fn parse_patch(text: &str) -> Result<PropsPatch, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Properties must be a JSON object.".to_string()),
        Err(e) => Err(format!("Invalid JSON: {e}")),
    }
}

fn current_selection(session: RwSignal<Option<EditorSession>>) -> Selection {
    session.with(|s| s.as_ref().map(|s| s.selection).unwrap_or_default())
}

#[component]
pub fn Outline() -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let session = app.with_value(|a| a.session);
    let new_page_title: RwSignal<String> = RwSignal::new(String::new());

    let select = move |sel: Selection| {
        session.update(|s| {
            if let Some(s) = s.as_mut() {
                s.select(sel);
            }
        })
    };
    let selected = move |sel: Selection| current_selection(session) == sel;

    let add_page = Callback::new(move |title: String| {
        let state = app.get_value();
        new_page_title.set(String::new());
        spawn_local(async move { state.add_page(title).await });
    });

    let pages = move || {
        session.with(|s| {
            s.as_ref()
                .map(|s| {
                    s.website
                        .pages
                        .iter()
                        .map(|p| (p.id, p.title.clone(), p.slug.clone(), s.active_page == Some(p.id)))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
    };

    let navbar = move || {
        session.with(|s| {
            s.as_ref()
                .map(|s| {
                    let items = s
                        .website
                        .navbar
                        .items
                        .iter()
                        .map(|i| (i.id, i.text.clone(), i.link_url.clone()))
                        .collect::<Vec<_>>();
                    (Some(s.website.navbar.id), items)
                })
                .unwrap_or_default()
        })
    };

    let rows = move || {
        session.with(|s| {
            s.as_ref()
                .and_then(|s| s.active_page())
                .map(|p| outline_rows(p))
                .unwrap_or_default()
        })
    };

    let selected_section = move || match current_selection(session) {
        Selection::Section(id) => Some(id),
        _ => None,
    };
    let saving = move || session.with(|s| s.as_ref().is_some_and(|s| s.is_saving()));

    view! {
        <Panel class="w-72">
            <PanelHeader>
                <PanelTitle>"Pages"</PanelTitle>
            </PanelHeader>
            <PanelBody class="flex-none">
                <TreeList>
                    {move || {
                        pages()
                            .into_iter()
                            .map(|(id, title, slug, active)| {
                                view! {
                                    <TreeRow
                                        attr:data-selected=active.to_string()
                                        on:click=move |_| app.with_value(|a| a.open_page(id))
                                    >
                                        <span class="flex-1 truncate">{title}</span>
                                        <span class="text-xs text-muted-foreground">{slug}</span>
                                    </TreeRow>
                                }
                            })
                            .collect_view()
                    }}
                </TreeList>
                <Input
                    placeholder="New page title"
                    bind_value=new_page_title
                    on_enter=add_page
                />
            </PanelBody>

            <PanelHeader>
                <PanelTitle>"Navbar"</PanelTitle>
            </PanelHeader>
            <PanelBody class="flex-none">
                <TreeList>
                    {move || {
                        let (navbar_id, items) = navbar();
                        let container = navbar_id.map(|id| {
                            let sel = Selection::Navbar(id);
                            view! {
                                <TreeRow
                                    attr:data-selected=move || selected(sel).to_string()
                                    on:click=move |_| select(sel)
                                >
                                    "Navbar"
                                </TreeRow>
                            }
                        });
                        let items = items
                            .into_iter()
                            .map(|(id, text, link)| {
                                let sel = Selection::NavbarItem(id);
                                view! {
                                    <TreeRow
                                        class="pl-5"
                                        attr:data-selected=move || selected(sel).to_string()
                                        on:click=move |_| select(sel)
                                    >
                                        <span class="flex-1 truncate">{text}</span>
                                        <span class="text-xs text-muted-foreground">{link}</span>
                                    </TreeRow>
                                }
                            })
                            .collect_view();
                        view! { {container} {items} }
                    }}
                </TreeList>
            </PanelBody>

            <PanelHeader>
                <PanelTitle>"Layout"</PanelTitle>
                <div class="flex items-center gap-1">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        attr:title="Add section"
                        attr:disabled=saving
                        on:click=move |_| {
                            app.with_value(|a| a.edit(|s| s.add_section()));
                        }
                    >
                        "+ Section"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        attr:title="Add layout block to the selected section"
                        attr:disabled=move || saving() || selected_section().is_none()
                        on:click=move |_| {
                            if let Some(id) = selected_section() {
                                app.with_value(|a| a.edit(|s| s.add_subsection(id)));
                            }
                        }
                    >
                        "+ Block"
                    </Button>
                </div>
            </PanelHeader>
            <PanelBody>
                <TreeList>
                    {move || {
                        rows()
                            .into_iter()
                            .map(|(depth, sel, label)| {
                                let indent = match depth {
                                    0 => "",
                                    1 => "pl-5",
                                    _ => "pl-9 text-muted-foreground",
                                };
                                view! {
                                    <TreeRow
                                        class=indent
                                        attr:data-selected=move || selected(sel).to_string()
                                        on:click=move |_| select(sel)
                                    >
                                        <span class="truncate">{label}</span>
                                    </TreeRow>
                                }
                            })
                            .collect_view()
                    }}
                </TreeList>
            </PanelBody>

            <PanelFooter>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Icon
                    attr:title="Move up"
                    attr:disabled=saving
                    on:click=move |_| {
                        app.with_value(|a| a.edit(|s| s.move_selected(Direction::Up)));
                    }
                >
                    <ChevronUp />
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Icon
                    attr:title="Move down"
                    attr:disabled=saving
                    on:click=move |_| {
                        app.with_value(|a| a.edit(|s| s.move_selected(Direction::Down)));
                    }
                >
                    <ChevronDown />
                </Button>
                <Button
                    variant=ButtonVariant::Destructive
                    size=ButtonSize::Icon
                    attr:title="Delete"
                    attr:disabled=saving
                    on:click=move |_| {
                        app.with_value(|a| a.edit(|s| s.delete_selected()));
                    }
                >
                    <X />
                </Button>
            </PanelFooter>
        </Panel>
    }
}

fn add_to_selection(app: &AppState, built: Option<(crate::models::ElementProps, Option<Value>)>) {
    if let Some((props, payload)) = built {
        app.edit(|s| s.add_element_to_selection(props, payload));
    }
}

/// Element picker, shown while a layout block is selected.
#[component]
fn Palette() -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let (categories, locations) = app.with_value(|a| (a.categories, a.locations));
    let menu: RwSignal<Vec<MenuEntry>> = RwSignal::new(vec![]);
    let menu_loading = RwSignal::new(false);
    let template = RwSignal::new(String::new());

    let load_menu = move |location_id: String| {
        let client = app.with_value(|a| a.api_client.get_untracked());
        menu_loading.set(true);
        spawn_local(async move {
            use crate::api::SiteBackend;
            match client.load_menu(&location_id).await {
                Ok(entries) => menu.set(entries),
                Err(e) => {
                    tracing::warn!(error = %e, "menu unavailable");
                    app.with_value(|a| a.notice.set(Some(e.to_string())));
                }
            }
            menu_loading.set(false);
        });
    };

    view! {
        <div class="flex flex-col gap-3">
            <PanelTitle>"Add element"</PanelTitle>
            <div class="grid grid-cols-3 gap-2">
                {palette::static_types()
                    .map(|kind| {
                        view! {
                            <Button
                                variant=ButtonVariant::Tile
                                size=ButtonSize::Tile
                                on:click=move |_| {
                                    app.with_value(|a| {
                                        add_to_selection(a, palette::default_props(kind).map(|p| (p, None)))
                                    })
                                }
                            >
                                {palette::display_name(kind)}
                            </Button>
                        }
                    })
                    .collect_view()}
            </div>

            <Show when=move || categories.with(|c| !c.is_empty()) fallback=|| ().into_view()>
                <PanelTitle>{palette::display_name(ElementType::Category)}</PanelTitle>
                <div class="flex flex-wrap gap-1">
                    {move || {
                        categories
                            .get()
                            .into_iter()
                            .map(|cat| {
                                let name = cat.name.clone();
                                view! {
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        on:click=move |_| {
                                            app.with_value(|a| add_to_selection(a, Some((palette::category(&cat), None))))
                                        }
                                    >
                                        {name}
                                    </Button>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </Show>

            <Show when=move || locations.with(|l| !l.is_empty()) fallback=|| ().into_view()>
                <PanelTitle>"Locations"</PanelTitle>
                {move || {
                    locations
                        .get()
                        .into_iter()
                        .map(|loc| {
                            let name = loc.location_name.clone();
                            let id = loc.location_id.clone();
                            view! {
                                <div class="flex items-center gap-1">
                                    <span class="flex-1 truncate text-xs">{name}</span>
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        on:click=move |_| {
                                            app.with_value(|a| add_to_selection(a, Some((palette::location_map(&loc), None))))
                                        }
                                    >
                                        "Map"
                                    </Button>
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        on:click=move |_| load_menu(id.clone())
                                    >
                                        "Menu"
                                    </Button>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </Show>

            <Show when=move || menu_loading.get() fallback=|| ().into_view()>
                <Spinner label="Loading menu" />
            </Show>
            <div class="flex flex-col gap-1">
                {move || {
                    menu.get()
                        .into_iter()
                        .map(|entry| {
                            let name = entry.item_name.clone();
                            view! {
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    class="justify-start"
                                    on:click=move |_| {
                                        app.with_value(|a| add_to_selection(a, Some((palette::menu_item(&entry), None))))
                                    }
                                >
                                    {name}
                                </Button>
                            }
                        })
                        .collect_view()
                }}
            </div>

            <Field label="Generated block template">
                <Input
                    placeholder="hero-banner"
                    bind_value=template
                    on_enter=Callback::new(move |name: String| {
                        let name = name.trim().to_string();
                        if name.is_empty() {
                            return;
                        }
                        app.with_value(|a| add_to_selection(a, Some(palette::ai_block(name, Map::new(), None, None))));
                        template.set(String::new());
                    })
                />
            </Field>
        </div>
    }
}

#[component]
pub fn Inspector() -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let session = app.with_value(|a| a.session);
    let patch_text: RwSignal<String> = RwSignal::new(String::new());
    let link_text: RwSignal<String> = RwSignal::new(String::new());

    // heading and pretty-printed properties of the current selection
    let details = move || {
        session.with(|s| {
            let s = s.as_ref()?;
            let node = s.selection.resolve(&s.website)?;
            let props = node
                .properties()
                .and_then(|p| serde_json::to_string_pretty(&p).ok());
            Some((node.title(), props))
        })
    };

    let apply_patch = move |_: web_sys::MouseEvent| match parse_patch(&patch_text.get_untracked()) {
        Ok(patch) => {
            if app
                .with_value(|a| a.edit(|s| s.update_properties(&patch)))
                .is_some()
            {
                patch_text.set(String::new());
            }
        }
        Err(msg) => app.with_value(|a| a.notice.set(Some(msg))),
    };

    let rename = Callback::new(move |text: String| {
        if let Selection::NavbarItem(id) = current_selection(session) {
            let state = app.get_value();
            spawn_local(async move { state.rename_navbar_item(id, text).await });
        }
    });

    let is_subsection = move || matches!(current_selection(session), Selection::Subsection(_));
    let is_nav_item = move || matches!(current_selection(session), Selection::NavbarItem(_));

    view! {
        <Panel class="w-80 border-r-0 border-l">
            <PanelHeader>
                <PanelTitle>"Inspector"</PanelTitle>
            </PanelHeader>
            <PanelBody>
                {move || match details() {
                    None => view! {
                        <p class="text-xs text-muted-foreground">"Select an item to edit it."</p>
                    }
                    .into_any(),
                    Some((title, props)) => view! {
                        <div class="flex flex-col gap-2">
                            <h3 class="font-medium">{title}</h3>
                            {props.map(|json| view! {
                                <pre class="max-h-64 overflow-auto rounded bg-muted p-2 text-xs">{json}</pre>
                            })}
                        </div>
                    }
                    .into_any(),
                }}

                <Show when=move || !is_nav_item() && details().is_some() fallback=|| ().into_view()>
                    <Field label="Property patch (JSON)">
                        <TextArea
                            placeholder=r##"{"style": {"color": "#333"}}"##
                            bind_value=patch_text
                        />
                    </Field>
                    <Button size=ButtonSize::Sm on:click=apply_patch>
                        "Apply"
                    </Button>
                </Show>

                <Show when=is_nav_item fallback=|| ().into_view()>
                    <Field label="Link text">
                        <Input placeholder="About us" bind_value=link_text on_enter=rename />
                    </Field>
                </Show>

                <Show when=is_subsection fallback=|| ().into_view()>
                    <Palette />
                </Show>
            </PanelBody>
        </Panel>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_outline_rows_follow_tree_order() {
        let site = seeded_website();
        let rows = outline_rows(&site.pages[0]);
        assert_eq!(
            rows,
            vec![
                (0, Selection::Section(uuid(20).into()), "Section 1".to_string()),
                (1, Selection::Subsection(uuid(30).into()), "Layout block 1".to_string()),
                (2, Selection::Element(uuid(40).into()), "Welcome".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_patch_requires_object() {
        assert!(parse_patch(r#"{"gap": "2rem"}"#).is_ok());
        assert_eq!(
            parse_patch("[1, 2]").unwrap_err(),
            "Properties must be a JSON object."
        );
        assert!(parse_patch("{oops").unwrap_err().starts_with("Invalid JSON"));
    }
}
