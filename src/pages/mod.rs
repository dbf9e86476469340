pub(crate) mod render;

use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use leptos_router::params::Params;
use wasm_bindgen::JsCast;

use crate::api::SiteBackend;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Field, Input, NoticeBar, Spinner,
};
use crate::editor::{Inspector, Outline};
use crate::models::Website;
use crate::selection::Selection;
use crate::state::{AppContext, SyncState};
use render::{NavbarView, PageView};

/// Builder keyboard shortcuts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shortcut {
    Save,
    Delete,
    Deselect,
}

/// Map a keydown to a shortcut. Plain keys are ignored while typing in a field.
pub(crate) fn shortcut(key: &str, meta: bool, typing: bool) -> Option<Shortcut> {
    let key = key.to_lowercase();
    if meta && key == "s" {
        return Some(Shortcut::Save);
    }
    if typing {
        return None;
    }
    match key.as_str() {
        "delete" | "backspace" => Some(Shortcut::Delete),
        "escape" => Some(Shortcut::Deselect),
        _ => None,
    }
}

fn preview_href(subdomain: &str, slug: &str) -> String {
    format!("/site/{}{}", urlencoding::encode(subdomain), slug)
}

#[component]
pub fn BuilderPage() -> impl IntoView {
    let app = StoredValue::new(expect_context::<AppContext>().0);
    let (session, loading, load_error, sync, notice) =
        app.with_value(|a| (a.session, a.loading, a.load_error, a.sync, a.notice));
    let subdomain: RwSignal<String> = RwSignal::new(String::new());

    Effect::new(move |_| {
        if session.with_untracked(|s| s.is_none()) && !loading.get_untracked() {
            let state = app.get_value();
            spawn_local(async move { state.load().await });
        }
    });

    let save = move || {
        let state = app.get_value();
        spawn_local(async move { state.save().await });
    };
    let is_saving = move || matches!(sync.get(), SyncState::Saving { .. });

    let _key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        let typing = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| {
                let tag = el.tag_name().to_lowercase();
                tag == "input" || tag == "textarea" || tag == "select"
            })
            .unwrap_or(false);

        match shortcut(&ev.key(), ev.meta_key() || ev.ctrl_key(), typing) {
            Some(Shortcut::Save) => {
                ev.prevent_default();
                save();
            }
            Some(Shortcut::Delete) => {
                ev.prevent_default();
                app.with_value(|a| a.edit(|s| s.delete_selected()));
            }
            Some(Shortcut::Deselect) => {
                app.with_value(|a| {
                    a.edit(|s| {
                        s.select(Selection::None);
                        Ok(())
                    })
                });
            }
            None => {}
        }
    });

    let create_website = move |_: web_sys::MouseEvent| {
        let state = app.get_value();
        let sub = subdomain.get_untracked().trim().to_string();
        spawn_local(async move {
            state
                .create_website((!sub.is_empty()).then_some(sub))
                .await
        });
    };

    let preview_link = move || {
        session.with(|s| {
            let s = s.as_ref()?;
            let sub = s.website.subdomain.as_deref()?;
            let slug = s.active_page().map(|p| p.slug.clone()).unwrap_or_default();
            Some(preview_href(sub, &slug))
        })
    };

    let canvas = move || {
        session.with(|s| {
            let s = s.as_ref()?;
            let page = s.active_page()?.clone();
            let items = s.website.visible_nav_items().into_iter().cloned().collect::<Vec<_>>();
            Some((s.website.navbar.clone(), items, page))
        })
    };

    view! {
        <div class="flex h-screen flex-col bg-background text-foreground">
            <header class="flex items-center justify-between border-b px-4 py-2">
                <span class="text-sm font-semibold">"Site builder"</span>
                <div class="flex items-center gap-2">
                    {move || preview_link().map(|href| view! {
                        <a class="px-2 text-sm text-primary underline-offset-4 hover:underline" href=href target="_blank">
                            "Preview"
                        </a>
                    })}
                    <Show when=is_saving fallback=|| ().into_view()>
                        <Spinner />
                    </Show>
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || is_saving() || session.with(|s| s.is_none())
                        on:click=move |_| save()
                    >
                        {move || sync.get().label()}
                    </Button>
                </div>
            </header>

            <NoticeBar message=notice />

            <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                <Alert class="mx-4 mt-3 border-destructive/30">
                    <AlertDescription class="text-destructive text-xs">
                        {move || load_error.get().unwrap_or_default()}
                    </AlertDescription>
                </Alert>
            </Show>

            <Show
                when=move || session.with(|s| s.is_some())
                fallback=move || view! {
                    <div class="mx-auto flex max-w-sm flex-1 flex-col justify-center gap-3">
                        <Show
                            when=move || !loading.get()
                            fallback=|| view! { <Spinner label="Loading website" /> }
                        >
                            <p class="text-sm text-muted-foreground">"You have no website yet."</p>
                            <Field label="Subdomain">
                                <Input placeholder="my-bistro" bind_value=subdomain />
                            </Field>
                            <Button size=ButtonSize::Sm on:click=create_website>
                                "Create website"
                            </Button>
                        </Show>
                    </div>
                }
            >
                <div class="flex min-h-0 flex-1">
                    <Outline />
                    <div class="min-w-0 flex-1 overflow-auto bg-muted/30 p-6">
                        <div class="mx-auto max-w-5xl bg-background shadow-sm">
                            {move || canvas().map(|(navbar, items, page)| view! {
                                <NavbarView
                                    navbar=navbar
                                    items=items
                                    href_for=|link: String| link
                                />
                                <PageView page=page />
                            })}
                        </div>
                    </div>
                    <Inspector />
                </div>
            </Show>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct SiteRouteParams {
    pub subdomain: Option<String>,
    pub slug: Option<String>,
}

/// Public rendering of a published site, no sign-in required.
#[component]
pub fn PreviewPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = leptos_router::hooks::use_params::<SiteRouteParams>();

    let subdomain = move || params.get().ok().and_then(|p| p.subdomain).unwrap_or_default();
    let path = move || {
        let slug = params.get().ok().and_then(|p| p.slug).unwrap_or_default();
        format!("/{}", slug.trim_start_matches('/'))
    };

    let site: RwSignal<Option<Website>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    Effect::new(move |_| {
        let sub = subdomain();
        if sub.trim().is_empty() {
            return;
        }
        let client = app_state.0.api_client.get_untracked();
        loading.set(true);
        error.set(None);
        spawn_local(async move {
            match client.load_public_website(&sub).await {
                Ok(Some(w)) => site.set(Some(w)),
                Ok(None) => error.set(Some(format!("No site is published at \"{sub}\"."))),
                Err(e) => {
                    tracing::warn!(subdomain = %sub, error = %e, "public site unavailable");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    });

    let rendered = move || {
        let path = path();
        site.with(|w| {
            let w = w.as_ref()?;
            let page = w.page_for_path(&path)?.clone();
            let items = w.visible_nav_items().into_iter().cloned().collect::<Vec<_>>();
            Some((w.navbar.clone(), items, page))
        })
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <Show when=move || loading.get() fallback=|| ().into_view()>
                <div class="p-6"><Spinner label="Loading" /></div>
            </Show>
            {move || error.get().map(|e| view! {
                <div class="px-4 py-8 text-xs text-muted-foreground">{e}</div>
            })}
            {move || rendered().map(|(navbar, items, page)| {
                let sub = subdomain();
                view! {
                    <NavbarView
                        navbar=navbar
                        items=items
                        href_for=move |link: String| preview_href(&sub, &link)
                    />
                    <PageView page=page />
                }
            })}
        </div>
    }
}
