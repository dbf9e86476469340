use std::sync::Arc;

use leptos::prelude::*;
use serde_json::{Map, Value};

use crate::models::element::FormProps;
use crate::models::{
    Element, ElementProps, Navbar, NavbarItem, Page, PropertyBag, Section, SectionProps,
    Subsection, SubsectionProps,
};

/// `backgroundColor` -> `background-color`
pub(crate) fn css_property(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn css_value(key: &str, value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if key == "backgroundImage" && !raw.starts_with("url(") {
        return Some(format!("url(\"{raw}\")"));
    }
    Some(raw)
}

/// Inline CSS from a style object. Nested objects and empty values are skipped.
pub(crate) fn inline_style(style: &Map<String, Value>) -> String {
    style
        .iter()
        .filter_map(|(k, v)| css_value(k, v).map(|v| format!("{}: {};", css_property(k), v)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn section_style(props: &SectionProps) -> String {
    match props.to_json() {
        Value::Object(map) => inline_style(&map),
        _ => String::new(),
    }
}

/// `gridColumns` is a count; it becomes a template unless one is set explicitly.
pub(crate) fn subsection_style(props: &SubsectionProps) -> String {
    let Value::Object(mut map) = props.to_json() else {
        return String::new();
    };
    map.remove("gridColumns");
    if props.grid_template_columns.is_none() {
        if let Some(n) = props.grid_columns.filter(|n| *n > 0) {
            map.insert(
                "gridTemplateColumns".to_string(),
                Value::String(format!("repeat({n}, minmax(0, 1fr))")),
            );
        }
    }
    inline_style(&map)
}

/// Prices arrive as numbers or preformatted strings.
pub(crate) fn format_price(price: Option<&Value>) -> Option<String> {
    match price? {
        Value::Number(n) => n.as_f64().map(|p| format!("${p:.2}")),
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn form_view(p: FormProps) -> AnyView {
    let label_style = inline_style(&p.label_style);
    let submit_text = p
        .submit_button
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("Submit")
        .to_string();
    let submit_style = p
        .submit_button
        .get("style")
        .and_then(Value::as_object)
        .map(inline_style)
        .unwrap_or_default();

    view! {
        <form class="flex flex-col gap-2" style=inline_style(&p.style) on:submit=|ev| ev.prevent_default()>
            <h3 class="font-semibold">{p.title}</h3>
            {p.fields
                .into_iter()
                .map(|f| {
                    let label_style = label_style.clone();
                    view! {
                        <label class="flex flex-col gap-1 text-sm" style=label_style>
                            {f.label}
                            <input class="rounded border px-2 py-1" name=f.id placeholder=f.placeholder />
                        </label>
                    }
                })
                .collect_view()}
            <button type="submit" class="rounded bg-primary px-3 py-1 text-primary-foreground" style=submit_style>
                {submit_text}
            </button>
        </form>
    }
    .into_any()
}

#[component]
pub fn ElementView(element: Arc<Element>) -> impl IntoView {
    match element.properties.clone() {
        ElementProps::Text(p) => view! { <p style=inline_style(&p.style)>{p.content}</p> }.into_any(),
        ElementProps::Button(p) => {
            let href = p.action_value.unwrap_or_else(|| "#".to_string());
            view! {
                <a class="inline-block rounded px-4 py-2" href=href style=inline_style(&p.style)>{p.text}</a>
            }
            .into_any()
        }
        ElementProps::Image(p) => {
            view! { <img class="max-w-full" src=p.src alt=p.alt style=inline_style(&p.style) /> }.into_any()
        }
        ElementProps::List(p) => view! {
            <ul class="list-disc pl-5" style=inline_style(&p.style)>
                {p.items.into_iter().map(|i| view! { <li>{i}</li> }).collect_view()}
            </ul>
        }
        .into_any(),
        ElementProps::Dropdown(p) => view! {
            <label class="flex flex-col gap-1" style=inline_style(&p.style)>
                {p.label}
                <select class="rounded border px-2 py-1">
                    {p.options
                        .into_iter()
                        .map(|o| view! { <option value=o.action_value>{o.text}</option> })
                        .collect_view()}
                </select>
            </label>
        }
        .into_any(),
        ElementProps::MenuItem(p) => {
            let price = format_price(p.base_price.as_ref());
            view! {
                <article class="flex gap-3 rounded border p-3" style=inline_style(&p.style)>
                    {p.image_url.map(|src| view! { <img class="size-16 rounded object-cover" src=src alt="" /> })}
                    <div class="flex flex-1 flex-col">
                        <div class="flex justify-between gap-2 font-medium">
                            <span>{p.item_name}</span>
                            {price.map(|price| view! { <span>{price}</span> })}
                        </div>
                        <p class="text-sm text-muted-foreground">{p.description}</p>
                    </div>
                </article>
            }
            .into_any()
        }
        ElementProps::Category(p) => view! {
            <figure class="flex flex-col items-center gap-2">
                {p.image_url.map(|src| view! { <img class="size-24 rounded-full object-cover" src=src alt="" /> })}
                <figcaption style=inline_style(&p.name_style)>{p.name}</figcaption>
            </figure>
        }
        .into_any(),
        ElementProps::Form(p) => form_view(p),
        ElementProps::Accordion(p) => view! {
            <div class="flex flex-col gap-1" style=inline_style(&p.style)>
                {p.items
                    .into_iter()
                    .map(|item| view! {
                        <details class="rounded border px-3 py-2">
                            <summary class="cursor-pointer font-medium">{item.question}</summary>
                            <p class="pt-2 text-sm">{item.answer}</p>
                        </details>
                    })
                    .collect_view()}
            </div>
        }
        .into_any(),
        ElementProps::Map(p) => view! {
            <iframe class="h-64 w-full border-0" src=p.src style=inline_style(&p.style) {..::leptos::tachys::html::attribute::custom::custom_attribute("loading", "lazy")}></iframe>
        }
        .into_any(),
        ElementProps::Ai(p) => {
            let props = serde_json::to_string(&p.props).unwrap_or_default();
            view! { <div data-template=p.template data-props=props></div> }.into_any()
        }
        ElementProps::Other { element_type, .. } => {
            view! { <div class="text-xs text-muted-foreground">{element_type}</div> }.into_any()
        }
    }
}

#[component]
pub fn SubsectionView(subsection: Arc<Subsection>) -> impl IntoView {
    let style = subsection_style(&subsection.properties);
    view! {
        <div class="min-h-8" style=style>
            {subsection
                .elements
                .iter()
                .map(|e| view! { <ElementView element=e.clone() /> })
                .collect_view()}
        </div>
    }
}

#[component]
pub fn SectionView(section: Arc<Section>) -> impl IntoView {
    view! {
        <section class="min-h-12" style=section_style(&section.properties)>
            {section
                .subsections
                .iter()
                .map(|s| view! { <SubsectionView subsection=s.clone() /> })
                .collect_view()}
        </section>
    }
}

/// Navigation links; `href_for` maps a page slug to the link target.
#[component]
pub fn NavbarView(
    navbar: Arc<Navbar>,
    items: Vec<NavbarItem>,
    #[prop(into)] href_for: Callback<String, String>,
) -> impl IntoView {
    let item_style = inline_style(&navbar.properties.item_style);
    let bar_style = navbar
        .properties
        .background_color
        .as_ref()
        .map(|c| format!("background-color: {c};"))
        .unwrap_or_default();

    view! {
        <nav class="flex items-center gap-4 px-6 py-3" style=bar_style>
            {items
                .into_iter()
                .map(|item| {
                    let href = href_for.run(item.link_url.clone());
                    view! { <a href=href style=item_style.clone()>{item.text}</a> }
                })
                .collect_view()}
        </nav>
    }
}

#[component]
pub fn PageView(page: Arc<Page>) -> impl IntoView {
    view! {
        <main class="flex flex-col">
            {page
                .sections
                .iter()
                .map(|s| view! { <SectionView section=s.clone() /> })
                .collect_view()}
        </main>
    }
}
