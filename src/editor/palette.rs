use serde_json::{json, Map, Value};
use strum::IntoEnumIterator;

use crate::models::element::{
    AccordionItem, AccordionProps, AiProps, ButtonProps, CategoryProps, DropdownOption,
    DropdownProps, FormField, FormProps, ImageProps, ListProps, MapProps, MenuItemProps,
    TextProps,
};
use crate::models::{Category, ElementProps, ElementType, Location, MenuEntry};

fn style(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub(crate) fn display_name(kind: ElementType) -> &'static str {
    match kind {
        ElementType::Text => "Text",
        ElementType::Button => "Button",
        ElementType::Image => "Image",
        ElementType::List => "List (UL)",
        ElementType::Dropdown => "Dropdown Menu",
        ElementType::MenuItem => "Menu Item",
        ElementType::Category => "Category",
        ElementType::Form => "Form",
        ElementType::Accordion => "Accordion (FAQ)",
        ElementType::Map => "Map",
        ElementType::Ai => "Generated Block",
    }
}

/// Element types that can be added without any restaurant data.
pub(crate) fn static_types() -> impl Iterator<Item = ElementType> {
    ElementType::iter().filter(|t| default_props(*t).is_some())
}

/// Default property record for a palette entry. `None` for types built from data.
pub(crate) fn default_props(kind: ElementType) -> Option<ElementProps> {
    let props = match kind {
        ElementType::Text => ElementProps::Text(TextProps {
            content: "New Text Block".to_string(),
            style: style(json!({"fontSize": "1rem", "color": "#000000"})),
            ..Default::default()
        }),
        ElementType::Button => ElementProps::Button(ButtonProps {
            text: "Click Me".to_string(),
            action_type: Some("LINK".to_string()),
            action_value: Some("#".to_string()),
            ..Default::default()
        }),
        ElementType::Image => ElementProps::Image(ImageProps {
            src: "https://placehold.co/600x400".to_string(),
            alt: "Placeholder Image".to_string(),
            ..Default::default()
        }),
        ElementType::List => ElementProps::List(ListProps {
            items: (1..=3).map(|i| format!("List item {i}")).collect(),
            style: style(json!({"listStyleType": "disc", "color": "#000000", "marginLeft": "20px"})),
            ..Default::default()
        }),
        ElementType::Dropdown => ElementProps::Dropdown(DropdownProps {
            label: "Select an Option".to_string(),
            options: vec![DropdownOption {
                text: "Go to Home".to_string(),
                action_value: "/".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ElementType::Form => ElementProps::Form(FormProps {
            title: "Contact Us".to_string(),
            fields: vec![
                form_field("name", "Name", "Your name"),
                form_field("email", "Email", "you@example.com"),
                form_field("message", "Message", "How can we help?"),
            ],
            submit_button: style(json!({
                "text": "Submit",
                "style": {"backgroundColor": "#2563eb", "color": "#ffffff"}
            })),
            label_style: style(json!({"color": "#374151"})),
            style: style(json!({"padding": "1.5rem", "backgroundColor": "#ffffff"})),
            ..Default::default()
        }),
        ElementType::Accordion => ElementProps::Accordion(AccordionProps {
            items: vec![AccordionItem {
                id: "faq-1".to_string(),
                question: "What are your opening hours?".to_string(),
                answer: "We are open every day from 11am to 10pm.".to_string(),
                ..Default::default()
            }],
            style: style(json!({
                "questionBg": "#f3f4f6",
                "answerBg": "#ffffff",
                "iconColor": "#6b7280"
            })),
            ..Default::default()
        }),
        ElementType::Map => ElementProps::Map(MapProps {
            src: String::new(),
            style: map_style(),
            ..Default::default()
        }),
        ElementType::MenuItem | ElementType::Category | ElementType::Ai => return None,
    };
    Some(props)
}

fn form_field(id: &str, label: &str, placeholder: &str) -> FormField {
    FormField {
        id: id.to_string(),
        label: label.to_string(),
        placeholder: placeholder.to_string(),
        ..Default::default()
    }
}

fn map_style() -> Map<String, Value> {
    style(json!({"width": "100%", "height": "300px", "border": "0", "pointerEvents": "none"}))
}

pub(crate) fn menu_item(entry: &MenuEntry) -> ElementProps {
    ElementProps::MenuItem(MenuItemProps {
        item_id: Some(Value::String(entry.item_id.clone())),
        item_name: entry.item_name.clone(),
        description: entry.description.clone().unwrap_or_default(),
        base_price: entry.base_price.clone(),
        image_url: entry.image_url.clone(),
        ..Default::default()
    })
}

pub(crate) fn category(cat: &Category) -> ElementProps {
    ElementProps::Category(CategoryProps {
        name: cat.name.clone(),
        image_url: cat.image_url.clone(),
        name_style: style(json!({"fontSize": "1.25rem", "color": "#111827"})),
        ..Default::default()
    })
}

/// Map element pointed at a location's embed link.
pub(crate) fn location_map(location: &Location) -> ElementProps {
    ElementProps::Map(MapProps {
        src: location.maps_link.clone().unwrap_or_default(),
        style: map_style(),
        ..Default::default()
    })
}

/// Generated block: template and props are rendered by the site, the payload is stored as-is.
pub(crate) fn ai_block(
    template: String,
    props: Map<String, Value>,
    script: Option<String>,
    payload: Option<Value>,
) -> (ElementProps, Option<Value>) {
    let element = ElementProps::Ai(AiProps {
        template,
        props,
        script,
        ..Default::default()
    });
    (element, payload)
}
