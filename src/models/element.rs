use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::props::{merge_object, nullable, PropertyBag, PropsPatch, StyleMap};

/// Element-type tag as stored by the persistence service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum ElementType {
    Text,
    Button,
    Image,
    List,
    Dropdown,
    MenuItem,
    Category,
    Form,
    Accordion,
    Map,
    Ai,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct TextProps {
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for TextProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct ButtonProps {
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
    /// `LINK` or a custom action understood by the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_value: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for ButtonProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct ImageProps {
    #[serde(default, deserialize_with = "nullable")]
    pub src: String,
    #[serde(default, deserialize_with = "nullable")]
    pub alt: String,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for ImageProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct ListProps {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for ListProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct DropdownOption {
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable")]
    pub action_value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct DropdownProps {
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, deserialize_with = "nullable")]
    pub options: Vec<DropdownOption>,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for DropdownProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct MenuItemProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub item_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// Numeric or decimal string depending on the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for MenuItemProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryProps {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, rename = "image_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub name_style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for CategoryProps {
    const NESTED: &'static [&'static str] = &["nameStyle"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct FormField {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, deserialize_with = "nullable")]
    pub placeholder: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormProps {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub fields: Vec<FormField>,
    /// `{text, style}` of the submit button.
    #[serde(default, deserialize_with = "nullable")]
    pub submit_button: Map<String, Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub label_style: StyleMap,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for FormProps {
    const NESTED: &'static [&'static str] = &["style", "labelStyle", "submitButton"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct AccordionItem {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub question: String,
    #[serde(default, deserialize_with = "nullable")]
    pub answer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct AccordionProps {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<AccordionItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for AccordionProps {
    const NESTED: &'static [&'static str] = &["style"];
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct MapProps {
    #[serde(default, deserialize_with = "nullable")]
    pub src: String,
    #[serde(default, deserialize_with = "nullable")]
    pub style: StyleMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for MapProps {
    const NESTED: &'static [&'static str] = &["style"];
}

/// Externally generated block. `script` is presentation-only and never run by the editor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct AiProps {
    #[serde(default, deserialize_with = "nullable")]
    pub template: String,
    #[serde(default, deserialize_with = "nullable")]
    pub props: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for AiProps {
    const NESTED: &'static [&'static str] = &["props"];
}

/// Element property bag, keyed by element-type tag.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementProps {
    Text(TextProps),
    Button(ButtonProps),
    Image(ImageProps),
    List(ListProps),
    Dropdown(DropdownProps),
    MenuItem(MenuItemProps),
    Category(CategoryProps),
    Form(FormProps),
    Accordion(AccordionProps),
    Map(MapProps),
    Ai(AiProps),
    /// Tag this editor does not know; kept verbatim.
    Other {
        element_type: String,
        properties: Value,
    },
}

impl ElementProps {
    /// Build from the wire pair `(element_type, properties)`.
    pub fn from_wire(element_type: &str, properties: Value) -> Result<Self, serde_json::Error> {
        let Ok(kind) = element_type.parse::<ElementType>() else {
            return Ok(ElementProps::Other {
                element_type: element_type.to_string(),
                properties,
            });
        };

        Ok(match kind {
            ElementType::Text => ElementProps::Text(TextProps::from_json(properties)?),
            ElementType::Button => ElementProps::Button(ButtonProps::from_json(properties)?),
            ElementType::Image => ElementProps::Image(ImageProps::from_json(properties)?),
            ElementType::List => ElementProps::List(ListProps::from_json(properties)?),
            ElementType::Dropdown => ElementProps::Dropdown(DropdownProps::from_json(properties)?),
            ElementType::MenuItem => ElementProps::MenuItem(MenuItemProps::from_json(properties)?),
            ElementType::Category => ElementProps::Category(CategoryProps::from_json(properties)?),
            ElementType::Form => ElementProps::Form(FormProps::from_json(properties)?),
            ElementType::Accordion => {
                ElementProps::Accordion(AccordionProps::from_json(properties)?)
            }
            ElementType::Map => ElementProps::Map(MapProps::from_json(properties)?),
            ElementType::Ai => ElementProps::Ai(AiProps::from_json(properties)?),
        })
    }

    pub fn element_type(&self) -> Option<ElementType> {
        Some(match self {
            ElementProps::Text(_) => ElementType::Text,
            ElementProps::Button(_) => ElementType::Button,
            ElementProps::Image(_) => ElementType::Image,
            ElementProps::List(_) => ElementType::List,
            ElementProps::Dropdown(_) => ElementType::Dropdown,
            ElementProps::MenuItem(_) => ElementType::MenuItem,
            ElementProps::Category(_) => ElementType::Category,
            ElementProps::Form(_) => ElementType::Form,
            ElementProps::Accordion(_) => ElementType::Accordion,
            ElementProps::Map(_) => ElementType::Map,
            ElementProps::Ai(_) => ElementType::Ai,
            ElementProps::Other { .. } => return None,
        })
    }

    /// Wire tag, including unknown ones.
    pub fn type_tag(&self) -> String {
        match self {
            ElementProps::Other { element_type, .. } => element_type.clone(),
            known => known
                .element_type()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ElementProps::Text(p) => p.to_json(),
            ElementProps::Button(p) => p.to_json(),
            ElementProps::Image(p) => p.to_json(),
            ElementProps::List(p) => p.to_json(),
            ElementProps::Dropdown(p) => p.to_json(),
            ElementProps::MenuItem(p) => p.to_json(),
            ElementProps::Category(p) => p.to_json(),
            ElementProps::Form(p) => p.to_json(),
            ElementProps::Accordion(p) => p.to_json(),
            ElementProps::Map(p) => p.to_json(),
            ElementProps::Ai(p) => p.to_json(),
            ElementProps::Other { properties, .. } => properties.clone(),
        }
    }

    /// Apply a patch within the same variant.
    pub fn merged(&self, patch: &PropsPatch) -> Result<Self, serde_json::Error> {
        Ok(match self {
            ElementProps::Text(p) => ElementProps::Text(p.merged(patch)?),
            ElementProps::Button(p) => ElementProps::Button(p.merged(patch)?),
            ElementProps::Image(p) => ElementProps::Image(p.merged(patch)?),
            ElementProps::List(p) => ElementProps::List(p.merged(patch)?),
            ElementProps::Dropdown(p) => ElementProps::Dropdown(p.merged(patch)?),
            ElementProps::MenuItem(p) => ElementProps::MenuItem(p.merged(patch)?),
            ElementProps::Category(p) => ElementProps::Category(p.merged(patch)?),
            ElementProps::Form(p) => ElementProps::Form(p.merged(patch)?),
            ElementProps::Accordion(p) => ElementProps::Accordion(p.merged(patch)?),
            ElementProps::Map(p) => ElementProps::Map(p.merged(patch)?),
            ElementProps::Ai(p) => ElementProps::Ai(p.merged(patch)?),
            ElementProps::Other {
                element_type,
                properties,
            } => {
                let mut base = match properties {
                    Value::Object(map) => map.clone(),
                    _ => Map::new(),
                };
                merge_object(&mut base, patch, &["style"]);
                ElementProps::Other {
                    element_type: element_type.clone(),
                    properties: Value::Object(base),
                }
            }
        })
    }

    /// Short human label for outlines and the preview.
    pub fn label(&self) -> String {
        match self {
            ElementProps::Text(p) => p.content.clone(),
            ElementProps::Button(p) => p.text.clone(),
            ElementProps::Image(p) => p.alt.clone(),
            ElementProps::List(p) => format!("{} items", p.items.len()),
            ElementProps::Dropdown(p) => p.label.clone(),
            ElementProps::MenuItem(p) => p.item_name.clone(),
            ElementProps::Category(p) => p.name.clone(),
            ElementProps::Form(p) => p.title.clone(),
            ElementProps::Accordion(p) => format!("{} questions", p.items.len()),
            ElementProps::Map(_) => "Map".to_string(),
            ElementProps::Ai(_) => "Generated block".to_string(),
            ElementProps::Other { element_type, .. } => element_type.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_element_type_tags() {
        assert_eq!(ElementType::MenuItem.to_string(), "MENU_ITEM");
        assert_eq!("ACCORDION".parse::<ElementType>().unwrap(), ElementType::Accordion);
        assert_eq!("AI".parse::<ElementType>().unwrap(), ElementType::Ai);
        assert!("VIDEO".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_style_patch_merges_one_level_deeper() {
        let props = ElementProps::from_wire(
            "TEXT",
            json!({"content": "Hi", "style": {"color": "#000"}}),
        )
        .unwrap();

        let patch = json!({"style": {"fontSize": "2rem"}});
        let merged = props.merged(patch.as_object().unwrap()).unwrap();

        assert_eq!(
            merged.to_json(),
            json!({"content": "Hi", "style": {"color": "#000", "fontSize": "2rem"}})
        );
    }

    #[test]
    fn test_form_submit_button_is_nested() {
        let props = ElementProps::from_wire(
            "FORM",
            json!({"title": "Contact", "submitButton": {"text": "Send", "style": {}}}),
        )
        .unwrap();
        let merged = props
            .merged(json!({"submitButton": {"text": "Go"}}).as_object().unwrap())
            .unwrap();

        let ElementProps::Form(form) = merged else {
            panic!("expected form");
        };
        assert_eq!(form.submit_button.get("text"), Some(&json!("Go")));
        assert_eq!(form.submit_button.get("style"), Some(&json!({})));
    }

    #[test]
    fn test_unknown_type_is_kept_verbatim() {
        let raw = json!({"src": "x.mp4", "loop": true});
        let props = ElementProps::from_wire("VIDEO", raw.clone()).unwrap();
        assert_eq!(props.type_tag(), "VIDEO");
        assert_eq!(props.element_type(), None);
        assert_eq!(props.to_json(), raw);
    }

    #[test]
    fn test_null_text_fields_read_as_empty() {
        let props = ElementProps::from_wire(
            "MENU_ITEM",
            json!({"item_name": "Soup", "description": null, "style": null}),
        )
        .unwrap();
        let ElementProps::MenuItem(item) = props else {
            panic!("expected menu item");
        };
        assert_eq!(item.item_name, "Soup");
        assert_eq!(item.description, "");
        assert!(item.style.is_empty());
    }

    #[test]
    fn test_ill_typed_properties_are_rejected() {
        assert!(ElementProps::from_wire("LIST", json!({"items": "not a list"})).is_err());
    }
}
