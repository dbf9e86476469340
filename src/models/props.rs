use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Free-form CSS-ish map (`style`, `nameStyle`, ...). Keys are compared as a map.
pub(crate) type StyleMap = Map<String, Value>;

/// JSON object used to patch a property bag.
pub(crate) type PropsPatch = Map<String, Value>;

/// A typed property record that round-trips through the persistence service as a JSON object.
pub(crate) trait PropertyBag: Serialize + DeserializeOwned + Clone + PartialEq {
    /// Keys holding nested maps that a patch merges into instead of replacing.
    const NESTED: &'static [&'static str] = &[];

    fn to_json(&self) -> Value {
        // Records are plain structs of strings/maps; serialization cannot fail.
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            v => v,
        };
        serde_json::from_value(value)
    }

    /// Shallow merge, one level deeper for `NESTED` keys.
    fn merged(&self, patch: &PropsPatch) -> Result<Self, serde_json::Error> {
        let mut base = match self.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merge_object(&mut base, patch, Self::NESTED);
        Self::from_json(Value::Object(base))
    }
}

/// Layout bags keep keys they cannot type in `extra`, so nothing is lost on a write-back.
pub(crate) trait LayoutBag: PropertyBag + Default {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;

    /// Decode what can be typed; returns the keys that were kept verbatim instead.
    fn from_json_lossy(value: Value) -> (Self, Vec<String>) {
        if let Ok(bag) = Self::from_json(value.clone()) {
            return (bag, Vec::new());
        }
        let Value::Object(map) = value else {
            return (Self::default(), vec!["<root>".to_string()]);
        };

        let (mut typed, mut verbatim) = (Map::new(), Map::new());
        for (key, v) in map {
            let single: Map<String, Value> = [(key.clone(), v.clone())].into_iter().collect();
            if Self::from_json(Value::Object(single)).is_ok() {
                typed.insert(key, v);
            } else {
                verbatim.insert(key, v);
            }
        }

        let mut bag = Self::from_json(Value::Object(typed)).unwrap_or_default();
        let mut keys: Vec<String> = verbatim.keys().cloned().collect();
        keys.sort();
        bag.extra_mut().extend(verbatim);
        (bag, keys)
    }
}

/// `null` reads as the field's default.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Number inputs store their raw text, so counts arrive as `3`, `"3"` or `""`.
pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid count: {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid count: {s:?}"))),
        other => Err(serde::de::Error::custom(format!("invalid count: {other}"))),
    }
}

pub(crate) fn merge_object(base: &mut Map<String, Value>, patch: &PropsPatch, nested: &[&str]) {
    for (key, value) in patch {
        let merge_deeper = nested.contains(&key.as_str()) && value.is_object();
        match (merge_deeper, base.get_mut(key)) {
            (true, Some(Value::Object(existing))) => {
                if let Value::Object(inner) = value {
                    for (k, v) in inner {
                        existing.insert(k.clone(), v.clone());
                    }
                }
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum DisplayMode {
    #[default]
    Flex,
    Grid,
    Block,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum FlexDirection {
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

/// Layout of the section itself plus how its subsections are arranged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_direction: Option<FlexDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for SectionProps {}

impl LayoutBag for SectionProps {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl SectionProps {
    pub fn new_default() -> Self {
        Self {
            display: Some(DisplayMode::Flex),
            flex_direction: Some(FlexDirection::Row),
            gap: Some("1rem".to_string()),
            padding: Some("2rem".to_string()),
            background_color: Some("#ffffff".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubsectionProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flex_direction: Option<FlexDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_template_columns: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub grid_columns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for SubsectionProps {}

impl LayoutBag for SubsectionProps {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl SubsectionProps {
    pub fn new_default() -> Self {
        Self {
            display: Some(DisplayMode::Flex),
            flex_direction: Some(FlexDirection::Column),
            align_items: Some("center".to_string()),
            justify_content: Some("center".to_string()),
            gap: Some("1rem".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NavbarProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Text style shared by every navbar item.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub item_style: StyleMap,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyBag for NavbarProps {
    const NESTED: &'static [&'static str] = &["itemStyle"];
}

impl LayoutBag for NavbarProps {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}
