//! Restaurant data the builder reads to seed menu, category and map elements.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Ids here come back as integers or strings depending on the table.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id: {other}"))),
    }
}

pub(crate) fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("unexpected id: {other}"))),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Location {
    #[serde(deserialize_with = "id_string")]
    pub location_id: String,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub maps_link: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct RestaurantSummary {
    #[serde(default)]
    pub has_restaurant: bool,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub restaurant_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Category {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct MenuEntry {
    #[serde(deserialize_with = "id_string")]
    pub item_id: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub base_price: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub category_id: Option<String>,
}
