use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Upstream definition sources are inconsistent about id encoding: map keys
/// are strings while embedded references may be raw numbers. Everything is
/// coerced to the string form used for lookups.
pub(crate) fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_id(&value).ok_or_else(|| de::Error::custom("expected a string or numeric id"))
}

pub(crate) fn id_list_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<Value>>::deserialize(deserializer)?;
    let mut map = BTreeMap::new();
    for (key, values) in raw {
        let ids = values
            .iter()
            .map(|value| {
                coerce_id(value)
                    .ok_or_else(|| de::Error::custom("expected a string or numeric id"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        map.insert(key, ids);
    }
    Ok(map)
}

/// Rule comparison values arrive as whatever the author typed into the
/// definition editor (string, number, or boolean). All of them compare as
/// text.
pub(crate) fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(text) => Ok(text),
        Value::Number(num) => Ok(num.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(de::Error::custom("expected a scalar comparison value")),
    }
}
