use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Envelope of the v2 schedule endpoint.
#[derive(Debug, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub data: Vec<RawSection>,
}

/// One section as the catalog reports it.
///
/// Every field may be absent, null or of the wrong JSON type. Unreadable
/// values are logged and read as absent so that one bad field never loses
/// the rest of the response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSection {
    #[serde(deserialize_with = "lenient_string")]
    pub subject: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub catalog_number: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub topic: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub note: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub academic_level: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub units: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub last_updated: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub class_number: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub section: Option<String>,
    /// Integer, numeric string, `99`, `"None"` or null.
    pub associated_class: Option<Value>,
    pub related_component_1: Option<Value>,
    pub related_component_2: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub campus: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub held_with: Vec<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub enrollment_total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub enrollment_capacity: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub waiting_total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub waiting_capacity: Option<i64>,
    #[serde(deserialize_with = "lenient_list")]
    pub reserves: Vec<RawReserve>,
    #[serde(deserialize_with = "lenient_list")]
    pub classes: Vec<RawClass>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawReserve {
    #[serde(deserialize_with = "lenient_string")]
    pub reserve_group: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub enrollment_total: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub enrollment_capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawClass {
    #[serde(deserialize_with = "lenient_object")]
    pub date: RawDate,
    #[serde(deserialize_with = "lenient_object")]
    pub location: RawLocation,
    #[serde(deserialize_with = "lenient_list")]
    pub instructors: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDate {
    #[serde(deserialize_with = "lenient_string")]
    pub start_time: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub end_time: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub weekdays: Option<String>,
    /// "MM/DD", only for one-time meetings.
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_tba: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_cancelled: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_closed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLocation {
    #[serde(deserialize_with = "lenient_string")]
    pub building: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub room: Option<String>,
}

/// Reads any JSON value and converts it; null is absent, anything
/// `convert` rejects is logged and absent.
fn scalar<'de, D, T>(
    deserializer: D,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let converted = convert(&value);
    if converted.is_none() {
        warn!("unreadable catalog value {}, using default", value);
    }
    Ok(converted)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar(deserializer, |value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar(deserializer, |value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar(deserializer, |value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = scalar(deserializer, |value| match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })?;
    Ok(flag.unwrap_or_default())
}

/// Keeps the readable entries of a list; null or a non-list is empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            warn!("expected a list in catalog response, got {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable catalog entry: {}", e);
                None
            }
        })
        .collect())
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("unreadable catalog object, using defaults: {}", e);
        T::default()
    }))
}
