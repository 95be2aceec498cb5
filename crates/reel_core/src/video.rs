use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Ranked;

/// One entry of a profile's video list as returned by the backend.
///
/// Fields the wizard does not interpret are kept in `extra` so that a cached
/// collection round-trips everything the backend sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub views: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoRecord {
    pub fn new(video_id: impl Into<String>, views: u64, likes: u64) -> Self {
        Self {
            video_id: video_id.into(),
            title: String::new(),
            thumbnail: None,
            url: None,
            views,
            likes,
            duration: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn duration_label(&self) -> String {
        match &self.duration {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Reads a popularity count the way scrapers report it: `null` counts as 0,
/// floats are rounded and negatives clamp to 0.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(number)) => Ok(number
            .as_u64()
            .unwrap_or_else(|| number.as_f64().map_or(0, rounded_count))),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(rounded_count)
            .map_err(|_| de::Error::custom(format!("count is not numeric: {text:?}"))),
        Some(other) => Err(de::Error::custom(format!(
            "count is not numeric: {other}"
        ))),
    }
}

fn rounded_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

impl Ranked for VideoRecord {
    fn key(&self) -> &str {
        &self.video_id
    }

    fn primary_rank(&self) -> u64 {
        self.views
    }

    fn secondary_rank(&self) -> u64 {
        self.likes
    }
}

/// Compact human-readable count: `999`, `1.2K`, `3.4M`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
