use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const CHANNEL_BASE_URL: &str = "https://twitch.tv";

/// One live stream as returned by the Helix `streams` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStream {
    pub id: String,
    pub user_login: String,
    #[serde(rename = "user_name")]
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub is_mature: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "thumbnail_url", default)]
    pub thumbnail_url_template: String,
}

impl LiveStream {
    pub fn detail_url(&self) -> String {
        format!("{}/{}", CHANNEL_BASE_URL, self.user_login)
    }

    pub fn thumbnail_url(&self, width: u32, height: u32) -> String {
        self.thumbnail_url_template
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }

    /// Markdown link used in the overflow summary.
    pub fn link(&self) -> String {
        format!("[{}]({})", self.display_name, self.detail_url())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A category ("game") the streams are filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Streams that went live since the previous successful tick.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    pub items: Vec<LiveStream>,
    pub total_live: usize,
    pub first_cycle: bool,
}

impl Delta {
    pub fn is_quiet(&self) -> bool {
        !self.first_cycle && self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Summary {
        count: usize,
        first_cycle: bool,
    },
    Detail(Box<LiveStream>),
    Overflow {
        remaining_count: usize,
        links_blob: String,
    },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Summary { .. } => "summary",
            OutboundMessage::Detail(_) => "detail",
            OutboundMessage::Overflow { .. } => "overflow",
        }
    }
}

#[cfg(test)]
pub(crate) fn make_stream(id: &str, login: &str) -> LiveStream {
    use chrono::TimeZone;

    LiveStream {
        id: id.to_string(),
        user_login: login.to_string(),
        display_name: login.to_uppercase(),
        title: format!("{login} playing"),
        started_at: Utc
            .with_ymd_and_hms(2026, 1, 18, 15, 30, 0)
            .single()
            .unwrap_or_default(),
        language: "en".to_string(),
        is_mature: false,
        tags: vec!["English".to_string()],
        thumbnail_url_template: format!(
            "https://static-cdn.jtvnw.net/previews-ttv/live_user_{login}-{{width}}x{{height}}.jpg"
        ),
    }
}
