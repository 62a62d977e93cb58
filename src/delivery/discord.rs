use crate::core::error::DeliveryError;
use crate::core::models::{LiveStream, OutboundMessage};
use crate::core::settings::DiscordSettings;
use crate::delivery::{Delivery, DeliveryTarget};
use crate::notify::overflow_heading;
use async_trait::async_trait;
use serde_json::{json, Value};

const GREEN: u32 = 0x57F287;
const PURPLE: u32 = 0xAC62FF;
const THUMBNAIL_WIDTH: u32 = 854;
const THUMBNAIL_HEIGHT: u32 = 480;

/// Posts each message as a single embed through the Discord REST API.
pub struct DiscordDelivery {
    bot_token: String,
    api_url: String,
    client: reqwest::Client,
}

impl DiscordDelivery {
    pub fn new(settings: &DiscordSettings, client: reqwest::Client) -> Self {
        Self {
            bot_token: settings.bot_token.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl Delivery for DiscordDelivery {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(
        &self,
        target: &DeliveryTarget,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError> {
        let url = format!("{}/channels/{}/messages", self.api_url, target.channel_id);
        let body = json!({ "embeds": [render_embed(target, message)] });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

pub(crate) fn render_embed(target: &DeliveryTarget, message: &OutboundMessage) -> Value {
    match message {
        OutboundMessage::Summary { count, .. } => json!({
            "description": format!(
                "First poll of {} streams: found {}",
                target.filter_name, count
            ),
            "color": GREEN,
        }),
        OutboundMessage::Detail(stream) => render_stream(stream),
        OutboundMessage::Overflow {
            remaining_count,
            links_blob,
        } => json!({
            "description": format!("{}{}", overflow_heading(*remaining_count), links_blob),
            "color": PURPLE,
        }),
    }
}

fn render_stream(stream: &LiveStream) -> Value {
    let url = stream.detail_url();
    let started = stream.started_at.timestamp();
    let tags = stream
        .tags
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(" ");

    let description = [
        url.clone(),
        format!("**Title:** {}", stream.title),
        format!("**Started:** <t:{started}:t> (<t:{started}:R>)"),
        format!("**Language:** {}", language_name(&stream.language)),
        format!(
            "**Mature:** {}",
            if stream.is_mature { "Yes" } else { "No" }
        ),
        format!("**Tags:** {tags}"),
    ]
    .join("\n");

    json!({
        "title": stream.display_name,
        "url": url,
        "description": description,
        "image": { "url": stream.thumbnail_url(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT) },
        "color": PURPLE,
    })
}

/// English name for a Twitch broadcaster language code.
fn language_name(code: &str) -> &str {
    match code.to_ascii_lowercase().as_str() {
        "en" => "English",
        "de" => "German",
        "es" => "Spanish",
        "fr" => "French",
        "it" => "Italian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "zh" => "Chinese",
        "zh-hk" => "Chinese (Hong Kong)",
        "pl" => "Polish",
        "tr" => "Turkish",
        "nl" => "Dutch",
        "sv" => "Swedish",
        "no" => "Norwegian",
        "da" => "Danish",
        "fi" => "Finnish",
        "cs" => "Czech",
        "hu" => "Hungarian",
        "el" => "Greek",
        "uk" => "Ukrainian",
        "ar" => "Arabic",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "other" => "Other",
        _ => code,
    }
}
