mod discord;

use crate::core::error::DeliveryError;
use crate::core::models::OutboundMessage;
use async_trait::async_trait;

pub use discord::DiscordDelivery;

/// Where a tick's messages go, captured from the configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub channel_id: String,
    pub filter_name: String,
}

#[async_trait]
pub trait Delivery: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError>;
}
