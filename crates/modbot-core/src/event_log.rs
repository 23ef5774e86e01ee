use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    domain::CommunityId,
    messaging::{
        port::GatewayPort,
        types::{Color, Embed, Notice},
    },
    store::ConfigStore,
};

/// What happened to a log request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOutcome {
    Delivered,
    /// No log channel configured, or the configured one no longer exists.
    NoChannel,
    Failed,
}

/// Posts structured records to a community's log channel.
///
/// Never fails: logging must not interrupt the feature that asked for it.
pub struct EventLogger {
    store: Arc<ConfigStore>,
    gateway: Arc<dyn GatewayPort>,
}

impl EventLogger {
    pub fn new(store: Arc<ConfigStore>, gateway: Arc<dyn GatewayPort>) -> Self {
        Self { store, gateway }
    }

    pub async fn log_action(
        &self,
        community: CommunityId,
        title: &str,
        description: &str,
        color: Color,
    ) -> LogOutcome {
        self.log_action_at(community, title, description, color, Utc::now())
            .await
    }

    pub async fn log_action_at(
        &self,
        community: CommunityId,
        title: &str,
        description: &str,
        color: Color,
        timestamp: DateTime<Utc>,
    ) -> LogOutcome {
        let Some(configured) = self.store.get_log_channel(community).await else {
            return LogOutcome::NoChannel;
        };

        let channel = match self.gateway.resolve_channel(community, configured).await {
            Ok(Some(ch)) => ch,
            Ok(None) => return LogOutcome::NoChannel,
            Err(e) => {
                tracing::debug!(community = community.0, "log channel lookup failed: {e}");
                return LogOutcome::NoChannel;
            }
        };

        let embed = Embed::new(title, description, color).at(timestamp);
        match self
            .gateway
            .send_notice(channel, Notice::embed(embed), None)
            .await
        {
            Ok(_) => LogOutcome::Delivered,
            Err(e) => {
                tracing::error!(community = community.0, "error logging action: {e}");
                LogOutcome::Failed
            }
        }
    }
}
