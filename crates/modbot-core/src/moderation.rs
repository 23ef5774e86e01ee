use std::{sync::Arc, time::Duration};

use crate::{
    classifier::{ContentClassifier, Verdict, ViolationKind},
    commands::CommandProcessor,
    domain::CommunityId,
    event_log::{EventLogger, LogOutcome},
    events::InboundMessage,
    messaging::{
        port::GatewayPort,
        types::{Color, Embed, Notice},
    },
};

/// How one message left the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Sent by an automated account.
    Ignored,
    PassedThrough,
    Remediated(Remediation),
}

/// Result of each remediation step. A failed step never skips the later ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remediation {
    pub kind: ViolationKind,
    pub deleted: bool,
    pub warned: bool,
    pub logged: LogOutcome,
}

/// Screens inbound messages: classify, then delete + warn + log on a violation.
pub struct ModerationPipeline {
    classifier: Arc<dyn ContentClassifier>,
    commands: Arc<dyn CommandProcessor>,
    gateway: Arc<dyn GatewayPort>,
    logger: Arc<EventLogger>,
    warning_ttl: Duration,
}

impl ModerationPipeline {
    pub fn new(
        classifier: Arc<dyn ContentClassifier>,
        commands: Arc<dyn CommandProcessor>,
        gateway: Arc<dyn GatewayPort>,
        logger: Arc<EventLogger>,
        warning_ttl: Duration,
    ) -> Self {
        Self {
            classifier,
            commands,
            gateway,
            logger,
            warning_ttl,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> MessageOutcome {
        if msg.author.is_bot {
            return MessageOutcome::Ignored;
        }

        // Direct messages are not moderated.
        let Some(community) = msg.community else {
            self.pass_through(msg).await;
            return MessageOutcome::PassedThrough;
        };

        match self.classifier.classify(&msg.content).await {
            Verdict::Clean => {
                self.pass_through(msg).await;
                MessageOutcome::PassedThrough
            }
            Verdict::Violation(kind) => {
                MessageOutcome::Remediated(self.remediate(community, msg, kind).await)
            }
        }
    }

    async fn pass_through(&self, msg: &InboundMessage) {
        if let Err(e) = self.commands.process(msg).await {
            tracing::error!(user = msg.author.id.0, "command processing failed: {e}");
        }
    }

    async fn remediate(
        &self,
        community: CommunityId,
        msg: &InboundMessage,
        kind: ViolationKind,
    ) -> Remediation {
        let author = msg.author.id;
        let channel = msg.message.channel_id;
        tracing::info!(
            community = community.0,
            user = author.0,
            kind = %kind,
            "removing message"
        );

        let deleted = match self.gateway.delete_message(msg.message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user = author.0, "error deleting message: {e}");
                false
            }
        };

        let warning = Embed::new(
            "⚠️ Warning",
            format!("Your message was removed for: {kind}."),
            Color::RED,
        );
        let warned = match self
            .gateway
            .send_notice(
                channel,
                Notice::to(author, warning),
                Some(self.warning_ttl),
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(user = author.0, "error sending warning: {e}");
                false
            }
        };

        let logged = self
            .logger
            .log_action(
                community,
                "Message Deleted",
                &format!(
                    "{}'s message was removed for {kind}.\nChannel: {}",
                    author.mention(),
                    channel.mention()
                ),
                Color::RED,
            )
            .await;

        Remediation {
            kind,
            deleted,
            warned,
            logged,
        }
    }
}
