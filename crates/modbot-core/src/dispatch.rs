use std::sync::Arc;

use crate::{
    classifier::{ContentClassifier, KeywordClassifier, KeywordRules},
    commands::{AdminCommands, CommandProcessor},
    config::Config,
    event_log::{EventLogger, LogOutcome},
    events::GatewayEvent,
    membership::{JoinOutcome, MembershipHandler},
    messaging::port::GatewayPort,
    moderation::{MessageOutcome, ModerationPipeline},
    store::ConfigStore,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handled {
    Message(MessageOutcome),
    Joined(JoinOutcome),
    Left(LogOutcome),
}

/// Routes each inbound event to its handler.
pub struct Dispatcher {
    moderation: ModerationPipeline,
    membership: MembershipHandler,
}

impl Dispatcher {
    pub fn new(moderation: ModerationPipeline, membership: MembershipHandler) -> Self {
        Self {
            moderation,
            membership,
        }
    }

    /// Wire the default classifier and admin commands around `store`/`gateway`.
    pub fn build(cfg: &Config, store: Arc<ConfigStore>, gateway: Arc<dyn GatewayPort>) -> Self {
        let classifier: Arc<dyn ContentClassifier> =
            Arc::new(KeywordClassifier::new(KeywordRules {
                banned_words: cfg.banned_words.clone(),
                block_links: cfg.block_links,
                max_mentions: cfg.max_mentions,
            }));
        let commands: Arc<dyn CommandProcessor> = Arc::new(AdminCommands::new(
            cfg.command_prefix.clone(),
            store.clone(),
            gateway.clone(),
        ));
        let logger = Arc::new(EventLogger::new(store.clone(), gateway.clone()));

        Self::new(
            ModerationPipeline::new(
                classifier,
                commands,
                gateway.clone(),
                logger.clone(),
                cfg.warning_ttl,
            ),
            MembershipHandler::new(store, gateway, logger),
        )
    }

    pub async fn dispatch(&self, event: GatewayEvent) -> Handled {
        match event {
            GatewayEvent::Message(msg) => Handled::Message(self.moderation.handle(&msg).await),
            GatewayEvent::MemberJoined(member) => {
                Handled::Joined(self.membership.on_join(&member).await)
            }
            GatewayEvent::MemberLeft(member) => {
                Handled::Left(self.membership.on_leave(&member).await)
            }
        }
    }
}
