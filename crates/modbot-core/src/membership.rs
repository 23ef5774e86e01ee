use std::sync::Arc;

use crate::{
    event_log::{EventLogger, LogOutcome},
    events::{DepartedMember, NewMember},
    messaging::{port::GatewayPort, types::Color},
    store::ConfigStore,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOutcome {
    pub role_assigned: bool,
    pub logged: LogOutcome,
}

/// Join/leave bookkeeping: auto-role on join, a log record for both.
pub struct MembershipHandler {
    store: Arc<ConfigStore>,
    gateway: Arc<dyn GatewayPort>,
    logger: Arc<EventLogger>,
}

impl MembershipHandler {
    pub fn new(
        store: Arc<ConfigStore>,
        gateway: Arc<dyn GatewayPort>,
        logger: Arc<EventLogger>,
    ) -> Self {
        Self {
            store,
            gateway,
            logger,
        }
    }

    pub async fn on_join(&self, member: &NewMember) -> JoinOutcome {
        let role_assigned = self.assign_auto_role(member).await;

        let logged = self
            .logger
            .log_action(
                member.community,
                "Member Joined",
                &format!("{} joined the server.", member.user.mention()),
                Color::GREEN,
            )
            .await;

        JoinOutcome {
            role_assigned,
            logged,
        }
    }

    pub async fn on_leave(&self, member: &DepartedMember) -> LogOutcome {
        self.logger
            .log_action(
                member.community,
                "Member Left",
                &format!("{} left the server.", member.name),
                Color::ORANGE,
            )
            .await
    }

    async fn assign_auto_role(&self, member: &NewMember) -> bool {
        // Only the global auto-role is applied on join; per-community values
        // written by `set_auto_role` are not consulted here.
        let Some(role_id) = self.store.get_auto_role(None).await else {
            return false;
        };

        let role = match self.gateway.resolve_role(member.community, role_id).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                tracing::warn!(
                    community = member.community.0,
                    role = role_id.0,
                    "auto-role not found"
                );
                return false;
            }
            Err(e) => {
                tracing::error!(
                    community = member.community.0,
                    "auto-role lookup failed: {e}"
                );
                return false;
            }
        };

        match self
            .gateway
            .add_role(member.community, member.user, role.id)
            .await
        {
            Ok(()) => {
                tracing::info!("added auto-role {} to {}", role.name, member.name);
                true
            }
            Err(e) => {
                tracing::error!(user = member.user.0, "failed to add auto-role: {e}");
                false
            }
        }
    }
}
