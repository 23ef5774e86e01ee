//! Prefix commands that edit the community configuration.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::{ChannelId, CommunityId, RoleId},
    events::InboundMessage,
    messaging::{
        port::GatewayPort,
        types::{Color, Embed, Notice},
    },
    permissions::{tier, Tier},
    store::{CommunityConfig, ConfigStore},
    Result,
};

/// Receives every message that passed moderation.
#[async_trait]
pub trait CommandProcessor: Send + Sync {
    async fn process(&self, msg: &InboundMessage) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminCommand {
    SetLogChannel(ChannelId),
    SetAutoRole(RoleId),
    AddAdminRole(RoleId),
    AddModeratorRole(RoleId),
    ShowConfig,
}

impl AdminCommand {
    fn required_tier(&self) -> Tier {
        match self {
            AdminCommand::ShowConfig => Tier::Moderator,
            _ => Tier::Admin,
        }
    }
}

/// Parse `text` as a command. `None` when it is not addressed to us at all,
/// `Some(Err(usage))` when it is but the arguments are wrong.
pub fn parse_command(
    prefix: &str,
    text: &str,
) -> Option<std::result::Result<AdminCommand, String>> {
    let rest = text.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();
    let arg = parts.next();

    let role_arg = |usage: &str| {
        arg.and_then(|a| parse_mention(a, "<@&"))
            .map(RoleId)
            .ok_or_else(|| format!("Usage: {prefix}{usage}"))
    };

    let cmd = match name.as_str() {
        "setlog" => arg
            .and_then(|a| parse_mention(a, "<#"))
            .map(|id| AdminCommand::SetLogChannel(ChannelId(id)))
            .ok_or_else(|| format!("Usage: {prefix}setlog <#channel>")),
        "setautorole" => role_arg("setautorole <@role>").map(AdminCommand::SetAutoRole),
        "addadminrole" => role_arg("addadminrole <@role>").map(AdminCommand::AddAdminRole),
        "addmodrole" => role_arg("addmodrole <@role>").map(AdminCommand::AddModeratorRole),
        "config" => Ok(AdminCommand::ShowConfig),
        _ => return None,
    };
    Some(cmd)
}

/// Accepts a raw id or a platform mention such as `<#123>` / `<@&123>`.
fn parse_mention(arg: &str, open: &str) -> Option<u64> {
    let raw = arg
        .strip_prefix(open)
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(arg);
    raw.parse::<u64>().ok()
}

/// Built-in configuration commands, gated by the permission tiers.
pub struct AdminCommands {
    prefix: String,
    store: Arc<ConfigStore>,
    gateway: Arc<dyn GatewayPort>,
}

impl AdminCommands {
    pub fn new(
        prefix: impl Into<String>,
        store: Arc<ConfigStore>,
        gateway: Arc<dyn GatewayPort>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            store,
            gateway,
        }
    }

    async fn execute(&self, community: CommunityId, cmd: AdminCommand) -> Embed {
        match cmd {
            AdminCommand::SetLogChannel(ch) => {
                self.store.set_log_channel(community, ch).await;
                done(format!("Log channel set to {}.", ch.mention()))
            }
            AdminCommand::SetAutoRole(role) => {
                self.store.set_auto_role(community, role).await;
                done(format!("Auto-role set to {}.", role.mention()))
            }
            AdminCommand::AddAdminRole(role) => {
                if self.store.add_admin_role(community, role).await {
                    done(format!("{} added to admin roles.", role.mention()))
                } else {
                    done(format!("{} is already an admin role.", role.mention()))
                }
            }
            AdminCommand::AddModeratorRole(role) => {
                if self.store.add_moderator_role(community, role).await {
                    done(format!("{} added to moderator roles.", role.mention()))
                } else {
                    done(format!("{} is already a moderator role.", role.mention()))
                }
            }
            AdminCommand::ShowConfig => {
                let cfg = self.store.get_community_config(community).await;
                Embed::new("Configuration", describe(&cfg), Color::GREEN)
            }
        }
    }
}

#[async_trait]
impl CommandProcessor for AdminCommands {
    async fn process(&self, msg: &InboundMessage) -> Result<()> {
        let Some(community) = msg.community else {
            return Ok(());
        };
        let Some(parsed) = parse_command(&self.prefix, &msg.content) else {
            return Ok(());
        };
        let channel = msg.message.channel_id;

        let reply = match parsed {
            Err(usage) => Embed::new("Invalid command", usage, Color::ORANGE),
            Ok(cmd) => {
                let Some(member) = self
                    .gateway
                    .fetch_member(community, msg.author.id)
                    .await?
                else {
                    return Ok(());
                };
                let cfg = self.store.get_community_config(community).await;
                if tier(&member, &cfg) < cmd.required_tier() {
                    tracing::info!(
                        community = community.0,
                        user = msg.author.id.0,
                        "command denied: {cmd:?}"
                    );
                    Embed::new(
                        "Permission denied",
                        "You are not allowed to use this command.",
                        Color::RED,
                    )
                } else {
                    self.execute(community, cmd).await
                }
            }
        };

        self.gateway
            .send_notice(channel, Notice::to(msg.author.id, reply), None)
            .await?;
        Ok(())
    }
}

fn done(description: String) -> Embed {
    Embed::new("Done", description, Color::GREEN)
}

fn describe(cfg: &CommunityConfig) -> String {
    let roles = |set: &std::collections::BTreeSet<RoleId>| {
        if set.is_empty() {
            "none".to_string()
        } else {
            set.iter().map(|r| r.mention()).collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "Log channel: {}\nAuto-role: {}\nAdmin roles: {}\nModerator roles: {}",
        cfg.log_channel
            .map(|c| c.mention())
            .unwrap_or_else(|| "not set".to_string()),
        cfg.auto_role
            .map(|r| r.mention())
            .unwrap_or_else(|| "not set".to_string()),
        roles(&cfg.admin_roles),
        roles(&cfg.moderator_roles),
    )
}
