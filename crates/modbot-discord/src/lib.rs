//! Discord adapter (serenity).
//!
//! This crate implements the `modbot-core` GatewayPort over the Discord HTTP API
//! and feeds gateway events into the core dispatcher.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;

use serenity::all::{Colour, CreateEmbed, CreateMessage, GuildId, Http, Mentionable, Timestamp};

pub mod handlers;
pub mod router;

use modbot_core::{
    domain::{ChannelId, CommunityId, Member, MessageId, MessageRef, Role, RoleId, UserId},
    errors::Error,
    messaging::{
        port::GatewayPort,
        types::{Embed, Notice},
    },
    Result,
};

#[derive(Clone)]
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn dc_guild(id: CommunityId) -> Result<GuildId> {
        non_zero(id.0).map(GuildId::new)
    }

    fn dc_channel(id: ChannelId) -> Result<serenity::all::ChannelId> {
        non_zero(id.0).map(serenity::all::ChannelId::new)
    }

    fn dc_role(id: RoleId) -> Result<serenity::all::RoleId> {
        non_zero(id.0).map(serenity::all::RoleId::new)
    }

    fn dc_user(id: UserId) -> Result<serenity::all::UserId> {
        non_zero(id.0).map(serenity::all::UserId::new)
    }

    fn dc_message(id: MessageId) -> Result<serenity::all::MessageId> {
        non_zero(id.0).map(serenity::all::MessageId::new)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }

    /// Schedule removal of a message we just posted.
    fn expire(
        &self,
        channel: serenity::all::ChannelId,
        id: serenity::all::MessageId,
        after: Duration,
    ) {
        let http = self.http.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Err(e) = http.delete_message(channel, id, None).await {
                tracing::debug!("failed to remove expired notice: {e}");
            }
        });
    }
}

fn non_zero(id: u64) -> Result<u64> {
    if id == 0 {
        return Err(Error::External("discord ids are never 0".to_string()));
    }
    Ok(id)
}

fn is_not_found(e: &serenity::Error) -> bool {
    match e {
        serenity::Error::Http(http) => http.status_code().is_some_and(|s| s.as_u16() == 404),
        _ => false,
    }
}

pub(crate) fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut out = CreateEmbed::new()
        .title(embed.title.clone())
        .description(embed.description.clone())
        .colour(Colour::new(embed.color.0));
    if let Some(ts) = embed
        .timestamp
        .and_then(|t| Timestamp::from_unix_timestamp(t.timestamp()).ok())
    {
        out = out.timestamp(ts);
    }
    out
}

pub(crate) fn build_message(notice: &Notice) -> Result<CreateMessage> {
    let mut msg = CreateMessage::new().embed(build_embed(&notice.embed));
    if let Some(user) = notice.mention {
        msg = msg.content(DiscordGateway::dc_user(user)?.mention().to_string());
    }
    Ok(msg)
}

#[async_trait]
impl GatewayPort for DiscordGateway {
    async fn resolve_channel(
        &self,
        community: CommunityId,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>> {
        let guild = Self::dc_guild(community)?;
        match self.http.get_channel(Self::dc_channel(channel)?).await {
            Ok(found) => Ok(found
                .guild()
                .filter(|gc| gc.guild_id == guild)
                .map(|gc| ChannelId(gc.id.get()))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn resolve_role(&self, community: CommunityId, role: RoleId) -> Result<Option<Role>> {
        let wanted = Self::dc_role(role)?;
        let roles = self
            .http
            .get_guild_roles(Self::dc_guild(community)?)
            .await
            .map_err(Self::map_err)?;
        Ok(roles.into_iter().find(|r| r.id == wanted).map(|r| Role {
            id: RoleId(r.id.get()),
            name: r.name,
        }))
    }

    async fn fetch_member(&self, community: CommunityId, user: UserId) -> Result<Option<Member>> {
        let guild = Self::dc_guild(community)?;
        let member = match self.http.get_member(guild, Self::dc_user(user)?).await {
            Ok(m) => m,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(Self::map_err(e)),
        };
        let roles = self
            .http
            .get_guild_roles(guild)
            .await
            .map_err(Self::map_err)?;
        let owner = self
            .http
            .get_guild(guild)
            .await
            .map_err(Self::map_err)?
            .owner_id;

        let by_id: HashMap<_, _> = roles.iter().map(|r| (r.id, r)).collect();

        // @everyone shares the guild id and applies to every member.
        let has_admin_flag = owner == member.user.id
            || roles
                .iter()
                .filter(|r| r.id.get() == guild.get() || member.roles.contains(&r.id))
                .any(|r| r.permissions.administrator());

        Ok(Some(Member {
            id: user,
            community,
            has_admin_flag,
            roles: member
                .roles
                .iter()
                .map(|id| Role {
                    id: RoleId(id.get()),
                    name: by_id.get(id).map(|r| r.name.clone()).unwrap_or_default(),
                })
                .collect(),
        }))
    }

    async fn send_notice(
        &self,
        channel: ChannelId,
        notice: Notice,
        expire_after: Option<Duration>,
    ) -> Result<MessageRef> {
        let dc_channel = Self::dc_channel(channel)?;
        let sent = dc_channel
            .send_message(&self.http, build_message(&notice)?)
            .await
            .map_err(Self::map_err)?;

        if let Some(after) = expire_after {
            self.expire(dc_channel, sent.id, after);
        }

        Ok(MessageRef {
            channel_id: channel,
            message_id: MessageId(sent.id.get()),
        })
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.http
            .delete_message(
                Self::dc_channel(msg.channel_id)?,
                Self::dc_message(msg.message_id)?,
                None,
            )
            .await
            .map_err(Self::map_err)
    }

    async fn add_role(&self, community: CommunityId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(
                Self::dc_guild(community)?,
                Self::dc_user(user)?,
                Self::dc_role(role)?,
                Some("auto-role"),
            )
            .await
            .map_err(Self::map_err)
    }
}
