use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{ChannelId, CommunityId, Member, MessageRef, Role, RoleId, UserId},
    messaging::types::Notice,
    Result,
};

/// Outbound port to the chat platform.
///
/// Every call may fail on its own; callers decide whether the failure stops
/// their flow. Lookups return `Ok(None)` when the platform has no such object.
#[async_trait]
pub trait GatewayPort: Send + Sync {
    async fn resolve_channel(
        &self,
        community: CommunityId,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>>;

    async fn resolve_role(&self, community: CommunityId, role: RoleId) -> Result<Option<Role>>;

    async fn fetch_member(&self, community: CommunityId, user: UserId) -> Result<Option<Member>>;

    /// Post a notice. With `expire_after`, the platform removes it again once
    /// the interval has elapsed.
    async fn send_notice(
        &self,
        channel: ChannelId,
        notice: Notice,
        expire_after: Option<Duration>,
    ) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn add_role(&self, community: CommunityId, user: UserId, role: RoleId) -> Result<()>;
}
