use crate::domain::{CommunityId, MessageRef, UserId};

/// Inbound platform events the bot reacts to.
#[derive(Clone, Debug)]
pub enum GatewayEvent {
    Message(InboundMessage),
    MemberJoined(NewMember),
    MemberLeft(DepartedMember),
}

#[derive(Clone, Debug)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    /// Automated account (including the bot itself).
    pub is_bot: bool,
}

#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub message: MessageRef,
    /// `None` for direct messages.
    pub community: Option<CommunityId>,
    pub author: Author,
    pub content: String,
}

#[derive(Clone, Debug)]
pub struct NewMember {
    pub community: CommunityId,
    pub user: UserId,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct DepartedMember {
    pub community: CommunityId,
    pub user: UserId,
    pub name: String,
}
