//! Discord event handlers.
//!
//! Each handler converts the serenity model into a core event and hands it to
//! the dispatcher; all moderation logic lives in `modbot-core`.

use serenity::all::{GuildId, Member, Message, User};

use modbot_core::{
    dispatch::Handled,
    domain::{ChannelId, CommunityId, MessageId, MessageRef, UserId},
    events::{Author, DepartedMember, GatewayEvent, InboundMessage, NewMember},
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: &AppState) {
    let event = GatewayEvent::Message(inbound_message(&msg));
    if let Handled::Message(outcome) = state.dispatcher.dispatch(event).await {
        tracing::debug!(message = msg.id.get(), "message handled: {outcome:?}");
    }
}

pub async fn handle_member_join(member: Member, state: &AppState) {
    let event = GatewayEvent::MemberJoined(NewMember {
        community: CommunityId(member.guild_id.get()),
        user: UserId(member.user.id.get()),
        name: member.user.name.clone(),
    });
    state.dispatcher.dispatch(event).await;
}

pub async fn handle_member_leave(guild_id: GuildId, user: User, state: &AppState) {
    let event = GatewayEvent::MemberLeft(DepartedMember {
        community: CommunityId(guild_id.get()),
        user: UserId(user.id.get()),
        name: user.name,
    });
    state.dispatcher.dispatch(event).await;
}

fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        message: MessageRef {
            channel_id: ChannelId(msg.channel_id.get()),
            message_id: MessageId(msg.id.get()),
        },
        community: msg.guild_id.map(|g| CommunityId(g.get())),
        author: Author {
            id: UserId(msg.author.id.get()),
            name: msg.author.name.clone(),
            is_bot: msg.author.bot,
        },
        content: msg.content.clone(),
    }
}
