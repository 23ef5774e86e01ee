use serde::{Deserialize, Serialize};

/// Community (guild) id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u64);

/// Channel id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Role id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

/// User id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Message id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// A stable reference to a posted message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl CommunityId {
    /// Key used for this community in the persisted document.
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl UserId {
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl ChannelId {
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl RoleId {
    pub fn mention(self) -> String {
        format!("<@&{}>", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// Member as seen by the permission checks.
///
/// `has_admin_flag` is the platform's native administrator permission.
#[derive(Clone, Debug)]
pub struct Member {
    pub id: UserId,
    pub community: CommunityId,
    pub has_admin_flag: bool,
    pub roles: Vec<Role>,
}

impl Member {
    pub fn holds_any(&self, ids: &std::collections::BTreeSet<RoleId>) -> bool {
        self.roles.iter().any(|r| ids.contains(&r.id))
    }
}
