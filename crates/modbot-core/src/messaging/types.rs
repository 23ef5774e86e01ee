use chrono::{DateTime, Utc};

use crate::domain::UserId;

/// Embed color (RGB).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const GREEN: Color = Color(0x2ecc71);
    pub const ORANGE: Color = Color(0xe67e22);
    pub const RED: Color = Color(0xe74c3c);
}

/// Structured record delivered to a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: Color,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: Color) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Outgoing message: an embed, optionally pinging one user.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub mention: Option<UserId>,
    pub embed: Embed,
}

impl Notice {
    pub fn embed(embed: Embed) -> Self {
        Self {
            mention: None,
            embed,
        }
    }

    pub fn to(user: UserId, embed: Embed) -> Self {
        Self {
            mention: Some(user),
            embed,
        }
    }
}
