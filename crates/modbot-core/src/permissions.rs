use crate::{domain::Member, store::CommunityConfig};

// ============== Authorization tiers ==============

/// Native administrator flag, or any role listed in `admin_roles`.
pub fn is_admin(member: &Member, cfg: &CommunityConfig) -> bool {
    member.has_admin_flag || member.holds_any(&cfg.admin_roles)
}

/// Admins, plus anyone holding a role listed in `moderator_roles`.
pub fn is_moderator(member: &Member, cfg: &CommunityConfig) -> bool {
    is_admin(member, cfg) || member.holds_any(&cfg.moderator_roles)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Member,
    Moderator,
    Admin,
}

pub fn tier(member: &Member, cfg: &CommunityConfig) -> Tier {
    if is_admin(member, cfg) {
        Tier::Admin
    } else if is_moderator(member, cfg) {
        Tier::Moderator
    } else {
        Tier::Member
    }
}
