//! Test doubles shared by the handler tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{ChannelId, CommunityId, Member, MessageId, MessageRef, Role, RoleId, UserId},
    errors::Error,
    messaging::{port::GatewayPort, types::Notice},
    store::{ConfigBackend, GlobalConfig},
    Result,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Delete(MessageRef),
    Send {
        channel: ChannelId,
        notice: Notice,
        expire_after: Option<Duration>,
    },
    AddRole {
        community: CommunityId,
        user: UserId,
        role: RoleId,
    },
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    channels: HashSet<ChannelId>,
    roles: HashMap<RoleId, Role>,
    members: HashMap<UserId, Member>,
    fail_lookup: bool,
    fail_delete: bool,
    fail_send: bool,
    fail_add_role: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub fn with_channel(mut self, id: u64) -> Self {
        self.channels.insert(ChannelId(id));
        self
    }

    pub fn with_role(mut self, id: u64, name: &str) -> Self {
        self.roles.insert(
            RoleId(id),
            Role {
                id: RoleId(id),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.insert(member.id, member);
        self
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    pub fn failing_add_role(mut self) -> Self {
        self.fail_add_role = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<(ChannelId, Notice, Option<Duration>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send {
                    channel,
                    notice,
                    expire_after,
                } => Some((channel, notice, expire_after)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GatewayPort for FakeGateway {
    async fn resolve_channel(
        &self,
        _community: CommunityId,
        channel: ChannelId,
    ) -> Result<Option<ChannelId>> {
        if self.fail_lookup {
            return Err(Error::External("service unavailable".to_string()));
        }
        Ok(self.channels.get(&channel).copied())
    }

    async fn resolve_role(&self, _community: CommunityId, role: RoleId) -> Result<Option<Role>> {
        Ok(self.roles.get(&role).cloned())
    }

    async fn fetch_member(&self, _community: CommunityId, user: UserId) -> Result<Option<Member>> {
        Ok(self.members.get(&user).cloned())
    }

    async fn send_notice(
        &self,
        channel: ChannelId,
        notice: Notice,
        expire_after: Option<Duration>,
    ) -> Result<MessageRef> {
        self.record(Call::Send {
            channel,
            notice,
            expire_after,
        });
        if self.fail_send {
            return Err(Error::External("missing permissions".to_string()));
        }
        Ok(MessageRef {
            channel_id: channel,
            message_id: MessageId(1),
        })
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.record(Call::Delete(msg));
        if self.fail_delete {
            return Err(Error::External("unknown message".to_string()));
        }
        Ok(())
    }

    async fn add_role(&self, community: CommunityId, user: UserId, role: RoleId) -> Result<()> {
        self.record(Call::AddRole {
            community,
            user,
            role,
        });
        if self.fail_add_role {
            return Err(Error::External("role hierarchy".to_string()));
        }
        Ok(())
    }
}

/// In-memory backend that records every write.
#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub stored: Mutex<Option<GlobalConfig>>,
    pub writes: Mutex<usize>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemoryBackend {
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn stored(&self) -> Option<GlobalConfig> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn read(&self) -> Result<Option<GlobalConfig>> {
        if self.fail_reads {
            return Err(Error::External("corrupt".to_string()));
        }
        Ok(self.stored())
    }

    async fn write(&self, doc: &GlobalConfig) -> Result<()> {
        *self.writes.lock().unwrap() += 1;
        if self.fail_writes {
            return Err(Error::External("disk full".to_string()));
        }
        *self.stored.lock().unwrap() = Some(doc.clone());
        Ok(())
    }
}
