//! Per-community configuration store backed by a single JSON document.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    domain::{ChannelId, CommunityId, RoleId},
    Result,
};

/// Role used by the nickname feature when the document does not name one.
pub const DEFAULT_NICKNAME_ROLE_ID: RoleId = RoleId(1359605832236404776);

/// Settings for one community.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub log_channel: Option<ChannelId>,
    /// Reserved; nothing reads it yet.
    pub announcement_channel: Option<ChannelId>,
    pub auto_role: Option<RoleId>,
    pub admin_roles: BTreeSet<RoleId>,
    pub moderator_roles: BTreeSet<RoleId>,
}

/// The whole persisted document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    #[serde(rename = "guilds")]
    pub communities: BTreeMap<String, CommunityConfig>,
    #[serde(rename = "auto_role")]
    pub default_auto_role: Option<RoleId>,
    #[serde(rename = "admin_roles")]
    pub default_admin_roles: BTreeSet<RoleId>,
    #[serde(rename = "moderator_roles")]
    pub default_moderator_roles: BTreeSet<RoleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname_role_id: Option<RoleId>,
}

impl GlobalConfig {
    /// Document written when no file exists yet.
    pub fn initial() -> Self {
        Self {
            nickname_role_id: Some(DEFAULT_NICKNAME_ROLE_ID),
            ..Self::default()
        }
    }
}

/// Where the document lives.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    async fn read(&self) -> Result<Option<GlobalConfig>>;
    async fn write(&self, doc: &GlobalConfig) -> Result<()>;
}

/// Pretty-printed JSON file on disk.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigBackend for JsonFileBackend {
    async fn read(&self) -> Result<Option<GlobalConfig>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        let txt = tokio::fs::read_to_string(&self.path).await?;
        let doc = serde_json::from_str(&txt)?;
        Ok(Some(doc))
    }

    async fn write(&self, doc: &GlobalConfig) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let txt = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&self.path, txt).await?;
        Ok(())
    }
}

#[derive(Default)]
struct CommunityLocks {
    inner: Mutex<HashMap<CommunityId, Arc<Mutex<()>>>>,
}

impl CommunityLocks {
    async fn lock(&self, id: CommunityId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Shared configuration store.
///
/// Constructed once at startup and handed to every handler behind an `Arc`.
/// Mutations of a community record are serialized per community id, and
/// writes to the backend are serialized so the last write always carries the
/// newest state.
pub struct ConfigStore {
    backend: Arc<dyn ConfigBackend>,
    doc: Mutex<GlobalConfig>,
    save_lock: Mutex<()>,
    communities: CommunityLocks,
}

impl ConfigStore {
    /// Load the document from `backend` and wrap it.
    pub async fn open(backend: Arc<dyn ConfigBackend>) -> Self {
        let doc = Self::load(backend.as_ref()).await;
        Self::with_document(backend, doc)
    }

    pub fn with_document(backend: Arc<dyn ConfigBackend>, doc: GlobalConfig) -> Self {
        Self {
            backend,
            doc: Mutex::new(doc),
            save_lock: Mutex::new(()),
            communities: CommunityLocks::default(),
        }
    }

    /// Read the persisted document.
    ///
    /// A missing document is created with defaults. An unreadable one yields an
    /// empty in-memory default that is not written back, so the broken file
    /// stays on disk until something explicitly saves.
    pub async fn load(backend: &dyn ConfigBackend) -> GlobalConfig {
        match backend.read().await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                let doc = GlobalConfig::initial();
                if let Err(e) = backend.write(&doc).await {
                    tracing::error!("failed to write default config: {e}");
                }
                doc
            }
            Err(e) => {
                tracing::error!("failed to load config, using empty defaults: {e}");
                GlobalConfig::default()
            }
        }
    }

    /// Persist `doc`, or the current document when `None`.
    ///
    /// Failures are logged; the in-memory document is kept either way.
    pub async fn save(&self, doc: Option<&GlobalConfig>) {
        if let Err(e) = self.try_save(doc).await {
            tracing::error!("failed to save config: {e}");
        }
    }

    async fn try_save(&self, doc: Option<&GlobalConfig>) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        match doc {
            Some(doc) => self.backend.write(doc).await,
            None => {
                let snapshot = self.doc.lock().await.clone();
                self.backend.write(&snapshot).await
            }
        }
    }

    /// Record for `id`, created (and persisted) on first access.
    pub async fn get_community_config(&self, id: CommunityId) -> CommunityConfig {
        let _guard = self.communities.lock(id).await;
        self.ensure_community(id).await
    }

    // Only place a community record is created. Callers hold the community lock.
    async fn ensure_community(&self, id: CommunityId) -> CommunityConfig {
        let created = {
            let mut doc = self.doc.lock().await;
            if let Some(existing) = doc.communities.get(&id.key()) {
                return existing.clone();
            }
            let fresh = CommunityConfig::default();
            doc.communities.insert(id.key(), fresh.clone());
            fresh
        };
        tracing::debug!(community = id.0, "created community config");
        self.save(None).await;
        created
    }

    /// Read-modify-write on one community record. Saves when `f` reports a change.
    async fn update_community<F>(&self, id: CommunityId, f: F) -> bool
    where
        F: FnOnce(&mut CommunityConfig) -> bool,
    {
        let _guard = self.communities.lock(id).await;
        self.ensure_community(id).await;

        let changed = {
            let mut doc = self.doc.lock().await;
            match doc.communities.get_mut(&id.key()) {
                Some(record) => f(record),
                None => false,
            }
        };
        if changed {
            self.save(None).await;
        }
        changed
    }

    pub async fn set_log_channel(&self, id: CommunityId, channel: ChannelId) {
        self.update_community(id, |c| {
            c.log_channel = Some(channel);
            true
        })
        .await;
    }

    pub async fn set_auto_role(&self, id: CommunityId, role: RoleId) {
        self.update_community(id, |c| {
            c.auto_role = Some(role);
            true
        })
        .await;
    }

    /// Returns `true` when the role was newly added.
    pub async fn add_admin_role(&self, id: CommunityId, role: RoleId) -> bool {
        self.update_community(id, |c| c.admin_roles.insert(role))
            .await
    }

    /// Returns `true` when the role was newly added.
    pub async fn add_moderator_role(&self, id: CommunityId, role: RoleId) -> bool {
        self.update_community(id, |c| c.moderator_roles.insert(role))
            .await
    }

    /// Community auto-role when `id` is given, otherwise the global fallback.
    pub async fn get_auto_role(&self, id: Option<CommunityId>) -> Option<RoleId> {
        match id {
            Some(id) => self.get_community_config(id).await.auto_role,
            None => self.doc.lock().await.default_auto_role,
        }
    }

    pub async fn get_log_channel(&self, id: CommunityId) -> Option<ChannelId> {
        self.get_community_config(id).await.log_channel
    }

    pub async fn get_nickname_role_id(&self) -> RoleId {
        self.doc
            .lock()
            .await
            .nickname_role_id
            .unwrap_or(DEFAULT_NICKNAME_ROLE_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;

    fn tmp(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("modbot-store-{}-{name}", std::process::id()))
    }

    async fn fresh_store() -> (Arc<MemoryBackend>, ConfigStore) {
        let backend = Arc::new(MemoryBackend::default());
        let store = ConfigStore::with_document(backend.clone(), GlobalConfig::initial());
        (backend, store)
    }

    #[tokio::test]
    async fn unseen_community_is_created_with_defaults_and_saved_once() {
        let (backend, store) = fresh_store().await;

        let cfg = store.get_community_config(CommunityId(7)).await;
        assert_eq!(cfg, CommunityConfig::default());
        assert_eq!(backend.write_count(), 1);

        // Second access finds the record and does not write again.
        store.get_community_config(CommunityId(7)).await;
        assert_eq!(backend.write_count(), 1);
        assert!(backend.stored().unwrap().communities.contains_key("7"));
    }

    #[tokio::test]
    async fn adding_same_admin_role_twice_is_a_noop() {
        let (backend, store) = fresh_store().await;
        store.get_community_config(CommunityId(1)).await;
        let before = backend.write_count();

        assert!(store.add_admin_role(CommunityId(1), RoleId(9)).await);
        assert!(!store.add_admin_role(CommunityId(1), RoleId(9)).await);

        let cfg = store.get_community_config(CommunityId(1)).await;
        assert_eq!(cfg.admin_roles.len(), 1);
        assert_eq!(backend.write_count(), before + 1);
    }

    #[tokio::test]
    async fn adding_same_moderator_role_twice_is_a_noop() {
        let (backend, store) = fresh_store().await;
        store.get_community_config(CommunityId(1)).await;
        let before = backend.write_count();

        assert!(store.add_moderator_role(CommunityId(1), RoleId(3)).await);
        assert!(!store.add_moderator_role(CommunityId(1), RoleId(3)).await);

        let cfg = store.get_community_config(CommunityId(1)).await;
        assert_eq!(cfg.moderator_roles.into_iter().collect::<Vec<_>>(), vec![RoleId(3)]);
        assert_eq!(backend.write_count(), before + 1);
    }

    #[tokio::test]
    async fn set_log_channel_on_unseen_community_leaves_other_fields_default() {
        let (_backend, store) = fresh_store().await;
        store.set_log_channel(CommunityId(100), ChannelId(55)).await;

        let cfg = store.get_community_config(CommunityId(100)).await;
        assert_eq!(cfg.log_channel, Some(ChannelId(55)));
        assert_eq!(
            cfg,
            CommunityConfig {
                log_channel: Some(ChannelId(55)),
                ..CommunityConfig::default()
            }
        );
        assert_eq!(store.get_log_channel(CommunityId(100)).await, Some(ChannelId(55)));
    }

    #[tokio::test]
    async fn auto_role_lookup_distinguishes_community_and_global() {
        let backend = Arc::new(MemoryBackend::default());
        let doc = GlobalConfig {
            default_auto_role: Some(RoleId(42)),
            ..GlobalConfig::initial()
        };
        let store = ConfigStore::with_document(backend, doc);

        store.set_auto_role(CommunityId(5), RoleId(8)).await;
        assert_eq!(store.get_auto_role(Some(CommunityId(5))).await, Some(RoleId(8)));
        assert_eq!(store.get_auto_role(None).await, Some(RoleId(42)));
        assert_eq!(store.get_auto_role(Some(CommunityId(6))).await, None);
    }

    #[tokio::test]
    async fn missing_document_is_created_with_nickname_default() {
        let backend = MemoryBackend::default();
        let doc = ConfigStore::load(&backend).await;

        assert_eq!(doc, GlobalConfig::initial());
        assert_eq!(backend.write_count(), 1);
        assert_eq!(backend.stored(), Some(GlobalConfig::initial()));
    }

    #[tokio::test]
    async fn unreadable_document_falls_back_without_overwriting() {
        let backend = MemoryBackend {
            fail_reads: true,
            ..MemoryBackend::default()
        };
        let doc = ConfigStore::load(&backend).await;

        assert_eq!(doc, GlobalConfig::default());
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn nickname_role_falls_back_to_literal() {
        let backend = Arc::new(MemoryBackend::default());
        let store = ConfigStore::with_document(backend, GlobalConfig::default());
        assert_eq!(store.get_nickname_role_id().await, DEFAULT_NICKNAME_ROLE_ID);

        let backend = Arc::new(MemoryBackend::default());
        let doc = GlobalConfig {
            nickname_role_id: Some(RoleId(77)),
            ..GlobalConfig::default()
        };
        let store = ConfigStore::with_document(backend, doc);
        assert_eq!(store.get_nickname_role_id().await, RoleId(77));
    }

    #[tokio::test]
    async fn failed_save_keeps_memory() {
        let backend = Arc::new(MemoryBackend {
            fail_writes: true,
            ..MemoryBackend::default()
        });
        let store = ConfigStore::with_document(backend.clone(), GlobalConfig::initial());

        store.set_log_channel(CommunityId(2), ChannelId(3)).await;
        assert_eq!(store.get_log_channel(CommunityId(2)).await, Some(ChannelId(3)));
        assert!(backend.stored().is_none());
    }

    #[tokio::test]
    async fn explicit_document_save_leaves_memory_alone() {
        let (backend, store) = fresh_store().await;
        let other = GlobalConfig {
            default_auto_role: Some(RoleId(1)),
            ..GlobalConfig::default()
        };

        store.save(Some(&other)).await;
        assert_eq!(backend.stored(), Some(other));
        assert_eq!(store.get_auto_role(None).await, None);

        store.save(None).await;
        assert_eq!(backend.stored(), Some(GlobalConfig::initial()));
    }

    #[tokio::test]
    async fn concurrent_inserts_on_one_community_are_not_lost() {
        let (backend, store) = fresh_store().await;
        let store = Arc::new(store);

        let mut tasks = Vec::new();
        for role in 0..16u64 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.add_admin_role(CommunityId(9), RoleId(role)).await;
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let cfg = store.get_community_config(CommunityId(9)).await;
        assert_eq!(cfg.admin_roles.len(), 16);
        assert_eq!(
            backend.stored().unwrap().communities["9"].admin_roles.len(),
            16
        );
    }

    #[tokio::test]
    async fn json_file_round_trip() {
        let path = tmp("roundtrip").join("nested").join("config.json");
        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
        let backend = JsonFileBackend::new(&path);

        let mut doc = GlobalConfig::initial();
        doc.default_auto_role = Some(RoleId(42));
        doc.default_admin_roles.insert(RoleId(1));
        doc.communities.insert(
            "100".to_string(),
            CommunityConfig {
                log_channel: Some(ChannelId(55)),
                announcement_channel: None,
                auto_role: Some(RoleId(4)),
                admin_roles: [RoleId(10), RoleId(11)].into_iter().collect(),
                moderator_roles: [RoleId(12)].into_iter().collect(),
            },
        );

        backend.write(&doc).await.unwrap();
        let reloaded = ConfigStore::load(&backend).await;
        assert_eq!(reloaded, doc);

        let _ = std::fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }

    #[tokio::test]
    async fn json_file_reads_canonical_shape() {
        let path = tmp("canonical.json");
        std::fs::write(
            &path,
            r#"{
  "guilds": {
    "100": {
      "log_channel": 55,
      "announcement_channel": null,
      "auto_role": null,
      "admin_roles": [1, 1, 2],
      "moderator_roles": []
    }
  },
  "auto_role": 42,
  "admin_roles": [],
  "moderator_roles": [],
  "nickname_role_id": 1359605832236404776
}"#,
        )
        .unwrap();

        let doc = ConfigStore::load(&JsonFileBackend::new(&path)).await;
        let community = &doc.communities["100"];
        assert_eq!(community.log_channel, Some(ChannelId(55)));
        assert_eq!(community.admin_roles.len(), 2);
        assert_eq!(doc.default_auto_role, Some(RoleId(42)));
        assert_eq!(doc.nickname_role_id, Some(DEFAULT_NICKNAME_ROLE_ID));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn store_saves_and_reopens_from_file() {
        let path = tmp("reopen").join("config.json");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        let backend: Arc<dyn ConfigBackend> = Arc::new(JsonFileBackend::new(&path));

        let store = ConfigStore::open(backend.clone()).await;
        store.set_log_channel(CommunityId(100), ChannelId(55)).await;
        store.set_auto_role(CommunityId(100), RoleId(4)).await;
        store.add_admin_role(CommunityId(100), RoleId(10)).await;
        store.add_moderator_role(CommunityId(100), RoleId(12)).await;
        store.doc.lock().await.default_auto_role = Some(RoleId(42));
        store.save(None).await;

        let reopened = ConfigStore::open(backend).await;
        assert_eq!(
            *reopened.doc.lock().await,
            store.doc.lock().await.clone()
        );
        assert_eq!(reopened.get_auto_role(None).await, Some(RoleId(42)));
        assert_eq!(
            reopened.get_log_channel(CommunityId(100)).await,
            Some(ChannelId(55))
        );
        let cfg = reopened.get_community_config(CommunityId(100)).await;
        assert!(cfg.admin_roles.contains(&RoleId(10)));
        assert!(cfg.moderator_roles.contains(&RoleId(12)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn corrupt_json_file_is_left_in_place() {
        let path = tmp("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let doc = ConfigStore::load(&JsonFileBackend::new(&path)).await;
        assert_eq!(doc, GlobalConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");

        let _ = std::fs::remove_file(&path);
    }
}
