use tracing::{debug, error, info, warn};

use super::{ActionableEntities, EntitySummary, NodeData, SessionData, SessionExport};
use crate::config::SessionConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::KeyValueStore;

/// Session store over an injected key/value backend.
///
/// Persistence problems never reach the caller: unreadable or corrupted session data
/// reads as empty, and a mutation whose load fails is logged and skipped so the stored
/// list is never overwritten. Use [`SessionStore::clear_corrupted_data`] to reset a
/// damaged slot.
pub struct SessionStore<S> {
    store: S,
    sessions_key: String,
    current_key: String,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create a store using the configured key namespace
    pub fn new(store: S, config: &SessionConfig) -> Self {
        Self {
            store,
            sessions_key: format!("{}_sessions", config.namespace),
            current_key: format!("{}_current_session", config.namespace),
        }
    }

    /// The underlying backend
    pub fn backend(&self) -> &S {
        &self.store
    }

    /// All persisted sessions, oldest first
    pub async fn list_sessions(&self) -> Vec<SessionData> {
        match self.load_sessions().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "Session data unavailable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Persisted sessions, failing on read errors and corrupted data.
    ///
    /// Mutations load through this so a failed read never turns into an overwrite of
    /// the stored list.
    async fn load_sessions(&self) -> StorageResult<Vec<SessionData>> {
        let Some(raw) = self.store.get(&self.sessions_key).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization {
            key: self.sessions_key.clone(),
            message: e.to_string(),
        })
    }

    async fn load_for_update(&self, operation: &str) -> Option<Vec<SessionData>> {
        match self.load_sessions().await {
            Ok(sessions) => Some(sessions),
            Err(e) => {
                error!(error = %e, operation, "Cannot load sessions, change not saved");
                None
            }
        }
    }

    async fn save_sessions(&self, sessions: &[SessionData]) -> bool {
        let raw = match serde_json::to_string(sessions) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to serialize sessions");
                return false;
            }
        };

        match self.store.set(&self.sessions_key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, key = %self.sessions_key, "Failed to save sessions");
                false
            }
        }
    }

    /// Id of the current session, if one is selected
    pub async fn current_session_id(&self) -> Option<String> {
        match self.store.get(&self.current_key).await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                error!(error = %e, key = %self.current_key, "Failed to load current session id");
                None
            }
        }
    }

    async fn save_current_id(&self, id: &str) {
        if let Err(e) = self.store.set(&self.current_key, id).await {
            error!(error = %e, key = %self.current_key, "Failed to save current session id");
        }
    }

    /// The current session, if one is selected and still exists
    pub async fn current_session(&self) -> Option<SessionData> {
        let id = self.current_session_id().await?;
        self.list_sessions().await.into_iter().find(|s| s.id == id)
    }

    /// Create a session and make it current
    pub async fn create_session(&self, name: Option<String>) -> SessionData {
        let session = SessionData::new(name);

        let Some(mut sessions) = self.load_for_update("create_session").await else {
            return session;
        };
        sessions.push(session.clone());
        if self.save_sessions(&sessions).await {
            self.save_current_id(&session.id).await;
        }

        info!(session_id = %session.id, name = %session.name, "Session created");
        session
    }

    /// Select the current session. Unknown ids leave the selection unchanged.
    pub async fn set_current_session(&self, id: &str) -> bool {
        let exists = self.list_sessions().await.iter().any(|s| s.id == id);
        if exists {
            self.save_current_id(id).await;
            debug!(session_id = %id, "Current session changed");
        } else {
            warn!(session_id = %id, "Cannot select unknown session");
        }
        exists
    }

    /// The current session, creating one if none is selected
    pub async fn ensure_current_session(&self) -> SessionData {
        match self.current_session().await {
            Some(session) => session,
            None => self.create_session(None).await,
        }
    }

    /// Append a node to the current session.
    ///
    /// Does nothing and returns `false` when no session is current.
    pub async fn add_node(&self, node: NodeData) -> bool {
        let Some(current_id) = self.current_session_id().await else {
            debug!(node_id = %node.id, "No current session, node dropped");
            return false;
        };

        let Some(mut sessions) = self.load_for_update("add_node").await else {
            return false;
        };
        let Some(session) = sessions.iter_mut().find(|s| s.id == current_id) else {
            debug!(node_id = %node.id, session_id = %current_id, "Current session missing, node dropped");
            return false;
        };

        debug!(
            session_id = %session.id,
            node_id = %node.id,
            api_name = %node.api_name,
            "Adding node"
        );
        session.nodes.push(node);
        session.touch();
        self.save_sessions(&sessions).await
    }

    /// Nodes of the current session in insertion order
    pub async fn get_nodes(&self) -> Vec<NodeData> {
        self.current_session()
            .await
            .map(|s| s.nodes)
            .unwrap_or_default()
    }

    /// Make a session current and return it
    pub async fn load_session(&self, id: &str) -> Option<SessionData> {
        let mut sessions = self.load_for_update("load_session").await?;
        let session = sessions.iter_mut().find(|s| s.id == id)?;
        session.touch();
        let loaded = session.clone();

        if self.save_sessions(&sessions).await {
            self.save_current_id(id).await;
        }

        info!(session_id = %id, nodes = loaded.nodes.len(), "Session loaded");
        Some(loaded)
    }

    /// Rename a session. Blank names are rejected.
    pub async fn rename_session(&self, id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let Some(mut sessions) = self.load_for_update("rename_session").await else {
            return false;
        };
        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        session.name = name.to_string();
        session.touch();
        self.save_sessions(&sessions).await
    }

    /// Delete a session.
    ///
    /// When the deleted session was current, the most recently accessed remaining
    /// session becomes current, or a new empty session is created if none remain.
    pub async fn delete_session(&self, id: &str) -> bool {
        let Some(mut sessions) = self.load_for_update("delete_session").await else {
            return false;
        };
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before || !self.save_sessions(&sessions).await {
            return false;
        }
        info!(session_id = %id, "Session deleted");

        if self.current_session_id().await.as_deref() == Some(id) {
            match sessions.iter().max_by_key(|s| s.last_accessed) {
                Some(next) => {
                    self.save_current_id(&next.id).await;
                    debug!(session_id = %next.id, "Switched to remaining session");
                }
                None => {
                    self.create_session(None).await;
                }
            }
        }
        true
    }

    /// Entity counts across the current session, computed fresh
    pub async fn get_entity_summary(&self) -> EntitySummary {
        EntitySummary::from_nodes(&self.get_nodes().await)
    }

    /// Lead counts across the current session, computed fresh
    pub async fn get_actionable_entities(&self) -> ActionableEntities {
        ActionableEntities::from_nodes(&self.get_nodes().await)
    }

    /// Export a session, or the current one when `id` is `None`
    pub async fn export_session(&self, id: Option<&str>) -> Option<SessionExport> {
        let session = match id {
            Some(id) => self.list_sessions().await.into_iter().find(|s| s.id == id)?,
            None => self.current_session().await?,
        };
        Some(SessionExport::new(session))
    }

    /// Remove all persisted session data
    pub async fn clear_corrupted_data(&self) -> StorageResult<()> {
        self.store.remove(&self.sessions_key).await?;
        self.store.remove(&self.current_key).await?;
        warn!(namespace_key = %self.sessions_key, "Cleared persisted session data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, MockKeyValueStore};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory backend whose reads of the sessions key fail while armed.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing_reads: AtomicUsize,
    }

    impl FlakyStore {
        fn fail_next_reads(&self, count: usize) {
            self.failing_reads.store(count, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            let fail = key == "mnuda_sessions"
                && self
                    .failing_reads
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
            if fail {
                return Err(StorageError::Query {
                    message: "database is locked".to_string(),
                });
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key).await
        }
    }

    fn session_names(sessions: &[SessionData]) -> Vec<&str> {
        sessions.iter().map(|s| s.name.as_str()).collect()
    }

    fn create_store() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new(), &SessionConfig::default())
    }

    #[tokio::test]
    async fn test_add_node_without_current_session_is_noop() {
        let store = create_store();
        let added = store.add_node(NodeData::api_result("search", json!({}))).await;

        assert!(!added);
        assert!(store.list_sessions().await.is_empty());
        assert!(store.get_nodes().await.is_empty());
    }

    #[tokio::test]
    async fn test_nodes_append_in_order() {
        let store = create_store();
        store.create_session(None).await;

        let n1 = NodeData::api_result("search", json!({"PeopleDetails": []}));
        let n2 = NodeData::api_result("details", json!({"Person Details": []}));
        assert!(store.add_node(n1.clone()).await);
        assert!(store.add_node(n2.clone()).await);

        assert_eq!(store.get_nodes().await, vec![n1, n2]);
    }

    #[tokio::test]
    async fn test_create_session_becomes_current() {
        let store = create_store();
        let first = store.create_session(Some("first".to_string())).await;
        let second = store.create_session(Some("second".to_string())).await;

        assert_eq!(store.current_session_id().await, Some(second.id.clone()));
        assert_eq!(store.list_sessions().await.len(), 2);

        assert!(store.set_current_session(&first.id).await);
        assert_eq!(store.current_session_id().await, Some(first.id));

        assert!(!store.set_current_session("missing").await);
        assert_ne!(store.current_session_id().await.as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn test_load_session_switches_current() {
        let store = create_store();
        let first = store.create_session(None).await;
        store.create_session(None).await;

        let loaded = store.load_session(&first.id).await.unwrap();
        assert_eq!(loaded.id, first.id);
        assert!(loaded.last_accessed >= first.last_accessed);
        assert_eq!(store.current_session_id().await, Some(first.id));

        assert!(store.load_session("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_rename_session() {
        let store = create_store();
        let session = store.create_session(None).await;

        assert!(store.rename_session(&session.id, "Hennepin leads").await);
        assert!(!store.rename_session(&session.id, "   ").await);
        assert!(!store.rename_session("missing", "x").await);

        let current = store.current_session().await.unwrap();
        assert_eq!(current.name, "Hennepin leads");
    }

    #[tokio::test]
    async fn test_delete_only_current_session_creates_replacement() {
        let store = create_store();
        let session = store.create_session(None).await;
        store
            .add_node(NodeData::api_result("search", json!({})))
            .await;

        assert!(store.delete_session(&session.id).await);

        let current = store.current_session().await.unwrap();
        assert_ne!(current.id, session.id);
        assert!(current.nodes.is_empty());
        assert_eq!(store.list_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_current_switches_to_sibling() {
        let store = create_store();
        let older = store.create_session(Some("older".to_string())).await;
        let current = store.create_session(Some("current".to_string())).await;

        assert!(store.delete_session(&current.id).await);
        assert_eq!(store.current_session_id().await, Some(older.id));
        assert_eq!(store.list_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_other_session_keeps_current() {
        let store = create_store();
        let other = store.create_session(None).await;
        let current = store.create_session(None).await;

        assert!(store.delete_session(&other.id).await);
        assert_eq!(store.current_session_id().await, Some(current.id));
        assert!(!store.delete_session("missing").await);
    }

    #[tokio::test]
    async fn test_summary_recomputed_each_call() {
        let store = create_store();
        store.create_session(None).await;
        assert_eq!(store.get_entity_summary().await, EntitySummary::default());

        store
            .add_node(NodeData::api_result(
                "details",
                json!({
                    "Email Addresses": ["a@b.co"],
                    "All Relatives": [{"Name": "R"}],
                }),
            ))
            .await;
        let summary = store.get_entity_summary().await;
        assert_eq!(summary.emails, 1);
        assert_eq!(summary.persons, 1);
        assert_eq!(summary.total, 2);

        store
            .add_node(NodeData::api_result(
                "details",
                json!({"Email Addresses": ["c@d.co"]}),
            ))
            .await;
        assert_eq!(store.get_entity_summary().await.emails, 2);
        assert_eq!(store.get_actionable_entities().await.relatives, 1);
    }

    #[tokio::test]
    async fn test_corrupted_sessions_degrade_to_empty() {
        let store = create_store();
        store
            .backend()
            .set("mnuda_sessions", "{not valid json")
            .await
            .unwrap();

        assert!(store.list_sessions().await.is_empty());

        store.clear_corrupted_data().await.unwrap();
        assert!(store.backend().is_empty().await);

        let session = store.create_session(None).await;
        assert_eq!(store.list_sessions().await, vec![session]);
    }

    #[tokio::test]
    async fn test_backend_failures_degrade() {
        let mut backend = MockKeyValueStore::new();
        backend.expect_get().returning(|_| {
            Err(StorageError::Query {
                message: "disk I/O error".to_string(),
            })
        });
        backend.expect_set().returning(|_, _| {
            Err(StorageError::Query {
                message: "disk I/O error".to_string(),
            })
        });

        let store = SessionStore::new(backend, &SessionConfig::default());

        assert!(store.list_sessions().await.is_empty());
        assert!(store.current_session_id().await.is_none());

        let session = store.create_session(Some("offline".to_string())).await;
        assert_eq!(session.name, "offline");
        assert!(!store.add_node(NodeData::api_result("x", json!({}))).await);
        assert_eq!(store.get_entity_summary().await, EntitySummary::default());
    }

    #[tokio::test]
    async fn test_namespaced_keys() {
        let config = SessionConfig {
            namespace: "test".to_string(),
        };
        let store = SessionStore::new(MemoryStore::new(), &config);
        let session = store.create_session(None).await;

        let backend = store.backend();
        assert!(backend.get("test_sessions").await.unwrap().is_some());
        assert_eq!(
            backend.get("test_current_session").await.unwrap(),
            Some(session.id)
        );
    }

    #[tokio::test]
    async fn test_export_current_session() {
        let store = create_store();
        assert!(store.export_session(None).await.is_none());

        let session = store.create_session(None).await;
        store
            .add_node(NodeData::api_result(
                "details",
                json!({"address": {"full": "1 Main St, Minneapolis, MN"}}),
            ))
            .await;

        let export = store.export_session(None).await.unwrap();
        assert_eq!(export.session.id, session.id);
        assert_eq!(export.entities.len(), 1);
        assert_eq!(export.summary.total, 0);

        assert!(store.export_session(Some(&session.id)).await.is_some());
        assert!(store.export_session(Some("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_create_after_failed_read_keeps_existing_sessions() {
        let store = SessionStore::new(FlakyStore::default(), &SessionConfig::default());
        store.create_session(Some("a".to_string())).await;
        let b = store.create_session(Some("b".to_string())).await;

        store.backend().fail_next_reads(1);
        let c = store.create_session(Some("c".to_string())).await;
        assert_eq!(c.name, "c");

        let sessions = store.list_sessions().await;
        assert_eq!(session_names(&sessions), vec!["a", "b"]);
        assert_eq!(store.current_session_id().await, Some(b.id));
    }

    #[tokio::test]
    async fn test_mutations_after_failed_read_are_skipped() {
        let store = SessionStore::new(FlakyStore::default(), &SessionConfig::default());
        let a = store.create_session(Some("a".to_string())).await;
        let b = store.create_session(Some("b".to_string())).await;
        assert!(store.add_node(NodeData::api_result("search", json!({}))).await);

        // add_node reads the list once after resolving the current id.
        store.backend().fail_next_reads(1);
        assert!(!store.add_node(NodeData::api_result("search", json!({}))).await);

        store.backend().fail_next_reads(1);
        assert!(!store.rename_session(&a.id, "renamed").await);

        store.backend().fail_next_reads(1);
        assert!(!store.delete_session(&a.id).await);

        store.backend().fail_next_reads(1);
        assert!(store.load_session(&a.id).await.is_none());

        let sessions = store.list_sessions().await;
        assert_eq!(session_names(&sessions), vec!["a", "b"]);
        assert_eq!(sessions[1].nodes.len(), 1);
        assert_eq!(store.current_session_id().await, Some(b.id));
    }

    #[tokio::test]
    async fn test_create_on_corrupted_slot_leaves_it_for_recovery() {
        let store = create_store();
        store
            .backend()
            .set("mnuda_sessions", "{not valid json")
            .await
            .unwrap();

        store.create_session(Some("new".to_string())).await;

        assert_eq!(
            store.backend().get("mnuda_sessions").await.unwrap().as_deref(),
            Some("{not valid json")
        );
        assert!(store.current_session_id().await.is_none());
    }
}
