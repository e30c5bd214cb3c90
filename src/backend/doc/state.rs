/**
 * Document State Management
 *
 * Server-side registry of open documents and their sessions.
 *
 * Each document owns one `DocumentBroker` behind one
 * `tokio::sync::Mutex`: the document-scoped lock shared by every session
 * of that document. Callback classification, activity switches and
 * forwarding decisions all run under it. The sender queues deliberately
 * live outside this lock, so a slow socket never holds up callback
 * processing for the whole document.
 */
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::backend::doc::{DocumentInfo, DocumentKind};
use crate::backend::session::queue::SenderQueue;
use crate::backend::session::session::Session;
use crate::shared::EngineEvent;

/// All sessions of one document, plus the engine-side document snapshot.
#[derive(Debug)]
pub struct DocumentBroker {
    doc_id: String,
    info: DocumentInfo,
    sessions: HashMap<Uuid, Session>,
    next_view_id: i64,
}

impl DocumentBroker {
    pub fn new(doc_id: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            doc_id: doc_id.into(),
            info: DocumentInfo::new(kind),
            sessions: HashMap::new(),
            next_view_id: 0,
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Register a new session around its connection's queue, allocating
    /// an engine view for it. Returns the session id and view id.
    pub fn add_session(&mut self, queue: Arc<SenderQueue>) -> (Uuid, i64) {
        let id = Uuid::new_v4();
        let view_id = self.next_view_id;
        self.next_view_id += 1;

        let mut session = Session::new(id, queue);
        session.bind_view(view_id);
        self.sessions.insert(id, session);

        tracing::info!(doc = %self.doc_id, session = %id, view_id, "session joined");
        (id, view_id)
    }

    /// Remove and disconnect a session; its queue is stopped.
    pub fn remove_session(&mut self, id: Uuid) -> Option<Session> {
        let mut session = self.sessions.remove(&id)?;
        session.disconnect();
        tracing::info!(doc = %self.doc_id, session = %id, "session left");
        Some(session)
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Mark a session closing; all further callbacks to it are dropped.
    pub fn mark_closing(&mut self, id: Uuid) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.mark_closing();
        }
    }

    /// Record peer activity for a session.
    pub fn touch(&mut self, id: Uuid) -> Option<u128> {
        let session = self.sessions.get_mut(&id)?;
        let idle = session.inactivity_ms();
        session.touch();
        Some(idle)
    }

    /// Flip a session's activity state. Activation replays the events
    /// buffered while inactive.
    pub fn set_session_active(&mut self, id: Uuid, active: bool) {
        let info = self.info.clone();
        if let Some(session) = self.sessions.get_mut(&id) {
            if active {
                session.on_user_active(&info);
            } else {
                session.on_user_inactive();
            }
        }
    }

    /// Deliver one engine callback to every session of this document.
    pub fn broadcast_event(&mut self, event: EngineEvent) {
        let info = self.info.clone();
        for session in self.sessions.values_mut() {
            session.handle_engine_event(&info, event.clone());
        }
    }

    /// Deliver one engine callback to a single session.
    pub fn deliver_event(&mut self, id: Uuid, event: EngineEvent) {
        let info = self.info.clone();
        if let Some(session) = self.sessions.get_mut(&id) {
            session.handle_engine_event(&info, event);
        }
    }

    /// Engine reported a part switch.
    pub fn set_current_part(&mut self, part: i32) {
        self.info.set_current_part(part);
    }

    /// Engine reported a new part count.
    pub fn set_part_count(&mut self, count: i32) {
        self.info.set_part_count(count);
    }
}

/// Map of document ID to its broker.
///
/// Brokers are stored as `Arc<Mutex<..>>` directly so every caller shares
/// the same instance and the same document lock.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    documents: Arc<RwLock<HashMap<String, Arc<Mutex<DocumentBroker>>>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the broker for a document, creating it on first use. The kind
    /// is inferred from the document name.
    pub async fn get_or_create(&self, doc_id: &str) -> Arc<Mutex<DocumentBroker>> {
        {
            let docs = self.documents.read().await;
            if let Some(broker) = docs.get(doc_id) {
                return broker.clone();
            }
        }

        let mut docs = self.documents.write().await;
        docs.entry(doc_id.to_string())
            .or_insert_with(|| {
                tracing::info!(doc = %doc_id, "opening document");
                Arc::new(Mutex::new(DocumentBroker::new(
                    doc_id,
                    DocumentKind::from_name(doc_id),
                )))
            })
            .clone()
    }

    pub async fn get(&self, doc_id: &str) -> Option<Arc<Mutex<DocumentBroker>>> {
        self.documents.read().await.get(doc_id).cloned()
    }

    /// Drop a document once its last session is gone.
    pub async fn remove_if_empty(&self, doc_id: &str) {
        let mut docs = self.documents.write().await;
        let empty = match docs.get(doc_id) {
            Some(broker) => broker.lock().await.session_count() == 0,
            None => return,
        };
        if empty {
            docs.remove(doc_id);
            tracing::info!(doc = %doc_id, "closing document, no sessions left");
        }
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        let docs = self.documents.read().await;
        let mut count = 0;
        for broker in docs.values() {
            count += broker.lock().await.session_count();
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EventType;

    #[tokio::test]
    async fn test_registry_reuses_broker() {
        let registry = DocumentRegistry::new();
        let a = registry.get_or_create("notes.odt").await;
        let b = registry.get_or_create("notes.odt").await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_registry_infers_kind() {
        let registry = DocumentRegistry::new();
        let broker = registry.get_or_create("budget.ods").await;
        assert_eq!(broker.lock().await.info().kind, DocumentKind::Spreadsheet);
    }

    #[tokio::test]
    async fn test_broker_session_lifecycle() {
        let mut broker = DocumentBroker::new("notes.odt", DocumentKind::Text);
        let queue = Arc::new(SenderQueue::new());
        let (id, view_id) = broker.add_session(queue.clone());
        assert_eq!(view_id, 0);
        assert_eq!(broker.session_count(), 1);

        let (_, second_view) = broker.add_session(Arc::new(SenderQueue::new()));
        assert_eq!(second_view, 1);

        let removed = broker.remove_session(id).unwrap();
        assert!(removed.queue().is_stopping());
        assert!(queue.is_stopping());
        assert_eq!(broker.session_count(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_session() {
        let mut broker = DocumentBroker::new("notes.odt", DocumentKind::Text);
        let q1 = Arc::new(SenderQueue::new());
        let q2 = Arc::new(SenderQueue::new());
        broker.add_session(q1.clone());
        broker.add_session(q2.clone());

        broker.broadcast_event(EngineEvent::new(EventType::TextSelection, "1,2,3,4"));
        assert_eq!(q1.size(), 1);
        assert_eq!(q2.size(), 1);
    }

    #[tokio::test]
    async fn test_deliver_targets_one_session() {
        let mut broker = DocumentBroker::new("notes.odt", DocumentKind::Text);
        let q1 = Arc::new(SenderQueue::new());
        let q2 = Arc::new(SenderQueue::new());
        let (id1, _) = broker.add_session(q1.clone());
        broker.add_session(q2.clone());

        broker.deliver_event(id1, EngineEvent::new(EventType::CellCursor, "0,0,1,1"));
        assert_eq!(q1.size(), 1);
        assert_eq!(q2.size(), 0);
    }

    #[tokio::test]
    async fn test_inactive_session_buffers_until_reactivated() {
        let mut broker = DocumentBroker::new("notes.odt", DocumentKind::Text);
        let queue = Arc::new(SenderQueue::new());
        let (id, _) = broker.add_session(queue.clone());

        broker.set_session_active(id, false);
        broker.broadcast_event(EngineEvent::new(EventType::InvalidateTiles, "0,0,10,10,0"));
        assert_eq!(queue.size(), 0);

        broker.set_session_active(id, true);
        assert_eq!(queue.size(), 1);
    }

    #[tokio::test]
    async fn test_remove_if_empty() {
        let registry = DocumentRegistry::new();
        let broker = registry.get_or_create("notes.odt").await;
        let (id, _) = broker.lock().await.add_session(Arc::new(SenderQueue::new()));

        registry.remove_if_empty("notes.odt").await;
        assert_eq!(registry.document_count().await, 1);

        broker.lock().await.remove_session(id);
        registry.remove_if_empty("notes.odt").await;
        assert_eq!(registry.document_count().await, 0);
    }
}
