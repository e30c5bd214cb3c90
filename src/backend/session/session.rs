/**
 * Session Orchestrator
 *
 * One `Session` per connected user. On each engine callback it decides,
 * from the session's activity state, whether to forward the event
 * immediately into the sender queue or to hand it to the state recorder;
 * on reactivation it drains the recorder in a fixed order and feeds every
 * buffered event back through the same live forwarding path.
 *
 * Replay order: global invalidation first (so narrower notifications are
 * not themselves stale), then per-view and per-type current values, then
 * the causally ordered sequence (comments, redlines) which may reference
 * objects the prior steps just positioned, and finally coarse state-change
 * signals.
 *
 * All methods take `&mut self` and run under the owning document's lock;
 * the replay reuses the forwarding path as plain method calls, so no lock
 * recursion is involved.
 */
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::doc::DocumentAccessor;
use crate::backend::session::classifier::{classify, MergePolicy};
use crate::backend::session::queue::SenderQueue;
use crate::backend::session::recorder::StateRecorder;
use crate::shared::protocol::{self, TileInvalidation};
use crate::shared::{Command, EngineEvent, EventType, OutboundMessage};

/// One user's logical connection to a shared document.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    view_id: Option<i64>,
    active: bool,
    closing: bool,
    disconnected: bool,
    recorder: StateRecorder,
    queue: Arc<SenderQueue>,
    connected_at: DateTime<Utc>,
    last_activity: Instant,
}

impl Session {
    /// Create a session around its connection's sender queue. Sessions
    /// start active; the engine view is bound separately once allocated.
    pub fn new(id: Uuid, queue: Arc<SenderQueue>) -> Self {
        Self {
            id,
            view_id: None,
            active: true,
            closing: false,
            disconnected: false,
            recorder: StateRecorder::new(),
            queue,
            connected_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bind the engine view this session renders through.
    pub fn bind_view(&mut self, view_id: i64) {
        self.view_id = Some(view_id);
    }

    pub fn view_id(&self) -> Option<i64> {
        self.view_id
    }

    pub fn queue(&self) -> &Arc<SenderQueue> {
        &self.queue
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Record peer activity (any inbound frame counts).
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Milliseconds since the last inbound frame.
    pub fn inactivity_ms(&self) -> u128 {
        self.last_activity.elapsed().as_millis()
    }

    /// The peer started closing; suppress all further callbacks.
    pub fn mark_closing(&mut self) {
        self.closing = true;
    }

    /// The connection is gone; stop the queue and suppress callbacks.
    pub fn disconnect(&mut self) {
        if !self.disconnected {
            self.disconnected = true;
            self.queue.stop();
        }
    }

    /// The user stopped interacting; start buffering instead of sending.
    pub fn on_user_inactive(&mut self) {
        tracing::debug!(session = %self.id, "session inactive, buffering events");
        self.active = false;
    }

    /// The user is interacting again: mark active and replay everything
    /// buffered during inactivity, through the live forwarding path.
    ///
    /// Panics if no engine view is bound; replaying without a session
    /// context is a programming error, not a runtime condition.
    pub fn on_user_active(&mut self, doc: &dyn DocumentAccessor) {
        assert!(
            self.view_id.is_some(),
            "replay requested for a session without a bound view"
        );

        self.active = true;
        let current_part = doc.current_part();

        // Re-establish the client's part selection ahead of any
        // invalidation. Text documents have a single logical part.
        if !doc.is_text_document() {
            self.queue.enqueue(OutboundMessage::text(
                Command::CurPart,
                format!("part={}", current_part),
            ));
            self.queue.enqueue(OutboundMessage::text(
                Command::SetPart,
                format!("part={}", current_part),
            ));
        }

        let recorded = self.recorder.take();

        if recorded.invalidate {
            self.forward_live(doc, EngineEvent::invalidate_all(current_part));
        }

        for (view_id, events) in recorded.view_events {
            for (_, event) in events {
                tracing::trace!(session = %self.id, view_id, ?event.event_type,
                    "replaying missed view event");
                self.forward_live(doc, event);
            }
        }

        for (_, event) in recorded.events {
            tracing::trace!(session = %self.id, ?event.event_type, "replaying missed event");
            self.forward_live(doc, event);
        }

        for event in recorded.sequence {
            tracing::trace!(session = %self.id, ?event.event_type,
                "replaying missed event (part of sequence)");
            self.forward_live(doc, event);
        }

        for (name, event) in recorded.states {
            tracing::trace!(session = %self.id, %name, "replaying missed state change");
            self.forward_live(doc, event);
        }

        tracing::debug!(session = %self.id, "finished replaying missed events");
    }

    /// Entry point for every engine callback addressed to this session.
    pub fn handle_engine_event(&mut self, doc: &dyn DocumentAccessor, event: EngineEvent) {
        if self.closing {
            tracing::trace!(session = %self.id, ?event.event_type,
                "skipping callback on closing session");
            return;
        }
        if self.disconnected {
            tracing::trace!(session = %self.id, ?event.event_type,
                "skipping callback on disconnected session");
            return;
        }

        if !self.active {
            self.record_for_inactive_user(doc, event);
            return;
        }

        self.forward_live(doc, event);
    }

    /// Buffer one event for later replay, per its merge policy.
    fn record_for_inactive_user(&mut self, doc: &dyn DocumentAccessor, event: EngineEvent) {
        match classify(event.event_type) {
            MergePolicy::PassThrough => {
                // Save completion reaches the client even when idle.
                self.forward_live(doc, event);
            }
            MergePolicy::GlobalInvalidate => self.recorder.record_invalidate(),
            MergePolicy::LatestPerType => self.recorder.record_event(event),
            MergePolicy::LatestPerView => match protocol::view_id_from_json(&event.payload) {
                Ok(view_id) => self.recorder.record_view_event(view_id, event),
                Err(err) => {
                    // Unkeyable: fall back to the non-deduplicating
                    // sequence rather than losing the event.
                    tracing::warn!(session = %self.id, %err,
                        "per-view event without parsable viewId, recording unkeyed");
                    self.recorder.record_sequence(event);
                }
            },
            MergePolicy::LatestPerState => {
                match protocol::parse_name_value(&event.payload, '=') {
                    Some((name, _)) => {
                        let name = name.to_string();
                        self.recorder.record_state(name, event);
                    }
                    None => {
                        tracing::warn!(session = %self.id, payload = %event.payload,
                            "state change without name=value payload, dropping");
                    }
                }
            }
            MergePolicy::OrderedSequence => self.recorder.record_sequence(event),
            MergePolicy::LiveOnly => {
                tracing::trace!(session = %self.id, ?event.event_type,
                    "skipping callback on inactive session");
            }
        }
    }

    /// Translate one engine event into wire frames and enqueue them.
    fn forward_live(&mut self, doc: &dyn DocumentAccessor, event: EngineEvent) {
        use EventType::*;

        let EngineEvent { event_type, payload } = event;
        match event_type {
            InvalidateTiles => {
                let invalidation = TileInvalidation::parse(&payload, doc.is_text_document());
                self.queue.enqueue(OutboundMessage::text(
                    Command::InvalidateTiles,
                    invalidation.wire_payload(),
                ));
            }
            DocumentSizeChanged => {
                // A resized document dirties every part wholesale.
                for part in 0..doc.part_count() {
                    let full = TileInvalidation::Rect {
                        part,
                        x: 0,
                        y: 0,
                        width: i32::MAX,
                        height: i32::MAX,
                    };
                    self.queue.enqueue(OutboundMessage::text(
                        Command::InvalidateTiles,
                        full.wire_payload(),
                    ));
                }
            }
            InvalidateVisibleCursor => self.enqueue_text(Command::InvalidateCursor, payload),
            CursorVisible => self.enqueue_text(Command::CursorVisible, payload),
            TextSelection => self.enqueue_text(Command::TextSelection, payload),
            TextSelectionStart => self.enqueue_text(Command::TextSelectionStart, payload),
            TextSelectionEnd => self.enqueue_text(Command::TextSelectionEnd, payload),
            CellFormula => self.enqueue_text(Command::CellFormula, payload),
            CellCursor => self.enqueue_text(Command::CellCursor, payload),
            CellAddress => self.enqueue_text(Command::CellAddress, payload),
            GraphicSelection => self.enqueue_text(Command::GraphicSelection, payload),
            InvalidateHeader => self.enqueue_text(Command::InvalidateHeader, payload),
            InvalidateViewCursor => self.enqueue_text(Command::InvalidateViewCursor, payload),
            TextViewSelection => self.enqueue_text(Command::TextViewSelection, payload),
            CellViewCursor => self.enqueue_text(Command::CellViewCursor, payload),
            GraphicViewSelection => self.enqueue_text(Command::GraphicViewSelection, payload),
            ViewCursorVisible => self.enqueue_text(Command::ViewCursorVisible, payload),
            ViewLock => self.enqueue_text(Command::ViewLock, payload),
            StateChanged => self.enqueue_text(Command::StateChanged, payload),
            RedlineTableSizeChanged => self.enqueue_text(Command::RedlineTableChanged, payload),
            RedlineTableEntryModified => self.enqueue_text(Command::RedlineTableModified, payload),
            Comment => self.enqueue_text(Command::Comment, payload),
            SaveResult => self.enqueue_text(Command::SaveResult, payload),
            StatusIndicatorStart => self.enqueue_text(Command::StatusIndicatorStart, String::new()),
            StatusIndicatorSetValue => {
                self.enqueue_text(Command::StatusIndicatorSetValue, payload)
            }
            StatusIndicatorFinish => {
                self.enqueue_text(Command::StatusIndicatorFinish, String::new())
            }
            SetPart => self.enqueue_text(Command::SetPart, payload),
            SearchNotFound => self.enqueue_text(Command::SearchNotFound, payload),
            SearchResultSelection => self.enqueue_text(Command::SearchResultSelection, payload),
            MousePointer => self.enqueue_text(Command::MousePointer, payload),
            HyperlinkClicked => self.enqueue_text(Command::HyperlinkClicked, payload),
            RulerUpdate => self.enqueue_text(Command::RulerUpdate, payload),
            Window => self.enqueue_text(Command::Window, payload),
        }
    }

    fn enqueue_text(&mut self, command: Command, payload: String) {
        self.queue.enqueue(OutboundMessage::text(command, payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::doc::{DocumentInfo, DocumentKind};

    fn text_doc() -> DocumentInfo {
        DocumentInfo::new(DocumentKind::Text)
    }

    fn spreadsheet(parts: i32, current: i32) -> DocumentInfo {
        let mut info = DocumentInfo::new(DocumentKind::Spreadsheet);
        info.set_part_count(parts);
        info.set_current_part(current);
        info
    }

    fn session() -> Session {
        let mut session = Session::new(Uuid::new_v4(), Arc::new(SenderQueue::new()));
        session.bind_view(0);
        session
    }

    fn drain_lines(session: &Session) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(msg) = session.queue().dequeue() {
            lines.push(msg.first_line());
        }
        lines
    }

    #[test]
    fn test_active_session_forwards_immediately() {
        let mut session = session();
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::TextSelection, "1,2,3,4"),
        );
        assert_eq!(drain_lines(&session), ["textselection: 1,2,3,4"]);
    }

    #[test]
    fn test_inactive_session_buffers_instead_of_sending() {
        let mut session = session();
        session.on_user_inactive();
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::TextSelection, "1,2,3,4"),
        );
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_save_result_passes_through_while_inactive() {
        let mut session = session();
        session.on_user_inactive();
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::SaveResult, "{\"success\":true}"),
        );
        assert_eq!(drain_lines(&session), ["saveresult: {\"success\":true}"]);
    }

    #[test]
    fn test_replay_order_and_clear() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();

        session.handle_engine_event(&doc, EngineEvent::new(EventType::InvalidateTiles, "0,0,10,10,0"));
        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::InvalidateVisibleCursor, "10,10,1,1"),
        );
        session.handle_engine_event(&doc, EngineEvent::new(EventType::Comment, "{\"n\":1}"));
        session.handle_engine_event(&doc, EngineEvent::new(EventType::Comment, "{\"n\":2}"));
        session.handle_engine_event(&doc, EngineEvent::state_changed(".uno:Bold", "true"));
        assert_eq!(session.queue().size(), 0);

        session.on_user_active(&doc);
        assert_eq!(
            drain_lines(&session),
            [
                format!(
                    "invalidatetiles: part=0 x=0 y=0 width={} height={}",
                    i32::MAX,
                    i32::MAX
                ),
                "invalidatecursor: 10,10,1,1".to_string(),
                "comment: {\"n\":1}".to_string(),
                "comment: {\"n\":2}".to_string(),
                "statechanged: .uno:Bold=true".to_string(),
            ]
        );

        // Unconditional clear: a second reactivation replays nothing.
        session.on_user_inactive();
        session.on_user_active(&doc);
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_replay_view_events_precede_own_events() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();

        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::CellCursor, "0,0,10,10"),
        );
        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::InvalidateViewCursor, "{\"viewId\":2,\"r\":\"x\"}"),
        );

        session.on_user_active(&doc);
        assert_eq!(
            drain_lines(&session),
            [
                "invalidateviewcursor: {\"viewId\":2,\"r\":\"x\"}",
                "cellcursor: 0,0,10,10",
            ]
        );
    }

    #[test]
    fn test_replay_buffers_latest_only() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();

        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::CellCursor, "0,0,10,10"),
        );
        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::CellCursor, "5,5,10,10"),
        );
        session.handle_engine_event(&doc, EngineEvent::state_changed(".uno:Bold", "true"));
        session.handle_engine_event(&doc, EngineEvent::state_changed(".uno:Bold", "false"));

        session.on_user_active(&doc);
        assert_eq!(
            drain_lines(&session),
            ["cellcursor: 5,5,10,10", "statechanged: .uno:Bold=false"]
        );
    }

    #[test]
    fn test_reactivation_of_spreadsheet_resyncs_part() {
        let doc = spreadsheet(3, 2);
        let mut session = session();
        session.on_user_inactive();
        session.handle_engine_event(&doc, EngineEvent::new(EventType::InvalidateTiles, "EMPTY, 2"));

        session.on_user_active(&doc);
        assert_eq!(
            drain_lines(&session),
            [
                "curpart: part=2".to_string(),
                "setpart: part=2".to_string(),
                format!(
                    "invalidatetiles: part=2 x=0 y=0 width={} height={}",
                    i32::MAX,
                    i32::MAX
                ),
            ]
        );
    }

    #[test]
    fn test_view_event_without_view_id_survives_in_order() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();

        session.handle_engine_event(&doc, EngineEvent::new(EventType::Comment, "{\"n\":1}"));
        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::ViewLock, "not json at all"),
        );

        session.on_user_active(&doc);
        assert_eq!(
            drain_lines(&session),
            ["comment: {\"n\":1}", "viewlock: not json at all"]
        );
    }

    #[test]
    fn test_state_change_without_pair_is_dropped() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();
        session.handle_engine_event(&doc, EngineEvent::new(EventType::StateChanged, "garbled"));

        session.on_user_active(&doc);
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_live_only_events_dropped_while_inactive() {
        let doc = text_doc();
        let mut session = session();
        session.on_user_inactive();
        session.handle_engine_event(
            &doc,
            EngineEvent::new(EventType::StatusIndicatorSetValue, "40"),
        );

        session.on_user_active(&doc);
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_closing_session_suppresses_callbacks() {
        let mut session = session();
        session.mark_closing();
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::TextSelection, "1,2,3,4"),
        );
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_disconnect_stops_queue() {
        let mut session = session();
        session.disconnect();
        assert!(session.queue().is_stopping());
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::TextSelection, "1,2,3,4"),
        );
        assert_eq!(session.queue().size(), 0);
    }

    #[test]
    fn test_tile_invalidation_clamps_for_text_doc() {
        let mut session = session();
        session.handle_engine_event(
            &text_doc(),
            EngineEvent::new(EventType::InvalidateTiles, "0, 0, 100, 100, 7"),
        );
        assert_eq!(
            drain_lines(&session),
            ["invalidatetiles: part=0 x=0 y=0 width=100 height=100"]
        );
    }

    #[test]
    fn test_document_size_change_invalidates_every_part() {
        let mut session = session();
        session.handle_engine_event(
            &spreadsheet(2, 0),
            EngineEvent::new(EventType::DocumentSizeChanged, "10000, 20000"),
        );
        assert_eq!(
            drain_lines(&session),
            [
                format!(
                    "invalidatetiles: part=0 x=0 y=0 width={} height={}",
                    i32::MAX,
                    i32::MAX
                ),
                format!(
                    "invalidatetiles: part=1 x=0 y=0 width={} height={}",
                    i32::MAX,
                    i32::MAX
                ),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "without a bound view")]
    fn test_replay_without_view_is_a_programming_error() {
        let mut session = Session::new(Uuid::new_v4(), Arc::new(SenderQueue::new()));
        session.on_user_active(&text_doc());
    }
}
