/**
 * State Recorder
 *
 * Per-session buffer for engine events that arrive while the user is
 * inactive. Five independent slots:
 *
 * - an invalidate latch ("everything needs redraw"),
 * - latest event per type,
 * - latest event per (view, type),
 * - latest event per named state key,
 * - an append-only sequence that preserves arrival order.
 *
 * Memory is bounded by the number of distinct keys seen while inactive,
 * except the sequence, which grows with each comment/redline event for
 * the duration of inactivity; those event classes are rare.
 *
 * The maps are BTreeMaps so the replay's "map iteration order" is
 * deterministic.
 */
use std::collections::BTreeMap;

use crate::shared::{EngineEvent, EventType};

/// Buffered events of one inactivity epoch.
#[derive(Debug, Default)]
pub struct StateRecorder {
    invalidate: bool,
    events: BTreeMap<EventType, EngineEvent>,
    view_events: BTreeMap<i64, BTreeMap<EventType, EngineEvent>>,
    states: BTreeMap<String, EngineEvent>,
    sequence: Vec<EngineEvent>,
}

/// The drained contents of a recorder, in replay layout.
#[derive(Debug, Default)]
pub struct RecordedEvents {
    pub invalidate: bool,
    pub events: BTreeMap<EventType, EngineEvent>,
    pub view_events: BTreeMap<i64, BTreeMap<EventType, EngineEvent>>,
    pub states: BTreeMap<String, EngineEvent>,
    pub sequence: Vec<EngineEvent>,
}

impl StateRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a full invalidation. The triggering payload is dropped.
    pub fn record_invalidate(&mut self) {
        self.invalidate = true;
    }

    /// Latest-wins per event type.
    pub fn record_event(&mut self, event: EngineEvent) {
        self.events.insert(event.event_type, event);
    }

    /// Latest-wins per (view, event type).
    pub fn record_view_event(&mut self, view_id: i64, event: EngineEvent) {
        self.view_events
            .entry(view_id)
            .or_default()
            .insert(event.event_type, event);
    }

    /// Latest-wins per named state key.
    pub fn record_state(&mut self, name: String, event: EngineEvent) {
        self.states.insert(name, event);
    }

    /// Append in arrival order; never overwritten.
    pub fn record_sequence(&mut self, event: EngineEvent) {
        self.sequence.push(event);
    }

    /// Whether nothing was recorded this epoch.
    pub fn is_empty(&self) -> bool {
        !self.invalidate
            && self.events.is_empty()
            && self.view_events.is_empty()
            && self.states.is_empty()
            && self.sequence.is_empty()
    }

    /// Drain everything, leaving the recorder empty for the next epoch.
    pub fn take(&mut self) -> RecordedEvents {
        let drained = std::mem::take(self);
        RecordedEvents {
            invalidate: drained.invalidate,
            events: drained.events,
            view_events: drained.view_events,
            states: drained.states,
            sequence: drained.sequence,
        }
    }
}
