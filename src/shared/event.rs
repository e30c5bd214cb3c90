/**
 * Engine Callback Events
 *
 * This module defines the discriminated callback delivered by the editing
 * engine: an event type tag plus a textual payload. The payload format
 * depends on the type: flat comma-delimited lists for tile invalidation,
 * JSON objects carrying a `viewId` for per-view events, and `name=value`
 * pairs for state changes.
 *
 * The set of types is closed on purpose: every consumer matches
 * exhaustively, so a new callback type is a compile error everywhere it
 * matters rather than a silently ignored default branch.
 */
use serde::{Deserialize, Serialize};

/// Type tag of an engine callback event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A region of the document needs re-rendering. Payload is
    /// `x,y,width,height,part` or the sentinel `EMPTY,part`.
    InvalidateTiles,
    /// The caret of this session's own view moved.
    InvalidateVisibleCursor,
    /// The caret of this session's own view was shown or hidden.
    CursorVisible,
    /// Text selection changed.
    TextSelection,
    /// Selection start handle moved.
    TextSelectionStart,
    /// Selection end handle moved.
    TextSelectionEnd,
    /// Spreadsheet formula bar content changed.
    CellFormula,
    /// Spreadsheet cell cursor moved.
    CellCursor,
    /// Spreadsheet cell address display changed.
    CellAddress,
    /// A graphic object was selected or deselected.
    GraphicSelection,
    /// The rendered document extent changed.
    DocumentSizeChanged,
    /// Spreadsheet row/column header needs redrawing.
    InvalidateHeader,
    /// Another view's caret moved. JSON payload with `viewId`.
    InvalidateViewCursor,
    /// Another view's text selection changed. JSON payload with `viewId`.
    TextViewSelection,
    /// Another view's cell cursor moved. JSON payload with `viewId`.
    CellViewCursor,
    /// Another view's graphic selection changed. JSON payload with `viewId`.
    GraphicViewSelection,
    /// Another view's caret visibility changed. JSON payload with `viewId`.
    ViewCursorVisible,
    /// Another view acquired or released an edit lock. JSON payload with `viewId`.
    ViewLock,
    /// A UI state toggle changed, `name=value` payload (e.g. `.uno:Bold=true`).
    StateChanged,
    /// The number of tracked changes grew or shrank.
    RedlineTableSizeChanged,
    /// An existing tracked change was modified.
    RedlineTableEntryModified,
    /// A comment was added, modified or removed.
    Comment,
    /// A save/export operation completed. Always delivered to the client,
    /// even for inactive sessions.
    SaveResult,
    /// Long-running operation started.
    StatusIndicatorStart,
    /// Long-running operation progress, integer percentage payload.
    StatusIndicatorSetValue,
    /// Long-running operation finished.
    StatusIndicatorFinish,
    /// The engine switched the active part.
    SetPart,
    /// A search yielded no match.
    SearchNotFound,
    /// A search selected its result.
    SearchResultSelection,
    /// Mouse pointer shape changed.
    MousePointer,
    /// A hyperlink was activated.
    HyperlinkClicked,
    /// Ruler geometry changed.
    RulerUpdate,
    /// A dialog/sidebar window changed.
    Window,
}

/// A single callback as delivered by the editing engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineEvent {
    /// Type tag, drives classification and forwarding.
    pub event_type: EventType,
    /// Raw payload; format depends on `event_type`.
    pub payload: String,
}

impl EngineEvent {
    /// Create a new engine event.
    pub fn new(event_type: EventType, payload: impl Into<String>) -> Self {
        Self {
            event_type,
            payload: payload.into(),
        }
    }

    /// Tile invalidation covering the full extent of one part.
    ///
    /// Used to synthesize the "invalidate everything" notification that
    /// replays a recorded invalidate latch.
    pub fn invalidate_all(part: i32) -> Self {
        Self::new(
            EventType::InvalidateTiles,
            format!("0, 0, {}, {}, {}", i32::MAX, i32::MAX, part),
        )
    }

    /// State-change event from a `name=value` pair.
    pub fn state_changed(name: &str, value: &str) -> Self {
        Self::new(EventType::StateChanged, format!("{}={}", name, value))
    }
}
