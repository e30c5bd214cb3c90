/**
 * Event Classifier
 *
 * Stateless mapping from an engine callback's type tag to the merge
 * policy applied while a session is inactive. The match is exhaustive
 * over the closed event-type set: adding a callback type forces a
 * decision here at compile time.
 */
use crate::shared::EventType;

/// How an event is merged into the recorder while the session is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Category A: set the "everything needs redraw" latch; the payload is
    /// dropped because the latch regrows to cover the whole document.
    GlobalInvalidate,
    /// Category B: keep only the latest event per type.
    LatestPerType,
    /// Category C: keep only the latest event per (view, type).
    LatestPerView,
    /// Category D: keep only the latest event per named state key.
    LatestPerState,
    /// Category E: append in arrival order, never overwritten. These are
    /// causally sensitive and rare enough that the log stays small.
    OrderedSequence,
    /// Always forwarded live, even to an inactive session.
    PassThrough,
    /// Forwarded while active, dropped while inactive.
    LiveOnly,
}

/// Classify an engine callback type.
pub fn classify(event_type: EventType) -> MergePolicy {
    use EventType::*;
    match event_type {
        InvalidateTiles => MergePolicy::GlobalInvalidate,

        InvalidateVisibleCursor | CursorVisible | TextSelection | TextSelectionStart
        | TextSelectionEnd | CellFormula | CellCursor | CellAddress | GraphicSelection
        | DocumentSizeChanged | InvalidateHeader => MergePolicy::LatestPerType,

        InvalidateViewCursor | TextViewSelection | CellViewCursor | GraphicViewSelection
        | ViewCursorVisible | ViewLock => MergePolicy::LatestPerView,

        StateChanged => MergePolicy::LatestPerState,

        RedlineTableSizeChanged | RedlineTableEntryModified | Comment => {
            MergePolicy::OrderedSequence
        }

        // Save completion must reach the client (and any storage
        // coordinator behind it) even for an idle viewer.
        SaveResult => MergePolicy::PassThrough,

        StatusIndicatorStart | StatusIndicatorSetValue | StatusIndicatorFinish | SetPart
        | SearchNotFound | SearchResultSelection | MousePointer | HyperlinkClicked
        | RulerUpdate | Window => MergePolicy::LiveOnly,
    }
}
