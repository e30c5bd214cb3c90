/**
 * Outbound Messages
 *
 * The immutable unit queued for delivery to one peer: a wire command, a
 * textual payload (plus raw bytes for tile image frames), and a dedup key.
 *
 * A message never changes after construction. When a newer notification
 * supersedes a queued one, the queue removes the old message and appends
 * the new one; nothing is edited in place. The dedup key is computed once,
 * here, from the decoded payload, so the queue compares structured keys
 * instead of re-parsing text on every enqueue.
 */
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::shared::protocol;

/// Outbound wire command, the first token of every frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Tile,
    InvalidateTiles,
    InvalidateCursor,
    TextSelection,
    TextSelectionStart,
    TextSelectionEnd,
    CursorVisible,
    GraphicSelection,
    CellCursor,
    CellFormula,
    CellAddress,
    InvalidateHeader,
    InvalidateViewCursor,
    TextViewSelection,
    CellViewCursor,
    GraphicViewSelection,
    ViewCursorVisible,
    ViewLock,
    StateChanged,
    RedlineTableChanged,
    RedlineTableModified,
    Comment,
    SaveResult,
    StatusIndicatorStart,
    StatusIndicatorSetValue,
    StatusIndicatorFinish,
    CurPart,
    SetPart,
    SearchNotFound,
    SearchResultSelection,
    MousePointer,
    HyperlinkClicked,
    RulerUpdate,
    Window,
    Status,
    Error,
}

impl Command {
    /// The command token as it appears on the wire (without the colon).
    pub fn token(&self) -> &'static str {
        match self {
            Command::Tile => "tile",
            Command::InvalidateTiles => "invalidatetiles",
            Command::InvalidateCursor => "invalidatecursor",
            Command::TextSelection => "textselection",
            Command::TextSelectionStart => "textselectionstart",
            Command::TextSelectionEnd => "textselectionend",
            Command::CursorVisible => "cursorvisible",
            Command::GraphicSelection => "graphicselection",
            Command::CellCursor => "cellcursor",
            Command::CellFormula => "cellformula",
            Command::CellAddress => "celladdress",
            Command::InvalidateHeader => "invalidateheader",
            Command::InvalidateViewCursor => "invalidateviewcursor",
            Command::TextViewSelection => "textviewselection",
            Command::CellViewCursor => "cellviewcursor",
            Command::GraphicViewSelection => "graphicviewselection",
            Command::ViewCursorVisible => "viewcursorvisible",
            Command::ViewLock => "viewlock",
            Command::StateChanged => "statechanged",
            Command::RedlineTableChanged => "redlinetablechanged",
            Command::RedlineTableModified => "redlinetablemodified",
            Command::Comment => "comment",
            Command::SaveResult => "saveresult",
            Command::StatusIndicatorStart => "statusindicatorstart",
            Command::StatusIndicatorSetValue => "statusindicatorsetvalue",
            Command::StatusIndicatorFinish => "statusindicatorfinish",
            Command::CurPart => "curpart",
            Command::SetPart => "setpart",
            Command::SearchNotFound => "searchnotfound",
            Command::SearchResultSelection => "searchresultselection",
            Command::MousePointer => "mousepointer",
            Command::HyperlinkClicked => "hyperlinkclicked",
            Command::RulerUpdate => "rulerupdate",
            Command::Window => "window",
            Command::Status => "status",
            Command::Error => "error",
        }
    }
}

/// Identity of one rendered tile: part, zoom level and tile coordinates.
///
/// Width/height are deliberately not part of the key; two renders of the
/// same tile differ only in pixel content and the newer one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub part: i32,
    pub zoom: i32,
    pub x: i32,
    pub y: i32,
}

impl TileKey {
    /// Decode the key fields from a tile frame payload
    /// (`part=.. zoom=.. x=.. y=.. ...`).
    pub fn parse(payload: &str) -> Option<Self> {
        let field = |key| protocol::kv_field(payload, key)?.parse::<i32>().ok();
        Some(Self {
            part: field("part")?,
            zoom: field("zoom")?,
            x: field("x")?,
            y: field("y")?,
        })
    }
}

/// The subset of a message's identity used for queue deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Not deduplicable; always appended, never evicts.
    None,
    /// A rendered tile, superseded by a newer render of the same tile.
    Tile(TileKey),
    /// Only one message with this command may be pending at a time.
    Command(Command),
    /// Per-view cursor invalidation, superseded per view.
    ViewCursor(i64),
}

/// An immutable outbound message owned by exactly one queue slot until
/// dequeued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    command: Command,
    payload: String,
    data: Option<Bytes>,
    dedup: DedupKey,
}

impl OutboundMessage {
    /// Build a text frame. The dedup key is derived from the command and
    /// payload here, once.
    pub fn text(command: Command, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let dedup = Self::compute_dedup(command, &payload);
        Self {
            command,
            payload,
            data: None,
            dedup,
        }
    }

    /// Build a binary tile frame: a textual header describing the tile
    /// followed by the encoded image bytes.
    pub fn tile(header: impl Into<String>, data: Bytes) -> Self {
        let payload = header.into();
        let dedup = Self::compute_dedup(Command::Tile, &payload);
        Self {
            command: Command::Tile,
            payload,
            data: Some(data),
            dedup,
        }
    }

    fn compute_dedup(command: Command, payload: &str) -> DedupKey {
        match command {
            Command::Tile => match TileKey::parse(payload) {
                Some(key) => DedupKey::Tile(key),
                None => DedupKey::None,
            },
            Command::StatusIndicatorSetValue | Command::InvalidateCursor => {
                DedupKey::Command(command)
            }
            Command::InvalidateViewCursor => match protocol::view_id_from_json(payload) {
                Ok(view_id) => DedupKey::ViewCursor(view_id),
                Err(_) => DedupKey::None,
            },
            _ => DedupKey::None,
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.dedup
    }

    pub fn is_binary(&self) -> bool {
        self.data.is_some()
    }

    /// The frame's first line: `command: payload` (bare `command:` when the
    /// payload is empty).
    pub fn first_line(&self) -> String {
        if self.payload.is_empty() {
            format!("{}:", self.command.token())
        } else {
            format!("{}: {}", self.command.token(), self.payload)
        }
    }

    /// Serialize for the wire, consuming the message.
    pub fn into_frame(self) -> Frame {
        let header = self.first_line();
        match self.data {
            None => Frame::Text(header),
            Some(data) => {
                let mut bytes = Vec::with_capacity(header.len() + 1 + data.len());
                bytes.extend_from_slice(header.as_bytes());
                bytes.push(b'\n');
                bytes.extend_from_slice(&data);
                Frame::Binary(Bytes::from(bytes))
            }
        }
    }
}

/// A serialized frame ready for the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}
