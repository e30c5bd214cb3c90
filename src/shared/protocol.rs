/**
 * Wire Protocol Decoding
 *
 * Typed decoders for the payload shapes the engine and the peer use.
 * Decoding happens exactly once, at classification or message-construction
 * time; downstream code compares structured values, never raw text.
 *
 * # Payload Shapes
 *
 * - Tile invalidation: `x,y,width,height,part` or the sentinel `EMPTY,part`
 * - Per-view events: a JSON object with at least a `viewId` integer field
 * - State changes: a single `name=value` pair
 * - Outbound frames: `command: key=value key=value ...`
 */
use crate::shared::error::SharedError;

/// A decoded tile-invalidation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileInvalidation {
    /// A rectangle of one part is dirty.
    Rect {
        part: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    /// Everything in one part is dirty.
    Empty { part: i32 },
    /// Unrecognized shape; the payload is forwarded verbatim.
    Raw(String),
}

impl TileInvalidation {
    /// Decode a tile-invalidation payload.
    ///
    /// Out-of-range integers clamp to the maximal extent instead of failing:
    /// the engine legitimately reports coordinates near `i32::MAX` and
    /// arithmetic on the other side may have pushed them past it. For
    /// flowed-text documents every part renders as part 0, so `is_text`
    /// collapses the part number.
    pub fn parse(payload: &str, is_text: bool) -> Self {
        let tokens: Vec<&str> = payload
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() == 5 {
            let parsed: Result<Vec<i32>, _> =
                tokens[..4].iter().map(|t| t.parse::<i32>()).collect();
            let part = if is_text {
                Ok(0)
            } else {
                tokens[4].parse::<i32>()
            };
            match (parsed, part) {
                (Ok(rect), Ok(part)) => TileInvalidation::Rect {
                    part,
                    x: rect[0],
                    y: rect[1],
                    width: rect[2],
                    height: rect[3],
                },
                // Overflowed or garbled numbers: invalidate everything.
                _ => TileInvalidation::Rect {
                    part: 0,
                    x: 0,
                    y: 0,
                    width: i32::MAX,
                    height: i32::MAX,
                },
            }
        } else if tokens.len() == 2 && tokens[0] == "EMPTY" {
            let part = if is_text {
                0
            } else {
                tokens[1].parse::<i32>().unwrap_or(0)
            };
            TileInvalidation::Empty { part }
        } else {
            TileInvalidation::Raw(payload.to_string())
        }
    }

    /// Render as the payload of an `invalidatetiles:` frame.
    pub fn wire_payload(&self) -> String {
        match self {
            TileInvalidation::Rect {
                part,
                x,
                y,
                width,
                height,
            } => format!(
                "part={} x={} y={} width={} height={}",
                part, x, y, width, height
            ),
            TileInvalidation::Empty { part } => format!("EMPTY, {}", part),
            TileInvalidation::Raw(payload) => payload.clone(),
        }
    }
}

/// Split a `name=value` payload at the given delimiter.
///
/// Returns `None` when the delimiter is absent or the name is empty.
pub fn parse_name_value(payload: &str, delimiter: char) -> Option<(&str, &str)> {
    let (name, value) = payload.split_once(delimiter)?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Extract the integer `viewId` field from a JSON payload.
pub fn view_id_from_json(payload: &str) -> Result<i64, SharedError> {
    let json: serde_json::Value = serde_json::from_str(payload)?;
    json.get("viewId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| SharedError::malformed(format!("no viewId in payload [{}]", payload)))
}

/// Look up one `key=value` field in a space-separated frame payload.
pub fn kv_field<'a>(payload: &'a str, key: &str) -> Option<&'a str> {
    payload
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Tokenize the first line of an inbound frame.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
