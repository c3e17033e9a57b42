const DATA_PREFIX: &str = "data:";
const ERROR_EVENT_PREFIX: &str = "event: error";

/// One classified line of the assistant's event-stream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLine<'a> {
    /// A content fragment to append to the in-flight assistant message.
    Data(&'a str),
    /// The service announced a stream error; surfaced via logging only.
    ErrorEvent,
    /// Blank separators, absent payloads, and unrecognised prefixes.
    Ignored,
}

/// Classifies one complete line of the event format.
///
/// A `data:` payload is everything after the colon with at most one leading
/// space stripped, so `data:  x` keeps one of its two spaces. An empty
/// payload after space stripping is still [`StreamLine::Data`]; only a line
/// with nothing at all after the colon carries no fragment. Unknown prefixes
/// are ignored rather than rejected.
pub fn classify(line: &str) -> StreamLine<'_> {
    if line.trim().is_empty() {
        return StreamLine::Ignored;
    }
    if line.starts_with(ERROR_EVENT_PREFIX) {
        return StreamLine::ErrorEvent;
    }
    if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
        if rest.is_empty() {
            return StreamLine::Ignored;
        }
        let payload = rest.strip_prefix(' ').unwrap_or(rest);
        return StreamLine::Data(payload);
    }
    StreamLine::Ignored
}
