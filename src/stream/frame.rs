//! Line classification for the raw event stream.

/// Prefix carried by every data-bearing line.
pub const DATA_PREFIX: &str = "data:";

/// Prefix of structural `event:` marker lines.
pub const EVENT_PREFIX: &str = "event:";

/// Payload of the version probe sent at the start of a stream.
pub const VERSION_PROBE: &str = "\"v1\"";

/// Payload of the terminal sentinel.
pub const DONE_SENTINEL: &str = "[DONE]";

/// How a single raw line should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Dropped from the output entirely.
    Ignored,
    /// A data line; carries the payload with the prefix stripped.
    Data(&'a str),
    /// Anything else, passed through untouched.
    Other,
}

/// Classify one line (without its trailing newline).
pub fn classify(line: &str) -> Frame<'_> {
    if line.trim().is_empty() || line.starts_with(EVENT_PREFIX) {
        return Frame::Ignored;
    }

    match data_payload(line) {
        Some(VERSION_PROBE) | Some(DONE_SENTINEL) => Frame::Ignored,
        Some(payload) => Frame::Data(payload),
        None => Frame::Other,
    }
}

/// Strip the data prefix and any whitespace following it.
///
/// Returns `None` if the line is not a data line.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
        .map(|rest| rest.trim_start().trim_end_matches('\r'))
}

/// Iterate the lines of a stream, tolerating `\r\n` endings.
pub(crate) fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(|l| l.trim_end_matches('\r'))
}
