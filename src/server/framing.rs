//! Line framing for the ingestion protocol
//!
//! Clients send newline-terminated lines. A line of the form
//! `SEEKTO:<index>,<offset>` is a control line asking for the log contents
//! from that record position on; everything else is data.
//!
//! `SEEKTO:` is ringlog's own wire form of the device's seek-to-command
//! operation: `<index>` counts retained records from the oldest (0) and
//! `<offset>` is a byte offset inside that record, both decimal. The prefix
//! must start a line and the line must end in `\n` (an optional `\r` before
//! it is ignored). Malformed or overlong candidates are stored as data. Only
//! the device backend interprets control lines.

use crate::ring::CommandPosition;

/// Prefix of a control line
pub const CONTROL_PREFIX: &[u8] = b"SEEKTO:";

/// Longest line still considered a control candidate
pub const MAX_CONTROL_LEN: usize = 64;

/// Parse a complete line (with or without its newline) as a control line
pub fn parse_control(line: &[u8]) -> Option<CommandPosition> {
    let body = line.strip_prefix(CONTROL_PREFIX)?;
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    let body = body.strip_suffix(b"\r").unwrap_or(body);

    let text = std::str::from_utf8(body).ok()?;
    let (index, offset) = text.split_once(',')?;

    Some(CommandPosition::new(
        index.trim().parse().ok()?,
        offset.trim().parse().ok()?,
    ))
}

/// Whether a partial line could still turn into a control line
pub fn could_be_control(partial: &[u8]) -> bool {
    if partial.len() > MAX_CONTROL_LEN {
        return false;
    }
    let n = partial.len().min(CONTROL_PREFIX.len());
    partial[..n] == CONTROL_PREFIX[..n]
}
