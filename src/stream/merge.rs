//! Coalesces runs of incremental text appends into single records.
//!
//! The backend streams a reply as one opening record followed by many tiny
//! continuations (`{"v":"lo"}`). The merger folds those continuations back into the
//! opening record so the output carries one line per logical fragment. Everything it
//! cannot merge is passed through verbatim, so the pass never fails and never loses a
//! line it was handed.

use tracing::{debug, trace, warn};

use super::frame::{self, Frame};
use super::record::PatchRecord;

/// Single-pass merge state. Holds at most one open record.
#[derive(Debug, Default)]
pub struct Merger {
    open: Option<PatchRecord>,
    out: String,
    lines_read: usize,
    continuations_merged: usize,
    passed_through: usize,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw line (without its trailing newline).
    pub fn push_line(&mut self, line: &str) {
        self.lines_read += 1;

        let payload = match frame::classify(line) {
            Frame::Ignored => return,
            // Keep-alives and comments may interleave a run of continuations; they
            // must not split the open record.
            Frame::Other => {
                self.emit_verbatim(line);
                return;
            }
            Frame::Data(payload) => payload,
        };

        let record = match PatchRecord::decode(payload) {
            Ok(record) => record,
            Err(e) => {
                trace!("undecodable data line ({}): {}", e, line);
                self.flush();
                self.emit_verbatim(line);
                return;
            }
        };

        if record.opens_entry() {
            self.flush();
            if record.text_value().is_some() {
                self.open = Some(record);
            } else {
                self.emit_verbatim(line);
            }
        } else if record.is_continuation() {
            let merged = match &mut self.open {
                Some(open) => open.merge_continuation(record),
                None => false,
            };
            if merged {
                self.continuations_merged += 1;
            } else {
                self.flush();
                self.emit_verbatim(line);
            }
        } else {
            self.flush();
            self.emit_verbatim(line);
        }
    }

    /// Flush any open record and return the merged stream.
    pub fn finish(mut self) -> String {
        self.flush();
        debug!(
            lines_read = self.lines_read,
            continuations_merged = self.continuations_merged,
            passed_through = self.passed_through,
            "merge pass complete"
        );
        self.out
    }

    fn flush(&mut self) {
        let Some(record) = self.open.take() else {
            return;
        };
        match record.to_line() {
            Ok(line) => self.push_out(&line),
            Err(e) => warn!("failed to re-serialize merged record: {}", e),
        }
    }

    fn emit_verbatim(&mut self, line: &str) {
        self.passed_through += 1;
        self.push_out(line);
    }

    fn push_out(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }
}

/// Run the merge pass over a complete raw stream.
pub fn merge(raw: &str) -> String {
    let mut merger = Merger::new();
    for line in frame::lines(raw) {
        merger.push_line(line);
    }
    merger.finish()
}
