//! Trace line classifier
//!
//! Decides whether one line of sink content is a trace record and, if so,
//! extracts the file and line being executed. Anything else (continuation
//! lines of multi-line commands, program output sharing the descriptor) is
//! noise and yields `None`.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::format::{Sentinel, SENTINEL, SEPARATOR};

static SHARED: Lazy<LineClassifier> = Lazy::new(|| {
    LineClassifier::new(&SENTINEL).expect("sentinel literals are escaped before compiling")
});

/// One parsed trace record. Only lives while its line is being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord<'a> {
    /// Nesting level, i.e. how many times the marker was repeated.
    pub depth: usize,
    /// File name as printed by the traced shell.
    pub filename: &'a Path,
    /// Line number as printed, 1-based.
    pub lineno: u64,
}

/// Compiled record pattern for one [`Sentinel`].
#[derive(Debug, Clone)]
pub struct LineClassifier {
    pattern: Regex,
    marker_len: usize,
}

impl LineClassifier {
    /// Compile the record pattern for `sentinel`.
    ///
    /// The filename capture is greedy so the split happens at the last
    /// separator followed by digits and the closing tag.
    pub fn new(sentinel: &Sentinel) -> Result<Self, regex::Error> {
        let marker = regex::escape(&sentinel.marker.to_string());
        let pattern = format!(
            r"(?-u)\A(?P<markers>(?:{marker})+){rest}(?P<filename>.+){sep}(?P<lineno>[0-9]+){closing}",
            rest = regex::escape(sentinel.rest),
            sep = regex::escape(&SEPARATOR.to_string()),
            closing = regex::escape(sentinel.closing),
        );

        Ok(Self {
            pattern: Regex::new(&pattern)?,
            marker_len: sentinel.marker.len_utf8(),
        })
    }

    /// Classifier for [`SENTINEL`], compiled once per process.
    pub fn shared() -> &'static LineClassifier {
        &SHARED
    }

    /// Parse `line`, or return `None` if it is not a well-formed record.
    pub fn classify<'a>(&self, line: &'a [u8]) -> Option<TraceRecord<'a>> {
        let captures = self.pattern.captures(line)?;

        let markers = captures.name("markers")?.as_bytes();
        let filename = captures.name("filename")?.as_bytes();
        let lineno = captures.name("lineno")?.as_bytes();

        // Digits only, but may still overflow.
        let lineno = std::str::from_utf8(lineno).ok()?.parse::<u64>().ok()?;

        Some(TraceRecord {
            depth: markers.len() / self.marker_len,
            filename: Path::new(OsStr::from_bytes(filename)),
            lineno,
        })
    }

    /// Whether `line` classifies as a record.
    pub fn is_trace_record(&self, line: &[u8]) -> bool {
        self.classify(line).is_some()
    }
}
