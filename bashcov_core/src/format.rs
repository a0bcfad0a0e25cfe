//! PS4 format builder
//!
//! Bash prints `PS4` before every command it traces, repeating the first
//! character once per level of indirection. Starting the sentinel with that
//! character means nesting depth is encoded without any bookkeeping here.

/// Literals shared by the PS4 builder and the line classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    /// Character bash repeats per nesting level.
    pub marker: char,
    /// Remainder of the opening sentinel, after the marker.
    pub rest: &'static str,
    /// Tag closing the `<filename>/<lineno>` segment.
    pub closing: &'static str,
}

/// The sentinel used for every trace this crate produces or reads.
pub const SENTINEL: Sentinel = Sentinel {
    marker: '+',
    rest: "BASHCOV> ",
    closing: " BASHCOV: ",
};

/// Separates the filename from the line number. It is the only character
/// that cannot appear in a file name, so splitting on its last occurrence
/// is unambiguous.
pub const SEPARATOR: char = '/';

impl Sentinel {
    /// Opening sentinel at depth one: the marker followed by the rest.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.marker, self.rest)
    }

    /// Builds the `PS4` value for this sentinel.
    ///
    /// The filename is resolved by the traced shell itself so records stay
    /// absolute whatever its working directory is.
    pub fn ps4(&self) -> String {
        format!(
            r#"{prefix}$(cd "$(dirname "${{BASH_SOURCE[0]}}")" && pwd){sep}$(basename "${{BASH_SOURCE[0]}}"){sep}${{LINENO}}{closing}"#,
            prefix = self.prefix(),
            sep = SEPARATOR,
            closing = self.closing,
        )
    }
}

/// `PS4` value to install in the traced shell's environment.
pub fn ps4() -> String {
    SENTINEL.ps4()
}
