//! Formatting options shared by the TOON encoder and decoder.

use crate::error::{Result, ToonError};

/// Delimiters the codec accepts between inline values, tabular cells and
/// tabular header fields.
pub const SUPPORTED_DELIMITERS: [char; 4] = [',', '\t', '|', ';'];

/// TOON encoding/decoding options.
///
/// Built once (e.g. from command-line flags) and passed by reference to every
/// encode/decode call; the codec never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToonOptions {
    /// Spaces per nesting level when `use_tab` is false.
    pub indent: usize,
    /// Separator between inline array values and tabular cells.
    pub delimiter: char,
    /// Indent with one tab per level instead of spaces.
    pub use_tab: bool,
}

impl Default for ToonOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            delimiter: ',',
            use_tab: false,
        }
    }
}

impl ToonOptions {
    /// Options with a different delimiter, everything else default.
    pub fn with_delimiter(delimiter: char) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// Reject option combinations that cannot produce decodable output.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_DELIMITERS.contains(&self.delimiter) {
            return Err(ToonError::Encode(format!(
                "unsupported delimiter {:?} (expected one of ',', '\\t', '|', ';')",
                self.delimiter
            )));
        }
        if !self.use_tab && self.indent == 0 {
            return Err(ToonError::Encode(
                "indent must be at least 1 space".to_string(),
            ));
        }
        Ok(())
    }

    /// The string emitted for one level of indentation.
    pub(crate) fn indent_unit(&self) -> String {
        if self.use_tab {
            "\t".to_string()
        } else {
            " ".repeat(self.indent)
        }
    }
}
