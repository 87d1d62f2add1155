use std::io;
use thiserror::Error;

/// Errors surfaced by the composition engines.
///
/// Recoverable conditions (an unknown font family under the default
/// fallback policy, a missing converter during a merge) are not errors;
/// they show up as log warnings or as a degraded [`crate::MergeOutput`].
#[derive(Error, Debug)]
pub enum Error {
    /// Template bytes are not a readable document of the expected kind.
    #[error("Template parse error: {0}")]
    TemplateParse(String),

    /// Only raised when fallback is disabled via [`crate::FontFallback::Reject`].
    #[error("Unsupported font family: {0}")]
    UnsupportedFontFamily(String),

    /// No configured converter could turn a flowable document into a fixed-layout one.
    #[error("Conversion unavailable: {0}")]
    ConversionUnavailable(String),

    /// Uploaded flowable content could not be read.
    #[error("Content extraction error: {0}")]
    ContentExtraction(String),

    /// A field position or font spec is out of range.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// lopdf only ever sees in-memory templates, so its errors are structural.
impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::TemplateParse(err.to_string())
    }
}
