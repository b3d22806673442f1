//! Error adapter for converting FishboneError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! Rejected documents that fail to parse as JSON carry a line and column; when
//! the document source is available, the report points at that location.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use fishbone::{FishboneError, document::ImportError};

/// Adapter for a [`FishboneError`] with an optional document source.
pub struct ErrorAdapter<'a> {
    err: &'a FishboneError,
    src: Option<&'a str>,
}

impl<'a> ErrorAdapter<'a> {
    pub fn new(err: &'a FishboneError) -> Self {
        Self { err, src: None }
    }

    /// Attach the document the error was raised for.
    pub fn with_source(mut self, src: &'a str) -> Self {
        self.src = Some(src);
        self
    }

    fn syntax_offset(&self) -> Option<usize> {
        let FishboneError::Import(ImportError::Malformed(json)) = self.err else {
            return None;
        };
        offset_of(self.src?, json.line(), json.column())
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.err, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.err, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.err)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.err {
            FishboneError::Io(_) => "fishbone::io",
            FishboneError::Import(_) => "fishbone::import",
            FishboneError::Drag(_) => "fishbone::drag",
            FishboneError::UnknownBlock(_)
            | FishboneError::UnknownCategory(_)
            | FishboneError::LastBlock(_) => "fishbone::model",
            FishboneError::Appearance(_) => "fishbone::appearance",
            FishboneError::Export(_) => "fishbone::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.err {
            FishboneError::Import(ImportError::MissingCategories) => {
                "a diagram document needs a `categories` array"
            }
            FishboneError::Import(ImportError::UnsupportedVersion { .. }) => {
                "export the document again with this version of fishbone"
            }
            FishboneError::Import(ImportError::InvalidColor(_)) => {
                "use a CSS color such as `#1f2937` or `steelblue`"
            }
            FishboneError::Appearance(_) => "check the [canvas] and [appearance] sections",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.syntax_offset()?;
        self.src.as_ref().map(|src| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let offset = self.syntax_offset()?;
        let span = SourceSpan::new(offset.into(), 0);
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Convert a 1-based line and column into a byte offset within `src`.
fn offset_of(src: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(src.len()))
}

/// Convert a [`FishboneError`] into a reportable diagnostic, with the
/// document source when one was read.
pub fn to_reportable<'a>(err: &'a FishboneError, src: Option<&'a str>) -> ErrorAdapter<'a> {
    let adapter = ErrorAdapter::new(err);
    match src {
        Some(src) => adapter.with_source(src),
        None => adapter,
    }
}
