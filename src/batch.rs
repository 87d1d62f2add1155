//! Sequential certificate batches: one field render per recipient, a
//! per-item ledger, and ZIP packaging of the results.

use std::io::{Cursor, Write};
use std::ops::ControlFlow;
use std::sync::OnceLock;

use regex::Regex;
use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::{FontSpec, Position};
use crate::options::EngineOptions;
use crate::pdf::field::render_field_with;

const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 100;
const MAX_FILE_STEM_CHARS: usize = 50;

static NAME_ALLOWED: OnceLock<Regex> = OnceLock::new();
static NAME_DISALLOWED: OnceLock<Regex> = OnceLock::new();
static FILE_DISALLOWED: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

fn whitespace() -> &'static Regex {
    regex(&WHITESPACE, r"\s+")
}

/// Trim, collapse whitespace, and drop anything but letters, spaces,
/// hyphens, apostrophes and periods.
pub fn sanitize_name(name: &str) -> String {
    let kept = regex(&NAME_DISALLOWED, r"[^\p{L}\s\-'.]").replace_all(name, "");
    whitespace().replace_all(kept.trim(), " ").into_owned()
}

pub fn validate_name(name: &str) -> Result<(), Error> {
    let trimmed = name.trim();
    let chars = trimmed.chars().count();
    if chars < MIN_NAME_CHARS {
        return Err(Error::InvalidField(format!(
            "name must be at least {MIN_NAME_CHARS} characters"
        )));
    }
    if chars > MAX_NAME_CHARS {
        return Err(Error::InvalidField(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    if !regex(&NAME_ALLOWED, r"^[\p{L}\s\-'.]+$").is_match(trimmed) {
        return Err(Error::InvalidField("name contains invalid characters".into()));
    }
    Ok(())
}

/// `Certificate_<stem>_<index>.pdf`, where the stem keeps ASCII letters,
/// digits and hyphens, with whitespace runs turned into `_`.
pub fn certificate_file_name(name: &str, index: usize) -> String {
    let kept = regex(&FILE_DISALLOWED, r"[^a-zA-Z0-9\s-]").replace_all(name, "");
    let stem: String = whitespace()
        .replace_all(&kept, "_")
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    format!("Certificate_{stem}_{index}.pdf")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Rounded percentage of items finished, 0..=100.
    pub percent: u8,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Processed { file_name: String, bytes: Vec<u8> },
    Failed { message: String },
}

#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub name: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    /// Set when the progress callback stopped the batch early.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Processed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.processed()
    }

    /// `(file_name, bytes)` of every processed item, in order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Processed { file_name, bytes } => {
                Some((file_name.as_str(), bytes.as_slice()))
            }
            ItemOutcome::Failed { .. } => None,
        })
    }
}

/// Renders one certificate per recipient onto a shared template.
///
/// Items run one after another so progress advances in order; a failed item
/// is recorded and the batch moves on.
pub struct CertificateBatch<'a> {
    template: &'a [u8],
    position: Position,
    font: FontSpec,
    options: EngineOptions,
}

impl<'a> CertificateBatch<'a> {
    pub fn new(template: &'a [u8], position: Position, font: FontSpec) -> Self {
        Self {
            template,
            position,
            font,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the batch. `progress` is called after each item; returning
    /// `ControlFlow::Break` stops scheduling further items.
    pub fn run<S, F>(&self, names: &[S], mut progress: F) -> BatchReport
    where
        S: AsRef<str>,
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        let t0 = std::time::Instant::now();
        let total = names.len();
        let mut report = BatchReport::default();

        for (i, raw) in names.iter().enumerate() {
            let name = sanitize_name(raw.as_ref());
            let index = i + 1;
            let outcome = match self.render_one(&name, index) {
                Ok((file_name, bytes)) => ItemOutcome::Processed { file_name, bytes },
                Err(e) => {
                    log::warn!("Certificate {index}/{total} failed: {e}");
                    ItemOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            report.items.push(BatchItem {
                index,
                name,
                outcome,
            });

            let percent = ((index as f64 / total as f64) * 100.0).round() as u8;
            let step = progress(Progress {
                completed: index,
                total,
                percent,
            });
            if step.is_break() && index < total {
                log::info!("Batch cancelled after {index} of {total} items");
                report.cancelled = true;
                break;
            }
        }

        log::info!(
            "Batch: {} processed, {} failed in {:.1}ms",
            report.processed(),
            report.failed(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        report
    }

    fn render_one(&self, name: &str, index: usize) -> Result<(String, Vec<u8>), Error> {
        validate_name(name)?;
        let bytes =
            render_field_with(self.template, name, &self.position, &self.font, &self.options)?;
        Ok((certificate_file_name(name, index), bytes))
    }
}

/// Pack files into one deflated ZIP archive with fixed entry timestamps.
pub fn package_zip<'f>(
    files: impl IntoIterator<Item = (&'f str, &'f [u8])>,
) -> Result<Vec<u8>, Error> {
    let zip_err = |e: zip::result::ZipError| Error::Render(format!("zip packaging: {e}"));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in files {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(bytes)?;
    }
    let cursor = zip.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_international_letters() {
        assert_eq!(sanitize_name("  José   O'Brien-Smith Jr. "), "José O'Brien-Smith Jr.");
        assert_eq!(sanitize_name("Ann Lee #42"), "Ann Lee");
    }

    #[test]
    fn names_are_length_checked() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
        assert!(validate_name(&"a".repeat(101)).is_err());
        assert!(validate_name("R2D2").is_err());
    }

    #[test]
    fn file_names_are_ascii_and_short() {
        assert_eq!(certificate_file_name("Jane Doe", 1), "Certificate_Jane_Doe_1.pdf");
        assert_eq!(certificate_file_name("José O'Brien", 2), "Certificate_Jos_OBrien_2.pdf");
        let long = certificate_file_name(&"x".repeat(80), 3);
        assert_eq!(long, format!("Certificate_{}_3.pdf", "x".repeat(50)));
    }
}
