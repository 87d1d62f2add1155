pub mod batch;
pub mod convert;
pub mod docx;
mod error;
pub mod fonts;
pub mod markup;
mod merge;
mod model;
mod options;
mod pdf;

pub use convert::{ConversionBridge, Converter, FlowRenderer, OfficeConverter};
pub use error::Error;
pub use merge::{SPACER_SPACE_AFTER, merge_flowable, merge_letterhead, merged_document};
pub use model::*;
pub use options::{EngineOptions, FontFallback};
pub use pdf::field::{FieldPlacement, layout_field, render_field, render_field_with};
pub use pdf::inspect_template;
pub use pdf::layout::{TextLine, lines_per_page, wrap_text};
pub use pdf::letterhead::{BODY_FACE, BODY_FONT_SIZE, LINE_HEIGHT, MARGIN, merge_fixed};

use std::path::{Path, PathBuf};
use std::time::Instant;

/// Render one field onto a template file and write the result to `output`.
pub fn render_field_file(
    template: &Path,
    text: &str,
    position: &Position,
    font: &FontSpec,
    options: &EngineOptions,
    output: &Path,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let template_bytes = std::fs::read(template)?;
    let t_read = t0.elapsed();

    let bytes = render_field_with(&template_bytes, text, position, font, options)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_read.as_secs_f64() * 1000.0,
        (t_render - t_read).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}

/// Merge `content` into the letterhead at `template` and write the result.
///
/// The file is written next to `output` with the extension of the kind
/// actually produced, so a degraded merge never lands in a `.pdf` file. The
/// path written is returned with the merge result.
pub fn merge_letterhead_file(
    template: &Path,
    content: &ContentUnit,
    desired: DocumentKind,
    bridge: &ConversionBridge,
    output: &Path,
) -> Result<(MergeOutput, PathBuf), Error> {
    let t0 = Instant::now();

    let letterhead = LetterheadTemplate::from_path(template)?;
    let t_read = t0.elapsed();

    let merged = merge_letterhead(&letterhead, content, desired, bridge)?;
    let t_merge = t0.elapsed();

    let path = output.with_extension(merged.kind.extension());
    std::fs::write(&path, &merged.bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, merge={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes, {:?})",
        t_read.as_secs_f64() * 1000.0,
        (t_merge - t_read).as_secs_f64() * 1000.0,
        (t_total - t_merge).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        merged.bytes.len(),
        merged.kind,
    );

    Ok((merged, path))
}
