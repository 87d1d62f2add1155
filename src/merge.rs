//! Letterhead merge: dispatch on the template kind, the flowable paragraph
//! merge, and the fallback when PDF conversion is unavailable.

use crate::convert::ConversionBridge;
use crate::docx;
use crate::error::Error;
use crate::markup::{PARAGRAPH_SPACE_AFTER, html_to_paragraphs, text_to_paragraphs};
use crate::model::{
    ContentUnit, DocumentKind, FlowDocument, FlowParagraph, LetterheadTemplate, MergeOutput,
    PageSetup,
};

/// Spacing after the empty paragraph that separates letterhead from body, in twips.
pub const SPACER_SPACE_AFTER: u32 = 400;

// Page margins of the merged document, in twips.
const MARGIN_TOP: u32 = 720;
const MARGIN_SIDE: u32 = 1440;

fn content_paragraphs(content: &ContentUnit) -> Result<Vec<FlowParagraph>, Error> {
    match content {
        ContentUnit::Markup(html) => Ok(html_to_paragraphs(html)),
        ContentUnit::Flowable(bytes) => Ok(text_to_paragraphs(&docx::extract_text(bytes)?)),
    }
}

/// Paragraph sequence of a flowable merge: letterhead lines, one spacer, then
/// the content lines. The letterhead's own layout is not kept.
pub fn merged_document(template: &[u8], content: &ContentUnit) -> Result<FlowDocument, Error> {
    let letterhead = docx::parse_bytes(template).map_err(|e| match e {
        Error::ContentExtraction(msg) => Error::TemplateParse(msg),
        other => other,
    })?;
    let body = content_paragraphs(content)?;

    let mut paragraphs = docx::flatten_lines(&letterhead.paragraphs, PARAGRAPH_SPACE_AFTER);
    log::debug!(
        "flowable merge: {} letterhead lines, {} content lines",
        paragraphs.len(),
        body.len()
    );
    paragraphs.push(FlowParagraph {
        space_after: SPACER_SPACE_AFTER,
        ..FlowParagraph::plain("")
    });
    paragraphs.extend(body);

    Ok(FlowDocument {
        page: PageSetup {
            width: letterhead.page.width,
            height: letterhead.page.height,
            margin_top: MARGIN_TOP,
            margin_right: MARGIN_SIDE,
            margin_bottom: MARGIN_SIDE,
            margin_left: MARGIN_SIDE,
        },
        paragraphs,
    })
}

/// Merge content into a DOCX letterhead.
///
/// When PDF is wanted and the bridge cannot convert, the DOCX is returned
/// with `degraded` set instead of failing.
pub fn merge_flowable(
    template: &[u8],
    content: &ContentUnit,
    desired: DocumentKind,
    bridge: &ConversionBridge,
) -> Result<MergeOutput, Error> {
    let merged = merged_document(template, content)?;
    let empty_body = merged.paragraphs.last().is_some_and(|p| p.text.is_empty());
    let docx_bytes = docx::write(&merged)?;

    let mut output = match desired {
        DocumentKind::Flowable => MergeOutput::exact(docx_bytes, DocumentKind::Flowable),
        DocumentKind::FixedLayout => match bridge.convert(&docx_bytes) {
            Ok(pdf) => MergeOutput::exact(pdf, DocumentKind::FixedLayout),
            Err(Error::ConversionUnavailable(reason)) => {
                log::warn!("PDF conversion unavailable, returning DOCX: {reason}");
                MergeOutput::degraded(
                    docx_bytes,
                    DocumentKind::Flowable,
                    format!("PDF conversion unavailable ({reason}); returned DOCX"),
                )
            }
            Err(e) => return Err(e),
        },
    };
    if empty_body {
        log::warn!("Letterhead content is empty");
        output.warnings.push("content is empty; only the letterhead was merged".to_string());
    }
    Ok(output)
}

/// Merge `content` into `template`, picking the algorithm from the template kind.
pub fn merge_letterhead(
    template: &LetterheadTemplate,
    content: &ContentUnit,
    desired: DocumentKind,
    bridge: &ConversionBridge,
) -> Result<MergeOutput, Error> {
    match template {
        LetterheadTemplate::FixedLayout(bytes) => {
            crate::pdf::letterhead::merge_fixed(bytes, content, desired)
        }
        LetterheadTemplate::Flowable(bytes) => merge_flowable(bytes, content, desired, bridge),
    }
}
