use crate::docx;
use crate::error::Error;
use crate::fonts::{StandardFace, strip_unencodable, unencodable_chars};
use crate::markup::{html_to_plain_text, normalize_plain_text};
use crate::model::{ContentUnit, DocumentKind, MergeOutput, Rgb};

use super::layout::{TextLine, lines_per_page, wrap_text};
use super::{
    append_page_copy, content_refs, first_page, flatten_inherited, install_font, layered_contents,
    load_template, overlay_stream, page_size, root_pages, save, save_state_stream, text_ops,
};

pub const BODY_FACE: StandardFace = StandardFace::Helvetica;
pub const BODY_FONT_SIZE: f32 = 12.0;
pub const LINE_HEIGHT: f32 = 18.0;
pub const MARGIN: f32 = 72.0;

/// Body text starts this far up the page, leaving the top third to the letterhead art.
const START_FRACTION: f32 = 2.0 / 3.0;

/// Content reduced to plain text, one line per block.
fn plain_text(content: &ContentUnit) -> Result<String, Error> {
    match content {
        ContentUnit::Markup(html) => Ok(html_to_plain_text(html)),
        ContentUnit::Flowable(bytes) => Ok(normalize_plain_text(&docx::extract_text(bytes)?)),
    }
}

/// Reflow `content` as 12pt text over page 0 of a PDF letterhead, repeating
/// the page as a background for as many pages as the text needs.
///
/// The result is always a PDF. Asking for flowable output yields a degraded
/// result with a warning, as do characters the body face cannot encode, which
/// are left out.
pub fn merge_fixed(
    template: &[u8],
    content: &ContentUnit,
    desired: DocumentKind,
) -> Result<MergeOutput, Error> {
    let mut warnings = Vec::new();
    let mut text = plain_text(content)?;
    let missing = unencodable_chars(&text);
    if !missing.is_empty() {
        let missing: String = missing.into_iter().collect();
        log::warn!(
            "Letterhead content has characters {} cannot encode: {missing}",
            BODY_FACE.base_font()
        );
        warnings.push(format!(
            "characters that cannot be encoded in {} were left out: {missing}",
            BODY_FACE.base_font()
        ));
        text = strip_unencodable(&text);
    }
    let mut doc = load_template(template)?;
    let page_id = first_page(&doc)?;
    flatten_inherited(&mut doc, page_id)?;

    let extra_pages: Vec<u32> = doc.get_pages().keys().copied().skip(1).collect();
    if !extra_pages.is_empty() {
        log::debug!("letterhead: ignoring {} template pages after the first", extra_pages.len());
        doc.delete_pages(&extra_pages);
        doc.prune_objects();
    }

    let (width, height) = page_size(&doc, page_id)?;
    let lines = wrap_text(&text, BODY_FACE, BODY_FONT_SIZE, width - 2.0 * MARGIN);
    let start_y = height * START_FRACTION;
    let per_page = lines_per_page(start_y, MARGIN + LINE_HEIGHT, LINE_HEIGHT);

    let pages: Vec<&[TextLine]> = if lines.is_empty() {
        log::warn!("Letterhead content is empty, returning the bare template page");
        warnings.push("content is empty; the letterhead page has no body text".to_string());
        vec![&lines[..]]
    } else {
        lines.chunks(per_page).collect()
    };
    log::debug!(
        "letterhead: {} lines, {} per page, {} pages",
        lines.len(),
        per_page,
        pages.len()
    );

    let font_name = install_font(&mut doc, page_id, BODY_FACE)?;
    let page_dict = doc.get_dictionary(page_id)?.clone();
    let background = content_refs(&doc, page_id)?;
    let pages_id = root_pages(&doc)?;
    let open = save_state_stream(&mut doc);

    for (index, page_lines) in pages.iter().enumerate() {
        let ops = page_lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.text.is_empty())
            .flat_map(|(n, line)| {
                let y = start_y - n as f32 * LINE_HEIGHT;
                text_ops(&font_name, BODY_FONT_SIZE, Rgb::BLACK, MARGIN, y, &line.text)
            })
            .collect();
        let overlay = overlay_stream(&mut doc, ops)?;
        let contents = layered_contents(open, &background, overlay);
        if index == 0 {
            doc.get_dictionary_mut(page_id)?.set("Contents", contents);
        } else {
            append_page_copy(&mut doc, &page_dict, pages_id, contents)?;
        }
    }

    let bytes = save(&mut doc)?;
    if desired == DocumentKind::Flowable {
        log::warn!("Fixed-layout letterhead cannot produce flowable output, returning PDF");
        warnings.push(
            "a fixed-layout letterhead cannot be merged into a flowable document; returned PDF"
                .to_string(),
        );
    }
    Ok(MergeOutput {
        bytes,
        kind: DocumentKind::FixedLayout,
        degraded: desired != DocumentKind::FixedLayout,
        warnings,
    })
}
