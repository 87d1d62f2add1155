use crate::error::Error;
use crate::fonts::{StandardFace, resolve_family, unencodable_chars};
use crate::model::{Alignment, FontSpec, Position};
use crate::options::EngineOptions;

use super::{
    content_refs, first_page, install_font, layered_contents, load_template, overlay_stream,
    page_size, save, save_state_stream, text_ops,
};

/// Text origin in PDF user space (bottom-left origin) for a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPlacement {
    pub x: f32,
    pub y: f32,
    pub text_width: f32,
}

/// Compute where a single line of text starts inside a field box.
///
/// The box is given with a top-left origin, so `page_height` flips it into
/// drawing space. Text that is wider than the box starts at the box's left
/// edge and overflows to the right.
pub fn layout_field(
    page_height: f32,
    text: &str,
    position: &Position,
    font_size: f32,
    alignment: Alignment,
    face: StandardFace,
) -> FieldPlacement {
    let text_width = face.text_width(text, font_size);
    let x = match alignment {
        Alignment::Left => position.x,
        Alignment::Center => position.x + (position.width - text_width) / 2.0,
        Alignment::Right => position.x + position.width - text_width,
    };
    let y = page_height - position.y - (position.height + font_size) / 2.0;
    FieldPlacement {
        x: x.max(position.x),
        y,
        text_width,
    }
}

/// Line breaks are not honoured in a field; the pieces are joined by spaces.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_field(
    template: &[u8],
    text: &str,
    position: &Position,
    font: &FontSpec,
) -> Result<Vec<u8>, Error> {
    render_field_with(template, text, position, font, &EngineOptions::default())
}

/// Draw `text` into the field box on page 0 of `template` and return the new
/// document. The input bytes are left untouched.
///
/// Text the resolved standard face cannot encode is rejected rather than
/// drawn with characters missing.
pub fn render_field_with(
    template: &[u8],
    text: &str,
    position: &Position,
    font: &FontSpec,
    options: &EngineOptions,
) -> Result<Vec<u8>, Error> {
    position.validate()?;
    font.validate()?;
    let text = single_line(text);
    if text.is_empty() {
        return Err(Error::InvalidField("field text must not be empty".into()));
    }
    let face = resolve_family(&font.family, options.font_fallback)?;
    let missing = unencodable_chars(&text);
    if !missing.is_empty() {
        return Err(Error::InvalidField(format!(
            "text contains characters that cannot be encoded in {}: {}",
            face.base_font(),
            missing.iter().collect::<String>()
        )));
    }

    let mut doc = load_template(template)?;
    let page_id = first_page(&doc)?;
    let (_, page_height) = page_size(&doc, page_id)?;

    let placement = layout_field(page_height, &text, position, font.size, font.alignment, face);
    log::debug!(
        "field: {} at ({:.2}, {:.2}), text width {:.2} in box {}x{}",
        face.base_font(),
        placement.x,
        placement.y,
        placement.text_width,
        position.width,
        position.height
    );

    let font_name = install_font(&mut doc, page_id, face)?;
    let background = content_refs(&doc, page_id)?;
    let open = save_state_stream(&mut doc);
    let ops = text_ops(&font_name, font.size, font.color, placement.x, placement.y, &text);
    let overlay = overlay_stream(&mut doc, ops)?;
    doc.get_dictionary_mut(page_id)?
        .set("Contents", layered_contents(open, &background, overlay));

    save(&mut doc)
}
