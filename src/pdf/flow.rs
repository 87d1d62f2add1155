//! In-process flowable-to-PDF renderer. Lays paragraph records out as
//! top-to-bottom lines of standard-14 Helvetica text; no tables, images or
//! styles.

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{StandardFace, strip_unencodable, to_winansi_bytes};
use crate::model::{FlowDocument, FlowParagraph};

use super::layout::{TextLine, wrap_text};

const DEFAULT_FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT_RATIO: f32 = 1.2;
const LINE_SPACING: f32 = 1.15;

fn twips_to_pt(twips: u32) -> f32 {
    twips as f32 / 20.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Variant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl Variant {
    const ALL: [Variant; 4] = [
        Variant::Regular,
        Variant::Bold,
        Variant::Italic,
        Variant::BoldItalic,
    ];

    fn of(para: &FlowParagraph) -> Self {
        match (para.bold, para.italic) {
            (false, false) => Variant::Regular,
            (true, false) => Variant::Bold,
            (false, true) => Variant::Italic,
            (true, true) => Variant::BoldItalic,
        }
    }

    fn base_font(self) -> &'static [u8] {
        match self {
            Variant::Regular => b"Helvetica",
            Variant::Bold => b"Helvetica-Bold",
            Variant::Italic => b"Helvetica-Oblique",
            Variant::BoldItalic => b"Helvetica-BoldOblique",
        }
    }

    fn resource_name(self) -> &'static [u8] {
        match self {
            Variant::Regular => b"F1",
            Variant::Bold => b"F2",
            Variant::Italic => b"F3",
            Variant::BoldItalic => b"F4",
        }
    }

    /// Oblique faces share the upright advance widths.
    fn metrics(self) -> StandardFace {
        match self {
            Variant::Regular | Variant::Italic => StandardFace::Helvetica,
            Variant::Bold | Variant::BoldItalic => StandardFace::HelveticaBold,
        }
    }
}

pub(crate) fn render(doc: &FlowDocument) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();

    let page_w = twips_to_pt(doc.page.width);
    let page_h = twips_to_pt(doc.page.height);
    let left = twips_to_pt(doc.page.margin_left);
    let top = page_h - twips_to_pt(doc.page.margin_top);
    let bottom = twips_to_pt(doc.page.margin_bottom);
    let text_width = (page_w - left - twips_to_pt(doc.page.margin_right)).max(1.0);

    let mut pages = vec![Content::new()];
    let mut y = top;

    for para in &doc.paragraphs {
        let variant = Variant::of(para);
        let font_size = para.font_size.unwrap_or(DEFAULT_FONT_SIZE);
        let line_h = font_size * LINE_HEIGHT_RATIO * LINE_SPACING;
        let text = strip_unencodable(&para.text);
        let mut lines = wrap_text(&text, variant.metrics(), font_size, text_width);
        if lines.is_empty() {
            // An empty paragraph still takes up one line.
            lines.push(TextLine {
                text: String::new(),
                width: 0.0,
            });
        }

        for line in &lines {
            if y - line_h < bottom && y < top {
                pages.push(Content::new());
                y = top;
            }
            let Some(content) = pages.last_mut() else {
                return Err(Error::Render("no page to draw on".into()));
            };
            let baseline = y - font_size;
            if !line.text.is_empty() {
                content
                    .begin_text()
                    .set_font(Name(variant.resource_name()), font_size)
                    .next_line(left, baseline)
                    .show(Str(&to_winansi_bytes(&line.text)))
                    .end_text();
                if para.underline {
                    let thick = (font_size * 0.05).max(0.5);
                    content
                        .rect(left, baseline - font_size * 0.12 - thick, line.width, thick)
                        .fill_nonzero();
                }
            }
            y -= line_h;
        }
        y -= twips_to_pt(para.space_after);
    }

    let t_layout = t0.elapsed();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let font_pairs: Vec<(Variant, Ref)> = Variant::ALL.iter().map(|v| (*v, alloc())).collect();
    for (variant, font_ref) in &font_pairs {
        pdf.type1_font(*font_ref)
            .base_font(Name(variant.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in pages.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        for (variant, font_ref) in &font_pairs {
            fonts.pair(Name(variant.resource_name()), *font_ref);
        }
    }

    log::info!(
        "Render phases: layout={:.1}ms, assembly={:.1}ms, pages={n}",
        t_layout.as_secs_f64() * 1000.0,
        (t0.elapsed() - t_layout).as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}
