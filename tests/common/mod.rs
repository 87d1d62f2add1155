#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Resource-name prefix the engines use for fonts they install.
pub const ENGINE_FONT_PREFIX: &[u8] = b"LpF";

fn background_stream(width: i64, n: usize) -> Vec<u8> {
    format!(
        "0.8 0.1 0.1 rg 10 10 {} 40 re f BT /F1 10 Tf 20 20 Td (background {n}) Tj ET",
        width - 20
    )
    .into_bytes()
}

fn finish(mut doc: Document, pages_id: ObjectId, pages: Dictionary) -> Vec<u8> {
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Single-page PDF with a red band and a line of Times text as artwork.
pub fn pdf_template(width: i64, height: i64) -> Vec<u8> {
    pdf_template_pages(width, height, 1)
}

pub fn pdf_template_pages(width: i64, height: i64, count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });

    let mut kids: Vec<Object> = Vec::new();
    for n in 0..count {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), background_stream(width, n)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count as i64,
    };
    finish(doc, pages_id, pages)
}

/// Single page whose MediaBox and (indirect) Resources live on the page tree node.
pub fn pdf_template_inherited(width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content_id = doc.add_object(Stream::new(Dictionary::new(), background_stream(width, 0)));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1_i64,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => resources_id,
    };
    finish(doc, pages_id, pages)
}

pub fn load(pdf: &[u8]) -> Document {
    Document::load_mem(pdf).expect("output parses as PDF")
}

pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

pub fn number(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r as f32,
        other => panic!("not a number: {other:?}"),
    }
}

pub fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
    let mut dict = doc.get_dictionary(page_id).unwrap();
    loop {
        if let Ok(mb) = dict.get(b"MediaBox") {
            return mb.as_array().unwrap().iter().map(number).collect();
        }
        let parent = dict.get(b"Parent").unwrap().as_reference().unwrap();
        dict = doc.get_dictionary(parent).unwrap();
    }
}

/// The page's `Contents` entry as a list of stream ids.
pub fn content_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    match doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap() {
        Object::Reference(id) => vec![*id],
        Object::Array(items) => items.iter().map(|o| o.as_reference().unwrap()).collect(),
        other => panic!("unexpected Contents: {other:?}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub text: String,
    pub font: Vec<u8>,
    pub size: f32,
    pub color: [f32; 3],
    pub x: f32,
    pub y: f32,
}

/// Every `Tj` on the page with the text state in effect when it ran.
pub fn drawn_text(doc: &Document, page_id: ObjectId) -> Vec<DrawnText> {
    let data = doc.get_page_content(page_id).unwrap();
    let content = Content::decode(&data).unwrap();

    let mut out = Vec::new();
    let (mut font, mut size, mut color, mut x, mut y) = (Vec::new(), 0.0, [0.0; 3], 0.0, 0.0);
    for op in content.operations {
        match op.operator.as_str() {
            "BT" => (x, y) = (0.0, 0.0),
            "Tf" => {
                font = op.operands[0].as_name().unwrap().to_vec();
                size = number(&op.operands[1]);
            }
            "rg" => color = [0, 1, 2].map(|i| number(&op.operands[i])),
            "Td" => {
                x += number(&op.operands[0]);
                y += number(&op.operands[1]);
            }
            "Tj" => {
                let Object::String(bytes, _) = &op.operands[0] else {
                    panic!("Tj without string");
                };
                out.push(DrawnText {
                    text: String::from_utf8_lossy(bytes).into_owned(),
                    font: font.clone(),
                    size,
                    color,
                    x,
                    y,
                });
            }
            _ => {}
        }
    }
    out
}

/// Text drawn by the engines, ignoring the template's own artwork.
pub fn engine_text(doc: &Document, page_id: ObjectId) -> Vec<DrawnText> {
    drawn_text(doc, page_id)
        .into_iter()
        .filter(|t| t.font.starts_with(ENGINE_FONT_PREFIX))
        .collect()
}

/// Base font behind a font resource name in the page's own Resources.
pub fn base_font(doc: &Document, page_id: ObjectId, resource: &[u8]) -> String {
    let deref = |obj: &Object| -> Dictionary {
        match obj {
            Object::Reference(id) => doc.get_dictionary(*id).unwrap().clone(),
            Object::Dictionary(d) => d.clone(),
            other => panic!("expected a dictionary, got {other:?}"),
        }
    };
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = deref(page.get(b"Resources").unwrap());
    let fonts = deref(resources.get(b"Font").unwrap());
    let font = deref(fonts.get(resource).unwrap());
    String::from_utf8(font.get(b"BaseFont").unwrap().as_name().unwrap().to_vec()).unwrap()
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// DOCX package around a hand-written `w:body`.
pub fn docx_package(body_xml: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
    );
    let content_types = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in [
        ("[Content_Types].xml", content_types.to_string()),
        ("word/document.xml", document),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// DOCX with one plain run per paragraph.
pub fn docx_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                xml_escape(p)
            )
        })
        .collect();
    docx_package(&body)
}

pub fn read_zip_entry(bytes: &[u8], name: &str) -> String {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = zip.by_name(name).unwrap();
    let mut out = String::new();
    entry.read_to_string(&mut out).unwrap();
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenParagraph {
    pub text: String,
    pub bold: bool,
    pub space_after: Option<u32>,
}

/// Paragraphs of a DOCX package read straight from `word/document.xml`.
pub fn docx_written_paragraphs(bytes: &[u8]) -> Vec<WrittenParagraph> {
    const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    let xml = read_zip_entry(bytes, "word/document.xml");
    let doc = roxmltree::Document::parse(&xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name((W, "p")))
        .map(|p| {
            let text = p
                .descendants()
                .filter(|n| n.has_tag_name((W, "t")))
                .filter_map(|n| n.text())
                .collect();
            let bold = p.descendants().any(|n| n.has_tag_name((W, "b")));
            let space_after = p
                .descendants()
                .find(|n| n.has_tag_name((W, "spacing")))
                .and_then(|n| n.attribute((W, "after")))
                .and_then(|v| v.parse().ok());
            WrittenParagraph {
                text,
                bold,
                space_after,
            }
        })
        .collect()
}
