use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

use super::WML_NS;
use crate::error::Error;
use crate::model::{FlowDocument, FlowParagraph};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // XML 1.0 forbids most C0 controls
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

fn write_run_properties(out: &mut String, para: &FlowParagraph) {
    if !(para.bold || para.italic || para.underline || para.font_size.is_some()) {
        return;
    }
    out.push_str("<w:rPr>");
    if para.bold {
        out.push_str("<w:b/>");
    }
    if para.italic {
        out.push_str("<w:i/>");
    }
    if para.underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(size) = para.font_size {
        let half_points = (size * 2.0).round() as u32;
        out.push_str(&format!(r#"<w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/>"#));
    }
    out.push_str("</w:rPr>");
}

fn write_paragraph(out: &mut String, para: &FlowParagraph) {
    out.push_str("<w:p>");
    out.push_str(&format!(
        r#"<w:pPr><w:spacing w:after="{}"/></w:pPr>"#,
        para.space_after
    ));
    if !para.text.is_empty() {
        out.push_str("<w:r>");
        write_run_properties(out, para);
        for (li, line) in para.text.split('\n').enumerate() {
            if li > 0 {
                out.push_str("<w:br/>");
            }
            for (ti, segment) in line.split('\t').enumerate() {
                if ti > 0 {
                    out.push_str("<w:tab/>");
                }
                if !segment.is_empty() {
                    out.push_str(r#"<w:t xml:space="preserve">"#);
                    out.push_str(&xml_escape(segment));
                    out.push_str("</w:t>");
                }
            }
        }
        out.push_str("</w:r>");
    }
    out.push_str("</w:p>");
}

fn document_xml(doc: &FlowDocument) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<w:document xmlns:w="{WML_NS}"><w:body>"#));
    for para in &doc.paragraphs {
        write_paragraph(&mut out, para);
    }
    let page = &doc.page;
    out.push_str(&format!(
        r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
        page.width,
        page.height,
        page.margin_top,
        page.margin_right,
        page.margin_bottom,
        page.margin_left,
    ));
    out.push_str("</w:body></w:document>");
    out
}

/// Serialize a flowable document as a minimal DOCX package.
///
/// Entry timestamps are pinned to the ZIP epoch so identical input gives
/// identical bytes.
pub(crate) fn write(doc: &FlowDocument) -> Result<Vec<u8>, Error> {
    let zip_err = |e: zip::result::ZipError| Error::Render(format!("docx packaging: {e}"));

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(doc)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(body.as_bytes())?;
    }
    let cursor = zip.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}
