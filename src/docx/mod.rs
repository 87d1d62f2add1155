mod writer;

use std::io::{Cursor, Read, Seek};

use crate::error::Error;
use crate::model::{FlowDocument, FlowParagraph, PageSetup};

pub(crate) use writer::write;

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i).
/// Present with no val or val != "0"/"false" means true.
fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false")
    })
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<u32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|v| v.abs().round() as u32)
}

fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

/// The paragraph a node belongs to, skipping the node itself.
fn owning_paragraph<'a>(node: roxmltree::Node<'a, 'a>) -> Option<roxmltree::Node<'a, 'a>> {
    node.ancestors().skip(1).find(|a| is_wml(*a, "p"))
}

#[derive(Default)]
struct RunFormat {
    bold: bool,
    italic: bool,
    underline: bool,
    font_size: Option<f32>,
}

fn run_format(run: roxmltree::Node) -> RunFormat {
    let Some(rpr) = wml(run, "rPr") else {
        return RunFormat::default();
    };
    RunFormat {
        bold: wml_bool(rpr, "b").unwrap_or(false),
        italic: wml_bool(rpr, "i").unwrap_or(false),
        underline: wml_attr(rpr, "u").is_some_and(|v| v != "none")
            || wml(rpr, "u").is_some_and(|u| u.attribute((WML_NS, "val")).is_none()),
        font_size: wml_attr(rpr, "sz")
            .and_then(|v| v.parse::<f32>().ok())
            .map(|half_points| half_points / 2.0),
    }
}

fn run_text(run: roxmltree::Node) -> String {
    let mut text = String::new();
    for child in run.children().filter(|c| c.is_element()) {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

fn parse_paragraph(p: roxmltree::Node) -> FlowParagraph {
    let mut para = FlowParagraph::default();

    for run in p
        .descendants()
        .filter(|n| is_wml(*n, "r") && owning_paragraph(*n) == Some(p))
    {
        let text = run_text(run);
        if text.is_empty() {
            continue;
        }
        let fmt = run_format(run);
        let has_ink = !text.trim().is_empty();
        para.bold |= fmt.bold && has_ink;
        para.italic |= fmt.italic && has_ink;
        para.underline |= fmt.underline && has_ink;
        if para.font_size.is_none() {
            para.font_size = fmt.font_size;
        }
        para.text.push_str(&text);
    }

    para.space_after = wml(p, "pPr")
        .and_then(|ppr| wml(ppr, "spacing"))
        .and_then(|s| twips_attr(s, "after"))
        .unwrap_or(0);
    para
}

fn parse_page_setup(body: roxmltree::Node) -> PageSetup {
    let defaults = PageSetup::default();
    let Some(sect) = wml(body, "sectPr") else {
        return defaults;
    };
    let pg_sz = wml(sect, "pgSz");
    let pg_mar = wml(sect, "pgMar");
    PageSetup {
        width: pg_sz.and_then(|n| twips_attr(n, "w")).unwrap_or(defaults.width),
        height: pg_sz.and_then(|n| twips_attr(n, "h")).unwrap_or(defaults.height),
        margin_top: pg_mar.and_then(|n| twips_attr(n, "top")).unwrap_or(defaults.margin_top),
        margin_right: pg_mar
            .and_then(|n| twips_attr(n, "right"))
            .unwrap_or(defaults.margin_right),
        margin_bottom: pg_mar
            .and_then(|n| twips_attr(n, "bottom"))
            .unwrap_or(defaults.margin_bottom),
        margin_left: pg_mar
            .and_then(|n| twips_attr(n, "left"))
            .unwrap_or(defaults.margin_left),
    }
}

/// Read the body paragraphs and page setup of a DOCX package.
///
/// Tables are flattened into their cell paragraphs in document order.
pub fn parse_bytes(bytes: &[u8]) -> Result<FlowDocument, Error> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|_| Error::ContentExtraction("file is not a ZIP archive".into()))?;

    let xml_content = read_zip_text(&mut zip, "word/document.xml").ok_or_else(|| {
        Error::ContentExtraction("missing word/document.xml (is this a DOCX file?)".into())
    })?;

    let xml = roxmltree::Document::parse(&xml_content)
        .map_err(|e| Error::ContentExtraction(format!("word/document.xml: {e}")))?;
    let body = wml(xml.root_element(), "body")
        .ok_or_else(|| Error::ContentExtraction("missing w:body".into()))?;

    let paragraphs: Vec<FlowParagraph> = body
        .descendants()
        .filter(|n| is_wml(*n, "p") && owning_paragraph(*n).is_none())
        .map(parse_paragraph)
        .collect();

    log::debug!("docx: {} paragraphs", paragraphs.len());

    Ok(FlowDocument {
        page: parse_page_setup(body),
        paragraphs,
    })
}

/// Raw text of a DOCX package: paragraphs separated by blank lines, tabs and
/// breaks kept as `\t` and `\n`.
pub fn extract_text(bytes: &[u8]) -> Result<String, Error> {
    let doc = parse_bytes(bytes)?;
    let text = doc
        .paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(text)
}

/// Template paragraphs as a flat list of non-empty lines. Hard breaks inside a
/// paragraph split it; formatting flags carry over to each piece.
pub(crate) fn flatten_lines(paragraphs: &[FlowParagraph], space_after: u32) -> Vec<FlowParagraph> {
    paragraphs
        .iter()
        .flat_map(|p| {
            p.text
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(move |line| FlowParagraph {
                    text: line.to_string(),
                    space_after,
                    ..p.clone()
                })
        })
        .collect()
}
