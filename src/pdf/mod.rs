//! Fixed-layout output: field placement and letterhead reflow over a PDF
//! template (lopdf), and the in-process flow renderer (pdf-writer).

pub(crate) mod field;
pub(crate) mod flow;
pub mod layout;
pub(crate) mod letterhead;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::Error;
use crate::fonts::{StandardFace, to_winansi_bytes};
use crate::model::{Rgb, TemplateInfo};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn load_template(bytes: &[u8]) -> Result<Document, Error> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::TemplateParse(e.to_string()))?;
    if doc.get_pages().is_empty() {
        return Err(Error::TemplateParse("document has no pages".into()));
    }
    Ok(doc)
}

pub(crate) fn first_page(doc: &Document) -> Result<ObjectId, Error> {
    doc.get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| Error::TemplateParse("document has no pages".into()))
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Look up a page attribute, walking up the `Parent` chain.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value).cloned();
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page itself so the page dictionary can
/// be cloned or re-parented without losing them.
pub(crate) fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), Error> {
    for key in INHERITABLE {
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            doc.get_dictionary_mut(page_id)?.set(key, value);
        }
    }
    Ok(())
}

/// Width and height of a page's MediaBox.
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32), Error> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .ok_or_else(|| Error::TemplateParse("page has no MediaBox".into()))?;
    let values: Vec<f32> = media_box
        .as_array()
        .map_err(|_| Error::TemplateParse("MediaBox is not an array".into()))?
        .iter()
        .filter_map(|o| resolve(doc, o).and_then(number))
        .collect();
    match values[..] {
        [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => Err(Error::TemplateParse(format!(
            "MediaBox must have 4 numbers, found {}",
            values.len()
        ))),
    }
}

/// Register a standard-14 font in the page's resources and return its
/// resource name. The resources dictionary is written back inline on the page.
pub(crate) fn install_font(
    doc: &mut Document,
    page_id: ObjectId,
    face: StandardFace,
) -> Result<Vec<u8>, Error> {
    let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font").ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let name = (0..)
        .map(|i| format!("LpF{i}").into_bytes())
        .find(|n| !fonts.has(n))
        .unwrap_or_else(|| b"LpF".to_vec());

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    fonts.set(name.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// The page's existing content streams as a list of references.
pub(crate) fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, Error> {
    let page = doc.get_dictionary(page_id)?;
    let refs = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    Ok(refs)
}

/// Stream that saves graphics state ahead of the template's own content.
pub(crate) fn save_state_stream(doc: &mut Document) -> ObjectId {
    doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()))
}

/// Stream that restores graphics state, then runs `ops`. Paired with
/// [`save_state_stream`] so the template's CTM and colours never leak into the overlay.
pub(crate) fn overlay_stream(doc: &mut Document, ops: Vec<Operation>) -> Result<ObjectId, Error> {
    let body = Content { operations: ops }
        .encode()
        .map_err(|e| Error::Render(format!("content stream: {e}")))?;
    // Leading newline: some readers join content streams without a separator.
    let mut data = b"\nQ\n".to_vec();
    data.extend_from_slice(&body);
    Ok(doc.add_object(Stream::new(Dictionary::new(), data)))
}

pub(crate) fn layered_contents(open: ObjectId, background: &[Object], overlay: ObjectId) -> Object {
    let mut contents = Vec::with_capacity(background.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend_from_slice(background);
    contents.push(Object::Reference(overlay));
    Object::Array(contents)
}

/// Draw operators for one line of text with its baseline origin at (x, y).
pub(crate) fn text_ops(
    font_name: &[u8],
    font_size: f32,
    color: Rgb,
    x: f32,
    y: f32,
    text: &str,
) -> Vec<Operation> {
    let [r, g, b] = color.to_unit();
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font_name.to_vec()), real(font_size)]),
        Operation::new("rg", vec![real(r), real(g), real(b)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(to_winansi_bytes(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

pub(crate) fn root_pages(doc: &Document) -> Result<ObjectId, Error> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_dictionary(root)?.get(b"Pages")?.as_reference()?)
}

/// Append a copy of `page` as the last kid of the root page tree node.
pub(crate) fn append_page_copy(
    doc: &mut Document,
    page: &Dictionary,
    pages_id: ObjectId,
    contents: Object,
) -> Result<ObjectId, Error> {
    let mut copy = page.clone();
    copy.set("Parent", Object::Reference(pages_id));
    copy.set("Contents", contents);
    // Annotations point back at their own page and cannot be shared.
    copy.remove(b"Annots");
    let id = doc.add_object(Object::Dictionary(copy));

    let pages = doc.get_dictionary_mut(pages_id)?;
    pages
        .get_mut(b"Kids")?
        .as_array_mut()
        .map_err(|_| Error::TemplateParse("page tree Kids is not an array".into()))?
        .push(Object::Reference(id));
    let count = pages.get(b"Count").ok().and_then(|c| c.as_i64().ok()).unwrap_or(0);
    pages.set("Count", count + 1);
    Ok(id)
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| Error::Render(format!("saving PDF: {e}")))?;
    Ok(buf)
}

/// Page count and first-page size of a fixed-layout template.
pub fn inspect_template(bytes: &[u8]) -> Result<TemplateInfo, Error> {
    let doc = load_template(bytes)?;
    let page_id = first_page(&doc)?;
    let (page_width, page_height) = page_size(&doc, page_id)?;
    Ok(TemplateInfo {
        page_count: doc.get_pages().len(),
        page_width,
        page_height,
    })
}
