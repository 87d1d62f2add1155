use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 144.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(Error::InvalidField(format!(
                "alignment must be left, center or right, got {other:?}"
            ))),
        }
    }
}

/// Field bounding box in template page units, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub page: u32,
}

impl Position {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            page: 0,
        }
    }

    /// Fixed-layout templates are single-page, so only page 0 is accepted.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(Error::InvalidField("position x and y must be finite".into()));
        }
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(Error::InvalidField("position width and height must be finite".into()));
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(Error::InvalidField(format!(
                "position width and height must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.page != 0 {
            return Err(Error::InvalidField(format!(
                "only page 0 is supported, got page {}",
                self.page
            )));
        }
        Ok(())
    }
}

/// RGB colour parsed from `#RRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    /// Components scaled to 0.0..=1.0 for PDF colour operators.
    pub fn to_unit(self) -> [f32; 3] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidField(format!(
                "colour must be a 6-digit hex value like #1A2B3C, got {s:?}"
            )));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Rgb([r, g, b])),
            _ => Err(Error::InvalidField(format!("invalid colour {s:?}"))),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> String {
        let [r, g, b] = rgb.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Font settings for a personalised field.
///
/// `family` is a free-form name resolved against the built-in faces at render
/// time; unknown names follow [`crate::FontFallback`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub color: Rgb,
    #[serde(default)]
    pub alignment: Alignment,
}

impl FontSpec {
    pub fn validate(&self) -> Result<(), Error> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.size) {
            return Err(Error::InvalidField(format!(
                "font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}, got {}",
                self.size
            )));
        }
        Ok(())
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".into(),
            size: 36.0,
            color: Rgb::BLACK,
            alignment: Alignment::Center,
        }
    }
}

/// Structural kind of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// Paginated, absolutely positioned content (PDF).
    FixedLayout,
    /// Reflowable word-processing content (DOCX).
    Flowable,
}

impl DocumentKind {
    /// Kind implied by a file extension. Only `pdf` and `docx` are recognised.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::FixedLayout),
            "docx" => Some(DocumentKind::Flowable),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::FixedLayout => "pdf",
            DocumentKind::Flowable => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::FixedLayout => "application/pdf",
            DocumentKind::Flowable => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" | "fixed" | "fixed-layout" => Ok(DocumentKind::FixedLayout),
            "docx" | "flowable" => Ok(DocumentKind::Flowable),
            other => Err(Error::InvalidField(format!(
                "output kind must be pdf or docx, got {other:?}"
            ))),
        }
    }
}

/// Letterhead template tagged by kind, so the merge engines dispatch with a `match`.
#[derive(Clone, Debug)]
pub enum LetterheadTemplate {
    FixedLayout(Vec<u8>),
    Flowable(Vec<u8>),
}

impl LetterheadTemplate {
    pub fn new(kind: DocumentKind, bytes: Vec<u8>) -> Self {
        match kind {
            DocumentKind::FixedLayout => LetterheadTemplate::FixedLayout(bytes),
            DocumentKind::Flowable => LetterheadTemplate::Flowable(bytes),
        }
    }

    /// Read a template from disk; the kind comes from the extension alone.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            Error::TemplateParse(format!(
                "{}: letterhead templates must be .pdf or .docx",
                path.display()
            ))
        })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(kind, bytes))
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            LetterheadTemplate::FixedLayout(_) => DocumentKind::FixedLayout,
            LetterheadTemplate::Flowable(_) => DocumentKind::Flowable,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            LetterheadTemplate::FixedLayout(b) | LetterheadTemplate::Flowable(b) => b,
        }
    }
}

/// Body content for a letterhead merge. Exactly one source per request.
#[derive(Clone, Debug)]
pub enum ContentUnit {
    /// HTML authored in a rich-text editor.
    Markup(String),
    /// An uploaded DOCX whose text becomes the body.
    Flowable(Vec<u8>),
}

/// One paragraph of a flowable document with coarse run formatting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowParagraph {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_size: Option<f32>, // points
    pub space_after: u32,       // twips
}

impl FlowParagraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Page geometry of a flowable document, in twips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSetup {
    pub width: u32,
    pub height: u32,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
}

impl PageSetup {
    /// A4 with 1-inch margins.
    pub const A4: PageSetup = PageSetup {
        width: 11906,
        height: 16838,
        margin_top: 1440,
        margin_right: 1440,
        margin_bottom: 1440,
        margin_left: 1440,
    };
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::A4
    }
}

/// Paragraph records plus page setup; what the DOCX reader produces and the writer consumes.
#[derive(Clone, Debug, Default)]
pub struct FlowDocument {
    pub page: PageSetup,
    pub paragraphs: Vec<FlowParagraph>,
}

/// Result of a letterhead merge.
///
/// `kind` is the kind actually produced; `degraded` is set when it differs
/// from the kind the caller asked for.
#[derive(Clone, Debug)]
pub struct MergeOutput {
    pub bytes: Vec<u8>,
    pub kind: DocumentKind,
    pub degraded: bool,
    pub warnings: Vec<String>,
}

impl MergeOutput {
    pub(crate) fn exact(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        Self {
            bytes,
            kind,
            degraded: false,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn degraded(bytes: Vec<u8>, kind: DocumentKind, warning: String) -> Self {
        Self {
            bytes,
            kind,
            degraded: true,
            warnings: vec![warning],
        }
    }
}

/// Page facts about a fixed-layout template.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplateInfo {
    pub page_count: usize,
    pub page_width: f32,
    pub page_height: f32,
}
