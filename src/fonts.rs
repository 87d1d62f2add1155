use crate::error::Error;
use crate::options::FontFallback;

/// The built-in faces. These are PDF standard-14 fonts, so nothing is embedded;
/// text is encoded as WinAnsi and measured with the AFM advance widths below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardFace {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFace {
    pub const ALL: [StandardFace; 6] = [
        StandardFace::Helvetica,
        StandardFace::HelveticaBold,
        StandardFace::TimesRoman,
        StandardFace::TimesBold,
        StandardFace::Courier,
        StandardFace::CourierBold,
    ];

    /// Name accepted in a font spec. Equal to the PDF `BaseFont` name.
    pub fn family_name(self) -> &'static str {
        match self {
            StandardFace::Helvetica => "Helvetica",
            StandardFace::HelveticaBold => "Helvetica-Bold",
            StandardFace::TimesRoman => "Times-Roman",
            StandardFace::TimesBold => "Times-Bold",
            StandardFace::Courier => "Courier",
            StandardFace::CourierBold => "Courier-Bold",
        }
    }

    pub fn base_font(self) -> &'static str {
        self.family_name()
    }

    pub fn from_family(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.family_name().eq_ignore_ascii_case(wanted))
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            StandardFace::Helvetica => &HELVETICA_WIDTHS,
            StandardFace::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            StandardFace::TimesRoman => &TIMES_ROMAN_WIDTHS,
            StandardFace::TimesBold => &TIMES_BOLD_WIDTHS,
            StandardFace::Courier | StandardFace::CourierBold => &COURIER_WIDTHS,
        }
    }

    /// Width used for WinAnsi characters above 0x7E.
    fn extended_width(self) -> f32 {
        match self {
            StandardFace::Helvetica | StandardFace::HelveticaBold => 556.0,
            StandardFace::TimesRoman | StandardFace::TimesBold => 500.0,
            StandardFace::Courier | StandardFace::CourierBold => 600.0,
        }
    }

    /// Width of a single character in 1000-units. Characters with no WinAnsi
    /// code are dropped when encoding, so they measure zero.
    pub fn char_width_1000(self, ch: char) -> f32 {
        match char_to_winansi(ch) {
            0 => 0.0,
            b @ 32..=126 => self.ascii_widths()[(b - 32) as usize] as f32,
            _ => self.extended_width(),
        }
    }

    pub fn text_width(self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

/// Resolve a font-spec family name to a built-in face.
pub fn resolve_family(name: &str, fallback: FontFallback) -> Result<StandardFace, Error> {
    if let Some(face) = StandardFace::from_family(name) {
        return Ok(face);
    }
    match fallback {
        FontFallback::Default => {
            log::warn!("Font family not built in: {name:?}, using Helvetica");
            Ok(StandardFace::Helvetica)
        }
        FontFallback::Reject => Err(Error::UnsupportedFontFamily(name.to_string())),
    }
}

// AFM advance widths for ASCII 0x20..=0x7E.

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const COURIER_WIDTHS: [u16; 95] = [600; 95];

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF string operands.
/// Unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Distinct non-whitespace characters in `s` that have no WinAnsi code, in
/// order of first appearance.
pub fn unencodable_chars(s: &str) -> Vec<char> {
    let mut found = Vec::new();
    for ch in s.chars() {
        if !ch.is_whitespace() && char_to_winansi(ch) == 0 && !found.contains(&ch) {
            found.push(ch);
        }
    }
    found
}

/// `s` without the characters [`unencodable_chars`] reports.
pub(crate) fn strip_unencodable(s: &str) -> String {
    s.chars()
        .filter(|&ch| ch.is_whitespace() || char_to_winansi(ch) != 0)
        .collect()
}
