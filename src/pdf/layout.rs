use crate::fonts::StandardFace;

/// One wrapped line and its measured width in points.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: f32,
}

/// Greedy word wrap. `\n` is a hard break; a blank segment yields an empty line.
/// A single word wider than `max_width` gets a line of its own and overflows.
pub fn wrap_text(text: &str, face: StandardFace, font_size: f32, max_width: f32) -> Vec<TextLine> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }

    for segment in text.split('\n') {
        let mut current = String::new();
        let mut emitted = false;

        for word in segment.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && face.text_width(&candidate, font_size) > max_width {
                let width = face.text_width(&current, font_size);
                lines.push(TextLine {
                    text: std::mem::replace(&mut current, word.to_string()),
                    width,
                });
                emitted = true;
            } else {
                current = candidate;
            }
        }

        if !current.is_empty() || !emitted {
            let width = face.text_width(&current, font_size);
            lines.push(TextLine {
                text: current,
                width,
            });
        }
    }
    lines
}

/// Lines that fit between `start_y` and the bottom limit when baselines step
/// down by `line_height`. Always at least one.
pub fn lines_per_page(start_y: f32, bottom_limit: f32, line_height: f32) -> usize {
    if start_y < bottom_limit || line_height <= 0.0 {
        return 1;
    }
    ((start_y - bottom_limit) / line_height).floor() as usize + 1
}
