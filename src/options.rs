//! Engine configuration.

use std::path::PathBuf;

/// What to do when a [`crate::FontSpec`] names a family that is not built in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFallback {
    /// Draw with Helvetica and log a warning.
    #[default]
    Default,
    /// Fail with [`crate::Error::UnsupportedFontFamily`].
    Reject,
}

/// Options shared by the field-placement and letterhead engines.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Policy for unknown font families
    pub font_fallback: FontFallback,

    /// Office-suite executable used for DOCX to PDF conversion.
    /// `None` probes `soffice` and then `libreoffice` on `PATH`.
    pub office_program: Option<PathBuf>,

    /// Whether the conversion bridge may fall back to the in-process renderer
    pub builtin_renderer: bool,
}

impl EngineOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `LETTERPRESS_FONT_FALLBACK`, `LETTERPRESS_SOFFICE`
    /// and `LETTERPRESS_BUILTIN_RENDERER`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(val) = std::env::var("LETTERPRESS_FONT_FALLBACK") {
            if val.trim().eq_ignore_ascii_case("reject") {
                options.font_fallback = FontFallback::Reject;
            }
        }
        if let Ok(val) = std::env::var("LETTERPRESS_SOFFICE") {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                options.office_program = Some(PathBuf::from(trimmed));
            }
        }
        if let Ok(val) = std::env::var("LETTERPRESS_BUILTIN_RENDERER") {
            options.builtin_renderer = !matches!(val.trim(), "0" | "false" | "off");
        }
        options
    }

    /// Set the font fallback policy.
    pub fn with_font_fallback(mut self, fallback: FontFallback) -> Self {
        self.font_fallback = fallback;
        self
    }

    /// Reject unknown font families instead of substituting Helvetica.
    pub fn reject_unknown_fonts(mut self) -> Self {
        self.font_fallback = FontFallback::Reject;
        self
    }

    /// Set the office-suite executable.
    pub fn with_office_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.office_program = Some(program.into());
        self
    }

    /// Enable or disable the in-process renderer.
    pub fn with_builtin_renderer(mut self, enabled: bool) -> Self {
        self.builtin_renderer = enabled;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            font_fallback: FontFallback::Default,
            office_program: None,
            builtin_renderer: true,
        }
    }
}
