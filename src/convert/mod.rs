//! Flowable (DOCX) to fixed-layout (PDF) conversion.
//!
//! A [`ConversionBridge`] holds an ordered list of [`Converter`] backends and
//! returns the first success. When every backend fails the caller gets
//! [`Error::ConversionUnavailable`] and decides what to fall back to.

mod soffice;

pub use soffice::OfficeConverter;

use crate::docx;
use crate::error::Error;
use crate::options::EngineOptions;

/// One way of turning a DOCX package into PDF bytes.
pub trait Converter: Send + Sync {
    fn name(&self) -> &str;

    fn convert(&self, flowable: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Built-in approximate renderer. Always available, never pixel-faithful.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowRenderer;

impl Converter for FlowRenderer {
    fn name(&self) -> &str {
        "builtin"
    }

    fn convert(&self, flowable: &[u8]) -> Result<Vec<u8>, Error> {
        let doc = docx::parse_bytes(flowable)?;
        crate::pdf::flow::render(&doc)
    }
}

#[derive(Default)]
pub struct ConversionBridge {
    converters: Vec<Box<dyn Converter>>,
}

impl ConversionBridge {
    /// A bridge with no backends; every conversion is unavailable.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(converters: Vec<Box<dyn Converter>>) -> Self {
        Self { converters }
    }

    /// Append a backend, tried after the existing ones.
    pub fn with(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// The office suite first, then the built-in renderer if enabled.
    pub fn from_options(options: &EngineOptions) -> Self {
        let office = match &options.office_program {
            Some(program) => OfficeConverter::with_program(program.clone()),
            None => OfficeConverter::new(),
        };
        let bridge = Self::none().with(office);
        if options.builtin_renderer {
            bridge.with(FlowRenderer)
        } else {
            bridge
        }
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    pub fn convert(&self, flowable: &[u8]) -> Result<Vec<u8>, Error> {
        if self.converters.is_empty() {
            return Err(Error::ConversionUnavailable("no converter configured".into()));
        }
        let mut failures = Vec::with_capacity(self.converters.len());
        for converter in &self.converters {
            let t0 = std::time::Instant::now();
            match converter.convert(flowable) {
                Ok(pdf) => {
                    log::info!(
                        "Converted with {} in {:.1}ms",
                        converter.name(),
                        t0.elapsed().as_secs_f64() * 1000.0
                    );
                    return Ok(pdf);
                }
                Err(e) => {
                    log::debug!("converter {} failed: {e}", converter.name());
                    failures.push(format!("{}: {e}", converter.name()));
                }
            }
        }
        Err(Error::ConversionUnavailable(failures.join("; ")))
    }
}
