use std::fs;
use std::path::PathBuf;
use std::process::Command;

use super::Converter;
use crate::error::Error;

const INPUT_NAME: &str = "document.docx";
const OUTPUT_NAME: &str = "document.pdf";

/// Converts through a headless LibreOffice (`soffice --convert-to pdf`).
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    programs: Vec<PathBuf>,
}

impl OfficeConverter {
    /// Probe `soffice`, then `libreoffice`, on `PATH`.
    pub fn new() -> Self {
        Self {
            programs: vec![PathBuf::from("soffice"), PathBuf::from("libreoffice")],
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            programs: vec![program.into()],
        }
    }
}

impl Default for OfficeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for OfficeConverter {
    fn name(&self) -> &str {
        "soffice"
    }

    fn convert(&self, flowable: &[u8]) -> Result<Vec<u8>, Error> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join(INPUT_NAME);
        fs::write(&input, flowable)?;
        // A private profile keeps a desktop instance of the suite from
        // swallowing the request.
        let profile = format!(
            "-env:UserInstallation=file://{}",
            dir.path().join("profile").display()
        );

        let mut failures = Vec::new();
        for program in &self.programs {
            log::debug!("running {} --convert-to pdf", program.display());
            let output = match Command::new(program)
                .arg(&profile)
                .arg("--headless")
                .arg("--convert-to")
                .arg("pdf")
                .arg("--outdir")
                .arg(dir.path())
                .arg(&input)
                .output()
            {
                Ok(output) => output,
                Err(e) => {
                    failures.push(format!("{}: {e}", program.display()));
                    continue;
                }
            };

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                failures.push(format!(
                    "{} exited with {}: {}",
                    program.display(),
                    output.status,
                    stderr.trim()
                ));
                continue;
            }

            match fs::read(dir.path().join(OUTPUT_NAME)) {
                Ok(pdf) if !pdf.is_empty() => return Ok(pdf),
                Ok(_) => failures.push(format!("{} produced an empty PDF", program.display())),
                Err(e) => failures.push(format!("{} produced no PDF: {e}", program.display())),
            }
        }

        Err(Error::ConversionUnavailable(failures.join("; ")))
    }
}
