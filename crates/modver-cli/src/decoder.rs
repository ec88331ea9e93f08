//! Decoder bindings for the service binary.
//!
//! Structural decoding is an external collaborator. The binary either shells
//! out to a configured decoder program or, when none is configured, reports
//! every module as undecodable (which the extractor turns into an
//! empty-but-present record).

use std::io::Write;
use std::process::Command;

use modver_verify::{DecodeError, ModuleDecoder};

/// Decoder invoking an external program: `program <module-file>`, expected to
/// print one exported name per line.
pub struct ProcessDecoder {
    program: String,
}

impl ProcessDecoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ModuleDecoder for ProcessDecoder {
    fn exported_names(&self, module_bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
        let mut file =
            tempfile::NamedTempFile::new().map_err(|e| DecodeError(e.to_string()))?;
        file.write_all(module_bytes)
            .map_err(|e| DecodeError(e.to_string()))?;

        let output = Command::new(&self.program)
            .arg(file.path())
            .output()
            .map_err(|e| DecodeError(e.to_string()))?;

        if !output.status.success() {
            return Err(DecodeError(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

/// Placeholder used when no decoder program is configured.
pub struct NoDecoder;

impl ModuleDecoder for NoDecoder {
    fn exported_names(&self, _module_bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
        Err(DecodeError("no decoder program configured".to_string()))
    }
}
