//! Rendering backends
//!
//! A backend turns a DOT description into the bytes of an image. Layout,
//! edge routing and cluster boxes are entirely its job.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, span, trace, Level};

use super::{DiagramError, OutputFormat, Result};

/// Environment variable naming the Graphviz executable
pub const DOT_PATH_ENV: &str = "ARCHGRAPH_DOT";

/// Core trait for layout and rasterization backends
pub trait RenderBackend {
    /// Get the name of this backend
    fn name(&self) -> &str;

    /// Lay out and rasterize `dot` into `format`
    fn render(&self, dot: &str, format: OutputFormat) -> Result<Vec<u8>>;
}

/// Backend that runs the Graphviz `dot` executable
#[derive(Debug, Clone)]
pub struct GraphvizBackend {
    executable: OsString,
}

impl GraphvizBackend {
    /// Use `ARCHGRAPH_DOT` if set, otherwise `dot` from `PATH`
    pub fn new() -> Self {
        let executable = std::env::var_os(DOT_PATH_ENV)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| OsString::from("dot"));
        Self { executable }
    }

    /// Use a specific executable
    pub fn with_executable(executable: impl Into<OsString>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// The executable this backend invokes
    pub fn executable(&self) -> &std::ffi::OsStr {
        &self.executable
    }

    fn program(&self) -> String {
        self.executable.to_string_lossy().into_owned()
    }
}

impl Default for GraphvizBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for GraphvizBackend {
    fn name(&self) -> &str {
        "graphviz"
    }

    fn render(&self, dot: &str, format: OutputFormat) -> Result<Vec<u8>> {
        let render_span = span!(
            Level::DEBUG,
            "graphviz_render",
            program = %self.program(),
            format = %format,
            dot_len = dot.len()
        );
        let _enter = render_span.enter();

        if format == OutputFormat::Dot {
            trace!("DOT output requested, skipping backend process");
            return Ok(dot.as_bytes().to_vec());
        }

        let mut child = Command::new(&self.executable)
            .arg(format!("-T{}", format.extension()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DiagramError::RenderBackendUnavailable {
                program: self.program(),
                source,
            })?;

        // dot reads its whole input before writing, so feeding stdin up front is safe
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .map_err(|e| DiagramError::render_error(format!("Failed to feed backend: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| DiagramError::render_error(format!("Failed to wait for backend: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiagramError::render_error(format!(
                "{} exited with {}: {}",
                self.program(),
                output.status,
                stderr.trim()
            )));
        }

        debug!(bytes = output.stdout.len(), "Backend produced output");
        Ok(output.stdout)
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory
///
/// The destination either receives the complete content or is left untouched.
/// The file ends up with the same mode a plain `fs::write` would give it.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = temp_file_in(&dir).map_err(|e| DiagramError::io_error(path, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(|e| DiagramError::io_error(path, e))?;
    temp.persist(path)
        .map_err(|e| DiagramError::io_error(path, e.error))?;

    trace!(path = %path.display(), bytes = bytes.len(), "Output written");
    Ok(())
}

// Temp files default to 0600; request 0666 so the umask decides, as for fs::write
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    Builder::new()
        .prefix(".archgraph")
        .permissions(Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    Builder::new().prefix(".archgraph").tempfile_in(dir)
}
