// src/evaluator/static_analysis.rs — External linter/compiler plumbing
//
// Writes reconstructed programs into a scoped scratch directory, runs an
// external tool on each file and parses its diagnostic stream. The scratch
// directory lives for one batch and is deleted when dropped, on every exit
// path.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::TempDir;

use super::types::Severity;
use crate::infra::errors::EvalError;

/// Per-batch scratch directory. Each item gets its own file, named by its
/// index within the batch.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> Result<Self, EvalError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `<index>.<extension>` and return the file path.
    pub fn write_item(
        &self,
        index: usize,
        extension: &str,
        contents: &str,
    ) -> Result<PathBuf, EvalError> {
        let path = self.dir.path().join(format!("{index}.{extension}"));
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Captured output of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// An external binary resolved on PATH, plus the arguments placed before the
/// target file.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalTool {
    /// Resolve `command` (a bare name or a path) to an executable.
    pub fn resolve(command: &str, args: &[String]) -> Result<Self, EvalError> {
        let program = which::which(command).map_err(|_| EvalError::ToolNotFound {
            tool: command.to_string(),
        })?;
        Ok(Self {
            name: command.to_string(),
            program,
            args: args.to_vec(),
        })
    }

    /// Run the tool on `file` with `work_dir` as the working directory.
    ///
    /// A non-zero exit status is not an error: linters and compilers use it
    /// to signal findings. Only failing to spawn or wait for the process is.
    pub fn run(&self, file: &Path, work_dir: &Path) -> Result<ToolOutput, EvalError> {
        tracing::debug!("Running: {} {:?}", self.name, file);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(file)
            .current_dir(work_dir)
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| EvalError::ToolFailed {
                tool: self.name.clone(),
                message: e.to_string(),
            })?;

        if output.status.code().is_none() {
            tracing::warn!(
                "{} terminated by signal on {:?}; keeping captured output",
                self.name,
                file
            );
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

static MESSAGE_CODE_RE: OnceLock<Regex> = OnceLock::new();
static LINE_BREAK_RE: OnceLock<Regex> = OnceLock::new();

/// Parse linter output produced with a `{msg_id}-{msg}` template.
///
/// Lines look like `C0114-Missing module docstring`, optionally wrapped in
/// quotes. The code is one letter followed by four digits; other lines
/// (module banners, score summaries) are skipped.
pub fn parse_message_codes(output: &str) -> Vec<String> {
    let re = MESSAGE_CODE_RE.get_or_init(|| {
        Regex::new(r"^['\x22]?([A-Z]\d{4})-").expect("message code pattern is valid")
    });
    output
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Bucket a pylint-style message code by its leading letter.
///
/// C/R are style, W is a warning, E/F are fatal. Anything else is `None`.
pub fn classify_message_code(code: &str) -> Option<Severity> {
    match code.chars().next()? {
        'C' | 'R' => Some(Severity::Style),
        'W' => Some(Severity::Warning),
        'E' | 'F' => Some(Severity::Fatal),
        _ => None,
    }
}

/// Split a compiler's diagnostic stream into lines, trimming the whitespace
/// around each break.
pub fn split_diagnostic_lines(stream: &str) -> Vec<String> {
    let re = LINE_BREAK_RE
        .get_or_init(|| Regex::new(r"\s*\r?\n\s*").expect("line break pattern is valid"));
    re.split(stream).map(str::to_string).collect()
}

/// A diagnostic stream is clean when every line is blank.
pub fn is_clean_stream(lines: &[String]) -> bool {
    lines.iter().all(|l| l.trim().is_empty())
}
