//! pdftk command-line wrapper
//!
//! This module builds the three pdftk invocations the crate relies on:
//! field dumps, document info updates and form fills. Every invocation talks
//! to pdftk over standard I/O; nothing here interprets PDF bytes.

use crate::error::{Error, Result};
use crate::source::FormSource;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::{Child, Command};

/// Environment variable overriding the pdftk executable
pub const PDFTK_PATH_ENV: &str = "PDFTK_PATH";

/// How to launch pdftk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdftkConfig {
    /// Executable to run (default: `pdftk` from `PATH`)
    pub program: PathBuf,
    /// Arguments placed before every pdftk argument list,
    /// e.g. `["-jar", "pdftk-all.jar"]` with `program = "java"`
    pub program_args: Vec<OsString>,
}

impl Default for PdftkConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftk"),
            program_args: Vec::new(),
        }
    }
}

impl PdftkConfig {
    /// Default configuration, with the program taken from `PDFTK_PATH` when set.
    pub fn from_env() -> Self {
        match std::env::var_os(PDFTK_PATH_ENV) {
            Some(program) if !program.is_empty() => Self::with_program(program),
            _ => Self::default(),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_program_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Builder and launcher for pdftk processes
#[derive(Debug, Clone, Default)]
pub struct PdftkCommand {
    config: PdftkConfig,
}

impl PdftkCommand {
    pub fn new(config: PdftkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PdftkConfig {
        &self.config
    }

    /// `<pdf> dump_data_fields_utf8`
    pub fn dump_data_fields(&self, pdf: &Path) -> Command {
        let mut command = self.command();
        command.arg(pdf).arg("dump_data_fields_utf8");
        command
    }

    /// `<pdf> update_info_utf8 - output -`
    ///
    /// The info block is expected on stdin, the updated PDF comes out on stdout.
    pub fn update_info(&self, pdf: &Path) -> Command {
        let mut command = self.command();
        command
            .arg(pdf)
            .args(["update_info_utf8", "-", "output", "-"])
            .stdin(Stdio::piped());
        command
    }

    /// `<pdf|-> fill_form <xfdf> output - [flatten]`
    pub fn fill_form(&self, source: FormSource, xfdf: &Path, flatten: bool) -> Result<Command> {
        let (source_arg, stdin) = source.into_parts()?;

        let mut command = self.command();
        command
            .arg(source_arg)
            .arg("fill_form")
            .arg(xfdf)
            .args(["output", "-"])
            .stdin(stdin);
        if flatten {
            command.arg("flatten");
        }
        Ok(command)
    }

    /// Run a command to completion and collect its output.
    pub async fn output(&self, mut command: Command) -> Result<Output> {
        log_invocation(&command);
        command.output().await.map_err(|e| self.spawn_error(e))
    }

    /// Start a command, leaving its pipes to the caller.
    pub fn spawn(&self, command: &mut Command) -> Result<Child> {
        log_invocation(command);
        command.spawn().map_err(|e| self.spawn_error(e))
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.program_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.config.program.display().to_string(),
            source,
        }
    }
}

fn log_invocation(command: &Command) {
    let command = command.as_std();
    tracing::debug!(
        program = ?command.get_program(),
        args = ?command.get_args().collect::<Vec<_>>(),
        "spawning pdftk"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_dump_data_fields_shape() {
        let pdftk = PdftkCommand::default();
        let command = pdftk.dump_data_fields(Path::new("form.pdf"));
        assert_eq!(command.as_std().get_program(), "pdftk");
        assert_eq!(args(&command), vec!["form.pdf", "dump_data_fields_utf8"]);
    }

    #[test]
    fn test_update_info_shape() {
        let pdftk = PdftkCommand::default();
        let command = pdftk.update_info(Path::new("form.pdf"));
        assert_eq!(
            args(&command),
            vec!["form.pdf", "update_info_utf8", "-", "output", "-"]
        );
    }

    #[test]
    fn test_fill_form_flatten() {
        let pdftk = PdftkCommand::default();
        let source = FormSource::Path(PathBuf::from("form.pdf"));
        let command = pdftk
            .fill_form(source, Path::new("/tmp/data.xfdf"), true)
            .unwrap();
        assert_eq!(
            args(&command),
            vec!["form.pdf", "fill_form", "/tmp/data.xfdf", "output", "-", "flatten"]
        );
    }

    #[test]
    fn test_fill_form_editable() {
        let pdftk = PdftkCommand::default();
        let source = FormSource::Path(PathBuf::from("form.pdf"));
        let command = pdftk
            .fill_form(source, Path::new("/tmp/data.xfdf"), false)
            .unwrap();
        assert_eq!(
            args(&command),
            vec!["form.pdf", "fill_form", "/tmp/data.xfdf", "output", "-"]
        );
    }

    #[test]
    fn test_program_args_prefix() {
        let config = PdftkConfig::with_program("java").with_program_args(["-jar", "pdftk.jar"]);
        let pdftk = PdftkCommand::new(config);
        let command = pdftk.dump_data_fields(Path::new("form.pdf"));
        assert_eq!(command.as_std().get_program(), "java");
        assert_eq!(
            args(&command),
            vec!["-jar", "pdftk.jar", "form.pdf", "dump_data_fields_utf8"]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let pdftk = PdftkCommand::new(PdftkConfig::with_program(
            "/nonexistent/bin/pdftk-forms-missing",
        ));
        let err = pdftk
            .output(pdftk.dump_data_fields(Path::new("form.pdf")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Spawn);
        assert!(err.to_string().contains("pdftk-forms-missing"));
    }
}
