//! Form inspection and filling
//!
//! [`PdfForms`] runs the two public operations against a configured pdftk:
//! - `fields`: dump a form's fields and parse them into a [`FieldMap`]
//! - `fill`: merge field values (and optionally document info) into a form,
//!   returning the resulting PDF as a [`FilledPdf`] stream

use crate::error::{Error, Result};
use crate::pdftk::{
    parse_field_dump, DocumentInfo, FieldMap, FilledPdf, PdftkCommand, PdftkConfig, Stage,
};
use crate::source::{resolve_path, FormSource};
use crate::xfdf::{FieldValues, XfdfDocument};
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdout;

/// Options for [`PdfForms::fill`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    /// Merge field values into the page content so the form is no longer editable
    pub flatten: bool,
    /// Document info to set before filling
    pub info: Option<DocumentInfo>,
    /// Log a correlation label, timing and failures at info/error level
    pub verbose: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            flatten: true,
            info: None,
            verbose: false,
        }
    }
}

impl FillOptions {
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn info(mut self, info: DocumentInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Form operations backed by one pdftk configuration
#[derive(Debug, Clone)]
pub struct PdfForms {
    pdftk: PdftkCommand,
}

impl Default for PdfForms {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfForms {
    /// Use `pdftk` from `PATH`, or `PDFTK_PATH` when set.
    pub fn new() -> Self {
        Self::with_config(PdftkConfig::from_env())
    }

    pub fn with_config(config: PdftkConfig) -> Self {
        Self {
            pdftk: PdftkCommand::new(config),
        }
    }

    pub fn config(&self) -> &PdftkConfig {
        self.pdftk.config()
    }

    /// List the fillable fields of a PDF form.
    pub async fn fields(&self, path: impl AsRef<Path>) -> Result<FieldMap> {
        let path = resolve_path(path).await?;

        let output = self
            .pdftk
            .output(self.pdftk.dump_data_fields(&path))
            .await?;

        if !output.stderr.is_empty() {
            return Err(Error::tool(&output.stderr));
        }
        if !output.status.success() {
            return Err(Error::Tool {
                message: format!("dump_data_fields_utf8 exited with {}", output.status),
            });
        }

        let fields = parse_field_dump(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(path = %path.display(), fields = fields.len(), "dumped form fields");
        Ok(fields)
    }

    /// Fill a PDF form and stream the result.
    pub async fn fill(
        &self,
        path: impl AsRef<Path>,
        values: &FieldValues,
        options: &FillOptions,
    ) -> Result<FilledPdf> {
        let path = path.as_ref();
        if !options.verbose {
            return self.run_fill(path, values, options).await;
        }

        let label = format!("pdftk-fill-{}", uuid::Uuid::new_v4());
        let started = Instant::now();
        tracing::info!(
            %label,
            path = %path.display(),
            fields = values.len(),
            flatten = options.flatten,
            info = options.info.is_some(),
            "fill started"
        );

        let result = self.run_fill(path, values, options).await;

        let elapsed_ms = saturating_millis(started.elapsed());
        match &result {
            Ok(_) => tracing::info!(%label, elapsed_ms, "fill output ready"),
            Err(e) => tracing::error!(%label, elapsed_ms, error = %e, "fill failed"),
        }
        result
    }

    async fn run_fill(
        &self,
        path: &Path,
        values: &FieldValues,
        options: &FillOptions,
    ) -> Result<FilledPdf> {
        let path = resolve_path(path).await?;

        let xfdf = XfdfDocument::new(&path)?
            .with_fields(values)
            .write_temp()
            .await?;

        let mut upstream = Vec::new();
        let source = match &options.info {
            Some(info) => {
                let (stdout, stage) = self.update_info(&path, info).await?;
                upstream.push(stage);
                FormSource::Piped(stdout)
            }
            None => FormSource::Path(path),
        };

        let mut command = self.pdftk.fill_form(source, &xfdf, options.flatten)?;
        let fill = self.pdftk.spawn(&mut command)?;
        // Closes the parent's end of the update_info pipe; the fill process holds its own.
        drop(command);

        FilledPdf::start(fill, upstream, xfdf).await
    }

    /// Start `update_info_utf8` on `path` and feed it the info block.
    async fn update_info(
        &self,
        path: &Path,
        info: &DocumentInfo,
    ) -> Result<(ChildStdout, Stage)> {
        let mut command = self.pdftk.update_info(path);
        let mut child = self.pdftk.spawn(&mut command)?;

        let stdout = child.stdout.take().ok_or_else(|| not_piped("stdout"))?;
        let mut stdin = child.stdin.take().ok_or_else(|| not_piped("stdin"))?;

        match stdin.write_all(info.to_info_block().as_bytes()).await {
            Ok(()) => {}
            // pdftk gave up before reading; its stderr explains why
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::warn!(path = %path.display(), "update_info closed its input early");
            }
            Err(e) => return Err(Error::Io(e)),
        }
        drop(stdin);

        Ok((stdout, Stage::new("update_info", child)))
    }
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn not_piped(pipe: &str) -> Error {
    Error::Io(std::io::Error::other(format!(
        "update_info {} was not piped",
        pipe
    )))
}

/// List the fillable fields of a PDF form with the default pdftk.
pub async fn fields(path: impl AsRef<Path>) -> Result<FieldMap> {
    PdfForms::default().fields(path).await
}

/// Fill a PDF form with the default pdftk.
pub async fn fill(
    path: impl AsRef<Path>,
    values: &FieldValues,
    options: &FillOptions,
) -> Result<FilledPdf> {
    PdfForms::default().fill(path, values, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::pdftk::{InfoKey, InfoValue};

    fn unlaunchable() -> PdfForms {
        PdfForms::with_config(PdftkConfig::with_program("/nonexistent/bin/pdftk"))
    }

    #[test]
    fn test_fill_options_defaults() {
        let options = FillOptions::default();
        assert!(options.flatten);
        assert!(options.info.is_none());
        assert!(!options.verbose);
    }

    #[test]
    fn test_fill_options_deserialization() {
        let options: FillOptions = serde_json::from_str(r#"{"verbose": true}"#).unwrap();
        assert!(options.flatten);
        assert!(options.verbose);

        let options: FillOptions = serde_json::from_str(
            r#"{"flatten": false, "info": {"title": "Form", "creationDate": null}}"#,
        )
        .unwrap();
        assert!(!options.flatten);
        let info = options.info.unwrap();
        assert_eq!(info.get(InfoKey::Title), Some(&InfoValue::from("Form")));
        assert_eq!(info.get(InfoKey::CreationDate), Some(&InfoValue::Empty));
    }

    #[test]
    fn test_fill_options_builder() {
        let options = FillOptions::default()
            .flatten(false)
            .verbose(true)
            .info(DocumentInfo::new().title("T"));
        assert!(!options.flatten);
        assert!(options.verbose);
        assert!(options.info.is_some());
    }

    #[test]
    fn test_elapsed_millis_saturate() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_fields_checks_path_before_spawning() {
        let err = unlaunchable()
            .fields("/nonexistent/path/form.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[tokio::test]
    async fn test_fill_checks_path_before_spawning() {
        let values = FieldValues::from([("name1".to_string(), "Value 1".into())]);
        let err = unlaunchable()
            .fill("/nonexistent/path/form.pdf", &values, &FillOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
    }

    #[tokio::test]
    async fn test_fields_spawn_failure() {
        let pdf = tempfile::NamedTempFile::new().unwrap();
        let err = unlaunchable().fields(pdf.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Spawn);
    }

    #[tokio::test]
    async fn test_verbose_fill_spawn_failure() {
        let pdf = tempfile::NamedTempFile::new().unwrap();
        let options = FillOptions::default().verbose(true);
        let err = unlaunchable()
            .fill(pdf.path(), &FieldValues::new(), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Spawn);
    }
}
