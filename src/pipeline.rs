use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::disambiguate::Disambiguator;
use crate::dish::{DishIdCounter, DishRecord, build_record};
use crate::error::{PipelineError, Result};
use crate::extract;
use crate::group::group;
use crate::profile::LayoutProfile;
use crate::resolve::resolve;

/// Turns menu documents into dish records. One pipeline serves a whole run so
/// dish identifiers keep counting across documents.
pub struct MenuPipeline {
    profile: LayoutProfile,
    oracle: Box<dyn Disambiguator>,
    ids: DishIdCounter,
}

/// Outcome of a batch run. Failed documents do not stop the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, PipelineError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl MenuPipeline {
    pub fn new(profile: LayoutProfile, oracle: Box<dyn Disambiguator>) -> Self {
        Self::with_ids(profile, oracle, DishIdCounter::new())
    }

    pub fn with_ids(
        profile: LayoutProfile,
        oracle: Box<dyn Disambiguator>,
        ids: DishIdCounter,
    ) -> Self {
        Self {
            profile,
            oracle,
            ids,
        }
    }

    /// Groups, repairs and splits one document's fragments, advancing the
    /// run-wide identifiers by the number of dishes.
    pub async fn structure(&self, fragments: &[String]) -> Result<Vec<DishRecord>> {
        let records = self.draft(fragments).await?;
        self.ids.advance(records.len() as u64);
        Ok(records)
    }

    /// Like [`MenuPipeline::structure`], but the identifiers are only taken
    /// once the records are on disk at `output`.
    pub async fn structure_into(
        &self,
        fragments: &[String],
        output: &Path,
    ) -> Result<Vec<DishRecord>> {
        let records = self.draft(fragments).await?;
        write_records(output, &records)?;
        self.ids.advance(records.len() as u64);
        info!(
            path = %output.display(),
            dishes = records.len(),
            next_dish_id = self.ids.peek(),
            "saved menu"
        );
        Ok(records)
    }

    // Numbers from the current counter value without consuming it.
    async fn draft(&self, fragments: &[String]) -> Result<Vec<DishRecord>> {
        let grouped = group(fragments, &self.profile)?;
        info!(categories = grouped.len(), "grouped fragments into categories");

        let resolved = resolve(grouped, &self.profile, self.oracle.as_ref()).await?;

        let ids = DishIdCounter::starting_at(self.ids.peek());
        let records: Vec<DishRecord> = resolved
            .iter()
            .flat_map(|(category, dishes)| {
                let ids = &ids;
                dishes.iter().map(move |dish| {
                    build_record(category, dish, self.profile.currency_marker, ids)
                })
            })
            .collect();
        info!(
            categories = resolved.len(),
            dishes = records.len(),
            "split dishes"
        );
        Ok(records)
    }

    /// Extracts, structures and writes one document. Returns the output path.
    pub async fn process_document(&self, path: &Path, output_dir: &Path) -> Result<PathBuf> {
        info!(path = %path.display(), "processing document");
        let source = path.to_path_buf();
        // pdf-extract is CPU bound and synchronous.
        let text = tokio::task::spawn_blocking(move || extract::read_document(&source))
            .await
            .map_err(|err| PipelineError::Extraction {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })??;

        let fragments = extract::fragments(&text);
        info!(elements = fragments.len(), "extracted fragments");

        let output = output_dir.join(output_file_name(path));
        self.structure_into(&fragments, &output).await?;
        Ok(output)
    }

    /// Processes every PDF in `input_dir` one at a time, logging and skipping
    /// documents that fail.
    pub async fn run_batch(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        let documents = discover_documents(input_dir)?;
        info!(count = documents.len(), dir = %input_dir.display(), "found PDF files");

        let mut report = BatchReport::default();
        for document in documents {
            match self.process_document(&document, output_dir).await {
                Ok(output) => report.written.push(output),
                Err(err) => {
                    error!(
                        path = %document.display(),
                        structural = err.is_structural(),
                        error = %err,
                        "skipping document"
                    );
                    report.failed.push((document, err));
                }
            }
        }
        Ok(report)
    }
}

/// Non-recursive `*.pdf` listing of `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "pdf") {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// `menu.v2.pdf` -> `complete_menu_menu.json`: the base name up to its first dot.
pub fn output_file_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    format!("complete_{stem}_menu.json")
}

/// Writes records as a four-space indented JSON array, replacing any
/// existing file.
pub fn write_records(path: &Path, records: &[DishRecord]) -> io::Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    std::fs::write(path, buf)
}
