//! Single-file and batch exports
//!
//! Every resolved input is passed through the file transformer and written
//! into the operation directory. Transforms run on a bounded worker pool;
//! writes and progress updates happen in this task only.

use crate::core::archive::plan::{sanitize_name, unique_path};
use crate::core::export::job::{until_cancelled, ExportJob, JobOutcome};
use crate::core::state::Completion;
use crate::domain::artifact::StoredArtifact;
use crate::domain::errors::CourierError;
use crate::domain::operation::{ExportKind, ExportStatus};
use crate::domain::options::ExportOptions;
use crate::domain::Result;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::collections::HashSet;

/// One written output file
#[derive(Debug, Clone)]
struct ExportedFile {
    file_id: String,
    file_name: String,
    size: u64,
}

/// Runs a `SingleFile` or `BatchFiles` operation
pub(crate) async fn export_files(job: &ExportJob) -> Result<JobOutcome> {
    let mut tracker = job.tracker();

    let Some(artifacts) = job.resolve_inputs(&mut tracker).await? else {
        return Ok(JobOutcome::Interrupted);
    };
    if artifacts.is_empty() {
        return Err(CourierError::NotFound("no valid files found".to_string()));
    }
    if !job.enter(ExportStatus::Exporting) {
        return Ok(JobOutcome::Interrupted);
    }

    let names = output_names(&artifacts, &job.options);
    let spec = job.options.transform_spec();
    let transformer = job.collaborators.transformer.clone();

    let mut transforms = stream::iter(artifacts.into_iter().zip(names))
        .map(|(artifact, name)| {
            let transformer = transformer.clone();
            let spec = spec.clone();
            let cancel = job.cancel.clone();
            async move {
                let bytes =
                    until_cancelled(&cancel, transformer.transform(&artifact.path, &spec)).await?;
                Some((artifact, name, bytes))
            }
        })
        .buffer_unordered(job.config.export.file_workers);

    let mut exported = Vec::new();
    while let Some(transformed) = transforms.next().await {
        let Some((artifact, name, bytes)) = transformed else {
            return Ok(JobOutcome::Interrupted);
        };
        if job.is_cancelled() {
            return Ok(JobOutcome::Interrupted);
        }

        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                job.skip(
                    &mut tracker,
                    &artifact.file_id,
                    format!("failed to export {}: {}", artifact.file_id, e.message()),
                );
                continue;
            }
        };

        let target = job.work_dir.join(&name);
        if let Err(e) = tokio::fs::write(&target, &bytes).await {
            return Err(CourierError::ArchiveWrite(format!(
                "failed to write {}: {e}",
                target.display()
            )));
        }

        tracker.file_processed();
        exported.push(ExportedFile {
            file_id: artifact.file_id.to_string(),
            file_name: name,
            size: bytes.len() as u64,
        });
    }

    if exported.is_empty() {
        return Err(CourierError::Transform(
            "no files exported successfully".to_string(),
        ));
    }

    let output_path = match (job.kind, exported.as_slice()) {
        (ExportKind::SingleFile, [only]) => job.work_dir.join(&only.file_name),
        _ => job.work_dir.clone(),
    };

    Ok(JobOutcome::Finished(Completion {
        output_path,
        metadata: vec![
            ("file_count".to_string(), json!(exported.len())),
            (
                "total_size".to_string(),
                json!(exported.iter().map(|f| f.size).sum::<u64>()),
            ),
            (
                "files".to_string(),
                json!(exported
                    .iter()
                    .map(|f| json!({ "file_id": f.file_id, "file_name": f.file_name, "size": f.size }))
                    .collect::<Vec<_>>()),
            ),
        ],
    }))
}

/// File names for the exported copies, in input order and collision-free
fn output_names(artifacts: &[StoredArtifact], options: &ExportOptions) -> Vec<String> {
    let mut used = HashSet::new();
    let single = artifacts.len() == 1;

    artifacts
        .iter()
        .enumerate()
        .map(|(index, artifact)| {
            let extension = options
                .format
                .extension()
                .map(str::to_string)
                .or_else(|| artifact.extension());
            let stem = match &options.custom_filename {
                Some(custom) if single => sanitize_name(custom),
                Some(custom) => format!("{}_{:03}", sanitize_name(custom), index + 1),
                None => sanitize_name(artifact.stem()),
            };
            let name = match extension {
                Some(ext) => format!("{stem}.{ext}"),
                None => stem,
            };
            unique_path(&name, &mut used)
        })
        .collect()
}
