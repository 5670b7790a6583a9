//! ZIP archive exports

use crate::core::archive::{
    build_archive, drop_unreadable, ArchiveLimits, ArchiveOutcome, ArchivePlacementPlan,
    ArchiveRequest, EntryEvent, MetadataFiles,
};
use crate::core::archive::plan::sanitize_name;
use crate::core::export::job::{ExportJob, JobOutcome};
use crate::core::state::Completion;
use crate::domain::errors::CourierError;
use crate::domain::operation::ExportStatus;
use crate::domain::Result;
use chrono::Utc;
use serde_json::json;

/// Runs a `ZipArchive` operation
pub(crate) async fn export_zip(job: &ExportJob) -> Result<JobOutcome> {
    let mut tracker = job.tracker();

    let Some(artifacts) = job.resolve_inputs(&mut tracker).await? else {
        return Ok(JobOutcome::Interrupted);
    };
    if !job.enter(ExportStatus::Packaging) {
        return Ok(JobOutcome::Interrupted);
    }

    let metadata_files = MetadataFiles {
        manifest: job.options.include_metadata,
        csv_index: job.options.include_metadata && job.options.include_csv_index,
        readme: job.options.include_metadata && job.options.include_readme,
    };
    let mut plan = ArchivePlacementPlan::build_reserving(
        artifacts,
        job.options.structure,
        &job.options.custom_structure,
        &metadata_files.reserved_paths(),
    );
    for skipped in drop_unreadable(&mut plan) {
        job.skip(&mut tracker, &skipped.file_id, skipped.reason);
    }
    if plan.is_empty() {
        return Err(CourierError::NotFound("no valid files found".to_string()));
    }

    let request = ArchiveRequest {
        name: archive_name(job),
        output_dir: job.work_dir.clone(),
        structure: job.options.structure,
        compression: job.options.compression,
        metadata_files,
    };
    let archive = &job.config.archive;
    let limits = ArchiveLimits {
        max_file_count: archive.max_file_count,
        max_total_bytes: archive.max_archive_bytes(),
        volume_bytes: archive.volume_bytes(),
        verify: archive.verify_archives,
    };

    let cancel = job.cancel.clone();
    let registry = job.registry.clone();
    let operation_id = job.id.clone();
    let blocking_request = request.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        build_archive(&plan, &blocking_request, &limits, &cancel, |event| match event {
            EntryEvent::Written(_) => tracker.file_processed(),
            EntryEvent::Skipped(entry, reason) => {
                registry.add_unresolved(&operation_id, &entry.artifact.file_id, reason);
                tracker.file_skipped();
            }
        })
    })
    .await
    .map_err(|e| CourierError::ArchiveWrite(format!("archive task failed: {e}")))??;

    if outcome.cancelled {
        return Ok(JobOutcome::Interrupted);
    }
    if outcome.written.is_empty() {
        return Err(CourierError::NotFound("no valid files found".to_string()));
    }
    if let Some(report) = &outcome.verification {
        job.registry
            .set_metadata(&job.id, "verification", serde_json::to_value(report)?);
        if let Some(summary) = report.failure_summary() {
            return Err(CourierError::ArchiveWrite(summary));
        }
    }

    Ok(JobOutcome::Finished(Completion {
        output_path: outcome.artifact_path(&job.work_dir),
        metadata: completion_metadata(&request, &outcome),
    }))
}

fn archive_name(job: &ExportJob) -> String {
    match &job.options.archive_name {
        Some(name) => sanitize_name(name.trim_end_matches(".zip")),
        None => format!("export_{}", Utc::now().format("%Y%m%d_%H%M%S")),
    }
}

fn completion_metadata(
    request: &ArchiveRequest,
    outcome: &ArchiveOutcome,
) -> Vec<(String, serde_json::Value)> {
    vec![
        ("archive_name".to_string(), json!(request.name)),
        ("file_count".to_string(), json!(outcome.written.len())),
        ("structure".to_string(), json!(request.structure)),
        ("compression".to_string(), json!(request.compression)),
        ("uncompressed_size".to_string(), json!(outcome.uncompressed_size)),
        ("archive_size".to_string(), json!(outcome.archive_size)),
        ("compression_ratio".to_string(), json!(outcome.compression_ratio)),
        (
            "volumes".to_string(),
            json!(outcome
                .volumes
                .iter()
                .map(|v| v.display().to_string())
                .collect::<Vec<_>>()),
        ),
    ]
}
