//! HTML portfolio exports
//!
//! Layout of the operation directory:
//!
//! ```text
//! portfolio_<id>/
//!   portfolio/index.html
//!   portfolio/portfolio.json
//!   portfolio/images/001_<name>
//!   <title>.zip            (when bundled)
//! ```

use crate::adapters::render::PortfolioAsset;
use crate::core::archive::plan::sanitize_name;
use crate::core::archive::{
    build_archive, ArchiveLimits, ArchivePlacementPlan, ArchiveRequest, MetadataFiles,
};
use crate::core::export::job::{until_cancelled, ExportJob, JobOutcome};
use crate::core::state::Completion;
use crate::domain::artifact::{content_type_for, StoredArtifact};
use crate::domain::context::ResultExt;
use crate::domain::errors::CourierError;
use crate::domain::ids::FileId;
use crate::domain::operation::ExportStatus;
use crate::domain::options::{CompressionSettings, StructureMode};
use crate::domain::Result;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

const SITE_DIR: &str = "portfolio";
const INDEX_FILE: &str = "index.html";
const DATA_FILE: &str = "portfolio.json";

/// Runs an `HtmlPortfolio` operation
pub(crate) async fn export_portfolio(job: &ExportJob) -> Result<JobOutcome> {
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

    let site = job.work_dir.join(SITE_DIR);
    tokio::fs::create_dir_all(site.join("images"))
        .await
        .with_context(|| format!("Failed to create portfolio site {}", site.display()))?;

    let mut assets = Vec::with_capacity(artifacts.len());
    for (index, artifact) in artifacts.iter().enumerate() {
        if job.is_cancelled() {
            return Ok(JobOutcome::Interrupted);
        }

        let image_path = format!(
            "images/{:03}_{}",
            index + 1,
            sanitize_name(&artifact.original_name)
        );
        match tokio::fs::copy(&artifact.path, site.join(&image_path)).await {
            Ok(size) => {
                assets.push(portfolio_asset(artifact, image_path, size));
                tracker.file_processed();
            }
            Err(e) => job.skip(
                &mut tracker,
                &artifact.file_id,
                format!("failed to copy {}: {e}", artifact.file_id),
            ),
        }
    }
    if assets.is_empty() {
        return Err(CourierError::NotFound("no valid files found".to_string()));
    }

    let portfolio = &job.options.portfolio;
    let Some(rendered) =
        until_cancelled(&job.cancel, job.collaborators.renderer.render(&assets, portfolio)).await
    else {
        return Ok(JobOutcome::Interrupted);
    };
    let html = rendered.map_err(|e| CourierError::Render(e.message().to_string()))?;
    tokio::fs::write(site.join(INDEX_FILE), html)
        .await
        .context("Failed to write portfolio index")?;

    let data = json!({
        "portfolio_info": {
            "title": portfolio.title,
            "subtitle": portfolio.subtitle,
            "description": portfolio.description,
            "theme": portfolio.theme,
            "layout": portfolio.layout,
            "created_at": Utc::now(),
            "total_assets": assets.len(),
        },
        "assets": assets,
    });
    tokio::fs::write(site.join(DATA_FILE), serde_json::to_vec_pretty(&data)?)
        .await
        .context("Failed to write portfolio data")?;

    let mut metadata = vec![
        ("title".to_string(), json!(portfolio.title)),
        ("file_count".to_string(), json!(assets.len())),
        ("theme".to_string(), json!(portfolio.theme)),
    ];

    if !portfolio.bundle {
        return Ok(JobOutcome::Finished(Completion {
            output_path: site,
            metadata,
        }));
    }

    if !job.enter(ExportStatus::Packaging) {
        return Ok(JobOutcome::Interrupted);
    }

    let name = match &job.options.archive_name {
        Some(name) => sanitize_name(name.trim_end_matches(".zip")),
        None => sanitize_name(&portfolio.title.replace(' ', "_").to_lowercase()),
    };
    let image_paths: Vec<String> = assets.iter().map(|a| a.image_path.clone()).collect();
    let request = ArchiveRequest {
        name: name.clone(),
        output_dir: job.work_dir.clone(),
        structure: StructureMode::Custom,
        compression: CompressionSettings::default(),
        metadata_files: MetadataFiles::none(),
    };
    let cancel = job.cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let plan = site_plan(&site, &image_paths)?;
        build_archive(&plan, &request, &ArchiveLimits::unbounded(), &cancel, |_| {})
    })
    .await
    .map_err(|e| CourierError::ArchiveWrite(format!("archive task failed: {e}")))??;

    if outcome.cancelled {
        return Ok(JobOutcome::Interrupted);
    }

    metadata.push(("archive_name".to_string(), json!(name)));
    metadata.push(("archive_size".to_string(), json!(outcome.archive_size)));
    Ok(JobOutcome::Finished(Completion {
        output_path: outcome.artifact_path(&job.work_dir),
        metadata,
    }))
}

fn portfolio_asset(artifact: &StoredArtifact, image_path: String, size: u64) -> PortfolioAsset {
    let title = artifact
        .metadata
        .get("title")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| artifact.stem().replace(['_', '-'], " "));

    PortfolioAsset {
        file_id: artifact.file_id.to_string(),
        title,
        original_name: artifact.original_name.clone(),
        image_path,
        size,
        content_type: artifact.content_type.clone(),
        created_at: artifact.created_at,
        metadata: artifact.metadata.clone(),
    }
}

/// Placement plan that mirrors the site directory inside the bundle
fn site_plan(site: &Path, image_paths: &[String]) -> Result<ArchivePlacementPlan> {
    let relative_paths = [INDEX_FILE.to_string(), DATA_FILE.to_string()]
        .into_iter()
        .chain(image_paths.iter().cloned());

    let mut artifacts = Vec::new();
    let mut custom = BTreeMap::new();
    for relative in relative_paths {
        let path = site.join(&relative);
        let size = std::fs::metadata(&path)?.len();
        let file_id = FileId::new(relative.clone()).map_err(CourierError::Other)?;
        custom.insert(relative.clone(), format!("{SITE_DIR}/{relative}"));
        artifacts.push(StoredArtifact {
            file_id,
            content_type: content_type_for(&relative).to_string(),
            original_name: relative,
            path,
            size,
            checksum: String::new(),
            created_at: Utc::now(),
            metadata: BTreeMap::new(),
        });
    }

    Ok(ArchivePlacementPlan::build(
        artifacts,
        StructureMode::Custom,
        &custom,
    ))
}
