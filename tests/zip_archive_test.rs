//! Integration tests for ZIP archive exports

mod common;

use common::{ids, Fixture};
use courier::core::archive::Manifest;
use courier::domain::{
    CompressionMethod, ExportErrorType, ExportKind, ExportOptions, ExportStatus, StructureMode,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(String::from).collect()
}

fn read_manifest(path: &Path) -> Manifest {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut contents = String::new();
    archive
        .by_name("manifest.json")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[tokio::test]
async fn test_missing_files_fail_after_packaging() {
    let fixture = Fixture::new();
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["ghost.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Failed);
    assert_eq!(op.errors[0].error_type, ExportErrorType::NotFound);
    assert_eq!(op.errors[0].message, "no valid files found");
    assert_eq!(
        op.status_history,
        vec![
            ExportStatus::Pending,
            ExportStatus::Preparing,
            ExportStatus::Packaging,
            ExportStatus::Failed,
        ]
    );
    assert!(op.download_token.is_none());
    assert_eq!(op.unresolved_file_ids, ids(&["ghost.png"]));
}

#[tokio::test]
async fn test_organized_archive_with_manifest() {
    let fixture = Fixture::new();
    fixture.add_file("photo.png", b"png bytes");
    fixture.add_file("exif.json", b"{\"iso\": 100}");
    fixture.add_file("notes.txt", b"shot at dusk");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["photo.png", "exif.json", "notes.txt"]),
        ExportOptions::default()
            .with_structure(StructureMode::Organized)
            .with_archive_name("shoot"),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed, "errors: {:?}", op.errors);
    assert_eq!(op.progress, 1.0);
    let archive_path = op.output_path.clone().unwrap();
    assert!(archive_path.ends_with("shoot.zip"));

    let names = entry_names(&archive_path);
    assert!(names.contains(&"images/001_photo.png".to_string()));
    assert!(names.contains(&"metadata/002_exif.json".to_string()));
    assert!(names.contains(&"files/003_notes.txt".to_string()));
    assert!(names.contains(&"README.md".to_string()));
    assert!(names.contains(&"file_index.csv".to_string()));

    let manifest = read_manifest(&archive_path);
    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.archive_info.file_count, 3);
    assert_eq!(manifest.files[0].archive_path, "images/001_photo.png");
    assert_eq!(manifest.files[0].original_filename, "photo.png");

    assert_eq!(op.metadata["archive_name"], "shoot");
    assert_eq!(op.metadata["file_count"], 3);
}

#[tokio::test]
async fn test_compressible_payload_shrinks() {
    let fixture = Fixture::new();
    let files = fixture.add_files(2, 64 * 1024);
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        files,
        ExportOptions::default().with_compression(CompressionMethod::Deflated, 9),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    let ratio = op.metadata["compression_ratio"].as_f64().unwrap();
    assert!(ratio < 1.0, "ratio was {ratio}");
    assert_eq!(op.metadata["uncompressed_size"], 2 * 64 * 1024);
}

#[tokio::test]
async fn test_stored_without_metadata() {
    let fixture = Fixture::new();
    let files = fixture.add_files(2, 128);
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        files,
        ExportOptions::default()
            .with_structure(StructureMode::Flat)
            .with_compression(CompressionMethod::Stored, 0)
            .without_metadata(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    let mut names = entry_names(op.output_path.as_ref().unwrap());
    names.sort();
    assert_eq!(names, vec!["file_0.png", "file_1.png"]);
}

#[tokio::test]
async fn test_file_count_limit_rejects_before_writing() {
    let fixture = Fixture::new();
    let files = fixture.add_files(3, 16);
    let mut config = fixture.config();
    config.archive.max_file_count = 2;
    let orchestrator = fixture
        .orchestrator_with(config, fixture.collaborators())
        .await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        files,
        ExportOptions::default().with_archive_name("too_many"),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Failed);
    assert_eq!(op.errors[0].error_type, ExportErrorType::Validation);
    assert!(op.errors[0]
        .message
        .contains("archive file count exceeds limit: 3 > 2"));

    let work_dir = op.work_dir.unwrap();
    assert!(!work_dir.join("too_many.zip").exists());
}

#[tokio::test]
async fn test_volumes_split_payload() {
    let fixture = Fixture::new();
    let files = fixture.add_files(3, 600 * 1024);
    let mut config = fixture.config();
    config.archive.volume_size_mb = 1;
    let orchestrator = fixture
        .orchestrator_with(config, fixture.collaborators())
        .await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        files,
        ExportOptions::default()
            .with_structure(StructureMode::Flat)
            .with_archive_name("split"),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed, "errors: {:?}", op.errors);
    let work_dir = op.work_dir.clone().unwrap();
    assert_eq!(op.output_path, Some(work_dir.clone()));

    let volumes = op.metadata["volumes"].as_array().unwrap();
    assert_eq!(volumes.len(), 3);
    assert!(work_dir.join("split_vol01.zip").exists());
    assert!(entry_names(&work_dir.join("split_vol01.zip")).contains(&"manifest.json".to_string()));
    assert_eq!(
        entry_names(&work_dir.join("split_vol02.zip")),
        vec!["file_1.png"]
    );
}

#[tokio::test]
async fn test_verification_report_recorded() {
    let fixture = Fixture::new();
    let files = fixture.add_files(2, 256);
    let mut config = fixture.config();
    config.archive.verify_archives = true;
    let orchestrator = fixture
        .orchestrator_with(config, fixture.collaborators())
        .await;

    let id = orchestrator.submit_export(ExportKind::ZipArchive, files, ExportOptions::default());
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    let report = &op.metadata["verification"];
    assert_eq!(report["failed"], 0);
    assert!(report["total_verified"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn test_partial_inputs_are_accounted_for() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"aaaa");
    fixture.add_file("b.png", b"bbbb");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["a.png", "missing.png", "b.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    assert_eq!(op.total_files, 3);
    assert_eq!(op.processed_files, 2);
    assert_eq!(op.processed_files + op.unresolved_file_ids.len(), op.total_files);
    assert_eq!(op.warnings, vec!["file not found: missing.png".to_string()]);
    assert!(op.progress < 1.0);
}

#[tokio::test]
async fn test_duplicate_ids_archived_once() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"aaaa");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["a.png", "a.png", "a.png"]),
        ExportOptions::default().with_structure(StructureMode::Flat),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    assert_eq!(op.total_files, 1);
    assert_eq!(op.file_ids.len(), 3);

    let manifest = read_manifest(op.output_path.as_ref().unwrap());
    assert_eq!(manifest.files.len(), 1);
}

#[tokio::test]
async fn test_inputs_named_like_metadata_files_are_renamed() {
    let fixture = Fixture::new();
    fixture.add_file("manifest.json", b"{\"mine\": true}");
    fixture.add_file("photo.png", b"png bytes");
    fixture.add_file("notes.md", b"# notes");
    let orchestrator = fixture.orchestrator().await;

    let flat = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["manifest.json", "photo.png"]),
        ExportOptions::default().with_structure(StructureMode::Flat),
    );
    let mapped = orchestrator.submit_export(
        ExportKind::ZipArchive,
        ids(&["notes.md"]),
        ExportOptions::default().with_custom_path("notes.md", "README.md"),
    );

    let op = orchestrator.wait_for_completion(&flat).await.unwrap();
    assert_eq!(op.status, ExportStatus::Completed, "errors: {:?}", op.errors);
    let archive_path = op.output_path.clone().unwrap();
    let names = entry_names(&archive_path);
    assert!(names.contains(&"manifest_1.json".to_string()));
    assert!(names.contains(&"photo.png".to_string()));
    let manifest = read_manifest(&archive_path);
    assert_eq!(manifest.files[0].archive_path, "manifest_1.json");

    let op = orchestrator.wait_for_completion(&mapped).await.unwrap();
    assert_eq!(op.status, ExportStatus::Completed, "errors: {:?}", op.errors);
    let names = entry_names(op.output_path.as_ref().unwrap());
    assert!(names.contains(&"README.md".to_string()));
    assert!(names.contains(&"README_1.md".to_string()));
}
