//! Integration tests for the operation lifecycle across export kinds

mod common;

use common::{ids, slow_collaborators, FailingTransformer, Fixture};
use courier::domain::{
    ExportErrorType, ExportKind, ExportOptions, ExportStatus, OutputFormat, PortfolioOptions,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_single_file_history_and_output() {
    let fixture = Fixture::new();
    fixture.add_file("photo.png", b"pixels");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::SingleFile,
        ids(&["photo.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(
        op.status_history,
        vec![
            ExportStatus::Pending,
            ExportStatus::Preparing,
            ExportStatus::Exporting,
            ExportStatus::Completed,
        ]
    );
    let output = op.output_path.clone().unwrap();
    assert!(output.ends_with("photo.png"));
    assert_eq!(std::fs::read(&output).unwrap(), b"pixels");

    let work_dir = op.work_dir.clone().unwrap();
    let dir_name = work_dir.file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(dir_name, format!("single_{id}"));
    assert!(work_dir.starts_with(fixture.export_dir()));
    assert!(op.finished_at.is_some());
}

#[tokio::test]
async fn test_portfolio_bundle_history() {
    let fixture = Fixture::new();
    fixture.add_file("one.jpg", b"first");
    fixture.add_file("two.jpg", b"second");
    let orchestrator = fixture.orchestrator().await;

    let portfolio = PortfolioOptions {
        title: "Spring Collection".to_string(),
        ..PortfolioOptions::default()
    };
    let id = orchestrator.submit_export(
        ExportKind::HtmlPortfolio,
        ids(&["one.jpg", "two.jpg"]),
        ExportOptions::default().with_portfolio(portfolio),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed, "errors: {:?}", op.errors);
    assert_eq!(
        op.status_history,
        vec![
            ExportStatus::Pending,
            ExportStatus::Preparing,
            ExportStatus::Exporting,
            ExportStatus::Packaging,
            ExportStatus::Completed,
        ]
    );
    assert!(op
        .output_path
        .as_ref()
        .unwrap()
        .ends_with("spring_collection.zip"));
    assert_eq!(op.metadata["title"], "Spring Collection");
    assert_eq!(op.metadata["file_count"], 2);
}

#[tokio::test]
async fn test_portfolio_without_bundle_keeps_site_directory() {
    let fixture = Fixture::new();
    fixture.add_file("one.jpg", b"first");
    let orchestrator = fixture.orchestrator().await;

    let portfolio = PortfolioOptions {
        bundle: false,
        ..PortfolioOptions::default()
    };
    let id = orchestrator.submit_export(
        ExportKind::HtmlPortfolio,
        ids(&["one.jpg"]),
        ExportOptions::default().with_portfolio(portfolio),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    assert!(!op.status_history.contains(&ExportStatus::Packaging));
    let site = op.output_path.unwrap();
    assert!(site.join("index.html").exists());
    assert!(site.join("images/001_one.jpg").exists());
}

#[tokio::test]
async fn test_progress_callback_is_non_decreasing() {
    let fixture = Fixture::new();
    let files = fixture.add_files(5, 32);
    let orchestrator = fixture.orchestrator().await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let id = orchestrator.submit_export_with_progress(
        ExportKind::BatchFiles,
        files,
        ExportOptions::default(),
        move |progress| sink.lock().unwrap().push(progress),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    let values = seen.lock().unwrap().clone();
    assert_eq!(values.len(), 5);
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(values.last().copied(), Some(1.0));
}

#[tokio::test]
async fn test_batch_with_missing_file_completes_with_warnings() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"a");
    fixture.add_file("c.png", b"c");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["a.png", "b.png", "c.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    assert_eq!(op.processed_files, 2);
    assert_eq!(op.unresolved_file_ids, ids(&["b.png"]));
    assert_eq!(op.warnings.len(), 1);
    assert!(op.progress < 1.0);
    assert!(op.download_token.is_some());
    assert_eq!(op.output_path, op.work_dir);
}

#[tokio::test]
async fn test_batch_where_every_transform_fails() {
    let fixture = Fixture::new();
    fixture.add_file("fail_1.png", b"x");
    fixture.add_file("fail_2.png", b"y");
    let collaborators = fixture
        .collaborators()
        .with_transformer(Arc::new(FailingTransformer));
    let orchestrator = fixture
        .orchestrator_with(fixture.config(), collaborators)
        .await;

    let id = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["fail_1.png", "fail_2.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Failed);
    assert_eq!(op.errors[0].error_type, ExportErrorType::Transform);
    assert_eq!(op.errors[0].message, "no files exported successfully");
    assert_eq!(op.unresolved_file_ids.len(), 2);
}

#[tokio::test]
async fn test_requested_format_renames_outputs() {
    let fixture = Fixture::new();
    fixture.add_file("photo.png", b"pixels");
    fixture.add_file("scan.tiff", b"more pixels");
    let orchestrator = fixture.orchestrator().await;

    let id = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["photo.png", "scan.tiff"]),
        ExportOptions::default().with_format(OutputFormat::Jpeg),
    );
    let op = orchestrator.wait_for_completion(&id).await.unwrap();

    assert_eq!(op.status, ExportStatus::Completed);
    let work_dir = op.work_dir.unwrap();
    assert!(work_dir.join("photo.jpg").exists());
    assert!(work_dir.join("scan.jpg").exists());
}

#[tokio::test]
async fn test_rejected_requests_are_failed_immediately() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    config.export.max_batch_size = 2;
    let orchestrator = fixture
        .orchestrator_with(config, fixture.collaborators())
        .await;

    let empty = orchestrator.submit_export(ExportKind::BatchFiles, vec![], ExportOptions::default());
    let oversized = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["a", "b", "c"]),
        ExportOptions::default(),
    );

    for id in [empty, oversized] {
        let op = orchestrator.get_operation(&id).unwrap();
        assert_eq!(op.status, ExportStatus::Failed);
        assert_eq!(op.errors[0].error_type, ExportErrorType::Validation);
        assert_eq!(
            op.status_history,
            vec![ExportStatus::Pending, ExportStatus::Failed]
        );
    }
}

#[tokio::test]
async fn test_statistics_and_listing() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"a");
    fixture.add_file("b.png", b"b");
    let orchestrator = fixture.orchestrator().await;

    let first = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["a.png", "b.png"]),
        ExportOptions::default(),
    );
    orchestrator.wait_for_completion(&first).await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let second =
        orchestrator.submit_export(ExportKind::ZipArchive, ids(&["ghost.png"]), ExportOptions::default());
    orchestrator.wait_for_completion(&second).await;

    let listed = orchestrator.list_operations(None, 10);
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second);
    assert_eq!(listed[1].id, first);

    let failed = orchestrator.list_operations(Some(ExportStatus::Failed), 10);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, second);

    let stats = orchestrator.get_statistics();
    assert_eq!(stats.total_operations, 2);
    assert_eq!(stats.active_operations, 0);
    assert_eq!(stats.by_status["completed"], 1);
    assert_eq!(stats.by_status["failed"], 1);
    assert_eq!(stats.by_status["pending"], 0);
    assert_eq!(stats.by_kind["batch_files"], 1);
    assert_eq!(stats.by_kind["zip_archive"], 1);
    assert_eq!(stats.by_kind["html_portfolio"], 0);
    assert_eq!(stats.success_rate, 0.5);
    assert_eq!(stats.total_files_exported, 2);
    assert_eq!(stats.average_batch_size, 2.0);
    assert_eq!(stats.recent_operations, 2);
}

#[tokio::test]
async fn test_heavy_exports_fail_fast_when_slots_are_taken() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"a");
    fixture.add_file("b.png", b"b");
    let mut config = fixture.config();
    config.export.max_concurrent_exports = 1;
    config.export.acquire_timeout_ms = 50;
    let collaborators = slow_collaborators(&fixture, Duration::from_millis(500));
    let orchestrator = fixture.orchestrator_with(config, collaborators).await;

    let busy = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["a.png"]),
        ExportOptions::default(),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(orchestrator.active_exports(), 1);

    let blocked = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["b.png"]),
        ExportOptions::default(),
    );
    let op = orchestrator.wait_for_completion(&blocked).await.unwrap();
    assert_eq!(op.status, ExportStatus::Failed);
    assert_eq!(op.errors[0].error_type, ExportErrorType::ConcurrencyExceeded);

    let op = orchestrator.wait_for_completion(&busy).await.unwrap();
    assert_eq!(op.status, ExportStatus::Completed);
    assert_eq!(orchestrator.active_exports(), 0);
}

#[tokio::test]
async fn test_single_file_skips_concurrency_limit() {
    let fixture = Fixture::new();
    fixture.add_file("a.png", b"a");
    fixture.add_file("b.png", b"b");
    let mut config = fixture.config();
    config.export.max_concurrent_exports = 1;
    config.export.acquire_timeout_ms = 10;
    let collaborators = slow_collaborators(&fixture, Duration::from_millis(200));
    let orchestrator = fixture.orchestrator_with(config, collaborators).await;

    let heavy = orchestrator.submit_export(
        ExportKind::BatchFiles,
        ids(&["a.png"]),
        ExportOptions::default(),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    let light = orchestrator.submit_export(
        ExportKind::SingleFile,
        ids(&["b.png"]),
        ExportOptions::default(),
    );

    let op = orchestrator.wait_for_completion(&light).await.unwrap();
    assert_eq!(op.status, ExportStatus::Completed);
    let op = orchestrator.wait_for_completion(&heavy).await.unwrap();
    assert_eq!(op.status, ExportStatus::Completed);
}
