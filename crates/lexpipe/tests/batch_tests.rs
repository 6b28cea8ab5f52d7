//! Archive upload and batch processing through `ProcessingService`.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::*;
use lexpipe::model::{BatchStatus, ProcessingStatus, UploadStatus};
use lexpipe::{HeuristicAnalyzer, LocalExtractor, ProcessingError, UploadError};

#[tokio::test]
async fn test_archive_counts_and_member_statuses() {
    let harness = TestHarness::new();
    let service = harness.default_service();
    let zip = build_zip(&[
        ("a.pdf", b"%PDF-1.4 not really a pdf"),
        ("b.exe", b"MZ"),
        ("notes.txt", LEASE_TEXT.as_bytes()),
    ]);

    let batch = service.upload_archive("docs.zip", zip).await.unwrap();

    assert_eq!(batch.total_files, 3);
    assert_eq!(batch.supported_files, 2);
    assert_eq!(batch.unsupported_files, 1);
    assert_eq!(batch.overall_status, BatchStatus::Extracted);
    assert_eq!(
        batch.files.iter().filter(|f| f.stored_path.is_some()).count(),
        2
    );

    let exe = batch.files.iter().find(|f| f.file_name == "b.exe").unwrap();
    assert_eq!(exe.status, UploadStatus::Unsupported);
    assert_eq!(exe.error.as_deref(), Some("Unsupported file format"));

    assert!(batch
        .extraction_directory
        .starts_with(&harness.scratch_dir));
    let registered = service.batch(&batch.batch_id).unwrap();
    assert_eq!(registered.total_files, 3);
}

#[tokio::test]
async fn test_batch_members_fail_independently() {
    let harness = TestHarness::new();
    let config = harness.config_builder().worker_count(2).build();
    let service = harness.service(
        &config,
        Arc::new(LocalExtractor::new()),
        Arc::new(HeuristicAnalyzer::new()),
    );
    let zip = build_zip(&[
        ("a.pdf", b"%PDF-1.4 not really a pdf"),
        ("b.exe", b"MZ"),
        ("notes.txt", LEASE_TEXT.as_bytes()),
    ]);
    let batch = service.upload_archive("docs.zip", zip).await.unwrap();

    let submitted = service
        .process_batch(&batch.batch_id, Default::default())
        .unwrap();
    assert_eq!(submitted, 2);

    let batch = service.batch(&batch.batch_id).unwrap();
    assert_eq!(batch.overall_status, BatchStatus::Processing);

    let mut outcomes = HashMap::new();
    for file in &batch.files {
        match file.status {
            UploadStatus::Processing => {
                let process_id = file.process_id.as_deref().unwrap();
                let record = wait_for_terminal(&service, process_id).await;
                outcomes.insert(file.file_name.clone(), record.status);
            }
            UploadStatus::Unsupported => assert!(file.process_id.is_none()),
            other => panic!("unexpected member status {:?}", other),
        }
    }

    assert_eq!(outcomes["notes.txt"], ProcessingStatus::Completed);
    assert_eq!(outcomes["a.pdf"], ProcessingStatus::Failed);
    assert_eq!(harness.list_outputs().len(), 1);
}

#[tokio::test]
async fn test_batch_started_twice_submits_once() {
    let harness = TestHarness::new();
    let service = harness.default_service();
    let zip = build_zip(&[("notes.txt", LEASE_TEXT.as_bytes())]);
    let batch = service.upload_archive("docs.zip", zip).await.unwrap();

    assert_eq!(
        service
            .process_batch(&batch.batch_id, Default::default())
            .unwrap(),
        1
    );
    assert_eq!(
        service
            .process_batch(&batch.batch_id, Default::default())
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_batch_without_supported_members() {
    let harness = TestHarness::new();
    let service = harness.default_service();
    let zip = build_zip(&[("tool.exe", b"MZ"), ("readme.md", b"# hi")]);
    let batch = service.upload_archive("junk.zip", zip).await.unwrap();

    assert_eq!(batch.supported_files, 0);
    assert_eq!(
        service
            .process_batch(&batch.batch_id, Default::default())
            .unwrap(),
        0
    );
    assert_eq!(
        service.batch(&batch.batch_id).unwrap().overall_status,
        BatchStatus::Extracted
    );
}

#[tokio::test]
async fn test_unknown_batch() {
    let harness = TestHarness::new();
    let service = harness.default_service();

    assert!(matches!(
        service.process_batch("no-such-batch", Default::default()),
        Err(ProcessingError::NotFound { kind: "Batch", .. })
    ));
}

#[tokio::test]
async fn test_unreadable_archive_is_rejected() {
    let harness = TestHarness::new();
    let service = harness.default_service();

    let result = service
        .upload_archive("broken.zip", b"not a zip at all".to_vec())
        .await;
    assert!(matches!(
        result,
        Err(UploadError::InvalidArchive(_))
    ));
}
