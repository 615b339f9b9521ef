//! End-to-end coverage of the versioned write path: collision handling,
//! version selection, upload validation and the lock-serialized concurrent
//! case.

use collector::config::CollectorConfig;
use collector::coordinator::IoCoordinator;
use collector::error::CollectorError;
use collector::fs::OsFileStore;
use collector::services::submissions::{
    select_latest, IncomingSubmission, StoreRequest, VersionedWriter,
};
use collector::task_controller::state::{start_submission_recorder, SubmissionUpdate, TasksState};
use collector::validate::SignatureValidator;
use common::model::task::{Task, TaskType, VersioningMode};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;

fn writer() -> VersionedWriter<OsFileStore, SignatureValidator> {
    let _ = env_logger::builder().is_test(true).try_init();
    VersionedWriter::new(OsFileStore, SignatureValidator, IoCoordinator::new())
}

fn csv_allow_list() -> Vec<String> {
    vec![".csv".to_string()]
}

fn listed_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn autoversion_produces_the_expected_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer();
    let allow = csv_allow_list();

    for i in 0..4u32 {
        let payload = format!("a,b\n{},{}\n", i, i);
        writer
            .store(StoreRequest {
                folder: dir.path(),
                base_filename: "ada_123_rd.csv",
                bytes: payload.as_bytes(),
                mode: VersioningMode::AutoVersion,
                allowed_extensions: &allow,
            })
            .await
            .unwrap();
    }

    let names = listed_names(dir.path());
    assert_eq!(
        names,
        vec![
            "ada_123_rd.csv",
            "ada_123_rd_v1.csv",
            "ada_123_rd_v2.csv",
            "ada_123_rd_v3.csv"
        ]
    );

    let latest = select_latest(names.iter().map(String::as_str)).unwrap();
    assert_eq!(latest, Some("ada_123_rd_v3.csv"));
}

#[tokio::test]
async fn overwrite_keeps_exactly_one_file_with_the_second_payload() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer();
    let allow = csv_allow_list();

    for payload in ["a\nfirst\n", "a\nsecond\n"] {
        writer
            .store(StoreRequest {
                folder: dir.path(),
                base_filename: "ada_123_rd.csv",
                bytes: payload.as_bytes(),
                mode: VersioningMode::Overwrite,
                allowed_extensions: &allow,
            })
            .await
            .unwrap();
    }

    let names = listed_names(dir.path());
    assert_eq!(names, vec!["ada_123_rd.csv"]);
    let content = fs::read_to_string(dir.path().join("ada_123_rd.csv")).unwrap();
    assert_eq!(content, "a\nsecond\n");
}

#[tokio::test]
async fn concurrent_autoversion_writes_never_collide() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Arc::new(writer());
    let allow = Arc::new(csv_allow_list());

    let mut handles = Vec::new();
    for i in 0..8u32 {
        let writer = writer.clone();
        let allow = allow.clone();
        let folder = dir.path().to_path_buf();
        handles.push(tokio::spawn(async move {
            let payload = format!("a\n{}\n", i);
            writer
                .store(StoreRequest {
                    folder: &folder,
                    base_filename: "ada_123_rd.csv",
                    bytes: payload.as_bytes(),
                    mode: VersioningMode::AutoVersion,
                    allowed_extensions: &allow,
                })
                .await
                .unwrap()
        }));
    }

    let mut stored = Vec::new();
    for h in handles {
        stored.push(h.await.unwrap());
    }
    stored.sort();
    stored.dedup();
    // Eight writers, eight strictly distinct paths.
    assert_eq!(stored.len(), 8);
    assert_eq!(listed_names(dir.path()).len(), 8);
}

#[tokio::test]
async fn accepted_submissions_land_and_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig::new(dir.path());
    let writer = writer();

    let (tx, rx) = mpsc::channel(8);
    let state = TasksState::new(tx.clone());
    let task = state
        .create_task(Task {
            id: String::new(),
            slug: "q3".to_string(),
            title: "Quarterly numbers".to_string(),
            task_type: TaskType::FileCollection,
            versioning: VersioningMode::AutoVersion,
            submission_count: 0,
            max_submissions: None,
            is_active: true,
            allowed_extensions: csv_allow_list(),
            allow_attachments: true,
        })
        .await;
    let recorder = tokio::spawn(start_submission_recorder(state.clone(), rx));

    // The same submitter uploads twice; the second copy must get _v1 and
    // both must be recorded.
    for payload in ["a,b\n1,2\n", "a,b\n3,4\n"] {
        let submission = writer
            .accept(
                &config,
                &task,
                IncomingSubmission {
                    submitter_name: "Ada",
                    contact: "13800001111",
                    department: "R&D",
                    original_filename: "numbers.csv",
                    bytes: payload.as_bytes(),
                    client_addr: Some("10.0.0.7"),
                    attachment: Some(("proof.csv", b"k,v\n1,2\n")),
                },
            )
            .await
            .unwrap();
        tx.send(SubmissionUpdate { submission }).await.unwrap();
    }

    // Wait for the recorder to apply both updates.
    for _ in 0..100 {
        if state.submissions.read().await.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(state.submissions.read().await.len(), 2);
    assert_eq!(state.task(&task.id).await.unwrap().submission_count, 2);
    let recorded = state.submissions.read().await;
    assert_eq!(recorded[0].stored_filename, "Ada_13800001111_R&D.csv");
    assert_eq!(recorded[1].stored_filename, "Ada_13800001111_R&D_v1.csv");
    assert_eq!(
        recorded[1].attachment_path.as_deref(),
        Some("attachments/Ada_proof_v1.csv")
    );
    drop(recorded);
    recorder.abort();

    let collection = config.collection_dir(&task);
    let names = listed_names(&collection);
    assert_eq!(
        names,
        vec![
            "Ada_13800001111_R&D.csv",
            "Ada_13800001111_R&D_v1.csv",
            "attachments"
        ]
    );
    let attachments = listed_names(&config.attachment_dir(&task));
    assert_eq!(attachments, vec!["Ada_proof.csv", "Ada_proof_v1.csv"]);
}

#[tokio::test]
async fn discarding_a_stored_file_keeps_the_other_versions() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer();
    let allow = csv_allow_list();

    for _ in 0..2 {
        writer
            .store(StoreRequest {
                folder: dir.path(),
                base_filename: "ada_123_rd.csv",
                bytes: b"a\n1\n",
                mode: VersioningMode::AutoVersion,
                allowed_extensions: &allow,
            })
            .await
            .unwrap();
    }

    writer.discard(dir.path(), "ada_123_rd_v1.csv").await.unwrap();
    let names = listed_names(dir.path());
    assert_eq!(names, vec!["ada_123_rd.csv"]);
    let latest = select_latest(names.iter().map(String::as_str)).unwrap();
    assert_eq!(latest, Some("ada_123_rd.csv"));
}

#[tokio::test]
async fn inactive_or_full_tasks_reject_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let config = CollectorConfig::new(dir.path());
    let writer = writer();
    let mut task = Task {
        id: "t1".to_string(),
        slug: "s".to_string(),
        title: "T".to_string(),
        task_type: TaskType::FileCollection,
        versioning: VersioningMode::Overwrite,
        submission_count: 1,
        max_submissions: Some(1),
        is_active: true,
        allowed_extensions: csv_allow_list(),
        allow_attachments: false,
    };
    let incoming = || IncomingSubmission {
        submitter_name: "Ada",
        contact: "123",
        department: "D",
        original_filename: "n.csv",
        bytes: b"a\n1\n",
        client_addr: None,
        attachment: None,
    };

    let full = writer.accept(&config, &task, incoming()).await;
    assert!(matches!(
        full,
        Err(CollectorError::SubmissionRejected { .. })
    ));

    task.max_submissions = None;
    task.is_active = false;
    let inactive = writer.accept(&config, &task, incoming()).await;
    assert!(matches!(
        inactive,
        Err(CollectorError::SubmissionRejected { .. })
    ));
}

#[tokio::test]
async fn disallowed_extension_and_garbage_content_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let writer = writer();
    let allow = csv_allow_list();

    let wrong_ext = writer
        .store(StoreRequest {
            folder: dir.path(),
            base_filename: "ada_123_rd.txt",
            bytes: b"hello",
            mode: VersioningMode::AutoVersion,
            allowed_extensions: &allow,
        })
        .await;
    assert!(matches!(
        wrong_ext,
        Err(CollectorError::SubmissionRejected { .. })
    ));

    let bad_magic = writer
        .store(StoreRequest {
            folder: dir.path(),
            base_filename: "ada_123_rd.csv",
            bytes: &[0xFF, 0xFE, 0x00, 0x13],
            mode: VersioningMode::AutoVersion,
            allowed_extensions: &allow,
        })
        .await;
    assert!(matches!(
        bad_magic,
        Err(CollectorError::SubmissionRejected { .. })
    ));

    // Nothing was written for either rejected submission.
    assert!(listed_names(dir.path()).is_empty());
}
