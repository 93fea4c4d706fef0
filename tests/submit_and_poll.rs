//! End-to-end tests for the upload, submit and poll workflow
//!
//! Every test runs against a wiremock server standing in for the optimizer
//! front end:
//! - files are read from disk and previewed
//! - a column mapping is confirmed and sent with the submission
//! - the task is polled to a terminal state through a real HTTP client

mod common;

use common::{
    FAST_INTERVAL, fast_client, mount_previews, mount_status_sequence, mount_submit,
    status_queries, write_inputs,
};
use serde_json::json;
use std::time::Duration;
use timetable_client::{
    ColumnMapping, Error, LoadingOverlay, OverlayConfig, OverlayState, SourceFile, SubmissionSession,
    TaskPoller, TaskState, TaskStatus, Toggle, TransportError, UploadFile,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session with all three files previewed and the course mapping confirmed
async fn prepared_session(server: &MockServer) -> SubmissionSession {
    let client = fast_client(server, 50);
    let inputs = write_inputs();
    let mut session = SubmissionSession::new();

    for (file, path) in &inputs.paths {
        let upload = UploadFile::from_path(path).await.unwrap();
        session.load_preview(&client, *file, upload).await.unwrap();
    }

    let mapping: ColumnMapping = [("Prof", "Faculty Name")].into_iter().collect();
    let diff = session.confirm_mapping(SourceFile::Courses, mapping);
    assert!(diff.is_clean(), "mapping should resolve the course columns: {diff:?}");

    session.set_toggle(Toggle::SameDay, true);
    session
}

#[tokio::test]
async fn full_run_from_disk_to_completed_task() {
    let server = MockServer::start().await;
    mount_previews(&server).await;
    Mock::given(method("POST"))
        .and(path("/send_admin_data"))
        .and(body_string_contains(r#""Prof":"Faculty Name""#))
        .and(body_string_contains("name=\"student_courses_file\"; filename=\"enrolment.xlsx\""))
        .and(body_string_contains("toggle_same_day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "run-1"})))
        .expect(1)
        .mount(&server)
        .await;
    mount_status_sequence(
        &server,
        "run-1",
        &[
            json!({"status": "pending"}),
            json!({"status": "running", "progress": "Allocating sections"}),
            json!({"status": "running"}),
            json!({"status": "completed", "progress": "Done"}),
        ],
    )
    .await;

    let session = prepared_session(&server).await;
    assert_eq!(
        session.preview_rows(SourceFile::Courses)[0]["Faculty Name"],
        "Dr. Rao"
    );

    let client = fast_client(&server, 50);
    let poller = TaskPoller::from_config(&client.config().polling);
    let mut overlay = LoadingOverlay::new(OverlayConfig::timetable_generation());
    let mut views = overlay.subscribe();

    let status = session
        .run(&client, &poller, &mut overlay, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status.status, TaskState::Completed);
    assert_eq!(status.progress.as_deref(), Some("Done"));
    assert_eq!(status_queries(&server).await, 4);
    assert!(!overlay.is_visible());
    assert!(views.has_changed().unwrap());
    assert_eq!(views.borrow_and_update().state, OverlayState::Hidden);
}

#[tokio::test]
async fn progress_callback_sees_every_status() {
    let server = MockServer::start().await;
    mount_previews(&server).await;
    mount_submit(&server, "run-2").await;
    mount_status_sequence(
        &server,
        "run-2",
        &[
            json!({"status": "running", "progress": "Reading inputs"}),
            json!({"status": "running", "progress": "Solving"}),
            json!({"status": "completed"}),
        ],
    )
    .await;

    let session = prepared_session(&server).await;
    let client = fast_client(&server, 50);
    let mut seen = Vec::new();
    let mut on_progress = |status: &TaskStatus, text: Option<&str>| {
        seen.push((status.status, text.map(str::to_string)));
    };

    session
        .run(&client, &TaskPoller::from_config(&client.config().polling), &mut on_progress, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            (TaskState::Running, Some("Reading inputs".to_string())),
            (TaskState::Running, Some("Solving".to_string())),
            (TaskState::Completed, Some("Solving".to_string())),
        ]
    );
}

#[tokio::test]
async fn never_finishing_task_times_out_at_the_ceiling() {
    let server = MockServer::start().await;
    mount_previews(&server).await;
    mount_submit(&server, "slow").await;
    Mock::given(method("GET"))
        .and(path("/task_status/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .expect(3)
        .mount(&server)
        .await;

    let session = prepared_session(&server).await;
    let client = fast_client(&server, 3);
    let err = session
        .run(
            &client,
            &TaskPoller::from_config(&client.config().polling),
            &mut timetable_client::NoProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        Error::Timeout { polls, waited, .. } => {
            assert_eq!(polls, 3);
            assert_eq!(waited, FAST_INTERVAL * 2);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_while_polling_is_not_retried() {
    let server = MockServer::start().await;
    mount_previews(&server).await;
    mount_submit(&server, "broken").await;
    Mock::given(method("GET"))
        .and(path("/task_status/broken"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "optimizer crashed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = prepared_session(&server).await;
    let client = fast_client(&server, 50);
    let err = session
        .run(
            &client,
            &TaskPoller::from_config(&client.config().polling),
            &mut timetable_client::NoProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        Error::Polling(e) => match e.source {
            TransportError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "optimizer crashed");
            }
            other => panic!("expected status error, got {other:?}"),
        },
        other => panic!("expected polling error, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelling_mid_run_stops_polling() {
    let server = MockServer::start().await;
    mount_previews(&server).await;
    mount_submit(&server, "cancel-me").await;
    mount_status_sequence(&server, "cancel-me", &[json!({"status": "running"})]).await;

    let session = prepared_session(&server).await;
    let client = fast_client(&server, 10_000);
    let poller = TaskPoller::new(Duration::from_millis(20), 10_000);
    let cancel = CancellationToken::new();
    let mut overlay = LoadingOverlay::default();

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let err = session
        .run(&client, &poller, &mut overlay, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "cancelled");
    assert!(!overlay.is_visible(), "overlay is released on cancellation");

    let queries = status_queries(&server).await;
    assert!(queries >= 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(status_queries(&server).await, queries, "no query after cancellation");
}

#[tokio::test]
async fn incomplete_session_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = SubmissionSession::new();
    session.select(SourceFile::Courses, UploadFile::new("courses.csv", ""));
    session.select(SourceFile::Faculty, UploadFile::new("faculty.pdf", "Name\n"));

    let client = fast_client(&server, 5);
    let err = session
        .run(
            &client,
            &TaskPoller::default(),
            &mut timetable_client::NoProgress,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    let Error::Validation(validation) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        validation.files(),
        vec![SourceFile::Courses, SourceFile::Faculty, SourceFile::Students]
    );
    let message = validation.to_string();
    assert!(message.contains("Courses file is empty"), "{message}");
    assert!(message.contains("faculty.pdf"), "{message}");
    assert!(message.contains("Student courses file is missing"), "{message}");
}
