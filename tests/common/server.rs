//! Mock optimizer front end built on wiremock

use serde_json::{Value, json};
use std::time::Duration;
use timetable_client::{Config, PollingConfig, SubmissionClient};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll interval short enough for real-time tests
pub const FAST_INTERVAL: Duration = Duration::from_millis(10);

/// Client pointed at `server`, polling every [`FAST_INTERVAL`] up to `max_polls` times
pub fn fast_client(server: &MockServer, max_polls: u32) -> SubmissionClient {
    let config = Config {
        base_url: server.uri(),
        polling: PollingConfig {
            interval: FAST_INTERVAL,
            max_polls,
        },
        ..Default::default()
    };
    SubmissionClient::new(config).expect("Failed to build client")
}

/// Accept one submission and hand out `task_id`
pub async fn mount_submit(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/send_admin_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": task_id })))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer status queries for `task_id` with `statuses` in order, repeating the last one
pub async fn mount_status_sequence(server: &MockServer, task_id: &str, statuses: &[Value]) {
    let status_path = format!("/task_status/{task_id}");
    let Some((last, leading)) = statuses.split_last() else {
        return;
    };

    // wiremock tries mocks in registration order, so each one-shot answer
    // is consumed before the next is reached.
    for status in leading {
        Mock::given(method("GET"))
            .and(path(status_path.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(status.clone()))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(last.clone()))
        .mount(server)
        .await;
}

/// Preview answers: the course file lacks `Faculty Name`, the others are clean
pub async fn mount_previews(server: &MockServer) {
    let answers = [
        (
            "courses",
            json!({
                "preview": [
                    {"Course code": "CS101", "Prof": "Dr. Rao", "Type": "Core", "Credits": 4},
                    {"Course code": "MA201", "Prof": "Dr. Iyer", "Type": "Elective", "Credits": 3}
                ],
                "extra_cols": ["Prof"],
                "missing_cols": ["Faculty Name"]
            }),
        ),
        (
            "faculty",
            json!({
                "preview": [{"Name": "Dr. Rao", "Busy Slot": "Mon 09:00"}],
                "extra_cols": [],
                "missing_cols": []
            }),
        ),
        (
            "students",
            json!({
                "preview": [{"Roll No.": "21CS001", "G CODE": "G1", "Sections": "A"}],
                "extra_cols": [],
                "missing_cols": []
            }),
        ),
    ];

    for (file_type, body) in answers {
        Mock::given(method("POST"))
            .and(path("/upload/"))
            .and(body_string_contains(file_type))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Number of status queries the server has seen
pub async fn status_queries(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path().starts_with("/task_status/"))
        .count()
}
