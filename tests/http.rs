use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct UserSummary {
    username: String,
    record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    id: i64,
    start_date: String,
    start_time: String,
    end_date: String,
    end_time: String,
    duration: f64,
    comments: String,
}

#[derive(Debug, Deserialize)]
struct DailyTotal {
    date: String,
    total: f64,
}

#[derive(Debug, Deserialize)]
struct WeeklyAverage {
    week_key: String,
    average: f64,
}

#[derive(Debug, Deserialize)]
struct MonthlyAverage {
    month_key: String,
    average: f64,
}

#[derive(Debug, Deserialize)]
struct Stats {
    window_size: usize,
    daily_totals: Vec<DailyTotal>,
    rolling_average: Vec<f64>,
    weekly_averages: Vec<WeeklyAverage>,
    monthly_averages: Vec<MonthlyAverage>,
    overall_average: f64,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("sleep_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_sleep_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("SLEEP_ROLLING_WINDOW", "7")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn login(client: &Client, base_url: &str, username: &str) -> UserSummary {
    client
        .post(format!("{base_url}/api/login"))
        .json(&serde_json::json!({ "username": username }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn add_record(
    client: &Client,
    base_url: &str,
    username: &str,
    entry: serde_json::Value,
) -> Record {
    let response = client
        .post(format!("{base_url}/api/users/{username}/records"))
        .json(&entry)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_overnight_record_feeds_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let summary = login(&client, &server.base_url, "stats-user").await;
    assert_eq!(summary.username, "stats-user");
    assert_eq!(summary.record_count, 0);

    let record = add_record(
        &client,
        &server.base_url,
        "stats-user",
        serde_json::json!({
            "startDate": "2025-01-06",
            "startTime": "23:00",
            "endDate": "2025-01-06",
            "endTime": "06:00",
            "comments": "forgot to change the date"
        }),
    )
    .await;
    assert_eq!(record.duration, 7.0);
    assert_eq!(record.end_date, "2025-01-06");

    add_record(
        &client,
        &server.base_url,
        "stats-user",
        serde_json::json!({
            "startDate": "2025-01-08",
            "startTime": "22:00",
            "endDate": "2025-01-09",
            "endTime": "07:00"
        }),
    )
    .await;

    let stats: Stats = client
        .get(format!("{}/api/users/stats-user/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats.window_size, 7);
    assert_eq!(stats.daily_totals.len(), 2);
    assert_eq!(stats.daily_totals[0].date, "2025-01-06");
    assert_eq!(stats.daily_totals[1].total, 9.0);
    assert_eq!(stats.rolling_average, vec![7.0, 8.0]);
    assert_eq!(stats.weekly_averages.len(), 1);
    assert_eq!(stats.weekly_averages[0].week_key, "2025-W02");
    assert_eq!(stats.weekly_averages[0].average, 8.0);
    assert_eq!(stats.monthly_averages[0].month_key, "2025-01");
    assert_eq!(stats.monthly_averages[0].average, 8.0);
    assert_eq!(stats.overall_average, 8.0);
}

#[tokio::test]
async fn http_edit_and_delete_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    login(&client, &server.base_url, "edit-user").await;
    let record = add_record(
        &client,
        &server.base_url,
        "edit-user",
        serde_json::json!({
            "startDate": "2025-02-01",
            "startTime": "23:00",
            "endDate": "2025-02-02",
            "endTime": "07:00"
        }),
    )
    .await;

    let edited: Record = client
        .put(format!("{}/api/users/edit-user/records/{}", server.base_url, record.id))
        .json(&serde_json::json!({
            "startDate": "2025-02-01",
            "startTime": "23:30",
            "endDate": "2025-02-02",
            "endTime": "07:00",
            "comments": "later bedtime"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(edited.id, record.id);
    assert_eq!(edited.duration, 7.5);
    assert_eq!(edited.comments, "later bedtime");

    let response = client
        .delete(format!("{}/api/users/edit-user/records/{}", server.base_url, record.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{}/api/users/edit-user/records/{}", server.base_url, record.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let records: Vec<Record> = client
        .get(format!("{}/api/users/edit-user/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn http_export_then_import_round_trips() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    login(&client, &server.base_url, "export-user").await;
    for (start, end) in [("2025-03-01", "2025-03-02"), ("2025-03-02", "2025-03-03")] {
        add_record(
            &client,
            &server.base_url,
            "export-user",
            serde_json::json!({
                "startDate": start,
                "startTime": "22:15",
                "endDate": end,
                "endTime": "06:40",
                "comments": "batch"
            }),
        )
        .await;
    }

    let response = client
        .get(format!("{}/api/users/export-user/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("export-user_sleep_data.json"));
    let exported: Vec<Record> = response.json().await.unwrap();
    assert_eq!(exported.len(), 2);

    login(&client, &server.base_url, "import-user").await;
    let summary: UserSummary = client
        .post(format!("{}/api/users/import-user/import", server.base_url))
        .json(&exported)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary.record_count, 2);

    let mut imported: Vec<Record> = client
        .get(format!("{}/api/users/import-user/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut expected = exported.clone();
    imported.sort_by_key(|r| r.id);
    expected.sort_by_key(|r| r.id);
    assert_eq!(imported, expected);
}

#[tokio::test]
async fn http_rejects_malformed_and_unknown() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    login(&client, &server.base_url, "strict-user").await;
    let response = client
        .post(format!("{}/api/users/strict-user/records", server.base_url))
        .json(&serde_json::json!({
            "startDate": "2025-02-30",
            "startTime": "23:00",
            "endDate": "2025-03-01",
            "endTime": "07:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .get(format!("{}/api/users/nobody-here/stats", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{}/api/login", server.base_url))
        .json(&serde_json::json!({ "username": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_import_rejects_negative_duration() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    login(&client, &server.base_url, "poison-user").await;
    let kept = add_record(
        &client,
        &server.base_url,
        "poison-user",
        serde_json::json!({
            "startDate": "2025-04-01",
            "startTime": "23:00:40",
            "endDate": "2025-04-02",
            "endTime": "06:00"
        }),
    )
    .await;
    assert_eq!(kept.start_time, "23:00:40");
    assert_eq!(kept.duration, 6.99);

    let response = client
        .post(format!("{}/api/users/poison-user/import", server.base_url))
        .json(&serde_json::json!([{
            "id": 1,
            "startDate": "2025-04-03",
            "startTime": "23:00",
            "endDate": "2025-04-04",
            "endTime": "06:00",
            "duration": -40.0,
            "comments": ""
        }]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let records: Vec<Record> = client
        .get(format!("{}/api/users/poison-user/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records, vec![kept]);
}

#[tokio::test]
async fn http_edit_form_updates_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    login(&client, &server.base_url, "form-user").await;
    let record = add_record(
        &client,
        &server.base_url,
        "form-user",
        serde_json::json!({
            "startDate": "2025-05-01",
            "startTime": "22:00",
            "endDate": "2025-05-02",
            "endTime": "06:00"
        }),
    )
    .await;

    let page = client
        .get(format!("{}/users/form-user?edit={}", server.base_url, record.id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Edit entry"));

    let response = client
        .post(format!("{}/users/form-user/records/{}", server.base_url, record.id))
        .form(&[
            ("startDate", "2025-05-01"),
            ("startTime", "23:00"),
            ("endDate", "2025-05-02"),
            ("endTime", "06:00"),
            ("comments", "edited in the form"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let records: Vec<Record> = client
        .get(format!("{}/api/users/form-user/records", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration, 7.0);
    assert_eq!(records[0].comments, "edited in the form");
}
