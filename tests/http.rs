use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JournalView {
    today: String,
    selected_date: String,
    is_today: bool,
    record: Value,
}

impl JournalView {
    fn entries(&self, key: &str) -> Vec<Value> {
        self.record[key].as_array().cloned().unwrap_or_default()
    }
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
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

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

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("food_journal_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/journal")).send().await {
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
    let child = Command::new(env!("CARGO_BIN_EXE_food_journal"))
        .env("PORT", port.to_string())
        .env("HOST", "127.0.0.1")
        .env("APP_DATA_DIR", unique_data_dir())
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

async fn send(request: reqwest::RequestBuilder) -> JournalView {
    let response = request.send().await.unwrap();
    assert!(response.status().is_success(), "status {}", response.status());
    response.json().await.unwrap()
}

async fn back_to_today(client: &Client, base_url: &str) -> JournalView {
    send(client.post(format!("{base_url}/api/date/today"))).await
}

#[tokio::test]
async fn http_add_meal_with_blank_time() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let before = back_to_today(&client, &server.base_url).await;
    assert!(before.is_today);

    let after = send(client.post(format!("{}/api/meals", server.base_url)).json(&json!({
        "source": "Eggs",
        "time": "",
        "calories": 140,
        "hungerBefore": 6,
        "hungerAfter": 3
    })))
    .await;

    let meals = after.entries("foodEntries");
    assert_eq!(meals.len(), before.entries("foodEntries").len() + 1);
    assert_eq!(meals[0]["source"], "Eggs");
    assert_eq!(meals[0]["calories"], 140);
    let time = meals[0]["time"].as_str().unwrap();
    assert_eq!(time.len(), 5);
    assert_eq!(&time[2..3], ":");
    assert!(!meals[0]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn http_blank_source_is_ignored() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let before = back_to_today(&client, &server.base_url).await;

    let after = send(
        client
            .post(format!("{}/api/meals", server.base_url))
            .json(&json!({ "source": "  ", "calories": 50 })),
    )
    .await;

    assert_eq!(after.entries("foodEntries"), before.entries("foodEntries"));
}

#[tokio::test]
async fn http_remove_activity() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    back_to_today(&client, &server.base_url).await;

    let added = send(
        client
            .post(format!("{}/api/activities", server.base_url))
            .json(&json!({ "type": "Walk", "duration": "30 min" })),
    )
    .await;
    let id = added.entries("activities")[0]["id"].as_str().unwrap().to_string();

    let unchanged = send(client.delete(format!("{}/api/activities/not-an-id", server.base_url))).await;
    assert_eq!(unchanged.entries("activities"), added.entries("activities"));

    let removed = send(client.delete(format!("{}/api/activities/{id}", server.base_url))).await;
    assert_eq!(
        removed.entries("activities").len(),
        added.entries("activities").len() - 1
    );
    assert!(removed.entries("activities").iter().all(|entry| entry["id"] != id.as_str()));
}

#[tokio::test]
async fn http_water_toggle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    back_to_today(&client, &server.base_url).await;

    let set = send(
        client
            .patch(format!("{}/api/record", server.base_url))
            .json(&json!({ "waterIntake": 3 })),
    )
    .await;
    assert_eq!(set.record["waterIntake"], 3);

    let lowered = send(client.post(format!("{}/api/water/2", server.base_url))).await;
    assert_eq!(lowered.record["waterIntake"], 2);

    let raised = send(client.post(format!("{}/api/water/5", server.base_url))).await;
    assert_eq!(raised.record["waterIntake"], 6);
}

#[tokio::test]
async fn http_select_date_materializes_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let view = send(
        client
            .post(format!("{}/api/date", server.base_url))
            .json(&json!({ "date": "2020-02-29" })),
    )
    .await;
    assert_eq!(view.selected_date, "2020-02-29");
    assert!(!view.is_today);
    assert_eq!(view.record["date"], "2020-02-29");

    let history: Value = client
        .get(format!("{}/api/history", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let dates: Vec<String> = history["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["date"].as_str().unwrap().to_string())
        .collect();
    assert!(dates.contains(&"2020-02-29".to_string()));
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
    assert_eq!(history["summaries"].as_array().unwrap().len(), dates.len());

    let today = back_to_today(&client, &server.base_url).await;
    assert_eq!(today.selected_date, today.today);
}

#[tokio::test]
async fn http_rejects_malformed_date() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/date", server.base_url))
        .json(&json!({ "date": "02/29/2020" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_recovery_exposes_raw_slots() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    back_to_today(&client, &server.base_url).await;

    send(
        client
            .patch(format!("{}/api/record", server.base_url))
            .json(&json!({ "notes": "recovery check" })),
    )
    .await;

    let raw: Value = client
        .get(format!("{}/api/recovery", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let log: Value = serde_json::from_str(raw["log"].as_str().unwrap()).unwrap();
    assert_eq!(log["notes"], "recovery check");
    let history: Value = serde_json::from_str(raw["history"].as_str().unwrap()).unwrap();
    assert!(history.as_array().unwrap().iter().any(|record| record["date"] == log["date"]));
}

#[tokio::test]
async fn http_index_renders() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let today = back_to_today(&client, &server.base_url).await;

    let body = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("<title>Food Journal</title>"));
    assert!(body.contains(&format!(r#"value="{}""#, today.today)));
}
