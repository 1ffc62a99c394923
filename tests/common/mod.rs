//! Shared fixtures for the integration tests
//!
//! - [`FakeBackend`]: an in-process axum server speaking the backend's JSON
//!   dialect, with in-memory users/links and per-endpoint request counters
//! - [`ScriptedPrompter`]: answers confirmations from a script and records
//!   every question and alert

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use shortlink_view::prompt::Prompter;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StoredUser {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub user_status: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StoredLink {
    pub id: i64,
    pub short_link: String,
    pub long_link: String,
    pub click_counter: u64,
    pub owner_id: i64,
    pub is_active: bool,
}

#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    links: Vec<StoredLink>,
    next_id: i64,
    hits: HashMap<String, usize>,
    /// Answer returned by the next request instead of the real handler
    failure: Option<(StatusCode, Value)>,
    /// Every write payload received, in order
    payloads: Vec<Value>,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

type Shared = Arc<Mutex<Store>>;

/// Running fake backend; the server task lives until the test ends
#[derive(Clone)]
pub struct FakeBackend {
    pub base_url: String,
    store: Shared,
}

impl FakeBackend {
    /// Starts the fake on an ephemeral local port
    pub async fn start() -> Self {
        let store = Shared::default();
        let app = Router::new()
            .route("/api/links/", post(create_link))
            .route("/api/users/", get(list_users).post(create_user).put(update_user))
            .route("/api/users/{id}", delete(delete_user))
            .route("/api/users/{id}/links/", get(user_links))
            .route("/dbinit/", get(init_db))
            .route("/demodb/", get(demo_db))
            .with_state(store.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend crashed");
        });

        Self {
            base_url: format!("http://{}", addr),
            store,
        }
    }

    /// Number of requests seen for `"<METHOD> <route>"`, e.g. `"GET /api/users/"`
    pub fn hits(&self, route: &str) -> usize {
        self.store.lock().unwrap().hits.get(route).copied().unwrap_or(0)
    }

    pub fn users(&self) -> Vec<StoredUser> {
        self.store.lock().unwrap().users.clone()
    }

    pub fn links(&self) -> Vec<StoredLink> {
        self.store.lock().unwrap().links.clone()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.store.lock().unwrap().payloads.clone()
    }

    pub fn add_user(&self, username: &str, enabled: bool) -> i64 {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        store.users.push(StoredUser {
            id,
            username: username.to_string(),
            password: "secret".to_string(),
            email: format!("{}@example.com", username),
            user_status: enabled,
            ..StoredUser::default()
        });
        id
    }

    pub fn add_link(&self, owner_id: i64, short_link: &str, long_link: &str) {
        let mut store = self.store.lock().unwrap();
        let id = store.next_id();
        store.links.push(StoredLink {
            id,
            short_link: short_link.to_string(),
            long_link: long_link.to_string(),
            owner_id,
            is_active: true,
            ..StoredLink::default()
        });
    }

    /// Makes the next request answer with `status` and `body`
    pub fn fail_next(&self, status: StatusCode, body: Value) {
        self.store.lock().unwrap().failure = Some((status, body));
    }
}

/// Counts the request and hands out a queued failure, if any
fn enter(store: &Shared, route: &str) -> Result<(), Response> {
    let mut store = store.lock().unwrap();
    *store.hits.entry(route.to_string()).or_default() += 1;
    match store.failure.take() {
        Some((status, body)) => Err((status, Json(body)).into_response()),
        None => Ok(()),
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Authorization header carries the caller's user id
fn caller(headers: &HeaderMap) -> i64 {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn text(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

async fn create_link(
    State(store): State<Shared>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    if let Err(response) = enter(&store, "POST /api/links/") {
        return response;
    }

    let long_link = text(&payload, "long_link").unwrap_or_default();
    if !long_link.starts_with("http://") && !long_link.starts_with("https://") {
        return error(StatusCode::BAD_REQUEST, "Link is not valid");
    }

    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    let mut store = store.lock().unwrap();
    store.payloads.push(payload.clone());
    let id = store.next_id();
    store.links.push(StoredLink {
        id,
        short_link: token.clone(),
        long_link,
        click_counter: 0,
        owner_id: caller(&headers),
        is_active: payload.get("is_active").and_then(Value::as_bool).unwrap_or(true),
    });

    (StatusCode::CREATED, Json(json!({ "created": token }))).into_response()
}

async fn user_links(State(store): State<Shared>, Path(id): Path<i64>) -> Response {
    if let Err(response) = enter(&store, "GET /api/users/{id}/links/") {
        return response;
    }

    let store = store.lock().unwrap();
    let found: Vec<&StoredLink> = store.links.iter().filter(|link| link.owner_id == id).collect();
    // The real backend sends null for an empty search
    if found.is_empty() {
        Json(json!({ "found": null })).into_response()
    } else {
        Json(json!({ "found": found })).into_response()
    }
}

async fn list_users(State(store): State<Shared>) -> Response {
    if let Err(response) = enter(&store, "GET /api/users/") {
        return response;
    }

    let store = store.lock().unwrap();
    Json(json!({ "found": store.users })).into_response()
}

async fn create_user(State(store): State<Shared>, Json(payload): Json<Value>) -> Response {
    if let Err(response) = enter(&store, "POST /api/users/") {
        return response;
    }

    let Some(username) = text(&payload, "username").filter(|name| !name.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "Username is required");
    };

    let mut store = store.lock().unwrap();
    store.payloads.push(payload.clone());
    if store.users.iter().any(|user| user.username == username) {
        return error(StatusCode::CONFLICT, "User already exists");
    }

    let id = store.next_id();
    store.users.push(StoredUser {
        id,
        username,
        password: text(&payload, "password").unwrap_or_default(),
        first_name: text(&payload, "first_name").unwrap_or_default(),
        last_name: text(&payload, "last_name").unwrap_or_default(),
        email: text(&payload, "email").unwrap_or_default(),
        phone: text(&payload, "phone").unwrap_or_default(),
        user_status: payload.get("user_status").and_then(Value::as_bool).unwrap_or(true),
    });

    (StatusCode::CREATED, Json(json!({ "created": id }))).into_response()
}

async fn update_user(State(store): State<Shared>, Json(payload): Json<Value>) -> Response {
    if let Err(response) = enter(&store, "PUT /api/users/") {
        return response;
    }

    let mut store = store.lock().unwrap();
    store.payloads.push(payload.clone());

    let Some(id) = payload.get("id").and_then(Value::as_i64) else {
        return error(StatusCode::BAD_REQUEST, "User id is required");
    };
    let Some(user) = store.users.iter_mut().find(|user| user.id == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };

    // Absent keys keep the stored value
    let fields: [(&str, &mut String); 6] = [
        ("username", &mut user.username),
        ("password", &mut user.password),
        ("first_name", &mut user.first_name),
        ("last_name", &mut user.last_name),
        ("email", &mut user.email),
        ("phone", &mut user.phone),
    ];
    for (key, slot) in fields {
        if let Some(value) = text(&payload, key) {
            *slot = value;
        }
    }
    if let Some(status) = payload.get("user_status").and_then(Value::as_bool) {
        user.user_status = status;
    }

    Json(json!({ "updated": id })).into_response()
}

async fn delete_user(State(store): State<Shared>, Path(id): Path<i64>) -> Response {
    if let Err(response) = enter(&store, "DELETE /api/users/{id}") {
        return response;
    }

    let mut store = store.lock().unwrap();
    let before = store.users.len();
    store.users.retain(|user| user.id != id);
    if store.users.len() == before {
        return error(StatusCode::NOT_FOUND, "User not found");
    }
    store.links.retain(|link| link.owner_id != id);

    Json(json!({ "deleted": id })).into_response()
}

async fn init_db(State(store): State<Shared>) -> Response {
    if let Err(response) = enter(&store, "GET /dbinit/") {
        return response;
    }

    let mut store = store.lock().unwrap();
    store.users.clear();
    store.links.clear();
    Json(json!({ "result": "DB Initialized" })).into_response()
}

async fn demo_db(State(store): State<Shared>) -> Response {
    if let Err(response) = enter(&store, "GET /demodb/") {
        return response;
    }

    let mut store = store.lock().unwrap();
    for (username, enabled) in [("admin", true), ("user", true), ("guest", false)] {
        let id = store.next_id();
        store.users.push(StoredUser {
            id,
            username: username.to_string(),
            password: username.to_string(),
            user_status: enabled,
            ..StoredUser::default()
        });
        let link_id = store.next_id();
        store.links.push(StoredLink {
            id: link_id,
            short_link: format!("{}00", username),
            long_link: format!("https://example.com/{}", username),
            owner_id: id,
            is_active: true,
            ..StoredLink::default()
        });
    }
    Json(json!({ "result": "Demo data is added" })).into_response()
}

#[derive(Default)]
struct Script {
    answers: VecDeque<bool>,
    questions: Vec<String>,
    alerts: Vec<String>,
}

/// Prompter answering confirmations from a queue; unscripted questions are declined
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPrompter {
    pub fn answering(answers: &[bool]) -> Self {
        let prompter = Self::default();
        prompter.script.lock().unwrap().answers.extend(answers);
        prompter
    }

    pub fn questions(&self) -> Vec<String> {
        self.script.lock().unwrap().questions.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.script.lock().unwrap().alerts.clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn confirm(&self, message: &str) -> bool {
        let mut script = self.script.lock().unwrap();
        script.questions.push(message.to_string());
        script.answers.pop_front().unwrap_or(false)
    }

    async fn alert(&self, message: &str) {
        self.script.lock().unwrap().alerts.push(message.to_string());
    }
}
