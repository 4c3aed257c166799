//! In-memory posts API for integration tests.
//!
//! Serves the same routes as JSONPlaceholder but keeps state, so a created
//! post can be read back and a deleted one really disappears.

#![allow(dead_code, clippy::unwrap_used)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    posts: BTreeMap<u64, Value>,
    deleted: Vec<u64>,
    fail_deletes: bool,
}

type Shared = Arc<Mutex<Store>>;

/// A running posts server bound to a random local port.
#[derive(Debug)]
pub struct PostsServer {
    base_url: String,
    store: Shared,
    handle: JoinHandle<()>,
}

impl PostsServer {
    /// Start with posts 1-3 by user 1 and post 4 by user 2.
    pub async fn start() -> Self {
        let mut store = Store {
            next_id: 5,
            ..Store::default()
        };
        for (id, user) in [(1, 1), (2, 1), (3, 1), (4, 2)] {
            let _ = store.posts.insert(
                id,
                json!({"userId": user, "id": id, "title": format!("post {id}"), "body": "seeded"}),
            );
        }
        let store = Arc::new(Mutex::new(store));

        let app = Router::new()
            .route("/posts", get(list).post(create))
            .route(
                "/posts/{id}",
                get(read).put(replace).patch(patch).delete(remove),
            )
            .with_state(Arc::clone(&store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            handle,
        }
    }

    /// Root URL, e.g. `http://127.0.0.1:41234`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ids currently stored
    pub fn live_ids(&self) -> Vec<u64> {
        self.store.lock().unwrap().posts.keys().copied().collect()
    }

    /// Ids removed through DELETE, in order
    pub fn deleted(&self) -> Vec<u64> {
        self.store.lock().unwrap().deleted.clone()
    }

    /// Make every DELETE answer 500
    pub fn fail_deletes(&self) {
        self.store.lock().unwrap().fail_deletes = true;
    }
}

impl Drop for PostsServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Accepts connections and never answers them.
#[derive(Debug)]
pub struct SilentServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl SilentServer {
    /// Bind to a random local port
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Root URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn list(
    State(store): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let store = store.lock().unwrap();
    let wanted = params.get("userId").and_then(|u| u.parse::<u64>().ok());
    let posts = store
        .posts
        .values()
        .filter(|p| wanted.map_or(true, |u| p["userId"] == json!(u)))
        .cloned()
        .collect();
    Json(posts)
}

async fn create(State(store): State<Shared>, Json(mut body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    let id = store.next_id;
    store.next_id += 1;
    body["id"] = json!(id);
    let _ = store.posts.insert(id, body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn read(State(store): State<Shared>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let store = store.lock().unwrap();
    store.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace(
    State(store): State<Shared>,
    Path(id): Path<u64>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    if !store.posts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    body["id"] = json!(id);
    let _ = store.posts.insert(id, body.clone());
    Ok(Json(body))
}

async fn patch(
    State(store): State<Shared>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    let post = store.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let (Some(target), Some(changes)) = (post.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            let _ = target.insert(key.clone(), value.clone());
        }
    }
    Ok(Json(post.clone()))
}

async fn remove(State(store): State<Shared>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let mut store = store.lock().unwrap();
    if store.fail_deletes {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    store.posts.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    store.deleted.push(id);
    Ok(Json(json!({})))
}
