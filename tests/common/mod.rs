#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use multiverse::error::{MultiverseError, Result};
use multiverse::fetch::{RawResponse, Transport};
use serde_json::{Value, json};

pub const BASE: &str = "https://rm.test/api";

#[derive(Clone)]
enum Reply {
    Body(u16, String),
    Fail(String),
}

#[derive(Clone)]
struct Route {
    reply: Reply,
    delay: Duration,
}

#[derive(Default)]
struct FakeState {
    routes: HashMap<String, Route>,
    requests: Vec<String>,
    completed: Vec<String>,
    journal: Vec<String>,
}

/// In-memory transport answering from a URL → reply table. Unrouted URLs get
/// a plain 404.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }
    fn insert(&self, url: &str, reply: Reply) {
        let mut state = self.state.lock().unwrap();
        let delay = state.routes.get(url).map(|r| r.delay).unwrap_or_default();
        state.routes.insert(url.to_string(), Route { reply, delay });
    }
    pub fn route(&self, url: &str, body: impl Into<String>) -> &Self {
        self.insert(url, Reply::Body(200, body.into()));
        self
    }
    pub fn route_status(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        self.insert(url, Reply::Body(status, body.into()));
        self
    }
    pub fn route_failure(&self, url: &str, message: &str) -> &Self {
        self.insert(url, Reply::Fail(message.to_string()));
        self
    }
    pub fn delay(&self, url: &str, ms: u64) -> &Self {
        let mut state = self.state.lock().unwrap();
        if let Some(route) = state.routes.get_mut(url) {
            route.delay = Duration::from_millis(ms);
        }
        self
    }
    /// URLs in the order they were requested.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
    /// URLs in the order their responses were produced.
    pub fn completed(&self) -> Vec<String> {
        self.state.lock().unwrap().completed.clone()
    }
    /// Requests and responses interleaved as they happened, as `sent <url>`
    /// and `done <url>`.
    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let route = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(url.to_string());
            state.journal.push(format!("sent {url}"));
            state.routes.get(url).cloned()
        };
        let Some(route) = route else {
            return Ok(RawResponse { status: 404, body: "not routed".into() });
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        {
            let mut state = self.state.lock().unwrap();
            state.completed.push(url.to_string());
            state.journal.push(format!("done {url}"));
        }
        match route.reply {
            Reply::Body(status, body) => Ok(RawResponse { status, body }),
            Reply::Fail(message) => Err(MultiverseError::transport(url, message)),
        }
    }
}

// ------------- Fixtures -------------
pub fn page_url(collection: &str, page: u32) -> String {
    format!("{BASE}/{collection}?page={page}")
}

pub fn item_url(collection: &str, id: u64) -> String {
    format!("{BASE}/{collection}/{id}")
}

pub fn page_body(results: Vec<Value>, next: Option<String>) -> String {
    json!({
        "info": { "count": results.len(), "pages": 1, "next": next, "prev": null },
        "results": results,
    })
    .to_string()
}

pub fn character(id: u64, name: &str, status: &str, species: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "status": status,
        "species": species,
        "type": "",
        "gender": "Male",
        "origin": { "name": "Earth (C-137)", "url": item_url("location", 1) },
        "location": { "name": "Citadel of Ricks", "url": item_url("location", 3) },
        "image": format!("{BASE}/character/avatar/{id}.jpeg"),
        "episode": [item_url("episode", 1), item_url("episode", 2)],
        "url": item_url("character", id),
        "created": "2017-11-04T18:48:46.250Z",
    })
}

pub fn episode(id: u64, name: &str, code: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "air_date": "December 2, 2013",
        "episode": code,
        "characters": [item_url("character", 1), item_url("character", 2)],
        "url": item_url("episode", id),
        "created": "2017-11-10T12:56:33.798Z",
    })
}

pub fn location(id: u64, name: &str, kind: &str, dimension: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": kind,
        "dimension": dimension,
        "residents": [item_url("character", 38)],
        "url": item_url("location", id),
        "created": "2017-11-10T12:42:04.162Z",
    })
}

/// `count` generic characters with ids starting at `first_id`.
pub fn characters(first_id: u64, count: u64) -> Vec<Value> {
    (first_id..first_id + count)
        .map(|id| character(id, &format!("Citizen {id}"), "Alive", "Human"))
        .collect()
}
