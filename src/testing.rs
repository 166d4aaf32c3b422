//! Scripted test doubles shared by the unit tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::{
    client::Navigator,
    transport::{ApiRequest, ApiResponse, Transport, TransportError},
};

#[derive(Clone)]
enum Scripted {
    Respond(ApiResponse),
    Fail,
}

/// In-memory [`Transport`] answering from per-path scripts.
///
/// Responses scripted for a path are consumed in order; the last one keeps
/// answering once the others are used up. Unscripted paths answer 404.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.push(path, Scripted::Respond(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, path: &str) {
        self.push(path, Scripted::Fail);
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Holds every request to `path` until the returned handle is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_request(&self, path: &str) -> Option<ApiRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }

    fn next(&self, path: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().get(&request.path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.next(&request.path) {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) => Err(TransportError::Other("connection refused".into())),
            None => Ok(ApiResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

pub struct RecordingNavigator {
    location: String,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> String {
        self.location.clone()
    }

    fn redirect(&self, target: &str) {
        self.redirects.lock().unwrap().push(target.to_string());
    }
}
