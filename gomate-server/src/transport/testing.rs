//! Canned upstream for resolver tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::error::TransportError;
use super::request::{Upstream, UpstreamRequest};

enum Canned {
    Body(Value),
    Status(u16),
    Quota,
}

/// Serves canned responses keyed by the request's display form
/// (`/path?query`). Unknown requests fail with a 404.
#[derive(Default)]
pub struct FakeUpstream {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, request: &str, body: Value) -> Self {
        self.responses.insert(request.to_string(), Canned::Body(body));
        self
    }

    pub fn fail(mut self, request: &str, status: u16) -> Self {
        self.responses
            .insert(request.to_string(), Canned::Status(status));
        self
    }

    pub fn quota_exceeded(mut self, request: &str) -> Self {
        self.responses.insert(request.to_string(), Canned::Quota);
        self
    }

    /// Requests seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Upstream for FakeUpstream {
    async fn get(&self, request: &UpstreamRequest) -> Result<Value, TransportError> {
        let key = request.to_string();
        self.calls.lock().unwrap().push(key.clone());

        match self.responses.get(&key) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(TransportError::Api {
                status: *status,
                message: "canned failure".to_string(),
            }),
            Some(Canned::Quota) => Err(TransportError::QuotaExceeded {
                message: "usage limits exceeded".to_string(),
            }),
            None => Err(TransportError::Api {
                status: 404,
                message: format!("no canned response for {key}"),
            }),
        }
    }
}
