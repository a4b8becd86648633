//! Scripted transport fake shared by the client and auth unit tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::net::error::ApiError;
use crate::net::transport::{ApiRequest, ApiResponse, Transport};

fn key(method: &reqwest::Method, path: &str) -> String {
    format!("{method} {path}")
}

/// Replays queued responses per `METHOD path` and records every request it
/// sees. Yields before responding so concurrent callers interleave the way
/// real network calls do.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&self, method: reqwest::Method, path: &str, status: u16, body: Value) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key(&method, path))
            .or_default()
            .push_back(ApiResponse { status, body });
    }

    /// Every request sent, in order.
    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many requests hit the given path.
    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse, ApiError>> + Send {
        async move {
            tokio::task::yield_now().await;
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request.clone());
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get_mut(&key(&request.method, &request.path))
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| {
                    ApiError::Network(format!(
                        "no scripted response for {} {}",
                        request.method, request.path
                    ))
                })
        }
    }
}
