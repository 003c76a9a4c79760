//! Test-only helpers shared by unit test modules.

pub mod socket_guard;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::proxy::{FetchFailure, FetchOutcome, FetchRequest, FetchResponse, Transport};

/// Transport that records every request and replays scripted outcomes in order.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<FetchRequest>>,
    outcomes: Mutex<VecDeque<FetchOutcome>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: Vec<FetchOutcome>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(outcomes.into()),
        }
    }

    pub fn replying(body: serde_json::Value) -> Self {
        Self::with_outcomes(vec![Ok(FetchResponse { status: 200, body })])
    }

    pub fn failing(failure: FetchFailure) -> Self {
        Self::with_outcomes(vec![Err(failure)])
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: FetchRequest) -> FetchOutcome {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
        self.outcomes
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front())
            .unwrap_or_else(|| Err(FetchFailure::network("no scripted response")))
    }
}
