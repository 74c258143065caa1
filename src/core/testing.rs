//! Test doubles for the transport and clock ports.

use crate::core::{Delay, SourceResponse, StockSource};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Step {
    /// Connection-level failure, no status.
    Unreachable,
    Status(u16),
    Json(&'static str),
    Panic,
}

/// Replays a scripted sequence of responses per store. An exhausted or
/// missing script behaves like an unreachable host.
#[derive(Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, store_code: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(store_code.to_string(), steps.into());
        self
    }

    pub fn calls(&self, store_code: &str) -> u32 {
        self.calls.lock().unwrap().get(store_code).copied().unwrap_or(0)
    }
}

#[async_trait]
impl StockSource for ScriptedSource {
    async fn get_store(&self, store_code: &str) -> Result<SourceResponse> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(store_code.to_string())
            .or_insert(0) += 1;

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(store_code)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Unreachable);

        match step {
            Step::Unreachable => Err(EtlError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Step::Status(status) => Ok(SourceResponse {
                status,
                body: String::new(),
            }),
            Step::Json(body) => Ok(SourceResponse {
                status: 200,
                body: body.to_string(),
            }),
            Step::Panic => panic!("scripted panic for {}", store_code),
        }
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn recorded(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}
