//! Single-actor request worker
//!
//! One task owns the `Background` and handles requests strictly one after
//! another: a request, including every storage and cookie jar call it makes,
//! completes before the next one is dequeued.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::background::Background;
use crate::error::CoreError;
use crate::protocol::{Request, Response};

const QUEUE_DEPTH: usize = 32;

type Job = (Request, oneshot::Sender<Response>);

/// Cloneable sender side of the worker queue
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
}

/// Start the worker on the current tokio runtime
pub fn spawn_worker(background: Background) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
    let background = Arc::new(background);

    tokio::spawn(async move {
        while let Some((request, reply)) = rx.recv().await {
            let action = request.action();
            let bg = Arc::clone(&background);

            // Store calls block on SQLite; keep them off the async threads
            let response = match tokio::task::spawn_blocking(move || bg.dispatch(request)).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(action, error = %e, "Request handler panicked");
                    Response::error(format!("Internal error handling {}", action))
                }
            };

            if reply.send(response).is_err() {
                tracing::debug!(action, "Caller went away before the response");
            }
        }

        tracing::info!("Background worker stopped");
    });

    WorkerHandle { tx }
}

impl WorkerHandle {
    /// Queue `request` and wait for its response
    pub async fn call(&self, request: Request) -> Response {
        let (reply_tx, reply_rx) = oneshot::channel();

        if self.tx.send((request, reply_tx)).await.is_err() {
            return CoreError::WorkerStopped.into();
        }

        reply_rx
            .await
            .unwrap_or_else(|_| CoreError::WorkerStopped.into())
    }

    /// Decode a raw message and queue it; undecodable messages are answered
    /// without reaching the worker.
    pub async fn call_value(&self, value: Value) -> Response {
        match Request::from_value(value) {
            Ok(request) => self.call(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected message");
                e.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use igswap_cookies::{BrowserCookieJar, Cookie};
    use igswap_storage::Database;
    use serde_json::json;
    use std::path::PathBuf;

    fn worker() -> WorkerHandle {
        let background = Background::with_parts(
            Config::new(PathBuf::from("/unused")),
            Database::open_in_memory().unwrap(),
            BrowserCookieJar::new(),
        );
        spawn_worker(background)
    }

    fn save(label: String, account_key: &str) -> Request {
        Request::SaveSession {
            account_name: label,
            cookies: Some(vec![
                Cookie::new("sessionid", "abc", ".instagram.com"),
                Cookie::new("ds_user_id", account_key, ".instagram.com"),
            ]),
        }
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let handle = worker();

        let saved = handle.call(save("Work".to_string(), "42")).await;
        assert!(!saved.is_error());

        let listed = handle
            .call_value(json!({ "action": "getSessions" }))
            .await
            .to_value()
            .unwrap();
        assert_eq!(listed["sessions"][0]["name"], "Work");
    }

    #[tokio::test]
    async fn test_concurrent_captures_do_not_lose_updates() {
        let handle = worker();

        let mut calls = Vec::new();
        for i in 0..8 {
            let handle = handle.clone();
            calls.push(tokio::spawn(async move {
                handle.call(save(format!("Work {}", i), "42")).await
            }));
        }
        for call in calls {
            assert!(!call.await.unwrap().is_error());
        }

        let listed = handle.call(Request::GetSessions).await.to_value().unwrap();
        assert_eq!(listed["sessions"].as_array().unwrap().len(), 1);

        // A second account queued behind the first is kept alongside it
        handle.call(save("Other".to_string(), "43")).await;
        let listed = handle.call(Request::GetSessions).await.to_value().unwrap();
        assert_eq!(listed["sessions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_message_is_answered() {
        let handle = worker();
        let response = handle
            .call_value(json!({ "action": "nope" }))
            .await
            .to_value()
            .unwrap();
        assert_eq!(response, json!({ "error": "Invalid action: nope" }));
    }
}
