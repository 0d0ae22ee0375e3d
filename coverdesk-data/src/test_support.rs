//! Scripted transport for unit tests

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted reply
pub(crate) enum Reply {
    Respond(u16, &'static str),
    Fail(TransportError),
    /// Sleep before answering, to exercise timeouts and cancellation
    Stall(Duration),
}

/// Replays scripted replies in order and records every request it receives
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Respond(status, body)) => Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Err(TransportError::Request("stalled reply finished".to_string()))
            }
            None => panic!("transport called more times than scripted"),
        }
    }
}
