//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::core::error::{ApiError, ChannelError};
use crate::core::service::HttpTransport;
use crate::embed::channel::ParentChannel;
use crate::services::api::transport::{HttpRequest, HttpResponse};

type PostHook = Box<dyn Fn(&Value) + Send + Sync>;

/// Records every posted message and optionally reacts to it.
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<Value>>,
    hook: Mutex<Option<PostHook>>,
    failing: Mutex<bool>,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `hook` for every posted message, after it is recorded.
    pub fn on_post(&self, hook: impl Fn(&Value) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    pub fn fail_posts(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn messages(&self) -> Vec<Value> {
        self.messages.lock().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .map(|m| m.get("type").and_then(Value::as_str).unwrap_or_default().to_string())
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().iter().filter(|k| k.as_str() == kind).count()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl ParentChannel for RecordingChannel {
    fn post_value(&self, value: Value) -> Result<(), ChannelError> {
        if *self.failing.lock() {
            return Err(ChannelError::Io("closed".to_string()));
        }
        self.messages.lock().push(value.clone());
        if let Some(hook) = self.hook.lock().as_ref() {
            hook(&value);
        }
        Ok(())
    }
}

/// One scripted transport outcome.
pub enum Scripted {
    Respond(HttpResponse),
    Fail(String),
    Hang,
}

pub fn respond(status: u16, body: impl Into<String>) -> Scripted {
    let status_text = match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    };
    Scripted::Respond(HttpResponse {
        status,
        status_text: status_text.to_string(),
        body: body.into(),
    })
}

/// Transport replaying scripted outcomes, matched by URL substring in the
/// order they were added.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<(String, VecDeque<Scripted>)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, url_fragment: &str, outcome: Scripted) {
        let mut routes = self.routes.lock();
        match routes.iter_mut().find(|(fragment, _)| fragment == url_fragment) {
            Some((_, queue)) => queue.push_back(outcome),
            None => routes.push((url_fragment.to_string(), VecDeque::from([outcome]))),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let outcome = {
            let mut routes = self.routes.lock();
            routes
                .iter_mut()
                .filter(|(fragment, queue)| request.url.contains(fragment.as_str()) && !queue.is_empty())
                .find_map(|(_, queue)| queue.pop_front())
        };
        self.requests.lock().push(request);

        match outcome {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(ApiError::Transport(message)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Ok(HttpResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: "no script".to_string(),
            }),
        }
    }
}
