//! Reasoning-service adapter: provider abstraction for the service that
//! judges headlines. Replies are returned as raw text; shape validation
//! happens in the classifier.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;
use crate::error::ClassificationError;

pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, ClassificationError>> + Send + 'a>>;

/// Trait object used by the classifier.
pub trait ReasoningClient: Send + Sync {
    /// Send a system instruction plus a user message; return the reply text.
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// False when the client never calls out, so there is nothing to retry.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Convenient alias used by callers.
pub type DynReasoningClient = Arc<dyn ReasoningClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a mock answering a fixed neutral judgment.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the configured provider.
pub fn build_client_from_config(config: &ReasoningConfig) -> anyhow::Result<DynReasoningClient> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockReasoningClient::fixed(NEUTRAL_MOCK_REPLY)));
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledClient));
    }

    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChatClient::new(config)?)),
        "mock" => Ok(Arc::new(MockReasoningClient::fixed(NEUTRAL_MOCK_REPLY))),
        other => {
            tracing::warn!(target: "analyze", provider = other, "unknown reasoning provider, AI disabled");
            Ok(Arc::new(DisabledClient))
        }
    }
}

const NEUTRAL_MOCK_REPLY: &str =
    r#"{"impact":"Neutral","reasoning":"No material information (mock).","confidence":0.5}"#;

// ------------------------------------------------------------
// OpenAI chat completions
// ------------------------------------------------------------

/// Chat Completions provider with JSON-object response format.
pub struct OpenAiChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiChatClient {
    pub fn new(config: &ReasoningConfig) -> anyhow::Result<Self> {
        let api_key = config.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .user_agent("market-news-feed/0.1")
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    response_format: ResponseFormat,
}
#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

impl ReasoningClient for OpenAiChatClient {
    fn complete<'a>(&'a self, system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                return Err(ClassificationError::Transport("missing api key".into()));
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: system,
                    },
                    Msg {
                        role: "user",
                        content: user,
                    },
                ],
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .map_err(|e| ClassificationError::Transport(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(ClassificationError::Transport(format!("status {status}")));
            }
            let body: Resp = resp
                .json()
                .await
                .map_err(|e| ClassificationError::Transport(format!("completion body: {e}")))?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| ClassificationError::Transport("empty completion".into()))
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Disabled + mock
// ------------------------------------------------------------

/// Always fails; used when AI is disabled. Articles stay unanalyzed.
pub struct DisabledClient;

impl ReasoningClient for DisabledClient {
    fn complete<'a>(&'a self, _system: &'a str, _user: &'a str) -> CompletionFuture<'a> {
        Box::pin(async { Err(ClassificationError::Transport("reasoning disabled".into())) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
    fn is_enabled(&self) -> bool {
        false
    }
}

/// Scripted client for tests/local runs. Replies are consumed in order;
/// once the script is exhausted the fallback (if any) is returned.
pub struct MockReasoningClient {
    script: Mutex<VecDeque<Result<String, ClassificationError>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockReasoningClient {
    pub fn fixed(reply: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ClassificationError>>,
    {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// User messages received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl ReasoningClient for MockReasoningClient {
    fn complete<'a>(&'a self, _system: &'a str, user: &'a str) -> CompletionFuture<'a> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(user.to_string());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let out = match next {
            Some(r) => r,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| ClassificationError::Transport("mock script exhausted".into())),
        };
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
