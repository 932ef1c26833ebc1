use async_trait::async_trait;
use ledger_core::{CommandInterpreter, CommandReply, CommandRequest, DispatchError, parse_reply};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::{self, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
        }
    }
}

/// Everything an interpreter needs, resolved up front. A missing `api_key`
/// is only reported when a command is sent.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl LlmConfig {
    pub fn from_config(cfg: &Config, api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            provider: cfg.provider()?,
            model: config::normalize_model(&cfg.llm.model),
            base_url: cfg.llm.base_url.trim_end_matches('/').to_string(),
            temperature: cfg.llm.temperature,
            timeout: cfg.timeout(),
            api_key,
        })
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Talks to a hosted model over HTTPS and asks for the reply schema.
pub struct HttpInterpreter {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpInterpreter {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    async fn gemini_complete(&self, key: &str, system: &str, prompt: &str) -> Result<String, DispatchError> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            role: Option<&'a str>,
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GenerationConfig {
            response_mime_type: &'static str,
            response_schema: Value,
            temperature: f32,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Req<'a> {
            system_instruction: Content<'a>,
            contents: Vec<Content<'a>>,
            generation_config: GenerationConfig,
        }

        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<CandidateContent>,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<PartOut>,
        }

        #[derive(Deserialize)]
        struct PartOut {
            text: Option<String>,
        }

        let body = Req {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: gemini_response_schema(),
                temperature: self.config.temperature,
            },
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(key).map_err(|e| DispatchError::Configuration(format!("api key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let resp = self
            .client
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(format!("gemini request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Transport(format!("gemini error: {status} {txt}")));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| DispatchError::MalformedResponse(format!("parse gemini response: {e}")))?;

        let mut s = String::new();
        if let Some(content) = out.candidates.into_iter().next().and_then(|c| c.content) {
            for p in content.parts {
                if let Some(t) = p.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s)
    }

    async fn openai_complete(&self, key: &str, system: &str, prompt: &str) -> Result<String, DispatchError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'static str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: Value,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            response_format: json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "ledger_reply",
                    "strict": true,
                    "schema": openai_response_schema(),
                }
            }),
        };

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .header(AUTHORIZATION, format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(format!("openai request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Transport(format!("openai error: {status} {txt}")));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| DispatchError::MalformedResponse(format!("parse openai response: {e}")))?;

        Ok(out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommandInterpreter for HttpInterpreter {
    async fn interpret(&self, request: CommandRequest<'_>) -> Result<CommandReply, DispatchError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| {
                DispatchError::Configuration(format!(
                    "missing {} API key; run: neon-ledger auth paste-{}-key",
                    self.config.provider.label(),
                    self.config.provider.label()
                ))
            })?;

        let system = request.system_instruction();
        let prompt = request.user_prompt()?;
        debug!(
            provider = self.config.provider.label(),
            model = %self.config.model,
            prompt_len = prompt.len(),
            "sending completion request"
        );

        let text = match self.config.provider {
            Provider::Gemini => self.gemini_complete(key, system, &prompt).await?,
            Provider::OpenAI => self.openai_complete(key, system, &prompt).await?,
        };

        parse_reply(&text)
    }
}

/// Reply schema in Gemini's OpenAPI subset.
pub fn gemini_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "systemMessage": {
                "type": "STRING",
                "description": "A short, robotic, cyberpunk-style system acknowledgment message (e.g. 'Protocols updated.')"
            },
            "tasks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING", "description": "Unique ID for the task" },
                        "title": { "type": "STRING", "description": "The actionable financial task" },
                        "insight": { "type": "STRING", "description": "A brief, data-driven tip related to the task (max 10 words)" },
                        "status": { "type": "STRING", "enum": ["pending", "completed"] },
                        "priority": { "type": "STRING", "enum": ["low", "med", "high"] },
                        "credits": { "type": "INTEGER", "description": "Reward value for completing the task (100-1000)" },
                        "deadline": { "type": "STRING", "description": "YYYY-MM-DD deadline inferred from context, or empty if none" }
                    },
                    "required": ["id", "title", "insight", "status", "priority", "credits"]
                }
            }
        },
        "required": ["systemMessage", "tasks"]
    })
}

/// Reply schema for OpenAI strict structured output: every property listed
/// as required, optional ones nullable.
pub fn openai_response_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "systemMessage": { "type": "string" },
            "tasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "insight": { "type": "string" },
                        "status": { "type": "string", "enum": ["pending", "completed"] },
                        "priority": { "type": "string", "enum": ["low", "med", "high"] },
                        "credits": { "type": "integer", "minimum": 0 },
                        "deadline": { "type": ["string", "null"] }
                    },
                    "required": ["id", "title", "insight", "status", "priority", "credits", "deadline"]
                }
            }
        },
        "required": ["systemMessage", "tasks"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledger_core::seed_tasks;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REPLY: &str = r#"{"systemMessage":"Directive logged.","tasks":[{"id":"t-101","title":"Rebalance Crypto Portfolio","insight":"ETH staking yield up 2.1%","status":"completed","priority":"high","credits":500,"deadline":"2026-10-18"}]}"#;

    fn cfg(provider: Provider, base_url: &str, key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            model: "test-model".to_string(),
            base_url: base_url.to_string(),
            temperature: 0.4,
            timeout: Duration::from_secs(5),
            api_key: key.map(str::to_string),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    async fn send(interp: &HttpInterpreter, command: &str) -> Result<CommandReply, DispatchError> {
        let tasks = seed_tasks(today());
        interp
            .interpret(CommandRequest {
                command,
                today: today(),
                tasks: &tasks,
            })
            .await
    }

    #[tokio::test]
    async fn test_gemini_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "AIza-test"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": REPLY }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), Some("AIza-test"))).unwrap();
        let reply = send(&interp, "mark the portfolio task done").await.unwrap();
        assert_eq!(reply.system_message, "Directive logged.");
        assert_eq!(reply.tasks.len(), 1);
        assert_eq!(reply.tasks[0].status, "completed");
    }

    #[tokio::test]
    async fn test_gemini_prompt_carries_command_and_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": REPLY }] } }]
            })))
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), Some("AIza-test"))).unwrap();
        send(&interp, "Clear high priority tasks").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Current Date: 2026-10-18"));
        assert!(prompt.contains("t-102"));
        assert!(prompt.contains("\"Clear high priority tasks\""));
        assert!(
            body["systemInstruction"]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .contains("Neon Ledger")
        );
    }

    #[tokio::test]
    async fn test_missing_key_never_touches_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), None)).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), Some("AIza-test"))).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(ref m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_prose_reply_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Protocols updated." }] } }]
            })))
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), Some("AIza-test"))).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_no_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::Gemini, &server.uri(), Some("AIza-test"))).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_openai_round_trip_with_null_deadline() {
        let server = MockServer::start().await;
        let content = r#"{"systemMessage":"Purged.","tasks":[{"id":"t-102","title":"Audit Monthly Subscriptions","insight":"","status":"pending","priority":"low","credits":150,"deadline":null}]}"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "response_format": { "type": "json_schema" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::OpenAI, &server.uri(), Some("sk-test"))).unwrap();
        let reply = send(&interp, "Clear high priority tasks").await.unwrap();
        assert_eq!(reply.system_message, "Purged.");
        assert_eq!(reply.tasks[0].deadline, None);
        assert_eq!(reply.tasks[0].validate().unwrap().credits, 150);
    }

    #[tokio::test]
    async fn test_openai_server_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(1)
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::OpenAI, &server.uri(), Some("sk-test"))).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_openai_no_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let interp = HttpInterpreter::new(cfg(Provider::OpenAI, &server.uri(), Some("sk-test"))).unwrap();
        let err = send(&interp, "add a task").await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedResponse(_)));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let c = cfg(Provider::OpenAI, "http://localhost", Some("sk-secret"));
        let s = format!("{c:?}");
        assert!(!s.contains("sk-secret"));
        assert!(s.contains("<set>"));
    }
}
