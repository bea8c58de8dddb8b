//! Agent Caller: the boundary to the external LLM service.
//!
//! The pipeline only needs "prompt + conversation in, text out". The
//! `AgentCaller` trait is that contract; `HttpAgentCaller` implements it over
//! two chat APIs and runs the tool-call loop locally:
//!
//! - `openai`   : OpenAI-compatible `/chat/completions` (default; Gemini's
//!                 compatibility endpoint speaks it)
//! - `anthropic`: Anthropic Messages API `/v1/messages`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decision_log::DecisionLog;
use crate::error::AgentError;
use crate::tools::{ToolDefinition, ToolRegistry};

pub const DEFAULT_ADAPTER: &str = "openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Upper bound on model ↔ tool round trips within one call.
pub const MAX_TOOL_ROUNDS: usize = 8;

/// LLM backend settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub adapter: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl LlmSettings {
    /// Resolve settings from `GYM_AGENT_*` variables with provider fallbacks.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let adapter = lookup("GYM_AGENT_ADAPTER").unwrap_or_else(|| DEFAULT_ADAPTER.to_string());

        let (key_vars, default_base): (&[&str], &str) = match adapter.as_str() {
            "anthropic" | "claude" => (
                &["ANTHROPIC_API_KEY", "ANTHROPIC_AUTH_TOKEN"][..],
                ANTHROPIC_BASE_URL,
            ),
            _ => (
                &["GEMINI_API_KEY", "GOOGLE_API_KEY", "OPENAI_API_KEY"][..],
                GEMINI_OPENAI_BASE_URL,
            ),
        };

        let api_key = lookup("GYM_AGENT_API_KEY")
            .or_else(|| key_vars.iter().find_map(|k| lookup(k)))
            .unwrap_or_default();

        Self {
            base_url: lookup("GYM_AGENT_BASE_URL").unwrap_or_else(|| default_base.to_string()),
            model: lookup("GYM_AGENT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            adapter,
        }
    }
}

/// Configuration for a single agent call.
#[derive(Debug, Clone)]
pub struct AgentCallConfig {
    /// Adapter type: "openai", "anthropic"
    pub adapter: String,
    /// API base URL
    pub base_url: String,
    /// API key / auth token
    pub api_key: String,
    /// Model ID
    pub model: String,
    /// Maximum tokens for the response
    pub max_tokens: u32,
    /// Temperature
    pub temperature: Option<f64>,
    /// System prompt
    pub system_prompt: String,
}

impl Default for AgentCallConfig {
    fn default() -> Self {
        Self {
            adapter: DEFAULT_ADAPTER.to_string(),
            base_url: GEMINI_OPENAI_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            system_prompt: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything one agent call needs.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Agent ID, for logging
    pub agent: String,
    pub config: AgentCallConfig,
    /// Conversation so far; the last message is from the user
    pub messages: Vec<ChatMessage>,
    /// Tools offered to the model
    pub tools: Vec<ToolDefinition>,
}

/// Response from an agent call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The agent's text response
    pub content: String,
    /// Model used
    pub model: String,
    /// Usage statistics, summed over tool rounds
    pub usage: Option<UsageInfo>,
    /// Whether the call succeeded
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Number of tool calls executed
    #[serde(default)]
    pub tool_calls: usize,
}

impl AgentResponse {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            success: true,
            ..Default::default()
        }
    }

    fn failed(model: &str, error: String) -> Self {
        Self {
            model: model.to_string(),
            success: false,
            error: Some(error),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

impl UsageInfo {
    pub(crate) fn accumulate(total: &mut Option<UsageInfo>, more: Option<UsageInfo>) {
        let Some(more) = more else { return };
        let sum = |a: Option<u64>, b: Option<u64>| match (a, b) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        };
        let current = total.unwrap_or_default();
        *total = Some(UsageInfo {
            input_tokens: sum(current.input_tokens, more.input_tokens),
            output_tokens: sum(current.output_tokens, more.output_tokens),
        });
    }
}

/// The opaque LLM boundary.
#[async_trait]
pub trait AgentCaller: Send + Sync {
    /// Send the request, executing any tool calls the model makes through
    /// `tools`, and return the final text.
    async fn call(
        &self,
        request: &AgentRequest,
        tools: &ToolRegistry,
        log: &DecisionLog,
    ) -> Result<AgentResponse, AgentError>;
}

/// Calls chat-completion APIs over HTTP.
pub struct HttpAgentCaller {
    client: reqwest::Client,
}

impl HttpAgentCaller {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Result<(reqwest::StatusCode, String), AgentError> {
        let mut builder = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(body);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| AgentError::Http(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Http(format!("Failed to read response body: {}", e)))?;
        Ok((status, text))
    }

    /// Call the Anthropic Messages API.
    ///
    /// POST {base_url}/v1/messages
    /// Headers:
    ///   x-api-key: {api_key}
    ///   anthropic-version: 2023-06-01
    async fn call_anthropic(
        &self,
        request: &AgentRequest,
        tools: &ToolRegistry,
        log: &DecisionLog,
    ) -> Result<AgentResponse, AgentError> {
        let config = &request.config;
        let url = format!("{}/v1/messages", config.base_url.trim_end_matches('/'));

        let mut messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
            .collect();

        let tool_specs: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect();

        let headers = [
            ("x-api-key", config.api_key.clone()),
            ("anthropic-version", "2023-06-01".to_string()),
        ];

        let mut usage = None;
        let mut tool_calls = 0;

        for _ in 0..MAX_TOOL_ROUNDS {
            let mut body = serde_json::json!({
                "model": config.model,
                "max_tokens": config.max_tokens,
                "messages": messages,
            });
            if !config.system_prompt.is_empty() {
                body["system"] = serde_json::Value::String(config.system_prompt.clone());
            }
            if let Some(temp) = config.temperature {
                body["temperature"] = serde_json::json!(temp);
            }
            if !tool_specs.is_empty() {
                body["tools"] = serde_json::Value::Array(tool_specs.clone());
            }

            tracing::info!(
                "[AgentCaller] {} -> Anthropic API: {} (model: {})",
                request.agent,
                url,
                config.model
            );

            let (status, text) = self.post(&url, &headers, &body).await?;
            if !status.is_success() {
                return Ok(AgentResponse::failed(
                    &config.model,
                    format!("API returned {}: {}", status, text),
                ));
            }

            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

            UsageInfo::accumulate(
                &mut usage,
                json.get("usage").map(|u| UsageInfo {
                    input_tokens: u.get("input_tokens").and_then(|v| v.as_u64()),
                    output_tokens: u.get("output_tokens").and_then(|v| v.as_u64()),
                }),
            );

            let blocks = json
                .get("content")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default();

            let tool_uses: Vec<&serde_json::Value> = blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_use"))
                .collect();

            if tool_uses.is_empty() {
                let content = blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n");
                let model = json
                    .get("model")
                    .and_then(|m| m.as_str())
                    .unwrap_or(&config.model)
                    .to_string();
                return Ok(AgentResponse {
                    content,
                    model,
                    usage,
                    success: true,
                    error: None,
                    tool_calls,
                });
            }

            let mut results = Vec::with_capacity(tool_uses.len());
            for tool_use in &tool_uses {
                let name = tool_use.get("name").and_then(|n| n.as_str()).unwrap_or("");
                let id = tool_use.get("id").and_then(|i| i.as_str()).unwrap_or("");
                let input = tool_use.get("input").cloned().unwrap_or_default();
                let result = tools.call(name, input, log);
                tool_calls += 1;
                results.push(serde_json::json!({
                    "type": "tool_result",
                    "tool_use_id": id,
                    "content": result.to_content(),
                    "is_error": !result.success,
                }));
            }

            messages.push(serde_json::json!({ "role": "assistant", "content": blocks }));
            messages.push(serde_json::json!({ "role": "user", "content": results }));
        }

        Err(AgentError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }

    /// Call an OpenAI-compatible chat completions API.
    ///
    /// POST {base_url}/chat/completions
    /// Headers:
    ///   Authorization: Bearer {api_key}
    async fn call_openai(
        &self,
        request: &AgentRequest,
        tools: &ToolRegistry,
        log: &DecisionLog,
    ) -> Result<AgentResponse, AgentError> {
        let config = &request.config;
        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !config.system_prompt.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": config.system_prompt
            }));
        }
        messages.extend(
            request
                .messages
                .iter()
                .map(|m| serde_json::json!({ "role": m.role, "content": m.content })),
        );

        let tool_specs: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        let headers = [("Authorization", format!("Bearer {}", config.api_key))];

        let mut usage = None;
        let mut tool_calls = 0;

        for _ in 0..MAX_TOOL_ROUNDS {
            let mut body = serde_json::json!({
                "model": config.model,
                "messages": messages,
                "max_tokens": config.max_tokens,
            });
            if let Some(temp) = config.temperature {
                body["temperature"] = serde_json::json!(temp);
            }
            if !tool_specs.is_empty() {
                body["tools"] = serde_json::Value::Array(tool_specs.clone());
            }

            tracing::info!(
                "[AgentCaller] {} -> OpenAI-compatible API: {} (model: {})",
                request.agent,
                url,
                config.model
            );

            let (status, text) = self.post(&url, &headers, &body).await?;
            if !status.is_success() {
                return Ok(AgentResponse::failed(
                    &config.model,
                    format!("API returned {}: {}", status, text),
                ));
            }

            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

            UsageInfo::accumulate(
                &mut usage,
                json.get("usage").map(|u| UsageInfo {
                    input_tokens: u
                        .get("prompt_tokens")
                        .or_else(|| u.get("input_tokens"))
                        .and_then(|v| v.as_u64()),
                    output_tokens: u
                        .get("completion_tokens")
                        .or_else(|| u.get("output_tokens"))
                        .and_then(|v| v.as_u64()),
                }),
            );

            let message = json
                .get("choices")
                .and_then(|c| c.as_array())
                .and_then(|arr| arr.first())
                .and_then(|choice| choice.get("message"))
                .cloned()
                .ok_or_else(|| AgentError::InvalidResponse("no choices in response".to_string()))?;

            let requested: Vec<serde_json::Value> = message
                .get("tool_calls")
                .and_then(|t| t.as_array())
                .cloned()
                .unwrap_or_default();

            if requested.is_empty() {
                let content = message
                    .get("content")
                    .and_then(|c| c.as_str())
                    .unwrap_or("")
                    .to_string();
                let model = json
                    .get("model")
                    .and_then(|m| m.as_str())
                    .unwrap_or(&config.model)
                    .to_string();
                return Ok(AgentResponse {
                    content,
                    model,
                    usage,
                    success: true,
                    error: None,
                    tool_calls,
                });
            }

            messages.push(message);
            for call in &requested {
                let id = call.get("id").and_then(|i| i.as_str()).unwrap_or("");
                let function = call.get("function");
                let name = function
                    .and_then(|f| f.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or("");
                let arguments = function
                    .and_then(|f| f.get("arguments"))
                    .cloned()
                    .unwrap_or_default();
                let result = tools.call(name, arguments, log);
                tool_calls += 1;
                messages.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": result.to_content(),
                }));
            }
        }

        Err(AgentError::ToolLoopExceeded(MAX_TOOL_ROUNDS))
    }
}

impl Default for HttpAgentCaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentCaller for HttpAgentCaller {
    async fn call(
        &self,
        request: &AgentRequest,
        tools: &ToolRegistry,
        log: &DecisionLog,
    ) -> Result<AgentResponse, AgentError> {
        if request.config.api_key.is_empty() {
            return Err(AgentError::MissingApiKey(
                "set GYM_AGENT_API_KEY (or GEMINI_API_KEY / ANTHROPIC_API_KEY), \
                 or api_key in the step config"
                    .to_string(),
            ));
        }

        match request.config.adapter.as_str() {
            "anthropic" | "claude" => self.call_anthropic(request, tools, log).await,
            "openai" | "gemini" => self.call_openai(request, tools, log).await,
            other => Err(AgentError::UnknownAdapter(other.to_string())),
        }
    }
}

/// Resolve environment variable references in a string.
/// Supports `${ENV_VAR}` and `${ENV_VAR:-default}` syntax.
pub fn resolve_env_vars(input: &str) -> String {
    static ENV_RE: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"\$\{([^}]+)\}").expect("env var regex is valid")
    });

    ENV_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var_expr = &caps[1];
            // Support default value syntax: ${VAR:-default}
            if let Some(idx) = var_expr.find(":-") {
                let var_name = &var_expr[..idx];
                let default_val = &var_expr[idx + 2..];
                std::env::var(var_name).unwrap_or_else(|_| default_val.to_string())
            } else {
                std::env::var(var_expr).unwrap_or_else(|_| format!("${{{}}}", var_expr))
            }
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("GYM_AGENT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${GYM_AGENT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix-${GYM_AGENT_TEST_VAR}-suffix"),
            "prefix-hello-suffix"
        );
        assert_eq!(
            resolve_env_vars("${GYM_AGENT_NONEXISTENT_VAR:-fallback}"),
            "fallback"
        );
        assert_eq!(
            resolve_env_vars("${GYM_AGENT_NONEXISTENT_VAR}"),
            "${GYM_AGENT_NONEXISTENT_VAR}"
        );
        std::env::remove_var("GYM_AGENT_TEST_VAR");
    }

    fn settings(vars: &[(&str, &str)]) -> LlmSettings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LlmSettings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_settings_default_to_gemini() {
        let s = settings(&[("GEMINI_API_KEY", "g-key")]);
        assert_eq!(s.adapter, "openai");
        assert_eq!(s.base_url, GEMINI_OPENAI_BASE_URL);
        assert_eq!(s.model, "gemini-2.5-flash-lite");
        assert_eq!(s.api_key, "g-key");
    }

    #[test]
    fn test_settings_anthropic_and_overrides() {
        let s = settings(&[
            ("GYM_AGENT_ADAPTER", "anthropic"),
            ("ANTHROPIC_API_KEY", "a-key"),
            ("GEMINI_API_KEY", "ignored"),
            ("GYM_AGENT_MODEL", "claude-haiku-4-5"),
        ]);
        assert_eq!(s.base_url, ANTHROPIC_BASE_URL);
        assert_eq!(s.api_key, "a-key");
        assert_eq!(s.model, "claude-haiku-4-5");

        let s = settings(&[("GYM_AGENT_API_KEY", "explicit"), ("OPENAI_API_KEY", "o")]);
        assert_eq!(s.api_key, "explicit");
    }

    #[test]
    fn test_usage_accumulates_over_rounds() {
        let mut total = None;
        UsageInfo::accumulate(
            &mut total,
            Some(UsageInfo {
                input_tokens: Some(10),
                output_tokens: Some(2),
            }),
        );
        UsageInfo::accumulate(
            &mut total,
            Some(UsageInfo {
                input_tokens: Some(5),
                output_tokens: None,
            }),
        );
        UsageInfo::accumulate(&mut total, None);
        assert_eq!(
            total,
            Some(UsageInfo {
                input_tokens: Some(15),
                output_tokens: Some(2),
            })
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected_before_any_request() {
        let caller = HttpAgentCaller::new();
        let request = AgentRequest {
            agent: "workout_planner".to_string(),
            config: AgentCallConfig::default(),
            messages: vec![ChatMessage::user("plan")],
            tools: Vec::new(),
        };
        let err = caller
            .call(&request, &ToolRegistry::new(), &DecisionLog::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey(_)));
    }

    #[tokio::test]
    async fn test_unknown_adapter() {
        let caller = HttpAgentCaller::new();
        let request = AgentRequest {
            agent: "workout_planner".to_string(),
            config: AgentCallConfig {
                adapter: "carrier-pigeon".to_string(),
                api_key: "k".to_string(),
                ..Default::default()
            },
            messages: vec![ChatMessage::user("plan")],
            tools: Vec::new(),
        };
        let err = caller
            .call(&request, &ToolRegistry::new(), &DecisionLog::disabled())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownAdapter(_)));
    }

    mod http {
        use super::*;
        use crate::tools::EQUIPMENT_SELECTOR;
        use crate::workspace::Workspace;
        use wiremock::matchers::{body_string_contains, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const CHEST_TABLE: &str =
            r#"{"chest": {"required_equipment": ["Barbell", "Bench"], "alternatives": []}}"#;

        fn registry() -> (tempfile::TempDir, ToolRegistry) {
            let tmp = tempfile::tempdir().unwrap();
            let ws = Workspace::open(tmp.path()).unwrap();
            std::fs::write(ws.equipment_db_path(), CHEST_TABLE).unwrap();
            let registry = ToolRegistry::for_workspace(&ws);
            (tmp, registry)
        }

        fn request(adapter: &str, server: &MockServer, tools: &ToolRegistry) -> AgentRequest {
            AgentRequest {
                agent: "workout_equipment".to_string(),
                config: AgentCallConfig {
                    adapter: adapter.to_string(),
                    base_url: server.uri(),
                    api_key: "test-key".to_string(),
                    model: "test-model".to_string(),
                    system_prompt: "You pick equipment.".to_string(),
                    ..Default::default()
                },
                messages: vec![ChatMessage::user("chest")],
                tools: tools.definitions(&[EQUIPMENT_SELECTOR.to_string()]),
            }
        }

        fn openai_tool_call() -> serde_json::Value {
            serde_json::json!({
                "model": "test-model",
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "equipment_selector",
                                "arguments": "{\"muscle\": \"Chest\"}"
                            }
                        }]
                    }
                }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 3 }
            })
        }

        #[tokio::test]
        async fn test_openai_tool_round_trip() {
            let server = MockServer::start().await;
            let (_tmp, tools) = registry();

            // Follow-up carrying the tool result; mounted first so it wins.
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(body_string_contains("tool_call_id"))
                .and(body_string_contains("Barbell"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "model": "test-model",
                    "choices": [{ "message": { "role": "assistant", "content": "Use a barbell and bench." } }],
                    "usage": { "prompt_tokens": 20, "completion_tokens": 5 }
                })))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .and(header("authorization", "Bearer test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(openai_tool_call()))
                .expect(1)
                .mount(&server)
                .await;

            let response = HttpAgentCaller::new()
                .call(&request("openai", &server, &tools), &tools, &DecisionLog::disabled())
                .await
                .unwrap();

            assert!(response.success);
            assert_eq!(response.content, "Use a barbell and bench.");
            assert_eq!(response.tool_calls, 1);
            assert_eq!(
                response.usage,
                Some(UsageInfo {
                    input_tokens: Some(30),
                    output_tokens: Some(8),
                })
            );
        }

        #[tokio::test]
        async fn test_anthropic_tool_round_trip() {
            let server = MockServer::start().await;
            let (_tmp, tools) = registry();

            Mock::given(method("POST"))
                .and(path("/v1/messages"))
                .and(body_string_contains("tool_result"))
                .and(body_string_contains("Barbell"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "model": "test-model",
                    "content": [{ "type": "text", "text": "Barbell bench press." }],
                    "usage": { "input_tokens": 40, "output_tokens": 6 }
                })))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/v1/messages"))
                .and(header("x-api-key", "test-key"))
                .and(header("anthropic-version", "2023-06-01"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "model": "test-model",
                    "content": [
                        { "type": "text", "text": "Checking the table." },
                        {
                            "type": "tool_use",
                            "id": "toolu_1",
                            "name": "equipment_selector",
                            "input": { "muscle": "chest" }
                        }
                    ],
                    "usage": { "input_tokens": 12, "output_tokens": 4 }
                })))
                .expect(1)
                .mount(&server)
                .await;

            let response = HttpAgentCaller::new()
                .call(&request("anthropic", &server, &tools), &tools, &DecisionLog::disabled())
                .await
                .unwrap();

            assert!(response.success);
            assert_eq!(response.content, "Barbell bench press.");
            assert_eq!(response.tool_calls, 1);
            assert_eq!(
                response.usage,
                Some(UsageInfo {
                    input_tokens: Some(52),
                    output_tokens: Some(10),
                })
            );
        }

        #[tokio::test]
        async fn test_error_status_is_a_failed_response() {
            let server = MockServer::start().await;
            let (_tmp, tools) = registry();
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
                .mount(&server)
                .await;

            for adapter in ["openai", "anthropic"] {
                let response = HttpAgentCaller::new()
                    .call(&request(adapter, &server, &tools), &tools, &DecisionLog::disabled())
                    .await
                    .unwrap();
                assert!(!response.success);
                assert_eq!(response.model, "test-model");
                let error = response.error.unwrap();
                assert!(error.contains("500"), "{}", error);
                assert!(error.contains("upstream down"), "{}", error);
            }
        }

        #[tokio::test]
        async fn test_endless_tool_calls_hit_the_round_limit() {
            let server = MockServer::start().await;
            let (_tmp, tools) = registry();
            Mock::given(method("POST"))
                .and(path("/chat/completions"))
                .respond_with(ResponseTemplate::new(200).set_body_json(openai_tool_call()))
                .expect(MAX_TOOL_ROUNDS as u64)
                .mount(&server)
                .await;

            let err = HttpAgentCaller::new()
                .call(&request("openai", &server, &tools), &tools, &DecisionLog::disabled())
                .await
                .unwrap_err();
            assert!(matches!(err, AgentError::ToolLoopExceeded(MAX_TOOL_ROUNDS)));
        }
    }
}
