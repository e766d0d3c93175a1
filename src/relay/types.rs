//! Caller-facing and upstream request/response types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Sampling temperature used when the caller omits one.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
/// Completion length cap used when the caller omits one.
pub const DEFAULT_MAX_TOKENS: i64 = 512;

/// Body of `POST /chat`.
///
/// Numeric fields are coerced leniently and never range-checked; the
/// provider decides what it accepts.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_float")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub max_tokens: Option<i64>,
}

/// A JSON number or a string holding one.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match value {
        Numeric::Int(n) => Ok(Some(n as f64)),
        Numeric::Float(f) => Ok(Some(f)),
        Numeric::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("invalid number '{}', expected a float", s))
        }),
    }
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Numeric>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let integral = |f: f64| {
        (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
    };
    let parsed = match &value {
        Numeric::Int(n) => Some(*n),
        Numeric::Float(f) => integral(*f),
        Numeric::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
    };
    parsed.map(Some).ok_or_else(|| {
        let shown = match value {
            Numeric::Int(n) => n.to_string(),
            Numeric::Float(f) => f.to_string(),
            Numeric::Text(s) => format!("'{}'", s),
        };
        serde::de::Error::custom(format!("invalid value {}, expected an integer", shown))
    })
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl ChatRequest {
    /// Ordered upstream messages: optional system instruction, then the prompt.
    ///
    /// An empty `system` string counts as not supplied.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(self.prompt.as_str()));
        messages
    }

    /// Requested model, falling back to `default_model` when absent or empty.
    pub fn model_or<'a>(&'a self, default_model: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(default_model)
    }
}

/// Chat completion payload sent upstream (OpenAI-compatible).
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: i64,
    pub stream: bool,
}

impl UpstreamRequest {
    /// Build the upstream payload, filling in defaults for omitted fields.
    pub fn from_chat(request: &ChatRequest, default_model: &str) -> Self {
        Self {
            model: request.model_or(default_model).to_string(),
            messages: request.messages(),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stream: false,
        }
    }
}

/// Body returned by `POST /chat` on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub text: String,
    pub model: String,
    pub usage: Option<Value>,
    pub raw: Value,
}

impl ChatResponse {
    /// Reshape a parsed upstream body.
    ///
    /// Never fails: a body without a usable reply yields empty `text`, and
    /// `model` falls back to `requested_model`.
    pub fn from_upstream(raw: Value, requested_model: &str) -> Self {
        let text = extract_text(&raw).unwrap_or_default().to_string();
        let model = raw
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(requested_model)
            .to_string();
        let usage = raw.get("usage").cloned();

        Self {
            text,
            model,
            usage,
            raw,
        }
    }
}

/// Extract `choices[0].message.content` if every step has the expected shape.
pub fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> ChatRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_messages_without_system_is_single_user_entry() {
        let req = request(json!({"prompt": "hi"}));
        assert_eq!(req.messages(), vec![Message::user("hi")]);
    }

    #[test]
    fn test_messages_with_system_puts_system_first() {
        let req = request(json!({"prompt": "hi", "system": "You are terse."}));
        assert_eq!(
            req.messages(),
            vec![Message::system("You are terse."), Message::user("hi")]
        );
    }

    #[test]
    fn test_empty_system_is_skipped() {
        let req = request(json!({"prompt": "hi", "system": ""}));
        assert_eq!(req.messages().len(), 1);
    }

    #[test]
    fn test_empty_prompt_is_accepted() {
        let req = request(json!({"prompt": ""}));
        assert_eq!(req.messages(), vec![Message::user("")]);
    }

    #[test]
    fn test_missing_prompt_fails_to_deserialize() {
        let result = serde_json::from_value::<ChatRequest>(json!({"system": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_upstream_request_applies_defaults() {
        let req = request(json!({"prompt": "hi"}));
        let payload = UpstreamRequest::from_chat(&req, "llama-3.1-70b-versatile");

        assert_eq!(payload.model, "llama-3.1-70b-versatile");
        assert_eq!(payload.temperature, 0.2);
        assert_eq!(payload.max_tokens, 512);
        assert!(!payload.stream);
    }

    #[test]
    fn test_upstream_request_treats_null_and_empty_as_omitted() {
        let req = request(json!({
            "prompt": "hi",
            "model": "",
            "temperature": null,
            "max_tokens": null
        }));
        let payload = UpstreamRequest::from_chat(&req, "default-model");

        assert_eq!(payload.model, "default-model");
        assert_eq!(payload.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(payload.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_upstream_request_keeps_caller_values() {
        let req = request(json!({
            "prompt": "hi",
            "model": "mixtral-8x7b",
            "temperature": 0.0,
            "max_tokens": 64
        }));
        let payload = UpstreamRequest::from_chat(&req, "default-model");

        assert_eq!(payload.model, "mixtral-8x7b");
        assert_eq!(payload.temperature, 0.0);
        assert_eq!(payload.max_tokens, 64);
    }

    #[test]
    fn test_upstream_request_serializes_stream_false() {
        let req = request(json!({"prompt": "hi"}));
        let json = serde_json::to_value(UpstreamRequest::from_chat(&req, "m")).unwrap();
        assert_eq!(json["stream"], json!(false));
        assert_eq!(json["messages"], json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn test_max_tokens_is_not_range_checked() {
        let req = request(json!({"prompt": "hi", "max_tokens": -1}));
        assert_eq!(req.max_tokens, Some(-1));

        let req = request(json!({"prompt": "hi", "max_tokens": 5_000_000_000i64}));
        assert_eq!(req.max_tokens, Some(5_000_000_000));
    }

    #[test]
    fn test_numeric_fields_coerce_leniently() {
        let req = request(json!({"prompt": "hi", "max_tokens": 512.0, "temperature": "0.5"}));
        assert_eq!(req.max_tokens, Some(512));
        assert_eq!(req.temperature, Some(0.5));

        let req = request(json!({"prompt": "hi", "max_tokens": " 64 ", "temperature": 1}));
        assert_eq!(req.max_tokens, Some(64));
        assert_eq!(req.temperature, Some(1.0));
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        let bad = [
            json!({"prompt": "hi", "max_tokens": 1.5}),
            json!({"prompt": "hi", "max_tokens": "lots"}),
            json!({"prompt": "hi", "max_tokens": [1]}),
            json!({"prompt": "hi", "temperature": "warm"}),
            json!({"prompt": "hi", "temperature": {}}),
        ];
        for body in bad {
            assert!(
                serde_json::from_value::<ChatRequest>(body.clone()).is_err(),
                "should reject {}",
                body
            );
        }
    }

    #[test]
    fn test_extract_text_happy_path() {
        let body = json!({"choices": [{"message": {"content": "Hello!"}}]});
        assert_eq!(extract_text(&body), Some("Hello!"));
    }

    #[test]
    fn test_extract_text_shape_mismatches() {
        assert_eq!(extract_text(&json!({})), None);
        assert_eq!(extract_text(&json!({"choices": []})), None);
        assert_eq!(extract_text(&json!({"choices": {"0": {}}})), None);
        assert_eq!(extract_text(&json!({"choices": [{}]})), None);
        assert_eq!(
            extract_text(&json!({"choices": [{"message": {"content": null}}]})),
            None
        );
        assert_eq!(extract_text(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_from_upstream_uses_reported_model_and_usage() {
        let raw = json!({
            "model": "llama-3.1-70b-versatile",
            "choices": [{"message": {"content": "Hello!"}}],
            "usage": {"total_tokens": 12}
        });
        let resp = ChatResponse::from_upstream(raw.clone(), "requested");

        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.model, "llama-3.1-70b-versatile");
        assert_eq!(resp.usage, Some(json!({"total_tokens": 12})));
        assert_eq!(resp.raw, raw);
    }

    #[test]
    fn test_from_upstream_degrades_without_choices() {
        let raw = json!({"id": "chatcmpl-1"});
        let resp = ChatResponse::from_upstream(raw.clone(), "requested");

        assert_eq!(resp.text, "");
        assert_eq!(resp.model, "requested");
        assert_eq!(resp.usage, None);
        assert_eq!(resp.raw, raw);
    }

    #[test]
    fn test_response_serializes_missing_usage_as_null() {
        let resp = ChatResponse::from_upstream(json!({}), "m");
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.as_object().unwrap().contains_key("usage"));
        assert!(json["usage"].is_null());
    }
}
