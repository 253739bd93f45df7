//! Gemini (Generative Language API) implementation of [`InferenceGateway`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;
use tracing::{debug, warn};

use crate::api::{GenerateContentResponse, SafetyRating};
use crate::core::chat_config::{ChatConfig, HarmCategory};
use crate::core::error::ChatError;
use crate::core::gateway::{build_request, validate_input, ChunkSink, InferenceGateway};
use crate::core::message::Turn;
use crate::utils::url::model_method_url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SAFETY_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn build_client(request_timeout: Option<Duration>) -> Result<reqwest::Client, ChatError> {
        let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| ChatError::Network(format!("failed to build HTTP client: {err}")))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    /// Same client and endpoint with a different credential.
    pub fn with_api_key(&self, api_key: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, ChatError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ChatError::Authentication("no API key configured".to_string()))
    }

    fn endpoint(&self, model: &str, streaming: bool) -> String {
        if streaming {
            let url = model_method_url(&self.base_url, model, "streamGenerateContent");
            format!("{url}?alt=sse")
        } else {
            model_method_url(&self.base_url, model, "generateContent")
        }
    }

    async fn post(
        &self,
        history: &[Turn],
        config: &ChatConfig,
        streaming: bool,
    ) -> Result<reqwest::Response, ChatError> {
        validate_input(history, config)?;
        let api_key = self.api_key()?;
        let request = build_request(history, config);

        debug!(
            model = config.model_id(),
            turns = history.len(),
            streaming,
            "Gemini API request"
        );

        let response = self
            .client
            .post(self.endpoint(config.model_id(), streaming))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            let error = classify_http_error(status.as_u16(), &error_text, config.model_id());
            warn!(status = status.as_u16(), kind = error.kind(), "Gemini API request failed");
            return Err(error);
        }

        Ok(response)
    }
}

impl fmt::Debug for GeminiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiGateway")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

#[async_trait]
impl InferenceGateway for GeminiGateway {
    async fn send(&self, history: &[Turn], config: &ChatConfig) -> Result<Turn, ChatError> {
        let response = self.post(history, config, false).await?;
        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ChatError::Network(format!("invalid response body: {err}")))?;
        interpret_response(&body)
    }

    async fn send_streaming(
        &self,
        history: &[Turn],
        config: &ChatConfig,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Turn, ChatError> {
        let response = self.post(history, config, true).await?;
        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut accumulator = StreamAccumulator::default();

        while let Some(chunk) = stream.next().await {
            let chunk_bytes = chunk.map_err(|err| ChatError::Network(err.to_string()))?;
            buffer.extend_from_slice(&chunk_bytes);

            while let Some(newline_pos) = memchr(b'\n', &buffer) {
                let line = String::from_utf8_lossy(&buffer[..newline_pos]).into_owned();
                buffer.drain(..=newline_pos);
                accumulator.process_line(line.trim(), on_chunk)?;
            }
        }

        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer).into_owned();
            accumulator.process_line(line.trim(), on_chunk)?;
        }

        accumulator.finish()
    }
}

/// Collects text from `data:` lines of a `streamGenerateContent?alt=sse` body.
#[derive(Default)]
struct StreamAccumulator {
    text: String,
    saw_payload: bool,
    finish_reason: Option<String>,
}

impl StreamAccumulator {
    fn process_line(&mut self, line: &str, on_chunk: ChunkSink<'_>) -> Result<(), ChatError> {
        let Some(payload) = extract_data_payload(line) else {
            return Ok(());
        };
        if payload.is_empty() {
            return Ok(());
        }

        let malformed = || ChatError::Network(format!("malformed stream payload: {payload}"));
        let value =
            serde_json::from_str::<serde_json::Value>(payload).map_err(|_| malformed())?;
        if value.get("error").is_some() {
            return Err(classify_error_value(&value, payload));
        }
        let response =
            serde_json::from_value::<GenerateContentResponse>(value).map_err(|_| malformed())?;
        self.saw_payload = true;

        check_safety(&response)?;
        if let Some(reason) = first_finish_reason(&response) {
            self.finish_reason = Some(reason.to_string());
        }
        let text = response.text();
        if !text.is_empty() {
            on_chunk(&text);
            self.text.push_str(&text);
        }
        Ok(())
    }

    fn finish(self) -> Result<Turn, ChatError> {
        if !self.saw_payload {
            return Err(ChatError::Network(
                "stream ended before any response arrived".to_string(),
            ));
        }
        if self.text.is_empty() {
            return Err(no_text_error(self.finish_reason.as_deref()));
        }
        Ok(Turn::assistant(self.text))
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Turn a complete (non-streamed) response into an assistant turn.
pub fn interpret_response(response: &GenerateContentResponse) -> Result<Turn, ChatError> {
    check_safety(response)?;
    if response.candidates.is_empty() {
        return Err(ChatError::Provider(
            "API Error: response contained no candidates".to_string(),
        ));
    }
    let text = response.text();
    if text.is_empty() {
        return Err(no_text_error(first_finish_reason(response)));
    }
    Ok(Turn::assistant(text))
}

fn first_finish_reason(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.finish_reason.as_deref())
}

/// Gemini rejects empty model turns, so a textless reply must not reach history.
fn no_text_error(finish_reason: Option<&str>) -> ChatError {
    ChatError::Provider(format!(
        "API Error: response contained no text (finishReason {})",
        finish_reason.unwrap_or("unspecified")
    ))
}

fn check_safety(response: &GenerateContentResponse) -> Result<(), ChatError> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(ChatError::SafetyBlock {
                category: triggering_category(&feedback.safety_ratings),
                reason: format!("prompt blocked ({reason})"),
            });
        }
    }

    if let Some(candidate) = response.candidates.first() {
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(ChatError::SafetyBlock {
                    category: triggering_category(&candidate.safety_ratings),
                    reason: format!("response withheld ({reason})"),
                });
            }
        }
    }

    Ok(())
}

/// The category that caused a block: an explicitly blocked rating first,
/// otherwise the highest-probability rating at MEDIUM or above.
fn triggering_category(ratings: &[SafetyRating]) -> Option<HarmCategory> {
    let parse = |rating: &SafetyRating| rating.category.parse::<HarmCategory>().ok();

    if let Some(category) = ratings.iter().filter(|r| r.blocked).find_map(parse) {
        return Some(category);
    }

    ["HIGH", "MEDIUM"].iter().find_map(|level| {
        ratings
            .iter()
            .filter(|rating| rating.probability.as_deref() == Some(*level))
            .find_map(parse)
    })
}

/// Map a failed HTTP exchange onto the error taxonomy.
pub fn classify_http_error(status: u16, body: &str, model: &str) -> ChatError {
    let value = serde_json::from_str::<serde_json::Value>(body.trim()).ok();
    let summary = value
        .as_ref()
        .and_then(extract_error_summary)
        .unwrap_or_else(|| format!("HTTP {status}"));
    let provider_status = value
        .as_ref()
        .and_then(|v| v.pointer("/error/status"))
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    match status {
        401 | 403 => ChatError::Authentication(summary),
        429 => ChatError::RateLimit(summary),
        404 => ChatError::UnsupportedModel(model.to_string()),
        _ if provider_status == "RESOURCE_EXHAUSTED" => ChatError::RateLimit(summary),
        _ if provider_status == "UNAUTHENTICATED" || mentions_invalid_key(body) => {
            ChatError::Authentication(summary)
        }
        _ => ChatError::Provider(format_api_error(status, body)),
    }
}

fn classify_error_value(value: &serde_json::Value, raw: &str) -> ChatError {
    let status = value
        .pointer("/error/code")
        .and_then(|code| code.as_u64())
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(500);
    classify_http_error(status, raw, "")
}

fn mentions_invalid_key(body: &str) -> bool {
    body.contains("API_KEY_INVALID") || body.contains("API key not valid")
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn format_api_error(status: u16, error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return format!("API Error ({status}): <empty response body>");
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            return format!("API Error ({status}): {summary}");
        }
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return format!("API Error ({status}):\n{pretty_json}");
        }
    }

    format!("API Error ({status}): {trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GenerateContentResponse {
        serde_json::from_str(raw).expect("valid response json")
    }

    #[test]
    fn interprets_plain_reply() {
        let response = parse(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello!"}]},"finishReason":"STOP"}]}"#,
        );
        assert_eq!(interpret_response(&response), Ok(Turn::assistant("Hello!")));
    }

    #[test]
    fn blocked_prompt_reports_triggering_category() {
        let response = parse(
            r#"{"promptFeedback":{"blockReason":"SAFETY","safetyRatings":[
                {"category":"HARM_CATEGORY_HARASSMENT","probability":"NEGLIGIBLE"},
                {"category":"HARM_CATEGORY_HATE_SPEECH","probability":"HIGH","blocked":true}
            ]}}"#,
        );
        assert_eq!(
            interpret_response(&response),
            Err(ChatError::SafetyBlock {
                category: Some(HarmCategory::HateSpeech),
                reason: "prompt blocked (SAFETY)".to_string(),
            })
        );
    }

    #[test]
    fn safety_finish_reason_without_blocked_flag_uses_highest_probability() {
        let response = parse(
            r#"{"candidates":[{"finishReason":"SAFETY","safetyRatings":[
                {"category":"HARM_CATEGORY_SEXUALLY_EXPLICIT","probability":"MEDIUM"},
                {"category":"HARM_CATEGORY_DANGEROUS_CONTENT","probability":"HIGH"}
            ]}]}"#,
        );
        match interpret_response(&response) {
            Err(ChatError::SafetyBlock { category, reason }) => {
                assert_eq!(category, Some(HarmCategory::DangerousContent));
                assert_eq!(reason, "response withheld (SAFETY)");
            }
            other => panic!("expected safety block, got {other:?}"),
        }
    }

    #[test]
    fn missing_candidates_is_provider_error() {
        assert!(matches!(
            interpret_response(&parse("{}")),
            Err(ChatError::Provider(_))
        ));
    }

    #[test]
    fn classifies_http_statuses() {
        let quota = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            classify_http_error(429, quota, "gemini-1.0-pro"),
            ChatError::RateLimit("Resource has been exhausted (e.g. check quota).".to_string())
        );

        let bad_key = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(
            classify_http_error(400, bad_key, "gemini-1.0-pro"),
            ChatError::Authentication("API key not valid. Please pass a valid API key.".to_string())
        );

        assert_eq!(
            classify_http_error(403, "", "gemini-1.0-pro"),
            ChatError::Authentication("HTTP 403".to_string())
        );
        assert_eq!(
            classify_http_error(404, "{}", "gemini-1.0-pro"),
            ChatError::UnsupportedModel("gemini-1.0-pro".to_string())
        );
        assert_eq!(
            classify_http_error(500, r#"{"error":{"code":500,"message":"internal   error"}}"#, "m"),
            ChatError::Provider("API Error (500): internal error".to_string())
        );
        assert_eq!(
            classify_http_error(502, "<html>bad gateway</html>", "m"),
            ChatError::Provider("API Error (502): <html>bad gateway</html>".to_string())
        );
    }

    #[test]
    fn stream_accumulator_collects_chunks() {
        let mut accumulator = StreamAccumulator::default();
        let mut seen = Vec::new();
        let mut sink = |chunk: &str| seen.push(chunk.to_string());

        let lines = [
            r#"data: {"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"}]}}]}"#,
            "",
            r#"data:{"candidates":[{"content":{"role":"model","parts":[{"text":"lo!"}]},"finishReason":"STOP"}]}"#,
            ": keep-alive comment",
        ];
        for line in lines {
            accumulator
                .process_line(line, &mut sink)
                .expect("line accepted");
        }

        assert_eq!(accumulator.finish(), Ok(Turn::assistant("Hello!")));
        assert_eq!(seen, vec!["Hel".to_string(), "lo!".to_string()]);
    }

    #[test]
    fn stream_accumulator_stops_on_safety_block() {
        let mut accumulator = StreamAccumulator::default();
        let mut sink = |_: &str| {};
        accumulator
            .process_line(
                r#"data: {"candidates":[{"content":{"parts":[{"text":"Sure, "}]}}]}"#,
                &mut sink,
            )
            .expect("first chunk");

        let err = accumulator
            .process_line(
                r#"data: {"candidates":[{"finishReason":"SAFETY","safetyRatings":[{"category":"HARM_CATEGORY_HARASSMENT","probability":"HIGH","blocked":true}]}]}"#,
                &mut sink,
            )
            .expect_err("safety block");
        assert!(matches!(
            err,
            ChatError::SafetyBlock {
                category: Some(HarmCategory::Harassment),
                ..
            }
        ));
    }

    #[test]
    fn stream_accumulator_routes_error_payloads() {
        let mut accumulator = StreamAccumulator::default();
        let mut sink = |_: &str| {};
        let err = accumulator
            .process_line(
                r#"data: {"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#,
                &mut sink,
            )
            .expect_err("error payload");
        assert_eq!(err, ChatError::RateLimit("quota".to_string()));
    }

    #[test]
    fn textless_candidate_is_provider_error() {
        let response = parse(r#"{"candidates":[{"finishReason":"RECITATION"}]}"#);
        assert_eq!(
            interpret_response(&response),
            Err(ChatError::Provider(
                "API Error: response contained no text (finishReason RECITATION)".to_string()
            ))
        );
    }

    #[test]
    fn textless_stream_is_provider_error() {
        let mut accumulator = StreamAccumulator::default();
        let mut sink = |_: &str| {};
        accumulator
            .process_line(
                r#"data: {"candidates":[{"finishReason":"MAX_TOKENS"}]}"#,
                &mut sink,
            )
            .expect("payload accepted");
        assert_eq!(
            accumulator.finish(),
            Err(ChatError::Provider(
                "API Error: response contained no text (finishReason MAX_TOKENS)".to_string()
            ))
        );
    }

    #[test]
    fn empty_stream_is_network_error() {
        let accumulator = StreamAccumulator::default();
        assert!(matches!(accumulator.finish(), Err(ChatError::Network(_))));
    }

    #[test]
    fn endpoints_include_model_and_method() {
        let gateway =
            GeminiGateway::new(reqwest::Client::new(), "https://example.test/v1beta/", None);
        assert_eq!(
            gateway.endpoint("gemini-1.0-pro", false),
            "https://example.test/v1beta/models/gemini-1.0-pro:generateContent"
        );
        assert_eq!(
            gateway.endpoint("gemini-1.0-pro", true),
            "https://example.test/v1beta/models/gemini-1.0-pro:streamGenerateContent?alt=sse"
        );
    }

    mod http {
        use std::time::Duration;

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};
        use tokio::task::JoinHandle;

        pub(super) struct CapturedRequest {
            pub request_line: String,
            pub headers: Vec<(String, String)>,
            pub body: serde_json::Value,
        }

        impl CapturedRequest {
            pub fn header(&self, name: &str) -> Option<&str> {
                self.headers
                    .iter()
                    .find(|(header, _)| header.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value.as_str())
            }
        }

        async fn read_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
            let mut buffer = Vec::new();
            let mut chunk = [0_u8; 1024];
            let header_end = loop {
                let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
                if read == 0 {
                    return Err("Unexpected EOF while reading HTTP headers".to_string());
                }
                buffer.extend_from_slice(&chunk[..read]);
                if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
            let mut lines = head.split("\r\n");
            let request_line = lines.next().unwrap_or_default().to_string();
            let headers: Vec<(String, String)> = lines
                .filter_map(|line| line.split_once(':'))
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .collect();
            let content_length = headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.parse::<usize>().ok())
                .unwrap_or(0);

            let mut body = buffer[header_end..].to_vec();
            while body.len() < content_length {
                let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
                if read == 0 {
                    return Err("Unexpected EOF while reading HTTP body".to_string());
                }
                body.extend_from_slice(&chunk[..read]);
            }
            body.truncate(content_length);
            let body = serde_json::from_slice(&body).map_err(|err| err.to_string())?;

            Ok(CapturedRequest {
                request_line,
                headers,
                body,
            })
        }

        /// Accepts one connection, records its request and writes `fragments`
        /// back with a short pause between each.
        pub(super) async fn serve_once(
            fragments: Vec<String>,
        ) -> (String, JoinHandle<Result<CapturedRequest, String>>) {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("listener should bind");
            let addr = listener.local_addr().expect("local addr should resolve");

            let server = tokio::spawn(async move {
                let (mut stream, _) = listener.accept().await.map_err(|err| err.to_string())?;
                let request = read_request(&mut stream).await?;
                for fragment in fragments {
                    stream
                        .write_all(fragment.as_bytes())
                        .await
                        .map_err(|err| err.to_string())?;
                    stream.flush().await.map_err(|err| err.to_string())?;
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                stream.shutdown().await.map_err(|err| err.to_string())?;
                Ok(request)
            });

            (format!("http://{addr}/v1beta"), server)
        }

        pub(super) fn json_response(status: &str, body: &str) -> String {
            format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            )
        }

        pub(super) fn chunked_event_stream(pieces: &[&str]) -> Vec<String> {
            let mut fragments = vec![
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n"
                    .to_string(),
            ];
            fragments.extend(
                pieces
                    .iter()
                    .map(|piece| format!("{:x}\r\n{piece}\r\n", piece.len())),
            );
            fragments.push("0\r\n\r\n".to_string());
            fragments
        }
    }

    fn local_gateway(base_url: String) -> GeminiGateway {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client should build");
        GeminiGateway::new(client, base_url, Some("test-key".to_string()))
    }

    #[tokio::test]
    async fn send_posts_history_with_api_key_header() {
        let reply = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello!"}]},"finishReason":"STOP"}]}"#;
        let (base_url, server) = http::serve_once(vec![http::json_response("200 OK", reply)]).await;
        let gateway = local_gateway(base_url);

        let turn = gateway
            .send(&[Turn::user("Hi")], &ChatConfig::default())
            .await
            .expect("reply");
        assert_eq!(turn, Turn::assistant("Hello!"));

        let request = server
            .await
            .expect("server task should join")
            .expect("server should capture request");
        assert!(
            request
                .request_line
                .starts_with("POST /v1beta/models/gemini-1.5-flash-latest:generateContent "),
            "request line: {}",
            request.request_line
        );
        assert_eq!(request.header("x-goog-api-key"), Some("test-key"));
        assert_eq!(request.body["contents"][0]["role"], "user");
        assert_eq!(request.body["contents"][0]["parts"][0]["text"], "Hi");
        assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[tokio::test]
    async fn rate_limited_status_maps_to_rate_limit() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded.","status":"RESOURCE_EXHAUSTED"}}"#;
        let (base_url, server) =
            http::serve_once(vec![http::json_response("429 Too Many Requests", body)]).await;
        let gateway = local_gateway(base_url);

        let err = gateway
            .send(&[Turn::user("Hi")], &ChatConfig::default())
            .await
            .expect_err("rate limited");
        assert_eq!(err, ChatError::RateLimit("Quota exceeded.".to_string()));
        server
            .await
            .expect("server task should join")
            .expect("server should capture request");
    }

    #[tokio::test]
    async fn streaming_reassembles_lines_split_across_chunks() {
        let first = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"}]}}]}"#;
        let second = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"lo!"}]},"finishReason":"STOP"}]}"#;
        // No newline after the last event, so it is only seen once the body ends.
        let body = format!("data: {first}\n\ndata: {second}");
        let (head, tail) = body.split_at(body.len() - 24);

        let (base_url, server) = http::serve_once(http::chunked_event_stream(&[head, tail])).await;
        let gateway = local_gateway(base_url);

        let mut seen = Vec::new();
        let mut sink = |chunk: &str| seen.push(chunk.to_string());
        let turn = gateway
            .send_streaming(&[Turn::user("Hi")], &ChatConfig::default(), &mut sink)
            .await
            .expect("streamed reply");

        assert_eq!(turn, Turn::assistant("Hello!"));
        assert_eq!(seen, vec!["Hel".to_string(), "lo!".to_string()]);

        let request = server
            .await
            .expect("server task should join")
            .expect("server should capture request");
        assert!(
            request
                .request_line
                .contains(":streamGenerateContent?alt=sse "),
            "request line: {}",
            request.request_line
        );
        assert_eq!(request.header("x-goog-api-key"), Some("test-key"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let gateway = GeminiGateway::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let err = gateway
            .send(&[Turn::user("Hi")], &ChatConfig::default())
            .await
            .expect_err("no key");
        assert!(matches!(err, ChatError::Authentication(_)));
        assert!(!gateway.has_api_key());
        assert!(gateway.with_api_key(Some("key".into())).has_api_key());
    }
}
