//! Client for Gemini's `generateContent` image editing endpoint.
//!
//! The wire types below only model the fields this app reads or writes;
//! everything else in the response is ignored by serde.

use serde::{Deserialize, Serialize};

use crate::codec::EncodedImage;
use crate::config::ApiConfig;
use crate::error::AiCallError;

/// Longest slice of an error body copied into the log.
const LOGGED_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Base64 image returned by the model.
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What the model sent back for an edit request.
pub enum EditOutcome {
    Image(InlineImage),
    /// The model answered in text instead, usually explaining why it
    /// could not comply.
    Refusal(String),
    Empty,
}

/// Anything that can turn an image and an instruction into an edited image.
pub trait ImageEditor: Send + Sync {
    fn edit(&self, image: &EncodedImage, instruction: &str) -> Result<EditOutcome, AiCallError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestPart<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<RequestBlob<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBlob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [Modality; 2],
}

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
enum Modality {
    Image,
    Text,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(image: &'a EncodedImage, instruction: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart {
                        inline_data: Some(RequestBlob {
                            mime_type: &image.mime_type,
                            data: &image.base64,
                        }),
                        text: None,
                    },
                    RequestPart {
                        inline_data: None,
                        text: Some(instruction),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: [Modality::Image, Modality::Text],
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default, alias = "inline_data")]
    inline_data: Option<ResponseBlob>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBlob {
    #[serde(default, alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

/// Picks the outcome from the first candidate. The first part carrying
/// inline data decides: an empty payload counts as no image. Without one,
/// the first non-empty text is a refusal.
fn classify(response: GenerateContentResponse) -> EditOutcome {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    if let Some(blob) = parts.iter().find_map(|p| p.inline_data.as_ref()) {
        if blob.data.is_empty() {
            return EditOutcome::Empty;
        }
        return EditOutcome::Image(InlineImage {
            data: blob.data.clone(),
            mime_type: blob.mime_type.clone(),
        });
    }

    match parts.into_iter().find_map(|p| p.text.filter(|t| !t.is_empty())) {
        Some(text) => EditOutcome::Refusal(text),
        None => EditOutcome::Empty,
    }
}

fn truncate_for_log(body: &str) -> &str {
    match body.char_indices().nth(LOGGED_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Blocking HTTP client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api: ApiConfig,
}

impl GeminiClient {
    pub fn new(api: ApiConfig) -> reqwest::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(api.timeout)
            .build()?;
        Ok(Self { http, api })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api.endpoint, self.api.model
        )
    }
}

impl ImageEditor for GeminiClient {
    fn edit(&self, image: &EncodedImage, instruction: &str) -> Result<EditOutcome, AiCallError> {
        let body = GenerateContentRequest::new(image, instruction);
        tracing::debug!(model = %self.api.model, mime = %image.mime_type, "sending edit request");

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api.api_key)
            .json(&body)
            .send()
            .map_err(|err| {
                tracing::error!(%err, "error calling AI service");
                AiCallError
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            tracing::error!(%status, body = truncate_for_log(&text), "AI service rejected request");
            return Err(AiCallError);
        }

        let parsed: GenerateContentResponse = response.json().map_err(|err| {
            tracing::error!(%err, "malformed response from AI service");
            AiCallError
        })?;

        let outcome = classify(parsed);
        match &outcome {
            EditOutcome::Image(img) => {
                tracing::info!(mime = %img.mime_type, bytes = img.data.len(), "AI returned an image")
            }
            EditOutcome::Refusal(text) => tracing::warn!(%text, "AI answered with text only"),
            EditOutcome::Empty => tracing::warn!("AI response had no usable parts"),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    fn parse(json: &str) -> EditOutcome {
        classify(serde_json::from_str(json).unwrap())
    }

    fn sample_image() -> EncodedImage {
        EncodedImage {
            base64: "Zm9v".to_string(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let image = sample_image();
        let body = serde_json::to_value(GenerateContentRequest::new(&image, "make it pop")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        { "inlineData": { "mimeType": "image/jpeg", "data": "Zm9v" } },
                        { "text": "make it pop" }
                    ]
                }],
                "generationConfig": { "responseModalities": ["IMAGE", "TEXT"] }
            })
        );
    }

    #[test]
    fn inline_image_wins_over_text() {
        let outcome = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here you go"},
                {"inlineData":{"mimeType":"image/png","data":"Zm9v"}}
            ]}}]}"#,
        );
        assert_eq!(
            outcome,
            EditOutcome::Image(InlineImage {
                data: "Zm9v".into(),
                mime_type: "image/png".into(),
            })
        );
    }

    #[test]
    fn text_only_response_is_a_refusal() {
        let outcome = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"I can't edit photos of people."}]}}]}"#,
        );
        assert_eq!(
            outcome,
            EditOutcome::Refusal("I can't edit photos of people.".into())
        );
    }

    #[test]
    fn empty_inline_data_means_no_image_even_with_text() {
        let outcome = parse(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"image/png","data":""}},
                {"text":"Sorry, something went wrong."}
            ]}}]}"#,
        );
        assert_eq!(outcome, EditOutcome::Empty);
    }

    #[test]
    fn whitespace_text_is_still_a_refusal() {
        let outcome = parse(r#"{"candidates":[{"content":{"parts":[{"text":"  \n"}]}}]}"#);
        assert_eq!(outcome, EditOutcome::Refusal("  \n".into()));
    }

    #[test]
    fn missing_candidates_are_empty() {
        assert_eq!(parse(r#"{}"#), EditOutcome::Empty);
        assert_eq!(parse(r#"{"candidates":[]}"#), EditOutcome::Empty);
        assert_eq!(
            parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            EditOutcome::Empty
        );
    }

    #[test]
    fn only_first_candidate_is_considered() {
        let outcome = parse(
            r#"{"candidates":[
                {"content":{"parts":[]}},
                {"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"Zm9v"}}]}}
            ]}"#,
        );
        assert_eq!(outcome, EditOutcome::Empty);
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let outcome = parse(
            r#"{"candidates":[{"content":{"parts":[{"inline_data":{"mime_type":"image/webp","data":"YmFy"}}]}}]}"#,
        );
        assert!(matches!(outcome, EditOutcome::Image(img) if img.mime_type == "image/webp"));
    }

    #[test]
    fn log_truncation_respects_char_boundaries() {
        let body = "é".repeat(LOGGED_BODY_LIMIT + 10);
        assert_eq!(truncate_for_log(&body).chars().count(), LOGGED_BODY_LIMIT);
        assert_eq!(truncate_for_log("short"), "short");
    }

    struct CapturedRequest {
        request_line: String,
        api_key: Option<String>,
        body: serde_json::Value,
    }

    /// Serves exactly one HTTP response and reports what was requested.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            let mut api_key = None;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    match name.to_ascii_lowercase().as_str() {
                        "content-length" => content_length = value.trim().parse().unwrap(),
                        "x-goog-api-key" => api_key = Some(value.trim().to_string()),
                        _ => {}
                    }
                }
            }
            let mut raw = vec![0u8; content_length];
            reader.read_exact(&mut raw).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();

            let _ = tx.send(CapturedRequest {
                request_line: request_line.trim_end().to_string(),
                api_key,
                body: serde_json::from_slice(&raw).unwrap_or(serde_json::Value::Null),
            });
        });
        (format!("http://{}", addr), rx)
    }

    fn client_for(endpoint: String) -> GeminiClient {
        GeminiClient::new(ApiConfig {
            api_key: "test-key".into(),
            model: "test-model".into(),
            endpoint,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn client_posts_to_model_endpoint_with_key_header() {
        let (endpoint, captured) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"Zm9v"}}]}}]}"#,
        );
        let client = client_for(endpoint);

        let outcome = client.edit(&sample_image(), "cartoon please").unwrap();
        assert!(matches!(outcome, EditOutcome::Image(ref img) if img.data == "Zm9v"));

        let req = captured.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            req.request_line,
            "POST /v1beta/models/test-model:generateContent HTTP/1.1"
        );
        assert_eq!(req.api_key.as_deref(), Some("test-key"));
        assert_eq!(req.body["contents"][0]["parts"][1]["text"], "cartoon please");
    }

    #[test]
    fn non_success_status_becomes_call_error() {
        let (endpoint, _captured) = serve_once(
            "500 Internal Server Error",
            r#"{"error":{"message":"boom"}}"#,
        );
        let client = client_for(endpoint);
        assert_eq!(client.edit(&sample_image(), "x"), Err(AiCallError));
    }

    #[test]
    fn malformed_body_becomes_call_error() {
        let (endpoint, _captured) = serve_once("200 OK", "not json");
        let client = client_for(endpoint);
        assert_eq!(client.edit(&sample_image(), "x"), Err(AiCallError));
    }

    #[test]
    fn unreachable_endpoint_becomes_call_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}", addr));
        assert_eq!(client.edit(&sample_image(), "x"), Err(AiCallError));
    }
}
