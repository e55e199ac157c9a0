use hr_review::reviews::{GenerationError, GenerationRequest, TextGenerator};
use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` over the blocking reqwest client.
///
/// Calls block the current thread; the review router runs them on the
/// blocking pool. The client is built on first use so it is never created
/// inside an async context.
#[derive(Debug)]
pub(crate) struct GeminiTextGenerator {
    base_url: String,
    client: OnceLock<Client>,
}

impl Default for GeminiTextGenerator {
    fn default() -> Self {
        Self::with_base_url(GEMINI_BASE_URL)
    }
}

impl GeminiTextGenerator {
    pub(crate) fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(|| {
            Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new())
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl TextGenerator for GeminiTextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = json!({ "contents": [{ "parts": [{ "text": request.prompt }] }] });
        let response = self
            .client()
            .post(self.endpoint(&request.model))
            .query(&[("key", request.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), model = %request.model, "gemini responded");
        if !status.is_success() {
            return Err(GenerationError::from_status(
                status.as_u16(),
                error_detail(response),
            ));
        }

        let payload: Value = response
            .json()
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        candidate_text(&payload).ok_or(GenerationError::EmptyResponse)
    }
}

/// `error.message` from the JSON error body, else the raw text.
fn error_detail(response: Response) -> Option<String> {
    let text = response.text().ok()?;
    let message = serde_json::from_str::<Value>(&text).ok().and_then(|body| {
        body.pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    message.or(Some(text))
}

fn candidate_text(payload: &Value) -> Option<String> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::routing::post;
    use axum::{Json, Router};
    use hr_review::config::AiProvider;
    use std::collections::HashMap;

    async fn fake_gemini(
        Path(call): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> AxumResponse {
        let prompt = body
            .pointer("/contents/0/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let model = call.trim_end_matches(":generateContent");
        if params.get("key").map(String::as_str) != Some("good-key") {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." } })),
            )
                .into_response();
        }
        match model {
            "busy-model" => (StatusCode::TOO_MANY_REQUESTS, "quota").into_response(),
            "teapot-model" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
            "silent-model" => Json(json!({ "candidates": [] })).into_response(),
            _ => Json(json!({
                "candidates": [{ "content": { "parts": [{ "text": format!("{model} says: {prompt}") }] } }]
            }))
            .into_response(),
        }
    }

    async fn stub_base_url() -> String {
        let app = Router::new().route("/v1beta/models/:call", post(fake_gemini));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub serves");
        });
        format!("http://{addr}/v1beta")
    }

    fn request(model: &str, api_key: &str) -> GenerationRequest {
        GenerationRequest {
            provider: AiProvider::Gemini,
            api_key: api_key.to_string(),
            model: model.to_string(),
            prompt: "Summarise Hana's quarter".to_string(),
        }
    }

    async fn generate(base_url: String, request: GenerationRequest) -> Result<String, GenerationError> {
        tokio::task::spawn_blocking(move || {
            GeminiTextGenerator::with_base_url(base_url).generate(&request)
        })
        .await
        .expect("blocking call joins")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn returns_first_candidate_text() {
        let base = stub_base_url().await;
        let text = generate(base, request("gemini-test", "good-key"))
            .await
            .expect("generated");
        assert_eq!(text, "gemini-test says: Summarise Hana's quarter");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn error_statuses_are_classified() {
        let base = stub_base_url().await;

        let busy = generate(base.clone(), request("busy-model", "good-key")).await;
        assert_eq!(busy, Err(GenerationError::RateLimited));

        let rejected = generate(base.clone(), request("gemini-test", "bad-key")).await;
        assert_eq!(
            rejected,
            Err(GenerationError::BadRequest(Some(
                "API key not valid. Please pass a valid API key.".to_string()
            )))
        );

        let odd = generate(base, request("teapot-model", "good-key")).await;
        assert_eq!(
            odd.map_err(|err| err.user_message()),
            Err("Error (418): short and stout".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_candidates_are_an_empty_response() {
        let base = stub_base_url().await;
        let silent = generate(base, request("silent-model", "good-key")).await;
        assert_eq!(silent, Err(GenerationError::EmptyResponse));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_provider_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let outcome = generate(format!("http://{addr}/v1beta"), request("gemini-test", "good-key")).await;
        assert!(matches!(outcome, Err(GenerationError::Network(_))));
    }

    #[test]
    fn endpoint_keeps_model_in_the_path() {
        let generator = GeminiTextGenerator::with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            generator.endpoint("gemini-2.5-flash"),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
