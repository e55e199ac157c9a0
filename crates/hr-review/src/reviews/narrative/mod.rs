mod prompts;

pub use prompts::{department_briefing_prompt, employee_report_prompt, feedback_email_prompt};

use crate::config::{AiApiConfig, AiProvider, DEFAULT_MODEL};
use crate::reviews::aggregates::department_summaries;
use crate::reviews::domain::{EvaluationRecord, Period};
use crate::reviews::history::resolve_history;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// One prompt ready for the text-generation transport.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub provider: AiProvider,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("prompt_len", &self.prompt.len())
            .finish_non_exhaustive()
    }
}

/// Transport to a hosted text model.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured")]
    MissingKey,
    #[error("rate limited by the provider")]
    RateLimited,
    #[error("API key rejected")]
    InvalidKey,
    #[error("access to the model is forbidden")]
    Forbidden,
    #[error("model not found")]
    ModelNotFound,
    #[error("malformed request")]
    BadRequest(Option<String>),
    #[error("provider outage (status {0})")]
    Upstream(u16),
    #[error("unexpected status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("network failure: {0}")]
    Network(String),
    #[error("text generation unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned no text")]
    EmptyResponse,
}

impl GenerationError {
    /// Classifies a non-success HTTP status from the provider.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail
            .map(|text| text.trim().chars().take(150).collect::<String>())
            .filter(|text| !text.is_empty());
        match status {
            429 => Self::RateLimited,
            401 => Self::InvalidKey,
            403 => Self::Forbidden,
            404 => Self::ModelNotFound,
            400 => Self::BadRequest(detail),
            500 | 502 | 503 => Self::Upstream(status),
            _ => Self::Status { status, detail },
        }
    }

    /// Text shown to the dashboard user in place of the generated prose.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingKey => {
                "No AI API key is configured. Add one under \"AI API settings\" first.".to_string()
            }
            Self::RateLimited => "The API usage limit was exceeded. Check the plan and usage in \
                 Google AI Studio (https://ai.google.dev) or try again shortly."
                .to_string(),
            Self::InvalidKey => {
                "The API key is not valid. Check it under \"AI API settings\".".to_string()
            }
            Self::Forbidden => {
                "API access was denied. Check the key's permissions and available models."
                    .to_string()
            }
            Self::ModelNotFound => format!(
                "The requested model was not found. Check the model name under \"AI API settings\" (e.g. {DEFAULT_MODEL})."
            ),
            Self::BadRequest(Some(detail)) => detail.clone(),
            Self::BadRequest(None) => {
                "The request was malformed. Check the model name and API key.".to_string()
            }
            Self::Upstream(_) => {
                "The AI provider is having a temporary problem. Try again shortly.".to_string()
            }
            Self::Status {
                status,
                detail: Some(detail),
            } => format!("Error ({status}): {detail}"),
            Self::Status {
                status,
                detail: None,
            } => format!("The AI API returned an error. (code: {status})"),
            Self::Network(_) => {
                "Could not reach the AI API. Check the connection and try again.".to_string()
            }
            Self::Unavailable(_) => {
                "The AI service is currently unavailable. Try again shortly.".to_string()
            }
            Self::EmptyResponse => "The AI did not return a response.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    EmployeeReport,
    FeedbackEmail,
    DepartmentBriefing,
}

/// Generated prose, or the user-facing reason there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub kind: NarrativeKind,
    pub subject: String,
    pub text: String,
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrativeError {
    #[error("{0} has no evaluation for the current quarter")]
    NoCurrentEvaluation(String),
    #[error("department {0} has nobody evaluated this quarter")]
    DepartmentNotFound(String),
}

/// Builds prompts from the record snapshot and hands them to a [`TextGenerator`].
pub struct NarrativeService<G> {
    generator: Arc<G>,
    config: AiApiConfig,
}

impl<G> NarrativeService<G>
where
    G: TextGenerator + 'static,
{
    pub fn new(generator: Arc<G>, config: AiApiConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &AiApiConfig {
        &self.config
    }

    pub fn employee_report(
        &self,
        subject: &str,
        records: &[EvaluationRecord],
    ) -> Result<Narrative, NarrativeError> {
        let history = resolve_history(subject, records);
        let latest = history
            .latest_record()
            .ok_or_else(|| NarrativeError::NoCurrentEvaluation(subject.to_string()))?;
        let prompt = employee_report_prompt(&history, latest);
        Ok(self.run(NarrativeKind::EmployeeReport, subject, prompt))
    }

    pub fn feedback_email(
        &self,
        subject: &str,
        records: &[EvaluationRecord],
    ) -> Result<Narrative, NarrativeError> {
        let history = resolve_history(subject, records);
        let latest = history
            .latest_record()
            .ok_or_else(|| NarrativeError::NoCurrentEvaluation(subject.to_string()))?;
        let prompt = feedback_email_prompt(latest);
        Ok(self.run(NarrativeKind::FeedbackEmail, subject, prompt))
    }

    pub fn department_briefing(
        &self,
        department: &str,
        records: &[EvaluationRecord],
    ) -> Result<Narrative, NarrativeError> {
        let summary = department_summaries(records)
            .into_iter()
            .find(|summary| summary.department == department && summary.count > 0)
            .ok_or_else(|| NarrativeError::DepartmentNotFound(department.to_string()))?;
        let prompt = department_briefing_prompt(&summary, Period::latest());
        Ok(self.run(NarrativeKind::DepartmentBriefing, department, prompt))
    }

    fn run(&self, kind: NarrativeKind, subject: &str, prompt: String) -> Narrative {
        let outcome = match self.config.api_key() {
            None => Err(GenerationError::MissingKey),
            Some(api_key) => {
                let request = GenerationRequest {
                    provider: self.config.provider,
                    api_key: api_key.to_string(),
                    model: self.config.model.clone(),
                    prompt,
                };
                self.generator
                    .generate(&request)
                    .and_then(|text| {
                        if text.trim().is_empty() {
                            Err(GenerationError::EmptyResponse)
                        } else {
                            Ok(text)
                        }
                    })
            }
        };

        match outcome {
            Ok(text) => {
                info!(?kind, subject, "narrative generated");
                Narrative {
                    kind,
                    subject: subject.to_string(),
                    text,
                    generated: true,
                }
            }
            Err(err) => {
                warn!(?kind, subject, error = %err, "narrative generation failed");
                Narrative {
                    kind,
                    subject: subject.to_string(),
                    text: err.user_message(),
                    generated: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::tests::common::ranked;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedGenerator {
        reply: Option<Result<String, GenerationError>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedGenerator {
        fn replying(reply: Result<String, GenerationError>) -> Self {
            Self {
                reply: Some(reply),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().expect("requests mutex").len()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.requests
                .lock()
                .expect("requests mutex")
                .push(request.clone());
            self.reply
                .clone()
                .unwrap_or_else(|| Err(GenerationError::Unavailable("no script".to_string())))
        }
    }

    fn keyed() -> AiApiConfig {
        AiApiConfig {
            api_key: Some(" key-123 ".to_string()),
            ..AiApiConfig::default()
        }
    }

    fn records() -> Vec<EvaluationRecord> {
        vec![
            ranked("Hana", "Sales", Period::Q3Of2025, 78.0, "B", 1),
            ranked("Hana", "Sales", Period::latest(), 91.0, "A", 1),
            ranked("Min", "Ops", Period::Q3Of2025, 70.0, "C", 2),
        ]
    }

    #[test]
    fn missing_key_short_circuits_without_calling_the_model() {
        let generator = Arc::new(ScriptedGenerator::replying(Ok("unused".to_string())));
        let service = NarrativeService::new(generator.clone(), AiApiConfig::default());

        let narrative = service
            .employee_report("Hana", &records())
            .expect("subject has a current record");
        assert!(!narrative.generated);
        assert_eq!(narrative.text, GenerationError::MissingKey.user_message());
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn successful_generation_passes_trimmed_key_and_model() {
        let generator = Arc::new(ScriptedGenerator::replying(Ok("Great quarter.".to_string())));
        let service = NarrativeService::new(generator.clone(), keyed());

        let narrative = service.feedback_email("Hana", &records()).expect("email");
        assert!(narrative.generated);
        assert_eq!(narrative.kind, NarrativeKind::FeedbackEmail);
        assert_eq!(narrative.text, "Great quarter.");

        let requests = generator.requests.lock().expect("requests mutex");
        assert_eq!(requests[0].api_key, "key-123");
        assert_eq!(requests[0].model, DEFAULT_MODEL);
        assert!(requests[0].prompt.contains("Hana"));
    }

    #[test]
    fn failures_become_user_messages() {
        let generator = Arc::new(ScriptedGenerator::replying(Err(
            GenerationError::from_status(429, None),
        )));
        let service = NarrativeService::new(generator, keyed());

        let narrative = service
            .department_briefing("Sales", &records())
            .expect("briefing");
        assert!(!narrative.generated);
        assert!(narrative.text.contains("usage limit"));

        let blank = NarrativeService::new(
            Arc::new(ScriptedGenerator::replying(Ok("   ".to_string()))),
            keyed(),
        );
        let narrative = blank.employee_report("Hana", &records()).expect("report");
        assert_eq!(narrative.text, GenerationError::EmptyResponse.user_message());
    }

    #[test]
    fn subjects_without_current_records_are_rejected() {
        let service = NarrativeService::new(Arc::new(ScriptedGenerator::default()), keyed());
        assert_eq!(
            service.employee_report("Min", &records()),
            Err(NarrativeError::NoCurrentEvaluation("Min".to_string()))
        );
        assert_eq!(
            service.department_briefing("Ops", &records()),
            Err(NarrativeError::DepartmentNotFound("Ops".to_string()))
        );
    }

    #[test]
    fn status_codes_map_to_distinct_messages() {
        let cases = [
            (429, GenerationError::RateLimited),
            (401, GenerationError::InvalidKey),
            (403, GenerationError::Forbidden),
            (404, GenerationError::ModelNotFound),
            (400, GenerationError::BadRequest(None)),
            (502, GenerationError::Upstream(502)),
        ];
        let mut messages = Vec::new();
        for (status, expected) in cases {
            let error = GenerationError::from_status(status, None);
            assert_eq!(error, expected);
            messages.push(error.user_message());
        }
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), 6);

        let detailed = GenerationError::from_status(418, Some("teapot".to_string()));
        assert_eq!(detailed.user_message(), "Error (418): teapot");
        let bad = GenerationError::from_status(400, Some("model field missing".to_string()));
        assert_eq!(bad.user_message(), "model field missing");
    }
}
