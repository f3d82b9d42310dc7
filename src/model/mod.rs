pub mod assessment;
pub mod backend;
pub mod credential;
pub mod error;
pub mod prompts;
pub mod recovery;
pub mod wire;

use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use assessment::{assessment_schema, AssessmentItem};
use backend::CompletionBackend;
use credential::{ApiKey, CredentialSource};
use error::GatewayError;
use wire::{Content, GenerateContentRequest, GenerationConfig, ThinkingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One prior exchange in a chat. The transcript is owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptRole {
    Chat,
    LogAnalysis,
    QuizGeneration,
}

impl PromptRole {
    /// Console input goes to log analysis when flagged, or when it is long and
    /// looks like HTTP access or firewall output.
    pub fn for_console_message(message: &str, flagged_as_log: bool) -> Self {
        let looks_like_log = message.chars().count() > 100
            && ["GET", "POST", "IP"].iter().any(|marker| message.contains(marker));
        if flagged_as_log || looks_like_log {
            PromptRole::LogAnalysis
        } else {
            PromptRole::Chat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub role: PromptRole,
    pub payload: String,
    pub topic: Option<String>,
}

impl PromptRequest {
    pub fn chat(message: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Chat,
            payload: message.into(),
            topic: None,
        }
    }

    pub fn log_analysis(log: impl Into<String>) -> Self {
        Self {
            role: PromptRole::LogAnalysis,
            payload: log.into(),
            topic: None,
        }
    }

    pub fn quiz(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self {
            role: PromptRole::QuizGeneration,
            payload: topic.clone(),
            topic: Some(topic),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    Assessment(AssessmentItem),
}

/// Stateless client for the completion service. Holds only the credential and
/// model settings; every call is one outbound request with no retry.
pub struct Gateway {
    backend: Arc<dyn CompletionBackend>,
    source: Arc<dyn CredentialSource>,
    credential: RwLock<Option<ApiKey>>,
    models: ModelConfig,
}

impl Gateway {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        source: Arc<dyn CredentialSource>,
        models: ModelConfig,
    ) -> Self {
        let credential = source.resolve();
        if credential.is_none() {
            warn!("No API key configured; AI features will report a missing credential");
        }
        Self {
            backend,
            source,
            credential: RwLock::new(credential),
            models,
        }
    }

    /// Re-resolves the credential from its source. Returns whether one is present.
    pub fn refresh_credential(&self) -> bool {
        let resolved = self.source.resolve();
        let present = resolved.is_some();
        match self.credential.write() {
            Ok(mut guard) => *guard = resolved,
            Err(poisoned) => *poisoned.into_inner() = resolved,
        }
        info!("Credential refreshed (present: {})", present);
        present
    }

    pub fn has_credential(&self) -> bool {
        self.current_credential().is_ok()
    }

    fn current_credential(&self) -> Result<ApiKey, GatewayError> {
        let guard = match self.credential.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone().ok_or(GatewayError::CredentialMissing)
    }

    pub async fn execute(
        &self,
        request: PromptRequest,
        transcript: &[Turn],
    ) -> Result<Completion, GatewayError> {
        match request.role {
            PromptRole::Chat => self.chat(&request.payload, transcript).await.map(Completion::Text),
            PromptRole::LogAnalysis => self
                .analyze_forensics(&request.payload)
                .await
                .map(Completion::Text),
            PromptRole::QuizGeneration => {
                let topic = request.topic.as_deref().unwrap_or(&request.payload);
                self.generate_assessment_item(topic)
                    .await
                    .map(Completion::Assessment)
            }
        }
    }

    pub async fn chat(&self, message: &str, transcript: &[Turn]) -> Result<String, GatewayError> {
        let key = self.current_credential()?;
        info!(
            "chat: model={}, {} prior turns, {} chars",
            self.models.chat_model,
            transcript.len(),
            message.len()
        );

        let reply = self
            .backend
            .send_chat(&key, &self.models.chat_model, prompts::MENTOR_PERSONA, transcript, message)
            .await
            .map_err(GatewayError::classify)?;

        Ok(self.finish_text(reply, prompts::CHAT_FALLBACK))
    }

    pub async fn analyze_forensics(&self, log_payload: &str) -> Result<String, GatewayError> {
        let key = self.current_credential()?;
        info!(
            "analyze_forensics: model={}, {} chars of log",
            self.models.analysis_model,
            log_payload.len()
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompts::forensic_analysis(log_payload))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: self.models.thinking_budget,
                }),
                ..GenerationConfig::default()
            }),
        };

        let report = self
            .backend
            .generate_content(&key, &self.models.analysis_model, request)
            .await
            .map_err(GatewayError::classify)?;

        Ok(self.finish_text(report, prompts::ANALYSIS_FALLBACK))
    }

    pub async fn generate_assessment_item(&self, topic: &str) -> Result<AssessmentItem, GatewayError> {
        let key = self.current_credential()?;
        info!("generate_assessment_item: model={}, topic={:?}", self.models.quiz_model, topic);

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompts::assessment_item(topic))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(assessment_schema()),
                thinking_config: None,
            }),
        };

        let raw = self
            .backend
            .generate_content(&key, &self.models.quiz_model, request)
            .await
            .map_err(GatewayError::classify)?
            .ok_or(GatewayError::MalformedResponse)?;

        debug!("Raw assessment item: {}", raw);
        recovery::parse_assessment_item(&raw).ok_or(GatewayError::MalformedResponse)
    }

    fn finish_text(&self, text: Option<String>, fallback: &str) -> String {
        match text {
            Some(text) => cap_reply(text, self.models.max_reply_chars),
            None => {
                warn!("Completion service returned empty text; using fallback");
                fallback.to_string()
            }
        }
    }
}

const TRUNCATION_MARKER: &str = "\n[truncated]";

fn cap_reply(text: String, max_chars: Option<usize>) -> String {
    let Some(max) = max_chars else {
        return text;
    };
    match text.char_indices().nth(max) {
        Some((cut, _)) => {
            let mut capped = text[..cut].to_string();
            capped.push_str(TRUNCATION_MARKER);
            capped
        }
        None => text,
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::credential::StaticCredential;
    use super::error::UpstreamError;
    use super::testing::{RecordedCall, ScriptedBackend};
    use super::*;

    const QUIZ_JSON: &str = r#"{"question":"Q","options":["A","B","C","D"],"correctAnswer":2,"explanation":"E"}"#;

    fn gateway_with(backend: Arc<ScriptedBackend>, key: Option<&str>) -> Gateway {
        Gateway::new(
            backend,
            Arc::new(StaticCredential(key.and_then(ApiKey::new))),
            ModelConfig::default(),
        )
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_call() {
        let backend = Arc::new(ScriptedBackend::text(QUIZ_JSON));
        let gateway = gateway_with(backend.clone(), None);

        let err = gateway.generate_assessment_item("Network Defense").await.unwrap_err();

        assert_eq!(err, GatewayError::CredentialMissing);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn quiz_call_declares_schema_and_parses_record() {
        let backend = Arc::new(ScriptedBackend::text(QUIZ_JSON));
        let gateway = gateway_with(backend.clone(), Some("key"));

        let item = gateway.generate_assessment_item("Network Defense").await.unwrap();
        assert_eq!(item.correct_answer, 2);
        assert_eq!(item.options.len(), 4);
        assert!(item.is_correct(2));

        let calls = backend.calls.lock().unwrap();
        let RecordedCall::Generate { model, request } = &calls[0] else {
            panic!("expected a single-shot call");
        };
        assert_eq!(model, "gemini-3-flash-preview");
        let config = request.generation_config.as_ref().unwrap();
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        assert_eq!(config.response_schema, Some(assessment_schema()));
        assert!(request.contents[0].parts[0].text.contains("Network Defense"));
    }

    #[tokio::test]
    async fn invalid_quiz_record_is_malformed() {
        let three = r#"{"question":"Q","options":["A","B","C"],"correctAnswer":1,"explanation":"E"}"#;
        let backend = Arc::new(ScriptedBackend::replying(vec![Ok(Some(three.to_string())), Ok(None)]));
        let gateway = gateway_with(backend, Some("key"));

        assert_eq!(
            gateway.generate_assessment_item("Threats").await,
            Err(GatewayError::MalformedResponse)
        );
        assert_eq!(
            gateway.generate_assessment_item("Threats").await,
            Err(GatewayError::MalformedResponse)
        );
    }

    #[tokio::test]
    async fn analysis_uses_pro_model_with_thinking_budget() {
        let backend = Arc::new(ScriptedBackend::text("Severity: High"));
        let gateway = gateway_with(backend.clone(), Some("key"));

        let report = gateway.analyze_forensics("GET /admin 403 from 10.0.0.5").await.unwrap();
        assert_eq!(report, "Severity: High");

        let calls = backend.calls.lock().unwrap();
        let RecordedCall::Generate { model, request } = &calls[0] else {
            panic!("expected a single-shot call");
        };
        assert_eq!(model, "gemini-3-pro-preview");
        let config = request.generation_config.as_ref().unwrap();
        assert_eq!(config.thinking_config, Some(ThinkingConfig { thinking_budget: 32768 }));
        assert!(config.response_schema.is_none());
        assert!(request.contents[0].parts[0].text.ends_with("GET /admin 403 from 10.0.0.5"));
    }

    #[tokio::test]
    async fn empty_text_gets_fallback_but_errors_propagate() {
        let backend = Arc::new(ScriptedBackend::replying(vec![
            Ok(None),
            Ok(None),
            Err(UpstreamError::transport("connection reset")),
        ]));
        let gateway = gateway_with(backend, Some("key"));

        assert_eq!(gateway.chat("hi", &[]).await.unwrap(), prompts::CHAT_FALLBACK);
        assert_eq!(
            gateway.analyze_forensics("log").await.unwrap(),
            prompts::ANALYSIS_FALLBACK
        );
        assert!(matches!(
            gateway.chat("hi", &[]).await,
            Err(GatewayError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn chat_sends_persona_and_transcript() {
        let backend = Arc::new(ScriptedBackend::text("Defense in depth layers controls."));
        let gateway = gateway_with(backend.clone(), Some("key"));
        let transcript = vec![
            Turn::new(TurnRole::User, "hello"),
            Turn::new(TurnRole::Model, "Operational readiness: standby."),
        ];

        let reply = gateway.chat("Explain defense in depth", &transcript).await.unwrap();
        assert_eq!(reply, "Defense in depth layers controls.");

        let calls = backend.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            RecordedCall::Chat {
                model: "gemini-3-flash-preview".to_string(),
                system_instruction: prompts::MENTOR_PERSONA.to_string(),
                transcript,
                message: "Explain defense in depth".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn rejected_key_maps_to_credential_missing() {
        let backend = Arc::new(ScriptedBackend::replying(vec![Err(UpstreamError::http(
            401,
            "unauthorized",
        ))]));
        let gateway = gateway_with(backend, Some("stale"));
        assert_eq!(gateway.chat("hi", &[]).await, Err(GatewayError::CredentialMissing));
    }

    struct SwitchableSource(Mutex<Option<&'static str>>);

    impl CredentialSource for SwitchableSource {
        fn resolve(&self) -> Option<ApiKey> {
            let current = *self.0.lock().unwrap();
            current.and_then(ApiKey::new)
        }
    }

    #[tokio::test]
    async fn refresh_picks_up_credential_supplied_later() {
        let backend = Arc::new(ScriptedBackend::text("ok"));
        let source = Arc::new(SwitchableSource(Mutex::new(None)));
        let gateway = Gateway::new(backend, source.clone(), ModelConfig::default());

        assert!(!gateway.has_credential());
        assert_eq!(gateway.chat("hi", &[]).await, Err(GatewayError::CredentialMissing));

        *source.0.lock().unwrap() = Some("late-key");
        assert!(!gateway.has_credential());
        assert!(gateway.refresh_credential());
        assert_eq!(gateway.chat("hi", &[]).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn execute_dispatches_on_role() {
        let backend = Arc::new(ScriptedBackend::replying(vec![
            Ok(Some("reply".to_string())),
            Ok(Some(QUIZ_JSON.to_string())),
        ]));
        let gateway = gateway_with(backend, Some("key"));

        assert_eq!(
            gateway.execute(PromptRequest::chat("hi"), &[]).await,
            Ok(Completion::Text("reply".to_string()))
        );
        let Ok(Completion::Assessment(item)) =
            gateway.execute(PromptRequest::quiz("Zero Trust"), &[]).await
        else {
            panic!("expected an assessment item");
        };
        assert_eq!(item.correct_answer, 2);
    }

    #[test]
    fn reply_cap_truncates_on_char_boundary() {
        assert_eq!(cap_reply("héllo".to_string(), Some(2)), "hé\n[truncated]");
        assert_eq!(cap_reply("short".to_string(), Some(10)), "short");
        assert_eq!(cap_reply("unbounded".to_string(), None), "unbounded");
    }

    #[test]
    fn console_routing_matches_log_heuristic() {
        let access_log = format!("{} GET /wp-login.php 401", "203.0.113.9 - - ".repeat(8));
        assert_eq!(PromptRole::for_console_message(&access_log, false), PromptRole::LogAnalysis);
        assert_eq!(PromptRole::for_console_message("short GET", false), PromptRole::Chat);
        assert_eq!(PromptRole::for_console_message("what is a SYN flood?", true), PromptRole::LogAnalysis);
        assert_eq!(
            PromptRole::for_console_message(&"a".repeat(200), false),
            PromptRole::Chat
        );
    }

    #[test]
    fn log_heuristic_counts_characters_not_bytes() {
        // 60 characters, 140 bytes
        let message = format!("GET {}", "é".repeat(56));
        assert!(message.len() > 100);
        assert_eq!(PromptRole::for_console_message(&message, false), PromptRole::Chat);
    }

    #[tokio::test]
    async fn quiz_request_wraps_topic_in_prompt_once() {
        let backend = Arc::new(ScriptedBackend::replying(vec![
            Ok(Some(QUIZ_JSON.to_string())),
            Ok(Some(QUIZ_JSON.to_string())),
        ]));
        let gateway = gateway_with(backend.clone(), Some("key"));

        let requests = [
            PromptRequest::quiz("Zero Trust"),
            PromptRequest {
                role: PromptRole::QuizGeneration,
                payload: "Zero Trust".to_string(),
                topic: None,
            },
        ];
        for request in requests {
            assert!(matches!(
                gateway.execute(request, &[]).await,
                Ok(Completion::Assessment(_))
            ));
        }

        let expected = prompts::assessment_item("Zero Trust");
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        for call in calls.iter() {
            let RecordedCall::Generate { request, .. } = call else {
                panic!("expected a single-shot call");
            };
            assert_eq!(request.contents[0].parts[0].text, expected);
        }
    }
}
