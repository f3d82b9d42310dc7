use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::PromptRole;
use crate::shell::content::Panel;
use crate::shell::ModuleType;

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub module: Option<String>,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleRequest {
    pub session_id: Option<Uuid>,
    pub module: ModuleType,
}

#[derive(Debug, Serialize)]
pub struct ModuleEntry {
    pub module: ModuleType,
    pub label: &'static str,
    pub active: bool,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ModulesResponse {
    pub session_id: Uuid,
    pub active: ModuleType,
    pub progress: u8,
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Serialize)]
pub struct PanelResponse {
    pub session_id: Uuid,
    pub panel: Panel,
    pub progress: u8,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub session_id: Uuid,
    pub progress: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub analyze_log: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub mode: PromptRole,
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub log: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub report: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    pub session_id: Option<Uuid>,
    pub topic: Option<String>,
    #[serde(default)]
    pub random_topic: bool,
}

/// A generated question as shown to the student, without the answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizQuestionResponse {
    pub session_id: Uuid,
    pub id: Option<i64>,
    pub topic: String,
    pub question: String,
    pub options: Vec<String>,
    pub score: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuizAnswerRequest {
    pub session_id: Uuid,
    pub choice: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizAnswerResponse {
    pub correct: bool,
    pub correct_answer: usize,
    pub explanation: String,
    pub score: u32,
    pub experience: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeAnswerRequest {
    pub session_id: Option<Uuid>,
    pub challenge_id: u32,
    pub option: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeAnswerResponse {
    pub optimal: bool,
    pub feedback: String,
    pub flaw: String,
    pub next_challenge_id: u32,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub firewall: bool,
    pub packets: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialResponse {
    pub credential: bool,
}
