use std::sync::MutexGuard;

use actix_web::{web, HttpResponse, Responder};
use log::{error, info, warn};
use serde_json::json;
use tera::Context;
use uuid::Uuid;

use crate::model::error::GatewayError;
use crate::model::{Completion, PromptRequest, PromptRole};
use crate::shell::content::{self, CHALLENGES};
use crate::shell::simulator::{self, MAX_PACKETS};
use crate::shell::ModuleType;
use crate::web::models::{
    AnalyzeRequest, AnalyzeResponse, ChallengeAnswerRequest, ChallengeAnswerResponse, ChatRequest,
    ChatResponse, CredentialResponse, IndexQuery, ModuleEntry, ModuleRequest, ModulesResponse,
    PanelResponse, ProgressResponse, QuizAnswerRequest, QuizAnswerResponse, QuizQuestionResponse,
    QuizRequest, ResetRequest, SessionQuery, SimulateRequest,
};
use crate::web::session::{QuizError, Session, SessionStore};
use crate::AppState;

fn lock_sessions(data: &AppState) -> Result<MutexGuard<'_, SessionStore>, HttpResponse> {
    data.sessions.lock().map_err(|e| {
        error!("Failed to lock sessions mutex: {}", e);
        HttpResponse::InternalServerError().json(json!({
            "error": "Internal server error"
        }))
    })
}

/// Runs `f` against the session, creating it when the id is missing or unknown.
/// Returns the id actually used.
fn with_session<T>(
    data: &AppState,
    session_id: Option<Uuid>,
    f: impl FnOnce(&mut Session) -> T,
) -> Result<(Uuid, T), HttpResponse> {
    let mut sessions = lock_sessions(data)?;
    let session_id = session_id.unwrap_or_else(Uuid::new_v4);
    Ok((session_id, f(sessions.get_or_create(session_id))))
}

/// Runs `f` against an existing session; unknown or expired ids are a 404.
fn with_existing_session<T>(
    data: &AppState,
    session_id: Uuid,
    f: impl FnOnce(&mut Session) -> T,
) -> Result<T, HttpResponse> {
    let mut sessions = lock_sessions(data)?;
    match sessions.get_mut(&session_id) {
        Some(session) => Ok(f(session)),
        None => Err(HttpResponse::NotFound().json(json!({
            "error": format!("unknown session: {}", session_id)
        }))),
    }
}

fn gateway_error_response(err: &GatewayError) -> HttpResponse {
    let body = json!({
        "error": err.to_string(),
        "kind": err.kind(),
        "action": err.action().as_str(),
    });
    match err {
        GatewayError::CredentialMissing => HttpResponse::Unauthorized().json(body),
        GatewayError::MalformedResponse => HttpResponse::BadGateway().json(body),
        GatewayError::ServiceUnavailable(_) => HttpResponse::ServiceUnavailable().json(body),
    }
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message.into() }))
}

fn module_entries(session: &Session) -> Vec<ModuleEntry> {
    ModuleType::ALL
        .into_iter()
        .map(|module| ModuleEntry {
            module,
            label: module.label(),
            active: session.shell.active() == module,
            completed: session.shell.is_completed(module),
        })
        .collect()
}

// Index page handler
pub async fn index(data: web::Data<AppState>, query: web::Query<IndexQuery>) -> impl Responder {
    let module = match query.module.as_deref().map(str::parse::<ModuleType>) {
        Some(Ok(module)) => Some(module),
        Some(Err(e)) => return HttpResponse::NotFound().body(e.to_string()),
        None => None,
    };

    let result = with_session(&data, query.session_id, |session| {
        if let Some(module) = module {
            session.shell.select(module);
        }
        (
            module_entries(session),
            session.shell.active(),
            session.shell.progress(),
        )
    });
    let (session_id, (modules, active, progress)) = match result {
        Ok(found) => found,
        Err(response) => return response,
    };

    let mut context = Context::new();
    context.insert("session_id", &session_id);
    context.insert("modules", &modules);
    context.insert("panel", &content::panel(active));
    context.insert("progress", &progress);
    if active == ModuleType::ProblemSolving {
        context.insert("challenges", CHALLENGES);
    }

    match data.tera.render("index.html", &context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Health check endpoint
pub async fn health_check(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "credential": data.gateway.has_credential(),
    }))
}

pub async fn list_modules(data: web::Data<AppState>, query: web::Query<SessionQuery>) -> impl Responder {
    match with_session(&data, query.session_id, |session| {
        (
            session.shell.active(),
            session.shell.progress(),
            module_entries(session),
        )
    }) {
        Ok((session_id, (active, progress, modules))) => HttpResponse::Ok().json(ModulesResponse {
            session_id,
            active,
            progress,
            modules,
        }),
        Err(response) => response,
    }
}

pub async fn select_module(data: web::Data<AppState>, req: web::Json<ModuleRequest>) -> impl Responder {
    let module = req.module;
    match with_session(&data, req.session_id, |session| {
        session.shell.select(module);
        session.shell.progress()
    }) {
        Ok((session_id, progress)) => {
            info!("Session {} opened module {}", session_id, module);
            HttpResponse::Ok().json(PanelResponse {
                session_id,
                panel: content::panel(module),
                progress,
            })
        }
        Err(response) => response,
    }
}

pub async fn complete_module(data: web::Data<AppState>, req: web::Json<ModuleRequest>) -> impl Responder {
    let module = req.module;
    match with_session(&data, req.session_id, |session| {
        session.shell.complete(module);
        session.shell.progress()
    }) {
        Ok((session_id, progress)) => HttpResponse::Ok().json(ProgressResponse { session_id, progress }),
        Err(response) => response,
    }
}

// Forensic console: chat with the mentor, or analyze a pasted log
pub async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return bad_request("message must not be empty");
    }
    let mode = PromptRole::for_console_message(&message, req.analyze_log);

    // Copy the transcript and release the lock before the outbound call
    let (session_id, transcript) = match with_session(&data, req.session_id, |session| {
        session.transcript.clone()
    }) {
        Ok(found) => found,
        Err(response) => return response,
    };

    info!("Console request from session {} ({:?}, {} chars)", session_id, mode, message.len());

    let request = match mode {
        PromptRole::LogAnalysis => PromptRequest::log_analysis(message.clone()),
        _ => PromptRequest::chat(message.clone()),
    };

    match data.gateway.execute(request, &transcript).await {
        Ok(Completion::Text(reply)) => {
            let user_text = match mode {
                PromptRole::LogAnalysis => format!("[SYSTEM_LOG_UPLOAD]: \n{}", message),
                _ => message,
            };
            let stored = with_session(&data, Some(session_id), |session| {
                session.record_exchange(user_text, reply.clone());
                session.shell.complete(ModuleType::AiLab);
            });
            if stored.is_err() {
                // Not critical if we fail to update history, just log it
                warn!("Failed to update transcript for session {}", session_id);
            }

            HttpResponse::Ok().json(ChatResponse {
                reply,
                mode,
                session_id,
            })
        }
        Ok(Completion::Assessment(_)) => {
            error!("Console request for session {} produced a quiz item", session_id);
            HttpResponse::InternalServerError().json(json!({ "error": "Internal server error" }))
        }
        Err(e) => {
            error!("Console request failed for session {}: {}", session_id, e);
            gateway_error_response(&e)
        }
    }
}

pub async fn reset_chat(data: web::Data<AppState>, req: web::Json<ResetRequest>) -> impl Responder {
    match with_existing_session(&data, req.session_id, |session| session.transcript.clear()) {
        Ok(()) => HttpResponse::Ok().json(json!({ "session_id": req.session_id, "cleared": true })),
        Err(response) => response,
    }
}

pub async fn analyze(data: web::Data<AppState>, req: web::Json<AnalyzeRequest>) -> impl Responder {
    if req.log.trim().is_empty() {
        return bad_request("log must not be empty");
    }
    match data.gateway.analyze_forensics(&req.log).await {
        Ok(report) => HttpResponse::Ok().json(AnalyzeResponse { report }),
        Err(e) => {
            error!("Log analysis failed: {}", e);
            gateway_error_response(&e)
        }
    }
}

pub async fn generate_quiz(data: web::Data<AppState>, req: web::Json<QuizRequest>) -> impl Responder {
    let topic = match (req.topic.as_deref().map(str::trim), req.random_topic) {
        (Some(topic), _) if !topic.is_empty() => topic.to_string(),
        (_, true) => content::random_quiz_topic().to_string(),
        _ => content::DEFAULT_QUIZ_TOPIC.to_string(),
    };

    let item = match data.gateway.execute(PromptRequest::quiz(topic.clone()), &[]).await {
        Ok(Completion::Assessment(item)) => item,
        Ok(Completion::Text(_)) => {
            error!("Quiz request produced free text");
            return gateway_error_response(&GatewayError::MalformedResponse);
        }
        Err(e) => {
            error!("Quiz generation failed for topic {:?}: {}", topic, e);
            return gateway_error_response(&e);
        }
    };

    let (id, question, options) = (item.id, item.question.clone(), item.options.clone());
    match with_session(&data, req.session_id, |session| {
        session.quiz.present(item);
        session.quiz.score()
    }) {
        Ok((session_id, score)) => HttpResponse::Ok().json(QuizQuestionResponse {
            session_id,
            id,
            topic,
            question,
            options,
            score,
        }),
        Err(response) => response,
    }
}

pub async fn answer_quiz(data: web::Data<AppState>, req: web::Json<QuizAnswerRequest>) -> impl Responder {
    let result = with_existing_session(&data, req.session_id, |session| {
        let outcome = session.quiz.answer(req.choice)?;
        if outcome.correct {
            session.shell.complete(ModuleType::Quiz);
        }
        Ok::<_, QuizError>((outcome, session.quiz.score(), session.quiz.experience()))
    });

    match result {
        Ok(Ok((outcome, score, experience))) => HttpResponse::Ok().json(QuizAnswerResponse {
            correct: outcome.correct,
            correct_answer: outcome.correct_answer,
            explanation: outcome.explanation,
            score,
            experience,
        }),
        Ok(Err(e)) => HttpResponse::Conflict().json(json!({ "error": e.to_string() })),
        Err(response) => response,
    }
}

pub async fn answer_challenge(data: web::Data<AppState>, req: web::Json<ChallengeAnswerRequest>) -> impl Responder {
    let Some(position) = CHALLENGES.iter().position(|c| c.id == req.challenge_id) else {
        return HttpResponse::NotFound().json(json!({
            "error": format!("unknown challenge: {}", req.challenge_id)
        }));
    };
    let challenge = &CHALLENGES[position];
    let Some(option) = challenge.answer(req.option) else {
        return bad_request(format!("option {} is not one of the choices", req.option));
    };

    if option.is_optimal {
        if let Some(session_id) = req.session_id {
            if with_existing_session(&data, session_id, |s| s.shell.complete(ModuleType::ProblemSolving)).is_err() {
                warn!("Failed to record challenge progress for session {}", session_id);
            }
        }
    }

    HttpResponse::Ok().json(ChallengeAnswerResponse {
        optimal: option.is_optimal,
        feedback: option.feedback.to_string(),
        flaw: challenge.flaw.to_string(),
        next_challenge_id: CHALLENGES[content::next_challenge_index(position)].id,
    })
}

pub async fn simulate_defense(data: web::Data<AppState>, req: web::Json<SimulateRequest>) -> impl Responder {
    let count = req.packets.unwrap_or(MAX_PACKETS);
    let report = simulator::simulate(&mut rand::thread_rng(), req.firewall, count);

    if req.firewall {
        if let Some(session_id) = req.session_id {
            if with_existing_session(&data, session_id, |s| s.shell.complete(ModuleType::Defenses)).is_err() {
                warn!("Failed to record defense progress for session {}", session_id);
            }
        }
    }

    HttpResponse::Ok().json(report)
}

// Re-authenticate action: pick up a credential supplied after startup
pub async fn refresh_credential(data: web::Data<AppState>) -> impl Responder {
    let credential = data.gateway.refresh_credential();
    HttpResponse::Ok().json(CredentialResponse { credential })
}
