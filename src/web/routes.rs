use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/modules", web::get().to(handlers::list_modules))
            .route("/modules/select", web::post().to(handlers::select_module))
            .route("/modules/complete", web::post().to(handlers::complete_module))
            .route("/chat", web::post().to(handlers::chat))
            .route("/chat/reset", web::post().to(handlers::reset_chat))
            .route("/analyze", web::post().to(handlers::analyze))
            .route("/quiz", web::post().to(handlers::generate_quiz))
            .route("/quiz/answer", web::post().to(handlers::answer_quiz))
            .route("/challenges/answer", web::post().to(handlers::answer_challenge))
            .route("/defenses/simulate", web::post().to(handlers::simulate_defense))
            .route("/credential/refresh", web::post().to(handlers::refresh_credential))
    )
    .route("/", web::get().to(handlers::index))
    .route("/health", web::get().to(handlers::health_check));
}
