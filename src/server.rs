//! HTTP surface over the dispatcher: `POST /generate` and `GET /check_status`.

use crate::{
    dispatch::{Dispatcher, SubmitRequest},
    error::ImageMakerError,
};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Deserialize;
use serde_json::json;

pub const CALLER_HEADER: &str = "X-User-Id";
const ANONYMOUS_CALLER: &str = "anonymous";

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub task_id: Option<String>,
}

fn caller_identity(req: &HttpRequest) -> String {
    req.headers()
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
        .to_string()
}

fn error_response(err: &ImageMakerError) -> HttpResponse {
    let body = json!({"status": "error", "message": err.to_string()});
    match err {
        ImageMakerError::NotFoundError(_) => HttpResponse::NotFound().json(body),
        e if e.is_submission_error() => HttpResponse::BadRequest().json(body),
        e if e.is_provider_error() => HttpResponse::BadGateway().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub async fn generate_image(
    dispatcher: web::Data<Dispatcher>,
    req: HttpRequest,
    body: web::Json<SubmitRequest>,
) -> HttpResponse {
    let caller = caller_identity(&req);
    match dispatcher.submit(body.into_inner(), &caller).await {
        Ok(task_id) => HttpResponse::Ok().json(json!({"status": "processing", "task_id": task_id})),
        Err(e) => {
            log::warn!("Rejected submission from {}: {}", caller, e);
            error_response(&e)
        }
    }
}

pub async fn check_image_status(
    dispatcher: web::Data<Dispatcher>,
    query: web::Query<StatusQuery>,
) -> HttpResponse {
    let task_id = match query.task_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            return HttpResponse::BadRequest()
                .json(json!({"status": "error", "message": "No task ID provided"}))
        }
    };

    match dispatcher.poll_status(task_id).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => error_response(&e),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(generate_image))
        .route("/check_status", web::get().to(check_image_status));
}

pub async fn run(dispatcher: Dispatcher, port: u16) -> std::io::Result<()> {
    log::info!("🌐 Listening on http://127.0.0.1:{}", port);
    let data = web::Data::new(dispatcher);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(("127.0.0.1", port))?
        .run()
        .await
}
