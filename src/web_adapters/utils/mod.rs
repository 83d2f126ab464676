use std::fmt::Debug;

use actix_web::{http::header, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::use_cases::registration::types::{RedirectTarget, RequestContext};

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Bad Request
pub fn response_400<T: Serialize>(body: &T) -> HttpResponse {
    HttpResponse::BadRequest().json(body)
}

/// NotFound
pub fn response_404(error_message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: error_message.to_string(),
    })
}

/// Internal Server Error: with logging
pub fn response_500<T: Debug>(e: T) -> HttpResponse {
    event!(target: "backend", Level::ERROR, "{:?}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Some unexpected error happened. Please try again later.".to_string(),
    })
}

pub fn see_other(target: &RedirectTarget) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target.to_uri()))
        .finish()
}

/// Programmatic clients ask for JSON through the Accept header.
pub fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|accept| accept.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

pub fn request_context(req: &HttpRequest, next: Option<String>) -> RequestContext {
    RequestContext {
        host: req.connection_info().host().to_string(),
        next,
    }
}
