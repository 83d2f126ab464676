mod activate;
mod activate_password;
mod login;
mod pages;
mod register;

use actix_web::{
    web::{scope, ServiceConfig},
    HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    entities::user,
    use_cases::registration::{
        backends::RegistrationBackend,
        types::{ActivationFailure, ActivationFailureReason, StructuredResponse},
    },
    utils::auth::session::AuthSession,
};

use super::utils::{request_context, response_500, see_other, wants_json};

pub fn registration_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/registration")
            .service(register::registration_form)
            .service(register::register)
            .service(activate::activate)
            .service(activate_password::set_password_form)
            .service(activate_password::activate_with_password)
            .service(login::login_form)
            .service(login::login_user)
            .service(pages::registration_complete)
            .service(pages::registration_closed),
    );
}

#[derive(Deserialize, Debug)]
pub struct NextQuery {
    next: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ActivationFailurePage {
    pub activation_key: String,
    pub reason: ActivationFailureReason,
    pub message: String,
}

/// Activation failures are a page of their own, never an error status.
fn activation_failed(req: &HttpRequest, failure: ActivationFailure) -> HttpResponse {
    if wants_json(req) {
        return HttpResponse::Ok().json(StructuredResponse::messages(vec![failure
            .message()
            .to_string()]));
    }
    HttpResponse::Ok().json(ActivationFailurePage {
        message: failure.message().to_string(),
        activation_key: failure.activation_key,
        reason: failure.reason,
    })
}

fn activation_succeeded(
    req: &HttpRequest,
    backend: &RegistrationBackend,
    user: &user::Model,
    session: &impl AuthSession,
    next: Option<String>,
) -> HttpResponse {
    match backend.post_activation_redirect(&request_context(req, next), user, session) {
        Ok(target) => match wants_json(req) {
            true => HttpResponse::Ok().json(StructuredResponse::ok()),
            false => see_other(&target),
        },
        Err(e) => response_500(e),
    }
}
