use actix_session::Session;
use actix_web::{
    get, post,
    web::{Data, Form, Path, Query},
    HttpRequest, HttpResponse,
};
use sea_orm::DbConn;
use serde::Serialize;

use crate::{
    settings::Settings,
    use_cases::registration::{
        backends::RegistrationBackend,
        forms::SetPasswordForm,
        types::{ActivationOutcome, KeyVerification, StructuredResponse},
        RegistrationError,
    },
    web_adapters::utils::{response_400, response_404, response_500, wants_json},
};

use super::{activation_failed, activation_succeeded, NextQuery};

#[derive(Serialize)]
struct SetPasswordPage {
    activation_key: String,
    username: String,
    fields: [&'static str; 2],
}

#[tracing::instrument(
    name = "Showing the set password form",
    skip(req, db, settings, backend, path)
)]
#[get("/activate-password/{activation_key}/")]
pub async fn set_password_form(
    req: HttpRequest,
    db: Data<DbConn>,
    settings: Data<Settings>,
    backend: Data<RegistrationBackend>,
    path: Path<String>,
) -> HttpResponse {
    let activation_key = path.into_inner();
    match backend
        .verify_key(db.get_ref(), &settings, &activation_key)
        .await
    {
        Ok(KeyVerification::Valid(user)) => HttpResponse::Ok().json(SetPasswordPage {
            activation_key,
            username: user.username,
            fields: ["new_password1", "new_password2"],
        }),
        Ok(KeyVerification::Invalid(failure)) => activation_failed(&req, failure),
        Err(RegistrationError::NotFound(message)) => response_404(&message),
        Err(e) => response_500(e),
    }
}

#[tracing::instrument(
    name = "Activating a new user with a password",
    skip(req, db, settings, backend, session, path, form)
)]
#[post("/activate-password/{activation_key}/")]
pub async fn activate_with_password(
    req: HttpRequest,
    db: Data<DbConn>,
    settings: Data<Settings>,
    backend: Data<RegistrationBackend>,
    session: Session,
    path: Path<String>,
    query: Query<NextQuery>,
    form: Form<SetPasswordForm>,
) -> HttpResponse {
    let activation_key = path.into_inner();
    match backend
        .activate_with_password(db.get_ref(), &settings, &activation_key, &form)
        .await
    {
        Ok(ActivationOutcome::Activated(user)) => {
            activation_succeeded(&req, &backend, &user, &session, query.into_inner().next)
        }
        Ok(ActivationOutcome::Failed(failure)) => activation_failed(&req, failure),
        Err(RegistrationError::Validation(errors)) => {
            let body = StructuredResponse::field_errors(errors);
            match wants_json(&req) {
                true => HttpResponse::Ok().json(body),
                false => response_400(&body),
            }
        }
        Err(RegistrationError::NotFound(message)) => response_404(&message),
        Err(e) => response_500(e),
    }
}
