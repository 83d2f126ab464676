use actix_web::{
    get, post,
    web::{Data, Form},
    HttpRequest, HttpResponse,
};
use sea_orm::DbConn;

use crate::{
    settings::Settings,
    use_cases::registration::{
        backends::RegistrationBackend,
        forms::RegistrationForm,
        types::StructuredResponse,
        RegistrationError,
    },
    utils::emails::ActivationMailer,
    web_adapters::utils::{request_context, response_400, response_500, see_other, wants_json},
};

fn registration_closed(req: &HttpRequest, backend: &RegistrationBackend) -> HttpResponse {
    match wants_json(req) {
        true => HttpResponse::Ok().json(StructuredResponse::messages(vec![
            RegistrationError::Closed.to_string(),
        ])),
        false => see_other(&backend.registration_closed_redirect()),
    }
}

#[tracing::instrument(name = "Showing the registration form", skip(req, settings, backend))]
#[get("/register/")]
pub async fn registration_form(
    req: HttpRequest,
    settings: Data<Settings>,
    backend: Data<RegistrationBackend>,
) -> HttpResponse {
    if !backend.registration_allowed(&settings) {
        return registration_closed(&req, &backend);
    }
    HttpResponse::Ok().json(backend.form_spec())
}

#[tracing::instrument(
    name = "Registering a user",
    skip(req, db, mailer, settings, backend, form),
    fields(username = %form.username)
)]
#[post("/register/")]
pub async fn register(
    req: HttpRequest,
    db: Data<DbConn>,
    mailer: Data<dyn ActivationMailer>,
    settings: Data<Settings>,
    backend: Data<RegistrationBackend>,
    form: Form<RegistrationForm>,
) -> HttpResponse {
    match backend
        .register(db.get_ref(), mailer.get_ref(), &settings, &form)
        .await
    {
        Ok(user) => match wants_json(&req) {
            true => HttpResponse::Ok().json(StructuredResponse::ok()),
            false => see_other(
                &backend.post_registration_redirect(&request_context(&req, None), &user),
            ),
        },
        Err(RegistrationError::Closed) => registration_closed(&req, &backend),
        Err(RegistrationError::Validation(errors)) => {
            let body = StructuredResponse::field_errors(errors);
            match wants_json(&req) {
                true => HttpResponse::Ok().json(body),
                false => response_400(&body),
            }
        }
        Err(e) => response_500(e),
    }
}
