mod activate;
mod login;
mod nameless;

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    http::{self, header},
    test,
};
use registration_backend::{
    entities::registration_profile, use_cases::registration::forms::RegistrationForm,
};
use sea_orm::{DbConn, DbErr, EntityTrait};

pub fn form(username: &str, email: &str, password1: &str, password2: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.to_string(),
        email: email.to_string(),
        password1: password1.to_string(),
        password2: password2.to_string(),
    }
}

pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Registers through the browser flow and returns the issued profile.
pub async fn register_user(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    db: &DbConn,
    username: &str,
    email: &str,
) -> Result<registration_profile::Model, DbErr> {
    let req = test::TestRequest::post()
        .uri("/registration/register/")
        .set_form(form(username, email, "secret", "secret"))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);

    Ok(registration_profile::Entity::find().one(db).await?.unwrap())
}
