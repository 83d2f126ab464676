use actix_session::Session;
use actix_web::{
    get, post,
    web::{Data, Form, Query},
    HttpRequest, HttpResponse,
};
use sea_orm::DbConn;
use serde::Serialize;

use crate::{
    entities::custom_methods::user::UserUrlTrait,
    use_cases::registration::{
        forms::LoginForm,
        login::{self, POST_ONLY_MESSAGE},
        redirect::resolve_next,
        types::{RedirectTarget, StructuredResponse},
        RegistrationError,
    },
    utils::auth::session::AuthSession,
    web_adapters::utils::{request_context, response_400, response_500, see_other, wants_json},
};

use super::NextQuery;

#[derive(Serialize)]
struct LoginPage {
    fields: [&'static str; 2],
}

#[get("/login/")]
pub async fn login_form(req: HttpRequest) -> HttpResponse {
    match wants_json(&req) {
        true => HttpResponse::Ok().json(StructuredResponse::messages(vec![
            POST_ONLY_MESSAGE.to_string(),
        ])),
        false => HttpResponse::Ok().json(LoginPage {
            fields: ["username", "password"],
        }),
    }
}

#[post("/login/")]
pub async fn login_user(
    req: HttpRequest,
    db: Data<DbConn>,
    session: Session,
    query: Query<NextQuery>,
    form: Form<LoginForm>,
) -> HttpResponse {
    match login::login(db.get_ref(), &form).await {
        Ok(user) => {
            if let Err(e) = session.establish(&user) {
                return response_500(e);
            }
            match wants_json(&req) {
                true => HttpResponse::Ok().json(StructuredResponse::ok()),
                false => see_other(&resolve_next(
                    &request_context(&req, query.into_inner().next),
                    RedirectTarget::to(user.get_absolute_url()),
                )),
            }
        }
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
