use actix_session::Session;
use actix_web::{
    get,
    web::{Data, Path, Query},
    HttpRequest, HttpResponse,
};
use sea_orm::DbConn;

use crate::{
    settings::Settings,
    use_cases::registration::{backends::RegistrationBackend, types::ActivationOutcome},
    web_adapters::utils::response_500,
};

use super::{activation_failed, activation_succeeded, NextQuery};

#[tracing::instrument(
    name = "Activating a new user",
    skip(req, db, settings, backend, session, path)
)]
#[get("/activate/{activation_key}/")]
pub async fn activate(
    req: HttpRequest,
    db: Data<DbConn>,
    settings: Data<Settings>,
    backend: Data<RegistrationBackend>,
    session: Session,
    path: Path<String>,
    query: Query<NextQuery>,
) -> HttpResponse {
    let activation_key = path.into_inner();
    match backend
        .activate(db.get_ref(), &settings, &activation_key)
        .await
    {
        Ok(ActivationOutcome::Activated(user)) => {
            activation_succeeded(&req, &backend, &user, &session, query.into_inner().next)
        }
        Ok(ActivationOutcome::Failed(failure)) => activation_failed(&req, failure),
        Err(e) => response_500(e),
    }
}
