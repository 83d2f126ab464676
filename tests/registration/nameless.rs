use actix_web::{http, test};
use chrono::{Duration, Utc};
use registration_backend::{
    entities::user,
    use_cases::registration::{
        backends::RegistrationBackend, forms::SetPasswordForm, types::StructuredResponse,
    },
    utils::auth::password::verify_password,
};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, IntoActiveModel, Set};

use super::{form, location, register_user};
use crate::utils::{capture_logs, init_app, init_app_with, Connections};

const EMAIL: &str = "user@example.com";

fn set_password(new_password1: &str, new_password2: &str) -> SetPasswordForm {
    SetPasswordForm {
        new_password1: new_password1.to_string(),
        new_password2: new_password2.to_string(),
    }
}

#[actix_web::test]
async fn username_must_match_email() -> Result<(), DbErr> {
    let Connections { app, db, mailer } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;

    let req = test::TestRequest::post()
        .uri("/registration/register/")
        .insert_header((http::header::ACCEPT, "application/json"))
        .set_form(form("user", EMAIL, "secret", "secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        res["errors"]["__all__"],
        serde_json::json!(["The username and email address must match."])
    );
    assert_eq!(user::Entity::find().all(&db).await?.len(), 0);
    assert!(mailer.outbox().is_empty());

    Ok(())
}

#[actix_web::test]
async fn first_click_valid_code() -> Result<(), DbErr> {
    let Connections { app, db, mailer } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;
    let profile = register_user(&app, &db, EMAIL, EMAIL).await?;
    assert!(mailer.outbox()[0].text.contains(&format!(
        "/registration/activate-password/{}/",
        profile.activation_key
    )));

    let req = test::TestRequest::get()
        .uri(&format!(
            "/registration/activate-password/{}/",
            profile.activation_key
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(res["activation_key"], profile.activation_key);
    assert_eq!(res["username"], EMAIL);

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(!user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn first_click_expired_code() -> Result<(), DbErr> {
    let Connections { app, db, .. } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;
    let profile = register_user(&app, &db, EMAIL, EMAIL).await?;
    let activation_key = profile.activation_key.clone();
    let user_id = profile.user_id;
    let mut profile = profile.into_active_model();
    profile.activation_started_at = Set((Utc::now() - Duration::days(7) - Duration::hours(1)).into());
    profile.update(&db).await?;

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate-password/{}/", activation_key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(res["reason"], "expired");

    let user_in_db = user::Entity::find_by_id(user_id).one(&db).await?.unwrap();
    assert!(!user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn complete_success_then_link_is_spent() -> Result<(), DbErr> {
    let Connections { app, db, .. } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;
    let profile = register_user(&app, &db, EMAIL, EMAIL).await?;
    let uri = format!(
        "/registration/activate-password/{}/",
        profile.activation_key
    );

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form(set_password("newpass", "newpass"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/users/{}/", EMAIL));
    assert!(resp
        .response()
        .cookies()
        .any(|cookie| cookie.name() == "sessionId"));

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(user_in_db.is_active);
    assert!(verify_password(&user_in_db.password, b"newpass").is_ok());

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(res["reason"], "not_found");

    Ok(())
}

#[actix_web::test]
async fn mismatched_new_passwords() -> Result<(), DbErr> {
    let Connections { app, db, .. } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;
    let profile = register_user(&app, &db, EMAIL, EMAIL).await?;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/registration/activate-password/{}/",
            profile.activation_key
        ))
        .insert_header((http::header::ACCEPT, "application/json"))
        .set_form(set_password("newpass", "other"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let res: StructuredResponse = test::read_body_json(resp).await;
    assert!(!res.success);

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(!user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn unavailable_for_default_backend() -> Result<(), DbErr> {
    let Connections { app, .. } = init_app().await?;

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate-password/{}/", "a".repeat(64)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);

    Ok(())
}

#[actix_web::test]
async fn activation_key_stays_out_of_logs() -> Result<(), DbErr> {
    let Connections { app, db, .. } =
        init_app_with(|settings| settings.registration.backend = RegistrationBackend::Nameless)
            .await?;
    let profile = register_user(&app, &db, EMAIL, EMAIL).await?;
    let uri = format!("/registration/activate-password/{}/", profile.activation_key);
    let (logs, _guard) = capture_logs();

    let req = test::TestRequest::get().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form(set_password("swordfish", "swordfish"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);

    let output = logs.contents();
    assert!(output.contains("user_activated"));
    assert!(!output.contains(&profile.activation_key));

    Ok(())
}
