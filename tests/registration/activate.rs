use actix_web::{http, test};
use chrono::{Duration, Utc};
use registration_backend::{
    entities::{registration_profile, user},
    use_cases::registration::types::StructuredResponse,
};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, IntoActiveModel, Set};

use super::{location, register_user};
use crate::utils::{capture_logs, init_app, Connections};

#[actix_web::test]
async fn valid_activation() -> Result<(), DbErr> {
    let Connections { app, db, mailer } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    assert!(mailer.outbox()[0].text.contains(&profile.activation_key));

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", profile.activation_key))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/users/alice/");

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(user_in_db.is_active);
    let profile_in_db = registration_profile::Entity::find_by_id(profile.id)
        .one(&db)
        .await?;
    assert!(profile_in_db.is_none());

    Ok(())
}

#[actix_web::test]
async fn valid_activation_json() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", profile.activation_key))
        .insert_header((http::header::ACCEPT, "application/json"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let res: StructuredResponse = test::read_body_json(resp).await;
    assert_eq!(res, StructuredResponse::ok());

    Ok(())
}

#[actix_web::test]
async fn activation_redirects_to_safe_next() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/registration/activate/{}/?next=http%3A%2F%2Fevil.com%2F",
            profile.activation_key
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/users/alice/");

    Ok(())
}

#[actix_web::test]
async fn activation_with_next() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;

    let req = test::TestRequest::get()
        .uri(&format!(
            "/registration/activate/{}/?next=%2Fwelcome%2F",
            profile.activation_key
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/welcome/");

    Ok(())
}

#[actix_web::test]
async fn invalid_activation() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    let unknown_key = "0".repeat(64);

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", unknown_key))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(res["activation_key"], unknown_key);
    assert_eq!(res["reason"], "not_found");

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(!user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn expired_activation() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    let activation_key = profile.activation_key.clone();
    let mut profile = profile.into_active_model();
    profile.activation_started_at = Set((Utc::now() - Duration::days(8)).into());
    let profile = profile.update(&db).await?;

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", activation_key))
        .insert_header((http::header::ACCEPT, "application/json"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    let res: StructuredResponse = test::read_body_json(resp).await;
    assert_eq!(
        res,
        StructuredResponse::messages(vec![
            "This activation link has expired. Please request a new one.".to_string()
        ])
    );

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(!user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn double_activation() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(&format!("/registration/activate/{}/", profile.activation_key))
            .to_request();
        test::call_service(&app, req).await;
    }
    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", profile.activation_key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let user_in_db = user::Entity::find_by_id(profile.user_id)
        .one(&db)
        .await?
        .unwrap();
    assert!(user_in_db.is_active);

    Ok(())
}

#[actix_web::test]
async fn activation_key_stays_out_of_logs() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    let (logs, _guard) = capture_logs();

    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", profile.activation_key))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);

    let output = logs.contents();
    assert!(output.contains("Activating a new user"));
    assert!(!output.contains(&profile.activation_key));

    Ok(())
}
