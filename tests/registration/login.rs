use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    http, test,
};
use registration_backend::use_cases::registration::{
    forms::LoginForm,
    login::{INVALID_LOGIN_MESSAGE, POST_ONLY_MESSAGE},
    types::StructuredResponse,
};
use sea_orm::DbErr;

use super::{location, register_user};
use crate::utils::{init_app, Connections};

fn credentials(username: &str, password: &str) -> LoginForm {
    LoginForm {
        username: username.to_string(),
        password: password.to_string(),
    }
}

async fn activate(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    activation_key: &str,
) {
    let req = test::TestRequest::get()
        .uri(&format!("/registration/activate/{}/", activation_key))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
}

#[actix_web::test]
async fn get_is_refused_for_json_clients() -> Result<(), DbErr> {
    let Connections { app, .. } = init_app().await?;

    let req = test::TestRequest::get()
        .uri("/registration/login/")
        .insert_header((http::header::ACCEPT, "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        res,
        serde_json::json!({"success": false, "errors": [POST_ONLY_MESSAGE]})
    );

    Ok(())
}

#[actix_web::test]
async fn login_json() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    activate(&app, &profile.activation_key).await;

    let req = test::TestRequest::post()
        .uri("/registration/login/")
        .insert_header((http::header::ACCEPT, "application/json"))
        .set_form(credentials("alice", "secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);
    assert!(resp
        .response()
        .cookies()
        .any(|cookie| cookie.name() == "sessionId"));

    let res: StructuredResponse = test::read_body_json(resp).await;
    assert_eq!(res, StructuredResponse::ok());

    Ok(())
}

#[actix_web::test]
async fn login_redirects_to_next() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    let profile = register_user(&app, &db, "alice", "alice@example.com").await?;
    activate(&app, &profile.activation_key).await;

    let req = test::TestRequest::post()
        .uri("/registration/login/?next=/dashboard/")
        .set_form(credentials("alice", "secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard/");

    let req = test::TestRequest::post()
        .uri("/registration/login/?next=http://evil.com/")
        .set_form(credentials("alice", "secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/users/alice/");

    Ok(())
}

#[actix_web::test]
async fn inactive_user_cannot_login() -> Result<(), DbErr> {
    let Connections { app, db, .. } = init_app().await?;
    register_user(&app, &db, "alice", "alice@example.com").await?;

    let req = test::TestRequest::post()
        .uri("/registration/login/")
        .insert_header((http::header::ACCEPT, "application/json"))
        .set_form(credentials("alice", "secret"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::OK);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(res["success"], false);
    assert_eq!(
        res["errors"]["__all__"],
        serde_json::json!([INVALID_LOGIN_MESSAGE])
    );

    Ok(())
}

#[actix_web::test]
async fn missing_fields() -> Result<(), DbErr> {
    let Connections { app, .. } = init_app().await?;

    let req = test::TestRequest::post()
        .uri("/registration/login/")
        .set_form(credentials("", ""))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);

    let res: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        res["errors"]["username"],
        serde_json::json!(["This field is required."])
    );
    assert_eq!(
        res["errors"]["password"],
        serde_json::json!(["This field is required."])
    );

    Ok(())
}
