use actix_web::{get, HttpResponse};
use serde::Serialize;

#[derive(Serialize)]
struct Page {
    message: &'static str,
}

#[get("/complete/")]
pub async fn registration_complete() -> HttpResponse {
    HttpResponse::Ok().json(Page {
        message: "Registration complete. Check your email for the activation link.",
    })
}

#[get("/closed/")]
pub async fn registration_closed() -> HttpResponse {
    HttpResponse::Ok().json(Page {
        message: "Registration is closed.",
    })
}
