use std::sync::Arc;

use actix_session::{
    config::{PersistentSession, SessionMiddlewareBuilder},
    storage::{RedisSessionStore, SessionStore},
    SessionMiddleware,
};
use actix_web::{
    cookie,
    dev::Server,
    web::{Data, ServiceConfig},
    App, HttpServer,
};
use sea_orm::{Database, DatabaseConnection, DbErr};

use crate::{
    settings::Settings,
    utils::emails::{build_mailer, ActivationMailer},
    web_adapters::registration_routes,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, std::io::Error> {
        let db = get_database_connection(&settings)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let mailer = build_mailer(&settings).map_err(|e| std::io::Error::other(e.to_string()))?;
        let address = format!(
            "{}:{}",
            settings.application.host, settings.application.port
        );

        let listener = std::net::TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db, mailer, settings).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn get_database_connection(settings: &Settings) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&settings.database.url).await
}

pub fn session_key(settings: &Settings) -> cookie::Key {
    cookie::Key::from(settings.secret.hmac_secret.as_bytes())
}

pub fn setup_session_middleware_builder<S: SessionStore>(
    builder: SessionMiddlewareBuilder<S>,
    settings: &Settings,
) -> SessionMiddlewareBuilder<S> {
    let builder = builder
        .session_lifecycle(PersistentSession::default().session_ttl(cookie::time::Duration::days(7)))
        .cookie_name("sessionId".to_string());
    match settings.debug {
        true => builder
            .cookie_same_site(cookie::SameSite::None)
            .cookie_secure(false),
        false => builder,
    }
}

/// Shared app state plus every route, so tests mount exactly what production serves.
pub fn configure_app(
    db: DatabaseConnection,
    mailer: Arc<dyn ActivationMailer>,
    settings: Settings,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let backend = settings.registration.backend;
        cfg.app_data(Data::new(db))
            .app_data(Data::from(mailer))
            .app_data(Data::new(backend))
            .app_data(Data::new(settings))
            .service(health_check)
            .configure(registration_routes);
    }
}

async fn run(
    listener: std::net::TcpListener,
    db: DatabaseConnection,
    mailer: Arc<dyn ActivationMailer>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let secret_key = session_key(&settings);
    let redis_store = RedisSessionStore::new(settings.redis.url.clone())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                setup_session_middleware_builder(
                    SessionMiddleware::builder(redis_store.clone(), secret_key.clone()),
                    &settings,
                )
                .build(),
            )
            .configure(configure_app(db.clone(), mailer.clone(), settings.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

#[actix_web::get("/health-check")]
pub async fn health_check() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json("Application is safe and healthy.")
}
