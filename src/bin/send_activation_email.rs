use std::process::ExitCode;

use clap::Parser;
use registration_backend::{
    settings as backend_settings, startup, telemetry,
    use_cases::registration::{
        resend::{send_activation_email, ResendOutcome, UserLookup, ALREADY_ACTIVE_MESSAGE},
        RegistrationError,
    },
    utils::emails::build_mailer,
};
use uuid::Uuid;

/// Makes sure an inactive user receives an activation email, issuing a new
/// key when the old one has expired.
#[derive(Parser, Debug)]
#[command(name = "send_activation_email")]
#[command(about = "Send (or resend) the activation email of an inactive user")]
struct Cli {
    /// Id of the user.
    #[arg(long)]
    userid: Option<Uuid>,

    /// Id of a unit the user belongs to.
    #[arg(long)]
    unitid: Option<Uuid>,

    /// Email address of the user.
    #[arg(long)]
    email: Option<String>,
}

async fn run(cli: Cli) -> Result<(), RegistrationError> {
    let settings = backend_settings::get_settings()
        .map_err(|e| RegistrationError::Internal(format!("Failed to read settings: {}", e)))?;
    let _guard = telemetry::init_subscriber(settings.debug)
        .map_err(|e| RegistrationError::Internal(e.to_string()))?;

    let db = startup::get_database_connection(&settings)
        .await
        .map_err(|e| RegistrationError::Internal(e.to_string()))?;
    let mailer = build_mailer(&settings).map_err(|e| RegistrationError::Internal(e.to_string()))?;
    let site = settings.registration.backend.site_context(&settings);

    let lookup = UserLookup {
        user_id: cli.userid,
        unit_id: cli.unitid,
        email: cli.email,
    };
    match send_activation_email(&db, mailer.as_ref(), &site, &lookup).await? {
        ResendOutcome::AlreadyActive(_) => println!("{}", ALREADY_ACTIVE_MESSAGE),
        ResendOutcome::Sent { user, .. } => {
            println!("Sent an activation email to {} <{}>.", user.username, user.email)
        }
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("CommandError: {}", e);
            ExitCode::FAILURE
        }
    }
}
