use std::process::ExitCode;

use openshelter::database::handle::process_env;
use openshelter::migrate::run_migrations;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run_migrations(&*process_env()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Migration failed: {}", e);
            ExitCode::from(1)
        }
    }
}
