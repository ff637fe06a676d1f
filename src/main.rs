use std::sync::Arc;

use event_wizard::channels::CliSession;
use event_wizard::config::WizardConfig;
use event_wizard::intake::event_intake_steps;
use event_wizard::notify::{CollectingNotifier, ConsoleNotifier, Notifier};
use event_wizard::routes::{WizardRouteState, wizard_routes};
use event_wizard::store::{Database, LibSqlBackend};
use event_wizard::submission::{InquirySubmitter, SubmissionSink};
use event_wizard::wizard::WizardEngine;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WizardConfig::from_env()?;

    // Keep the guard alive so the file writer flushes on exit.
    let _log_guard = init_tracing(&config);

    eprintln!("🎊 Event Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());

    let db = open_store(&config).await?;
    let submitter: Arc<dyn SubmissionSink> = Arc::new(InquirySubmitter::new(Arc::clone(&db)));

    match config.http_port {
        Some(port) => {
            let notifications = Arc::new(CollectingNotifier::new());
            let engine = WizardEngine::new(event_intake_steps(), submitter, notifications.clone())
                .with_numeric_policy(config.numeric_policy);
            let app = wizard_routes(WizardRouteState {
                engine: Arc::new(tokio::sync::Mutex::new(engine)),
                notifications,
            });

            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
            eprintln!("   Wizard API: http://0.0.0.0:{port}/api/wizard\n");
            tracing::info!(port, "Wizard HTTP server started");
            axum::serve(listener, app).await?;
        }
        None => {
            let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
            let engine = WizardEngine::new(event_intake_steps(), submitter, notifier)
                .with_numeric_policy(config.numeric_policy);
            eprintln!("   Type /help for commands.\n");
            CliSession::new(engine, config.session_id.clone(), config.prompt_delay)
                .with_store(db)
                .run()
                .await?;
        }
    }

    Ok(())
}

async fn open_store(config: &WizardConfig) -> event_wizard::error::Result<Arc<dyn Database>> {
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
    Ok(db)
}

/// stderr logging, plus a daily-rolling file when a log directory is set.
fn init_tracing(config: &WizardConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "event-wizard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}
