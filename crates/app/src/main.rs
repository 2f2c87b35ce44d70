use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use threadline::cli::Cli;
use threadline::console::{BubbleRenderer, Console};
use threadline::logging::init_tracing;
use threadline::settings::{SettingsStore, settings_json};
use threadline_chat::{ChatRuntime, SessionStore};
use tokio::io::BufReader;

/// Application entry point.
///
/// 1. Logging on stderr
/// 2. Settings from file and environment, falling back to defaults
/// 3. Controller task seeded with the configured sessions
/// 4. Terminal view on stdin/stdout until `/quit` or end of input
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let settings_store = match cli.config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::load(),
    };
    let settings = settings_store.settings();

    if cli.print_config {
        return match settings_json(&settings) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                tracing::error!("{error}");
                ExitCode::FAILURE
            }
        };
    }

    let store = match SessionStore::with_sessions(settings.initial_sessions.iter().cloned()) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!("invalid initial sessions: {error}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        sessions = store.len(),
        config = ?settings_store.config_path(),
        "starting chat runtime"
    );

    let (handle, events) = ChatRuntime::spawn(
        store,
        settings.controller_config(),
        Arc::new(settings.reply_generator()),
    );
    let console = Console::new(handle, BubbleRenderer::default(), std::io::stdout())
        .with_settings(settings_store);

    match console
        .run(BufReader::new(tokio::io::stdin()), events)
        .await
    {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("terminal view failed: {error}");
            ExitCode::FAILURE
        }
    }
}
