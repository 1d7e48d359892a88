//! chatroute console
//!
//! Reads chat messages from stdin, one per line, and prints the bot's
//! replies. A line starting with `[id] ` is sent as that user, e.g.
//! `[42] !roll 20`. Logs go to stderr; set `RUST_LOG` to change the level.

mod demo;
mod event;

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chatroute_core::{Dispatcher, DispatcherConfig};

use crate::event::ConsoleEvent;

fn main() -> ExitCode {
    let config = DispatcherConfig::load();
    init_tracing(config.as_ref().is_ok_and(|c| c.debug));

    let config = config.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        DispatcherConfig::default()
    });

    let registry = match demo::registry() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to register commands: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = match Dispatcher::from_config(registry, &config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!("Invalid config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("chatroute ready, prefixes: {}", dispatcher.prefixes().join(" "));

    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let outcome = dispatcher.dispatch(Arc::new(ConsoleEvent::parse(&line)));
        tracing::debug!("{:?}", outcome);
    }

    dispatcher.shutdown();
    tracing::info!("chatroute shutting down...");
    ExitCode::SUCCESS
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
