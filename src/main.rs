//! TetrECS host (default binary).
//!
//! Runs the multiplayer piece dealer. Every connected client receives the same
//! ordered piece ids, so their games stay comparable.
//!
//! Configuration comes from the environment; see [`ServerConfig::from_env`].
//! `TETRECS_LOG` sets the log level (default `info`).

use std::str::FromStr;

use anyhow::{Context, Result};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use tetrecs::adapter::{run_server, ServerConfig, PROTOCOL_VERSION};

/// Console logging at the level named by `TETRECS_LOG`
fn init_log() -> Result<()> {
    let level = std::env::var("TETRECS_LOG")
        .ok()
        .and_then(|s| LevelFilter::from_str(s.trim()).ok())
        .unwrap_or(LevelFilter::Info);

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {l} {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .context("invalid log configuration")?;
    log4rs::init_config(config).context("logger already initialised")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_log()?;

    let config = ServerConfig::from_env();
    info!(
        "[Host] TetrECS {} (protocol {}), max {} clients",
        env!("CARGO_PKG_VERSION"),
        PROTOCOL_VERSION,
        config.max_clients
    );

    tokio::select! {
        result = run_server(config, None) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("[Host] Shutting down");
            Ok(())
        }
    }
}
