use anyhow::Context;
use remedy_core::config::{Config, WarnLevel};
use remedy_server::AppState;
use std::path::Path;

pub fn run(config_path: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let warnings = config.validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }
    let errors: Vec<&str> = warnings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message.as_str())
        .collect();
    if !errors.is_empty() {
        anyhow::bail!("refusing to serve with config errors: {}", errors.join("; "));
    }

    let port = port.unwrap_or(config.server.port);
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let state = AppState::from_config(&config).context("failed to wire collaborators")?;
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;

        tokio::select! {
            res = remedy_server::serve_on(state, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
