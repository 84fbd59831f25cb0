use clap::Parser;

use watch_progress::{
    cli::{Backend, Cli},
    config::Config,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing::debug!(
        backend = %config.backend_base_url,
        user_id = %config.user_id,
        authenticated = config.session_cookie.is_some(),
        "Configuration loaded"
    );

    let backend = Backend::from_config(&config)?;
    let output = cli.command.run(&backend).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
