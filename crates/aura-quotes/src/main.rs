#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "aura-quotes", about = "Mood-aware quote companion server")]
struct Args {
    /// Embed the quote catalogue and bootstrap training set before serving
    #[arg(long)]
    bootstrap: bool,
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::path::Path;
    use std::sync::Arc;

    use aura_quotes::agent::QuoteAgent;
    use aura_quotes::api::build_router;
    use aura_quotes::config::Config;
    use aura_quotes::quote_db::{seed, QuoteDatabase};

    dotenvy::dotenv().ok();
    aura_quotes::telemetry::init_tracing();

    let args = Args::parse();
    let config = Config::from_env()?;
    config.print_config();

    let database = Arc::new(QuoteDatabase::new(Path::new(&config.database_path))?);
    seed::seed_quotes(&database)?;

    let addr = config.api_addr();
    let agent = Arc::new(QuoteAgent::new(config, database));

    if args.bootstrap {
        agent.bootstrap().await?;
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, build_router(agent)).await?;
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    println!("CLI feature not enabled. Enable with --features cli");
}
