use clap::Parser;
use portfolio_cli::PortfolioCli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = PortfolioCli::parse();
    let mut stdout = std::io::stdout().lock();
    portfolio_cli::run(cli, &|key: &str| std::env::var(key).ok(), &mut stdout).await
}
