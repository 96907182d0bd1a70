use anyhow::Result;
use brief_server::cli::{self, Cli, Commands};
use brief_server::config::BriefConfig;
use brief_server::serve;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `generate` and `list` output can be piped.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = BriefConfig::load(&cli.config)?;
    config.apply_overrides(&cli);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  - {}", e);
        }
        anyhow::bail!("invalid configuration in {}", cli.config.display());
    }

    match cli.command {
        Commands::Serve(args) => {
            if let Some(addr) = args.http_addr {
                config.server.http_addr = addr;
            }
            serve::run(config).await
        }
        Commands::Generate(args) => cli::generate::run(args, &config).await,
        Commands::Validate(args) => cli::validate::run(args),
        Commands::Status => cli::status::run(&config),
        Commands::List(args) => cli::list::run(args, &config),
    }
}
