use clap::Parser;

mod commands;
mod config;

#[derive(Parser, Clone, Debug)]
#[clap(name = "kagami", version, about)]
struct KagamiArgs {
    #[clap(flatten)]
    options: commands::GlobalOptions,

    #[clap(subcommand)]
    command: commands::KagamiCommand,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .try_from_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = KagamiArgs::parse();
    let settings = args.options.resolve()?;
    args.command.run(settings).await
}
