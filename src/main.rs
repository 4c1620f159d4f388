use anyhow::Result;
use chess_lm_finetune::cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chess_lm_finetune=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
