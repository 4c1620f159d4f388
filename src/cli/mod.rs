// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case in Layer 2. Results are printed here and nowhere else.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PrepareArgs, ProbeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "chess-lm-finetune",
    version,
    about = "Fine-tune a pretrained causal language model on chess games."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Probe(args)   => run_probe(args),
            Commands::Prepare(args) => run_prepare(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let summary = TrainUseCase::new(args.config).execute()?;
    match summary.last_loss {
        Some(loss) => println!(
            "Training complete: {} steps over {} epoch(s), last loss {:.4}",
            summary.steps, summary.epochs, loss
        ),
        None => println!("Training complete: the dataset produced no batches"),
    }
    Ok(())
}

fn run_probe(args: ProbeArgs) -> Result<()> {
    use crate::application::probe_use_case::ProbeUseCase;

    let report = ProbeUseCase::new(args.config, args.from_checkpoint).execute()?;
    println!(
        "Logits {:?}  loss {:.4}  forward {:.3}s",
        report.logits_shape, report.loss, report.elapsed_secs
    );
    Ok(())
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    let summary = PrepareUseCase::from(args).execute()?;
    println!(
        "Wrote {} of {} games to {}",
        summary.games_written,
        summary.games_read,
        summary.output.display()
    );
    Ok(())
}
