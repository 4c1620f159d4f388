// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `train`, `probe` and `prepare`.
// Training hyper-parameters live in the config file, so the
// train and probe commands only take its path.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::prepare_use_case::PrepareUseCase;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune a pretrained model on chess games
    Train(TrainArgs),

    /// Run one batch through the model and report shapes and loss
    Probe(ProbeArgs),

    /// Sample games from a PGN file into a text dataset
    Prepare(PrepareArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the key/value config file
    #[arg(long, default_value = "dtchess/config.yaml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Path to the key/value config file
    #[arg(long, default_value = "dtchess/config.yaml")]
    pub config: PathBuf,

    /// Restore the latest checkpoint from ckpt_path before probing
    #[arg(long)]
    pub from_checkpoint: bool,
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// PGN file to read games from
    #[arg(long = "input_filepath")]
    pub input_filepath: PathBuf,

    /// Upper bound on the number of games written
    #[arg(long = "num_random_games", default_value_t = 10_000)]
    pub num_random_games: usize,

    /// Directory the text dataset is written to
    #[arg(long, default_value = "data")]
    pub output: PathBuf,

    /// Prefix each game with its starting piece placement
    #[arg(long = "with_start_position")]
    pub with_start_position: bool,
}

/// The application layer never sees clap types.
impl From<PrepareArgs> for PrepareUseCase {
    fn from(a: PrepareArgs) -> Self {
        PrepareUseCase {
            input:               a.input_filepath,
            num_random_games:    a.num_random_games,
            output:              a.output,
            with_start_position: a.with_start_position,
        }
    }
}
