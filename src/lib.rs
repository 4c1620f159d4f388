//! Fine-tune a pretrained causal language model on chess games.
//!
//! The crate is split into six layers, outermost first:
//! `cli`, `application`, `domain`, `data`, `ml` and `infra`.
//! The `chess-lm-finetune` binary is a thin wrapper around [`cli::Cli`].

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
pub mod util;

#[cfg(test)]
mod test_support;
