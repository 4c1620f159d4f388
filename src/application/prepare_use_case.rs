// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Turns a PGN dump into a line-per-game text dataset:
//
//   Step 1: Stream the games of the PGN file   (Layer 4 - data)
//   Step 2: Reservoir-sample at most N of them
//   Step 3: Write one movetext line per game   → {output}/{stem}.txt
//
// Only the sampled games are held in memory, however large the
// dump is. Games keep their order from the source file. With
// `with_start_position` each line is prefixed with the piece
// placement the game starts from.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use rand::{seq::IteratorRandom, Rng};

use crate::data::pgn::PgnReader;
use crate::domain::{board::board_to_sequence, game::Game};
use crate::util::extract_filename;

pub struct PrepareUseCase {
    pub input:               PathBuf,
    pub num_random_games:    usize,
    pub output:              PathBuf,
    pub with_start_position: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    pub games_read:    usize,
    pub games_written: usize,
    pub output:        PathBuf,
}

impl PrepareUseCase {
    pub fn execute(&self) -> Result<PrepareSummary> {
        self.execute_with(&mut rand::thread_rng())
    }

    pub fn execute_with<R: Rng>(&self, rng: &mut R) -> Result<PrepareSummary> {
        let reader = PgnReader::open(&self.input)
            .with_context(|| format!("Cannot open PGN file '{}'", self.input.display()))?;
        let (picked, games_read) = sample_games(reader, self.num_random_games, rng)
            .with_context(|| format!("Cannot read PGN file '{}'", self.input.display()))?;
        tracing::info!("Read {} games from '{}'", games_read, self.input.display());

        fs::create_dir_all(&self.output)
            .with_context(|| format!("Cannot create output dir '{}'", self.output.display()))?;
        let stem = extract_filename(&self.input.to_string_lossy());
        let path = self.output.join(format!("{stem}.txt"));
        let mut out = BufWriter::new(
            File::create(&path).with_context(|| format!("Cannot create '{}'", path.display()))?,
        );

        let mut written = 0;
        for game in &picked {
            if game.movetext.is_empty() {
                continue;
            }
            writeln!(out, "{}", self.line_for(game)?)?;
            written += 1;
        }
        out.flush()?;

        tracing::info!("Wrote {} games to '{}'", written, path.display());
        Ok(PrepareSummary { games_read, games_written: written, output: path })
    }

    fn line_for(&self, game: &Game) -> Result<String> {
        if !self.with_start_position {
            return Ok(game.movetext.clone());
        }
        let board = game
            .start_board()
            .with_context(|| format!("Bad FEN tag in game '{}'", game.tag("Event").unwrap_or("?")))?;
        Ok(format!("{} {}", board_to_sequence(&board), game.movetext))
    }
}

/// At most `n` games chosen uniformly without replacement in one pass,
/// returned in file order, plus the number of games seen. Stops at the
/// first read error.
fn sample_games<I, R>(games: I, n: usize, rng: &mut R) -> crate::error::Result<(Vec<Game>, usize)>
where
    I: Iterator<Item = crate::error::Result<Game>>,
    R: Rng,
{
    let mut error = None;
    let mut seen = 0usize;
    let mut picked: Vec<(usize, Game)> = games
        .enumerate()
        .map_while(|(i, game)| match game {
            Ok(game) => {
                seen += 1;
                Some((i, game))
            }
            Err(e) => {
                error = Some(e);
                None
            }
        })
        .choose_multiple(rng, n);

    if let Some(e) = error {
        return Err(e);
    }
    picked.sort_unstable_by_key(|(i, _)| *i);
    Ok((picked.into_iter().map(|(_, game)| game).collect(), seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const PGN: &str = r#"[Event "A"]
[Result "1-0"]

1. e4 e5 2. Nf3 {main line} Nc6 1-0

[Event "B"]
[FEN "8/8/8/4k3/8/8/8/4K3 w - - 0 1"]

1. Kd2 Kd5 1/2-1/2

[Event "C"]

1. d4 d5 0-1
"#;

    fn use_case(dir: &std::path::Path, n: usize, with_start_position: bool) -> PrepareUseCase {
        let input = dir.join("games.pgn");
        fs::write(&input, PGN).unwrap();
        PrepareUseCase { input, num_random_games: n, output: dir.join("data"), with_start_position }
    }

    #[test]
    fn test_writes_every_game_when_n_is_large() {
        let dir = tempfile::tempdir().unwrap();
        let summary = use_case(dir.path(), 10_000, false).execute().unwrap();
        assert_eq!(summary.games_read, 3);
        assert_eq!(summary.games_written, 3);
        assert_eq!(summary.output, dir.path().join("data").join("games.txt"));

        let text = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(text.lines().next().unwrap(), "1. e4 e5 2. Nf3 Nc6 1-0");
    }

    #[test]
    fn test_samples_without_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let summary = use_case(dir.path(), 2, false).execute_with(&mut rng).unwrap();
        assert_eq!(summary.games_written, 2);

        let text = fs::read_to_string(&summary.output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_ne!(lines[0], lines[1]);
    }

    #[test]
    fn test_start_position_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let summary = use_case(dir.path(), 10, true).execute().unwrap();
        let text = fs::read_to_string(&summary.output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR 1. e4"));
        assert!(lines[1].starts_with("8/8/8/4k3/8/8/8/4K3 1. Kd2"));
    }

    #[test]
    fn test_sampling_is_single_pass_and_keeps_file_order() {
        let games = (0..1000).map(|i| Ok(Game::new(Default::default(), format!("{i}. e4"))));
        let mut rng = StdRng::seed_from_u64(11);
        let (picked, seen) = sample_games(games, 5, &mut rng).unwrap();

        assert_eq!(seen, 1000);
        assert_eq!(picked.len(), 5);
        let order: Vec<usize> = picked
            .iter()
            .map(|g| g.movetext.split('.').next().unwrap().parse().unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sampling_stops_at_read_error() {
        let games = vec![
            Ok(Game::new(Default::default(), "1. e4")),
            Err(crate::error::PipelineError::ResourceFetch("truncated".into())),
            Ok(Game::new(Default::default(), "1. d4")),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sample_games(games.into_iter(), 10, &mut rng).is_err());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let uc = PrepareUseCase {
            input: dir.path().join("nope.pgn"),
            num_random_games: 1,
            output: dir.path().join("out"),
            with_start_position: false,
        };
        assert!(uc.execute().is_err());
    }
}
