// ============================================================
// Layer 4 — PGN Reader
// ============================================================
// Splits a Portable Game Notation file into Games.
//
// A PGN file is a sequence of games, each made of:
//   [Event "Casual"]          ← tag pairs, one per line
//   [Result "1-0"]
//                             ← blank line
//   1. e4 {best by test} e5   ← movetext, possibly wrapped
//   2. Nf3 (2. f4) Nc6 1-0      over several lines
//
// The movetext is normalised for training:
//   - {brace comments} and ; line comments are dropped
//   - (recursive variations) are dropped
//   - $NAG annotations are dropped
//   - whitespace is collapsed to single spaces
//
// PgnReader is an iterator, so very large PGN dumps are read
// one game at a time.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::Path,
};

use crate::domain::game::Game;
use crate::error::{PipelineError, Result};

pub struct PgnReader<R: BufRead> {
    lines:   Lines<R>,
    pending: Option<String>,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), pending: None }
    }

    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        match self.pending.take() {
            Some(line) => Some(Ok(line)),
            None => self.lines.next(),
        }
    }
}

impl PgnReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PipelineError::ResourceFetch(format!("cannot open PGN '{}': {e}", path.display()))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = Result<Game>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tags     = BTreeMap::new();
        let mut movetext = String::new();
        let mut in_moves = false;

        while let Some(line) = self.next_line() {
            let line = match line {
                Ok(l) => l,
                Err(e) => return Some(Err(e.into())),
            };
            let trimmed = line.trim();

            if trimmed.starts_with('[') {
                if in_moves {
                    // Start of the next game; hand the line back.
                    self.pending = Some(line);
                    break;
                }
                if let Some((name, value)) = parse_tag(trimmed) {
                    tags.insert(name, value);
                }
            } else if !trimmed.is_empty() {
                in_moves = true;
                movetext.push_str(trimmed);
                movetext.push('\n');
            }
        }

        if tags.is_empty() && movetext.is_empty() {
            return None;
        }
        Some(Ok(Game::new(tags, clean_movetext(&movetext))))
    }
}

/// `[White "Carlsen, M."]` → ("White", "Carlsen, M.")
fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (name, rest) = inner.split_once(char::is_whitespace)?;
    let value = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((name.to_string(), value.replace("\\\"", "\"")))
}

fn clean_movetext(raw: &str) -> String {
    let mut out          = String::with_capacity(raw.len());
    let mut brace        = false;
    let mut line_comment = false;
    let mut depth        = 0usize;

    for c in raw.chars() {
        if line_comment {
            if c == '\n' {
                line_comment = false;
                out.push(' ');
            }
            continue;
        }
        if brace {
            if c == '}' {
                brace = false;
            }
            continue;
        }
        match c {
            '{' => brace = true,
            ';' => line_comment = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c => out.push(c),
        }
    }

    out.split_whitespace()
        .filter(|tok| !tok.starts_with('$'))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_GAMES: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 {the king's pawn} e5 2. Nf3 (2. f4 exf4) Nc6 $1
3. Bb5 a6 1-0

[Event "Blitz"]
[Result "0-1"]

1. d4 ; queen's pawn
Nf6 0-1
"#;

    #[test]
    fn test_splits_games_and_reads_tags() {
        let games: Vec<Game> = PgnReader::new(Cursor::new(TWO_GAMES)).collect::<Result<_>>().unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tag("White"), Some("Alice"));
        assert_eq!(games[0].result(), "1-0");
        assert_eq!(games[1].tag("Event"), Some("Blitz"));
    }

    #[test]
    fn test_movetext_is_cleaned() {
        let games: Vec<Game> = PgnReader::new(Cursor::new(TWO_GAMES)).collect::<Result<_>>().unwrap();
        assert_eq!(games[0].movetext, "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0");
        assert_eq!(games[1].movetext, "1. d4 Nf6 0-1");
    }

    #[test]
    fn test_empty_input_has_no_games() {
        assert_eq!(PgnReader::new(Cursor::new("")).count(), 0);
        assert_eq!(PgnReader::new(Cursor::new("\n\n")).count(), 0);
    }

    #[test]
    fn test_movetext_without_tags_is_a_game() {
        let games: Vec<Game> = PgnReader::new(Cursor::new("1. e4 e5 *\n")).collect::<Result<_>>().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].movetext, "1. e4 e5 *");
        assert_eq!(games[0].result(), "*");
    }
}
