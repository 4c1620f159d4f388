// ============================================================
// Layer 3 — Chess Board Domain Type
// ============================================================
// A minimal board: piece placement plus the FEN state fields.
// There is no move generation here; the board only exists so a
// position can be rendered as text for the language model.
//
// FEN layout (six space-separated fields):
//   rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
//   └──────── piece placement ───────────────┘ │ │    │ │ └ fullmove
//                                              │ │    │ └ halfmove clock
//                                              │ │    └ en passant
//                                              │ └ castling rights
//                                              └ side to move

use std::fmt;

use crate::error::{PipelineError, Result};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind:  PieceKind,
    pub color: Color,
}

impl Piece {
    fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Self { kind, color })
    }

    fn fen_char(self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

/// `squares[0]` is rank 8, `squares[7]` is rank 1; files run a → h.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares:         [[Option<Piece>; 8]; 8],
    side_to_move:    Color,
    castling:        String,
    en_passant:      Option<String>,
    halfmove_clock:  u32,
    fullmove_number: u32,
}

impl Board {
    pub fn starting_position() -> Self {
        // The constant is well-formed, so this cannot fail.
        Self::from_fen(STARTING_FEN).unwrap_or_else(|_| unreachable!())
    }

    /// Parse a FEN string. Only the placement field is mandatory; missing
    /// trailing fields take their starting-position values.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let invalid = |msg: String| PipelineError::InvalidFen(format!("'{fen}': {msg}"));

        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or_else(|| invalid("empty".into()))?;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid(format!("expected 8 ranks, found {}", ranks.len())));
        }

        let mut squares = [[None; 8]; 8];
        for (r, rank) in ranks.iter().enumerate() {
            let mut file = 0usize;
            for c in rank.chars() {
                if let Some(n) = c.to_digit(10) {
                    file += n as usize;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| invalid(format!("unknown piece '{c}'")))?;
                    if file >= 8 {
                        return Err(invalid(format!("rank {} overflows", 8 - r)));
                    }
                    squares[r][file] = Some(piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(invalid(format!("rank {} has {} files", 8 - r, file)));
            }
        }

        let side_to_move = match fields.next().unwrap_or("w") {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(format!("side to move '{other}'"))),
        };
        let castling   = fields.next().unwrap_or("-").to_string();
        let en_passant = match fields.next().unwrap_or("-") {
            "-" => None,
            sq => Some(sq.to_string()),
        };
        let halfmove_clock = fields.next().unwrap_or("0").parse()
            .map_err(|_| invalid("halfmove clock".into()))?;
        let fullmove_number = fields.next().unwrap_or("1").parse()
            .map_err(|_| invalid("fullmove number".into()))?;

        Ok(Self { squares, side_to_move, castling, en_passant, halfmove_clock, fullmove_number })
    }

    /// Render the piece-placement field of the FEN.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(64);
        for (r, rank) in self.squares.iter().enumerate() {
            let mut empty = 0;
            for sq in rank {
                match sq {
                    Some(p) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(p.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if r < 7 {
                out.push('/');
            }
        }
        out
    }

    pub fn fen(&self) -> String {
        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        format!(
            "{} {} {} {} {} {}",
            self.placement(),
            side,
            self.castling,
            self.en_passant.as_deref().unwrap_or("-"),
            self.halfmove_clock,
            self.fullmove_number,
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

/// The text a board contributes to a training sequence: the first
/// space-delimited field of its FEN.
pub fn board_to_sequence(board: &Board) -> String {
    board.fen().split(' ').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_sequence() {
        let board = Board::starting_position();
        assert_eq!(board_to_sequence(&board), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
    }

    #[test]
    fn test_fen_round_trips_state_fields() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.fen(), fen);
        assert_eq!(board_to_sequence(&board), "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR");
    }

    #[test]
    fn test_placement_only_fen_is_accepted() {
        let board = Board::from_fen("8/8/8/8/8/8/8/4K2k").unwrap();
        assert_eq!(board.fen(), "8/8/8/8/8/8/8/4K2k w - - 0 1");
    }

    #[test]
    fn test_malformed_fen_is_rejected() {
        assert!(Board::from_fen("8/8/8").is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8").is_err());
        assert!(Board::from_fen("x7/8/8/8/8/8/8/8").is_err());
    }
}
