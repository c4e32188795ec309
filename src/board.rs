use shakmaty::fen::Fen;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, FromSetup, Move, MoveList, Piece, Position,
    PositionError, Role, Square,
};
use std::fmt;

use crate::error::CommandError;
use crate::notation::MoveRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate(Color), // Color is the winner
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        *self != GameStatus::Ongoing
    }

    pub fn result(&self) -> &'static str {
        match self {
            GameStatus::Ongoing => "*",
            GameStatus::Checkmate(Color::White) => "1-0",
            GameStatus::Checkmate(Color::Black) => "0-1",
            _ => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GameStatus::Ongoing => write!(f, "game in progress"),
            GameStatus::Checkmate(winner) => write!(
                f,
                "checkmate, {} is mated and {} wins",
                color_name(!*winner),
                color_name(*winner)
            ),
            GameStatus::Stalemate => write!(f, "stalemate"),
            GameStatus::InsufficientMaterial => write!(f, "draw by insufficient material"),
            GameStatus::SeventyFiveMoveRule => write!(f, "draw by the 75-move rule"),
            GameStatus::FivefoldRepetition => write!(f, "draw by fivefold repetition"),
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// The authoritative game state: the current position plus every earlier
/// position, so any applied move can be taken back.
#[derive(Debug, Clone)]
pub struct Board {
    position: Chess,
    history: Vec<(Chess, String)>, // position before the move, move as played
}

impl Board {
    pub fn new() -> Self {
        Self {
            position: Chess::default(),
            history: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, CommandError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| CommandError::InvalidFen(format!("{fen}: {e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| CommandError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self {
            position,
            history: Vec::new(),
        })
    }

    pub fn legal_moves(&self) -> MoveList {
        self.position.legal_moves()
    }

    /// Resolves a requested move against the current position. Returns
    /// `None` unless the move is fully legal.
    pub fn legal_move(&self, request: &MoveRequest) -> Option<Move> {
        request.to_uci().to_move(&self.position).ok()
    }

    pub fn push(&mut self, mv: &Move) {
        let played = mv.to_uci(CastlingMode::Standard).to_string();
        self.history.push((self.position.clone(), played));
        self.position.play_unchecked(mv);
    }

    pub fn pop(&mut self) -> Option<String> {
        let (previous, played) = self.history.pop()?;
        self.position = previous;
        Some(played)
    }

    pub fn reset(&mut self) {
        self.position = Chess::default();
        self.history.clear();
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    pub fn moves(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|(_, played)| played.as_str())
    }

    pub fn last_move(&self) -> Option<&str> {
        self.history.last().map(|(_, played)| played.as_str())
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_over()
    }

    pub fn result(&self) -> &'static str {
        self.status().result()
    }

    pub fn status(&self) -> GameStatus {
        let position = &self.position;

        if position.is_checkmate() {
            return GameStatus::Checkmate(!position.turn());
        }
        if position.is_stalemate() {
            return GameStatus::Stalemate;
        }
        if position.is_insufficient_material() {
            return GameStatus::InsufficientMaterial;
        }
        if position.halfmoves() >= 150 {
            return GameStatus::SeventyFiveMoveRule;
        }
        if self.repetitions() >= 5 {
            return GameStatus::FivefoldRepetition;
        }

        GameStatus::Ongoing
    }

    // Current position included
    fn repetitions(&self) -> usize {
        let current = &self.position;
        1 + self
            .history
            .iter()
            .filter(|(past, _)| same_position(past, current))
            .count()
    }

    /// Moves a piece without consulting the rules. Only pieces of the side
    /// not to move may be placed, and the side to move is left as it was.
    pub fn place(&mut self, request: &MoveRequest) -> Result<(), CommandError> {
        let reject = |reason: String| CommandError::EditRejected {
            notation: request.to_string(),
            reason,
        };

        let turn = self.position.turn();
        let piece = self
            .piece_at(request.from)
            .ok_or_else(|| reject(format!("no piece on {}", request.from)))?;
        if piece.color == turn {
            return Err(reject(format!("{} is to move", color_name(turn))));
        }

        let placed = match request.promotion {
            Some(role) => Piece {
                color: piece.color,
                role,
            },
            None => piece,
        };

        let mut setup = self.position.clone().into_setup(EnPassantMode::Legal);
        setup.board.remove_piece_at(request.from);
        setup.board.remove_piece_at(request.to);
        setup.board.set_piece_at(request.to, placed);
        setup.ep_square = None;

        let position = Chess::from_setup(setup, CastlingMode::Standard)
            .or_else(PositionError::ignore_invalid_castling_rights)
            .or_else(PositionError::ignore_invalid_ep_square)
            .or_else(PositionError::ignore_too_much_material)
            .or_else(PositionError::ignore_impossible_check)
            .map_err(|e| reject(e.to_string()))?;

        let previous = std::mem::replace(&mut self.position, position);
        self.history.push((previous, request.to_string()));
        Ok(())
    }
}

/// Positions repeat when placement, side to move, castling rights and the
/// capturable en passant square all match.
fn same_position(a: &Chess, b: &Chess) -> bool {
    a.turn() == b.turn()
        && a.board() == b.board()
        && a.castles().castling_rights() == b.castles().castling_rights()
        && a.ep_square(EnPassantMode::Legal) == b.ep_square(EnPassantMode::Legal)
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for rank in (0..8u32).rev() {
            for file in 0..8u32 {
                let square = Square::new(rank * 8 + file);
                let piece_char = match self.piece_at(square) {
                    Some(piece) => {
                        let c = match piece.role {
                            Role::Pawn => 'p',
                            Role::Knight => 'n',
                            Role::Bishop => 'b',
                            Role::Rook => 'r',
                            Role::Queen => 'q',
                            Role::King => 'k',
                        };
                        if piece.color == Color::White {
                            c.to_ascii_uppercase()
                        } else {
                            c
                        }
                    }
                    None => '.',
                };
                result.push(piece_char);

                if file < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}
