use shakmaty::uci::UciMove;
use shakmaty::{Role, Square};
use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// A move as the user typed or clicked it: origin, destination and an
/// optional promotion piece. Whether it is legal is decided by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, role: Role) -> Self {
        self.promotion = Some(role);
        self
    }

    pub fn to_uci(&self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = match chars.next()? {
        c @ 'a'..='h' => c as u32 - 'a' as u32,
        _ => return None,
    };
    let rank = match chars.next()? {
        c @ '1'..='8' => c as u32 - '1' as u32,
        _ => return None,
    };
    Some(Square::new(rank * 8 + file))
}

fn promotion_role(c: u8) -> Option<Role> {
    match c.to_ascii_lowercase() {
        b'q' => Some(Role::Queen),
        b'r' => Some(Role::Rook),
        b'b' => Some(Role::Bishop),
        b'n' => Some(Role::Knight),
        _ => None,
    }
}

impl FromStr for MoveRequest {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CommandError::InvalidNotation(s.to_string());

        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(invalid());
        }

        let from = parse_square(&s[0..2]).ok_or_else(invalid)?;
        let to = parse_square(&s[2..4]).ok_or_else(invalid)?;
        if from == to {
            return Err(invalid());
        }

        let mut request = MoveRequest::new(from, to);
        if let Some(&c) = s.as_bytes().get(4) {
            request = request.with_promotion(promotion_role(c).ok_or_else(invalid)?);
        }
        Ok(request)
    }
}

impl fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            let c = match role {
                Role::Queen => 'q',
                Role::Rook => 'r',
                Role::Bishop => 'b',
                Role::Knight => 'n',
                _ => '?',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
