//! Check, pin and attack detection.
//!
//! Rays are cast outward from a target square. Directions are stored as the
//! step from the target (usually the king) toward the piece found on the ray.

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::state::GameState;

pub type Direction = (i8, i8);

pub const ORTHOGONALS: [Direction; 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];
pub const DIAGONALS: [Direction; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub const KNIGHT_OFFSETS: [Direction; 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];
pub const KING_OFFSETS: [Direction; 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

/// A friendly piece that may only move along `direction` or its reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub square: Square,
    pub direction: Direction,
}

/// An enemy piece giving check, and the direction from the king to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Check {
    pub square: Square,
    pub direction: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckAnalysis {
    pub in_check: bool,
    pub pins: Vec<Pin>,
    pub checks: Vec<Check>,
}

impl CheckAnalysis {
    pub fn pin_direction(&self, square: Square) -> Option<Direction> {
        self.pins
            .iter()
            .find(|pin| pin.square == square)
            .map(|pin| pin.direction)
    }
}

/// Whether `piece`, found `distance` steps from a target along `direction`,
/// attacks that target.
fn attacks_along(piece: Piece, direction: Direction, distance: u8) -> bool {
    let orthogonal = direction.0 == 0 || direction.1 == 0;
    match piece.kind {
        PieceKind::Rook => orthogonal,
        PieceKind::Bishop => !orthogonal,
        PieceKind::Queen => true,
        PieceKind::King => distance == 1,
        // A pawn captures toward its forward row, so it sits one row behind
        // the squares it attacks.
        PieceKind::Pawn => {
            distance == 1 && !orthogonal && direction.0 == -piece.color.forward()
        }
        PieceKind::Knight => false,
    }
}

/// Finds checks against, and pins on, the side to move's king.
pub fn analyze(state: &GameState) -> CheckAnalysis {
    let ally = state.side_to_move;
    let king = state.king_location(ally);
    let mut analysis = CheckAnalysis::default();

    for &direction in ORTHOGONALS.iter().chain(DIAGONALS.iter()) {
        let mut possible_pin = None;
        let mut current = king;
        let mut distance = 0;
        while let Some(square) = current.offset(direction.0, direction.1) {
            current = square;
            distance += 1;
            let piece = match state.board.get(square) {
                Some(piece) => piece,
                None => continue,
            };
            if piece.color == ally {
                if possible_pin.is_some() {
                    // Two friendly pieces in a row: nothing on this ray.
                    break;
                }
                possible_pin = Some(square);
                continue;
            }
            if attacks_along(piece, direction, distance) {
                match possible_pin {
                    None => {
                        analysis.in_check = true;
                        analysis.checks.push(Check { square, direction });
                    }
                    Some(pinned) => analysis.pins.push(Pin {
                        square: pinned,
                        direction,
                    }),
                }
            }
            break;
        }
    }

    let enemy_knight = Piece::new(ally.opposite(), PieceKind::Knight);
    for &offset in KNIGHT_OFFSETS.iter() {
        if let Some(square) = king.offset(offset.0, offset.1) {
            if state.board.get(square) == Some(enemy_knight) {
                analysis.in_check = true;
                analysis.checks.push(Check {
                    square,
                    direction: offset,
                });
            }
        }
    }

    analysis
}

/// Whether any piece of color `by` attacks `square` on `board`.
///
/// Works for any square, occupied or not, without touching game state.
pub fn is_square_attacked(board: &Board, square: Square, by: Color) -> bool {
    for &direction in ORTHOGONALS.iter().chain(DIAGONALS.iter()) {
        let mut current = square;
        let mut distance = 0;
        while let Some(next) = current.offset(direction.0, direction.1) {
            current = next;
            distance += 1;
            if let Some(piece) = board.get(next) {
                if piece.color == by && attacks_along(piece, direction, distance) {
                    return true;
                }
                break;
            }
        }
    }

    let knight = Piece::new(by, PieceKind::Knight);
    KNIGHT_OFFSETS.iter().any(|&(dr, dc)| {
        square
            .offset(dr, dc)
            .map_or(false, |from| board.get(from) == Some(knight))
    })
}
