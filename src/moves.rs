use std::fmt;
use std::hash::{Hash, Hasher};

use crate::board::{Board, Piece, PieceKind, Square};

/// A single ply. Two moves are equal when their start and end squares are.
#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub start: Square,
    pub end: Square,
    pub piece_moved: Piece,
    pub piece_captured: Option<Piece>,
    pub is_en_passant: bool,
    pub is_castle: bool,
    pub is_promotion: bool,
}

impl Move {
    /// Builds a plain move or capture, reading the pieces off `board`.
    ///
    /// Returns `None` when `start` is empty.
    pub fn new(start: Square, end: Square, board: &Board) -> Option<Self> {
        let piece_moved = board.get(start)?;
        let is_promotion =
            piece_moved.kind == PieceKind::Pawn && end.row() == piece_moved.color.promotion_row();
        Some(Self {
            start,
            end,
            piece_moved,
            piece_captured: board.get(end),
            is_en_passant: false,
            is_castle: false,
            is_promotion,
        })
    }

    pub fn new_en_passant(start: Square, end: Square, pawn: Piece) -> Self {
        Self {
            start,
            end,
            piece_moved: pawn,
            piece_captured: Some(Piece::new(pawn.color.opposite(), PieceKind::Pawn)),
            is_en_passant: true,
            is_castle: false,
            is_promotion: false,
        }
    }

    pub fn new_castling(start: Square, end: Square, king: Piece) -> Self {
        Self {
            start,
            end,
            piece_moved: king,
            piece_captured: None,
            is_en_passant: false,
            is_castle: true,
            is_promotion: false,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.piece_captured.is_some()
    }

    pub fn is_kingside_castle(&self) -> bool {
        self.is_castle && self.end.col() > self.start.col()
    }

    /// Square of the pawn removed by an en-passant capture: the square the
    /// captured pawn stands on, beside the capturer, not the arrival square.
    pub fn en_passant_victim(&self) -> Square {
        Square::new(self.start.row(), self.end.col())
    }

    /// Start and end of the rook's hop for a castling move.
    pub fn castling_rook_squares(&self) -> (Square, Square) {
        let row = self.start.row();
        if self.is_kingside_castle() {
            (Square::new(row, 7), Square::new(row, self.end.col() - 1))
        } else {
            (Square::new(row, 0), Square::new(row, self.end.col() + 1))
        }
    }

    /// Coordinate form such as `e2e4`.
    pub fn coordinate_notation(&self) -> String {
        format!("{}{}", self.start, self.end)
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

/// Standard algebraic notation, without check or mate suffixes.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_castle {
            return if self.is_kingside_castle() {
                write!(f, "O-O")
            } else {
                write!(f, "O-O-O")
            };
        }

        match self.piece_moved.kind {
            PieceKind::Pawn => {
                if self.is_capture() {
                    write!(f, "{}", self.start.file_char())?;
                }
            }
            kind => write!(f, "{}", kind.letter())?,
        }
        if self.is_capture() {
            write!(f, "x")?;
        }
        write!(f, "{}", self.end)?;
        if self.is_promotion {
            write!(f, "=Q")?;
        }
        Ok(())
    }
}
