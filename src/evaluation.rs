use crate::board::{Color, Piece, PieceKind, Square};
use crate::state::GameState;

/// Score of a mated position, in centipawns.
pub const CHECKMATE: i32 = 100_000;
pub const STALEMATE: i32 = 0;

/// Static evaluation in centipawns. Positive scores favor White.
#[derive(Debug, Clone)]
pub struct Evaluator {
    // Piece values
    pub pawn_value: i32,
    pub knight_value: i32,
    pub bishop_value: i32,
    pub rook_value: i32,
    pub queen_value: i32,
    pub king_value: i32,

    // Positional bonuses from White's side, row 0 being rank 8.
    // Black reads the same tables upside down.
    pub pawn_position_bonus: [[i32; 8]; 8],
    pub knight_position_bonus: [[i32; 8]; 8],
    pub bishop_position_bonus: [[i32; 8]; 8],
    pub rook_position_bonus: [[i32; 8]; 8],
    pub queen_position_bonus: [[i32; 8]; 8],
    pub king_position_bonus: [[i32; 8]; 8],
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            pawn_value: 100,
            knight_value: 300,
            bishop_value: 325,
            rook_value: 500,
            queen_value: 900,
            king_value: 0,

            // Pawns never stand on the last rank, they promote on arrival.
            pawn_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [50, 50, 50, 50, 50, 50, 50, 50],
                [10, 10, 20, 30, 30, 20, 10, 10],
                [5, 5, 10, 25, 25, 10, 5, 5],
                [0, 0, 0, 20, 20, 0, 0, 0],
                [5, -5, -10, 0, 0, -10, -5, 5],
                [5, 10, 10, -20, -20, 10, 10, 5],
                [0, 0, 0, 0, 0, 0, 0, 0],
            ],

            // Knights belong in the center, away from the rim.
            knight_position_bonus: [
                [-50, -40, -30, -30, -30, -30, -40, -50],
                [-40, -20, 0, 0, 0, 0, -20, -40],
                [-30, 0, 10, 15, 15, 10, 0, -30],
                [-30, 5, 15, 20, 20, 15, 5, -30],
                [-30, 0, 15, 20, 20, 15, 0, -30],
                [-30, 5, 10, 15, 15, 10, 5, -30],
                [-40, -20, 0, 5, 5, 0, -20, -40],
                [-50, -40, -30, -30, -30, -30, -40, -50],
            ],

            // Favors long central diagonals over corners.
            bishop_position_bonus: [
                [-20, -10, -10, -10, -10, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 10, 10, 5, 0, -10],
                [-10, 5, 5, 10, 10, 5, 5, -10],
                [-10, 0, 10, 10, 10, 10, 0, -10],
                [-10, 10, 10, 10, 10, 10, 10, -10],
                [-10, 5, 0, 0, 0, 0, 5, -10],
                [-20, -10, -10, -10, -10, -10, -10, -20],
            ],

            // Rewards the seventh rank and central files on the back rank.
            rook_position_bonus: [
                [0, 0, 0, 0, 0, 0, 0, 0],
                [5, 10, 10, 10, 10, 10, 10, 5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [-5, 0, 0, 0, 0, 0, 0, -5],
                [0, 0, 0, 5, 5, 0, 0, 0],
            ],

            // Mild pull toward the center.
            queen_position_bonus: [
                [-20, -10, -10, -5, -5, -10, -10, -20],
                [-10, 0, 0, 0, 0, 0, 0, -10],
                [-10, 0, 5, 5, 5, 5, 0, -10],
                [-5, 0, 5, 5, 5, 5, 0, -5],
                [0, 0, 5, 5, 5, 5, 0, -5],
                [-10, 5, 5, 5, 5, 5, 0, -10],
                [-10, 0, 5, 0, 0, 0, 0, -10],
                [-20, -10, -10, -5, -5, -10, -10, -20],
            ],

            // Keeps the king tucked behind its pawns.
            king_position_bonus: [
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-30, -40, -40, -50, -50, -40, -40, -30],
                [-20, -30, -30, -40, -40, -30, -30, -20],
                [-10, -20, -20, -20, -20, -20, -20, -10],
                [20, 20, 0, 0, 0, 0, 20, 20],
                [20, 30, 10, 0, 0, 10, 30, 20],
            ],
        }
    }

    /// Scores `state` from White's point of view.
    ///
    /// Reads the terminal flags left by the last legality query, so callers
    /// should run `GameState::valid_moves` on the position first.
    pub fn evaluate(&self, state: &GameState) -> i32 {
        if state.checkmate {
            return match state.side_to_move {
                Color::White => -CHECKMATE,
                Color::Black => CHECKMATE,
            };
        }
        if state.stalemate {
            return STALEMATE;
        }

        let mut score = 0;
        for (square, piece) in state.board.pieces() {
            let value = self.piece_value(piece, square);
            match piece.color {
                Color::White => score += value,
                Color::Black => score -= value,
            }
        }
        score
    }

    /// Material plus positional bonus for `piece` standing on `square`.
    pub fn piece_value(&self, piece: Piece, square: Square) -> i32 {
        let material = match piece.kind {
            PieceKind::Pawn => self.pawn_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::King => self.king_value,
        };

        let table = match piece.kind {
            PieceKind::Pawn => &self.pawn_position_bonus,
            PieceKind::Knight => &self.knight_position_bonus,
            PieceKind::Bishop => &self.bishop_position_bonus,
            PieceKind::Rook => &self.rook_position_bonus,
            PieceKind::Queen => &self.queen_position_bonus,
            PieceKind::King => &self.king_position_bonus,
        };
        let row = match piece.color {
            Color::White => square.row(),
            Color::Black => 7 - square.row(),
        };

        material + table[row as usize][square.col() as usize]
    }
}
