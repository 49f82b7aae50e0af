use crate::attacks::{
    self, is_square_attacked, Check, CheckAnalysis, Direction, DIAGONALS, KING_OFFSETS,
    KNIGHT_OFFSETS, ORTHOGONALS,
};
use crate::board::{Piece, PieceKind, Square};
use crate::moves::Move;
use crate::state::GameState;

/// Result of a legality query. The flags describe the position the moves
/// were generated for.
#[derive(Debug, Clone, Default)]
pub struct LegalMoves {
    pub moves: Vec<Move>,
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

/// A pinned piece may only travel along the pin line, in either sense.
fn along_pin(pin: Option<Direction>, direction: Direction) -> bool {
    match pin {
        None => true,
        Some(pin) => pin == direction || pin == (-direction.0, -direction.1),
    }
}

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator
    }

    pub fn legal_moves(&self, state: &GameState) -> LegalMoves {
        let analysis = attacks::analyze(state);
        let king = state.king_location(state.side_to_move);

        let moves = match analysis.checks.as_slice() {
            [] => self.pseudo_moves(state, &analysis),
            [check] => {
                let targets = self.evasion_squares(state, king, check);
                let mut moves = self.pseudo_moves(state, &analysis);
                moves.retain(|mv| {
                    mv.piece_moved.kind == PieceKind::King
                        || targets.contains(&mv.end)
                        || (mv.is_en_passant && mv.en_passant_victim() == check.square)
                });
                moves
            }
            // Double check: only the king can answer.
            _ => {
                let mut moves = Vec::new();
                self.king_steps(state, king, &mut moves);
                moves
            }
        };

        let no_moves = moves.is_empty();
        LegalMoves {
            moves,
            in_check: analysis.in_check,
            checkmate: no_moves && analysis.in_check,
            stalemate: no_moves && !analysis.in_check,
        }
    }

    /// Squares a non-king piece can move to in order to answer `check`: the
    /// checker itself and, for sliders, every square between it and the king.
    fn evasion_squares(&self, state: &GameState, king: Square, check: &Check) -> Vec<Square> {
        let checker = state.board.get(check.square).map(|piece| piece.kind);
        if checker == Some(PieceKind::Knight) {
            return vec![check.square];
        }
        let mut squares = Vec::with_capacity(7);
        let mut current = king;
        while let Some(square) = current.offset(check.direction.0, check.direction.1) {
            squares.push(square);
            if square == check.square {
                break;
            }
            current = square;
        }
        squares
    }

    /// Moves for the side to move that respect pins. King moves are already
    /// safe; other moves may still leave a check unanswered.
    pub fn pseudo_moves(&self, state: &GameState, analysis: &CheckAnalysis) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for (square, piece) in state.board.pieces() {
            if piece.color != state.side_to_move {
                continue;
            }
            let pin = analysis.pin_direction(square);
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(state, square, piece, pin, &mut moves),
                PieceKind::Knight => self.knight_moves(state, square, piece, pin, &mut moves),
                PieceKind::Bishop => {
                    self.sliding_moves(state, square, piece, &DIAGONALS, pin, &mut moves)
                }
                PieceKind::Rook => {
                    self.sliding_moves(state, square, piece, &ORTHOGONALS, pin, &mut moves)
                }
                PieceKind::Queen => {
                    self.sliding_moves(state, square, piece, &ORTHOGONALS, pin, &mut moves);
                    self.sliding_moves(state, square, piece, &DIAGONALS, pin, &mut moves);
                }
                PieceKind::King => {
                    self.king_steps(state, square, &mut moves);
                    self.castling_moves(state, square, piece, &mut moves);
                }
            }
        }
        moves
    }

    fn pawn_moves(
        &self,
        state: &GameState,
        from: Square,
        pawn: Piece,
        pin: Option<Direction>,
        moves: &mut Vec<Move>,
    ) {
        let board = &state.board;
        let forward = pawn.color.forward();

        if let Some(one) = from.offset(forward, 0) {
            if board.is_empty(one) && along_pin(pin, (forward, 0)) {
                moves.extend(Move::new(from, one, board));
                if from.row() == pawn.color.pawn_start_row() {
                    if let Some(two) = from.offset(2 * forward, 0) {
                        if board.is_empty(two) {
                            moves.extend(Move::new(from, two, board));
                        }
                    }
                }
            }
        }

        for side in [-1, 1] {
            let target = match from.offset(forward, side) {
                Some(target) => target,
                None => continue,
            };
            if !along_pin(pin, (forward, side)) {
                continue;
            }
            match board.get(target) {
                Some(piece) if piece.color != pawn.color => {
                    moves.extend(Move::new(from, target, board));
                }
                None if state.en_passant == Some(target) => {
                    let mv = Move::new_en_passant(from, target, pawn);
                    if self.en_passant_is_safe(state, &mv) {
                        moves.push(mv);
                    }
                }
                _ => {}
            }
        }
    }

    /// Rejects en-passant captures that expose the king once both pawns have
    /// left their rank, which the pin scan cannot see.
    fn en_passant_is_safe(&self, state: &GameState, mv: &Move) -> bool {
        let color = mv.piece_moved.color;
        let victim = mv.en_passant_victim();
        if state.board.get(victim) != Some(Piece::new(color.opposite(), PieceKind::Pawn)) {
            return false;
        }
        let mut after = state.board;
        after.set(mv.start, None);
        after.set(victim, None);
        after.set(mv.end, Some(mv.piece_moved));
        !is_square_attacked(&after, state.king_location(color), color.opposite())
    }

    fn knight_moves(
        &self,
        state: &GameState,
        from: Square,
        knight: Piece,
        pin: Option<Direction>,
        moves: &mut Vec<Move>,
    ) {
        // A pinned knight can never stay on the pin line.
        if pin.is_some() {
            return;
        }
        for &(dr, dc) in KNIGHT_OFFSETS.iter() {
            if let Some(to) = from.offset(dr, dc) {
                if state.board.get(to).map_or(true, |p| p.color != knight.color) {
                    moves.extend(Move::new(from, to, &state.board));
                }
            }
        }
    }

    fn sliding_moves(
        &self,
        state: &GameState,
        from: Square,
        slider: Piece,
        directions: &[Direction],
        pin: Option<Direction>,
        moves: &mut Vec<Move>,
    ) {
        for &direction in directions {
            if !along_pin(pin, direction) {
                continue;
            }
            let mut current = from;
            while let Some(to) = current.offset(direction.0, direction.1) {
                current = to;
                match state.board.get(to) {
                    None => moves.extend(Move::new(from, to, &state.board)),
                    Some(piece) => {
                        if piece.color != slider.color {
                            moves.extend(Move::new(from, to, &state.board));
                        }
                        break;
                    }
                }
            }
        }
    }

    /// One-square king moves onto squares the enemy does not attack.
    fn king_steps(&self, state: &GameState, from: Square, moves: &mut Vec<Move>) {
        let color = state.side_to_move;
        // Lift the king so it cannot shield a square behind itself.
        let mut without_king = state.board;
        without_king.set(from, None);

        for &(dr, dc) in KING_OFFSETS.iter() {
            let to = match from.offset(dr, dc) {
                Some(to) => to,
                None => continue,
            };
            if state.board.get(to).map_or(false, |p| p.color == color) {
                continue;
            }
            if !is_square_attacked(&without_king, to, color.opposite()) {
                moves.extend(Move::new(from, to, &state.board));
            }
        }
    }

    fn castling_moves(&self, state: &GameState, from: Square, king: Piece, moves: &mut Vec<Move>) {
        let color = king.color;
        let row = color.back_row();
        if from != Square::new(row, 4) {
            return;
        }
        let board = &state.board;
        let rook = Some(Piece::new(color, PieceKind::Rook));
        let empty = |cols: &[u8]| cols.iter().all(|&col| board.is_empty(Square::new(row, col)));
        let safe = |cols: &[u8]| {
            cols.iter()
                .all(|&col| !is_square_attacked(board, Square::new(row, col), color.opposite()))
        };

        if state.castling_rights.kingside(color)
            && board.get(Square::new(row, 7)) == rook
            && empty(&[5, 6])
            && safe(&[4, 5, 6])
        {
            moves.push(Move::new_castling(from, Square::new(row, 6), king));
        }
        if state.castling_rights.queenside(color)
            && board.get(Square::new(row, 0)) == rook
            && empty(&[1, 2, 3])
            && safe(&[2, 3, 4])
        {
            moves.push(Move::new_castling(from, Square::new(row, 2), king));
        }
    }
}

/// Number of leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(state: &mut GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = state.valid_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let mut child = state.scoped_move(mv);
            perft(&mut child, depth - 1)
        })
        .sum()
}
