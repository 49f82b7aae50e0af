use std::fmt;
use std::ops::{Deref, DerefMut};

use log::{error, warn};

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::error::EngineError;
use crate::movegen::MoveGenerator;
use crate::moves::Move;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn clear_color(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Clears the right tied to the rook that starts on `square`, if any.
    fn clear_rook_corner(&mut self, square: Square) {
        match (square.row(), square.col()) {
            (7, 0) => self.white_queenside = false,
            (7, 7) => self.white_kingside = false,
            (0, 0) => self.black_queenside = false,
            (0, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flags = [
            (self.white_kingside, 'K'),
            (self.white_queenside, 'Q'),
            (self.black_kingside, 'k'),
            (self.black_queenside, 'q'),
        ];
        let text: String = flags.iter().filter(|(on, _)| *on).map(|(_, c)| *c).collect();
        if text.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", text)
        }
    }
}

/// Everything needed to play on from a position and to take moves back.
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub side_to_move: Color,
    /// Indexed by `Color::index`.
    pub king_locations: [Square; 2],
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,

    // Recomputed by every `valid_moves` call.
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,

    move_log: Vec<Move>,
    // Value before each logged move, popped on undo.
    castling_log: Vec<CastlingRights>,
    en_passant_log: Vec<Option<Square>>,

    start_side: Color,
    start_fullmove: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        let board = Board::starting();
        Self {
            board,
            side_to_move: Color::White,
            king_locations: [Square::new(7, 4), Square::new(0, 4)],
            castling_rights: CastlingRights::all(),
            en_passant: None,
            in_check: false,
            checkmate: false,
            stalemate: false,
            move_log: Vec::new(),
            castling_log: Vec::new(),
            en_passant_log: Vec::new(),
            start_side: Color::White,
            start_fullmove: 1,
        }
    }

    /// Sets up a position from FEN. The clock fields are optional.
    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let invalid = |why: &str| EngineError::InvalidFen(format!("{} in `{}`", why, fen));
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(invalid("expected at least four fields"));
        }

        let rows: Vec<&str> = fields[0].split('/').collect();
        if rows.len() != 8 {
            return Err(invalid("expected eight ranks"));
        }
        let mut board = Board::empty();
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid("bad empty-square count"));
                    }
                    col += skip as u8;
                } else {
                    let piece = Piece::from_char(c).ok_or_else(|| invalid("unknown piece"))?;
                    if col >= 8 {
                        return Err(invalid("rank too long"));
                    }
                    board.set(Square::new(row as u8, col), Some(piece));
                    col += 1;
                }
                if col > 8 {
                    return Err(invalid("rank too long"));
                }
            }
            if col != 8 {
                return Err(invalid("rank too short"));
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(invalid("bad side to move")),
        };

        let mut castling_rights = CastlingRights::none();
        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => castling_rights.white_kingside = true,
                    'Q' => castling_rights.white_queenside = true,
                    'k' => castling_rights.black_kingside = true,
                    'q' => castling_rights.black_queenside = true,
                    _ => return Err(invalid("bad castling field")),
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            text => Some(text.parse::<Square>().map_err(|_| invalid("bad en-passant square"))?),
        };

        let start_fullmove: u32 = match fields.get(5) {
            Some(text) => text.parse().map_err(|_| invalid("bad fullmove number"))?,
            None => 1,
        };

        let mut king_locations = [Square::new(0, 0); 2];
        for color in [Color::White, Color::Black] {
            let king = Piece::new(color, PieceKind::King);
            if board.pieces().filter(|(_, piece)| *piece == king).count() != 1 {
                return Err(invalid("each side needs exactly one king"));
            }
            king_locations[color.index()] = board
                .find_king(color)
                .ok_or_else(|| invalid("each side needs exactly one king"))?;
        }

        Ok(Self {
            board,
            side_to_move,
            king_locations,
            castling_rights,
            en_passant,
            in_check: false,
            checkmate: false,
            stalemate: false,
            move_log: Vec::new(),
            castling_log: Vec::new(),
            en_passant_log: Vec::new(),
            start_side: side_to_move,
            start_fullmove,
        })
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in 0..8u8 {
            let mut empty = 0;
            for col in 0..8u8 {
                match self.board.get(Square::new(row, col)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if row < 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} 0 {}",
            placement,
            side,
            self.castling_rights,
            en_passant,
            self.fullmove_number()
        )
    }

    pub fn fullmove_number(&self) -> u32 {
        let offset = match self.start_side {
            Color::White => 0,
            Color::Black => 1,
        };
        let played = u32::try_from((self.move_log.len() + offset) / 2).unwrap_or(u32::MAX);
        self.start_fullmove.saturating_add(played)
    }

    pub fn king_location(&self, color: Color) -> Square {
        self.king_locations[color.index()]
    }

    pub fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    /// The sole legality query. Also refreshes `in_check`, `checkmate` and
    /// `stalemate`.
    pub fn valid_moves(&mut self) -> Vec<Move> {
        let legal = MoveGenerator::new().legal_moves(self);
        self.in_check = legal.in_check;
        self.checkmate = legal.checkmate;
        self.stalemate = legal.stalemate;
        legal.moves
    }

    /// Applies a move produced by the move generator. No legality check is
    /// made here; see `submit_move` for untrusted input.
    pub fn make_move(&mut self, mv: Move) {
        let mover = mv.piece_moved;

        self.board.set(mv.start, None);
        let arriving = if mv.is_promotion {
            Piece::new(mover.color, PieceKind::Queen)
        } else {
            mover
        };
        self.board.set(mv.end, Some(arriving));

        if mv.is_en_passant {
            self.board.set(mv.en_passant_victim(), None);
        }

        if mv.is_castle {
            let (rook_from, rook_to) = mv.castling_rook_squares();
            let rook = self.board.get(rook_from);
            self.board.set(rook_to, rook);
            self.board.set(rook_from, None);
        }

        if mover.kind == PieceKind::King {
            self.king_locations[mover.color.index()] = mv.end;
        }

        self.en_passant_log.push(self.en_passant);
        let double_push =
            mover.kind == PieceKind::Pawn && mv.start.row().abs_diff(mv.end.row()) == 2;
        self.en_passant = if double_push {
            Some(Square::new((mv.start.row() + mv.end.row()) / 2, mv.start.col()))
        } else {
            None
        };

        self.castling_log.push(self.castling_rights);
        self.update_castling_rights(&mv);

        self.move_log.push(mv);
        self.side_to_move = self.side_to_move.opposite();
    }

    fn update_castling_rights(&mut self, mv: &Move) {
        match mv.piece_moved.kind {
            PieceKind::King => self.castling_rights.clear_color(mv.piece_moved.color),
            PieceKind::Rook => self.castling_rights.clear_rook_corner(mv.start),
            _ => {}
        }
        if let Some(captured) = mv.piece_captured {
            if captured.kind == PieceKind::Rook {
                self.castling_rights.clear_rook_corner(mv.end);
            }
        }
    }

    /// Takes back the last move and returns it.
    pub fn undo_move(&mut self) -> Result<Move, EngineError> {
        let mv = match self.move_log.pop() {
            Some(mv) => mv,
            None => {
                warn!("undo requested with an empty move log");
                return Err(EngineError::InvalidState);
            }
        };

        self.board.set(mv.start, Some(mv.piece_moved));
        if mv.is_en_passant {
            self.board.set(mv.end, None);
            self.board.set(mv.en_passant_victim(), mv.piece_captured);
        } else {
            self.board.set(mv.end, mv.piece_captured);
        }

        if mv.is_castle {
            let (rook_from, rook_to) = mv.castling_rook_squares();
            let rook = self.board.get(rook_to);
            self.board.set(rook_from, rook);
            self.board.set(rook_to, None);
        }

        if mv.piece_moved.kind == PieceKind::King {
            self.king_locations[mv.piece_moved.color.index()] = mv.start;
        }

        if let Some(rights) = self.castling_log.pop() {
            self.castling_rights = rights;
        }
        if let Some(target) = self.en_passant_log.pop() {
            self.en_passant = target;
        }

        self.side_to_move = self.side_to_move.opposite();
        self.checkmate = false;
        self.stalemate = false;
        Ok(mv)
    }

    /// Applies `mv` and returns a guard that takes it back when dropped.
    pub fn scoped_move(&mut self, mv: Move) -> MoveGuard<'_> {
        self.make_move(mv);
        MoveGuard { state: self }
    }

    /// Applies a caller-supplied move if it matches a legal move by its start
    /// and end squares. The state is left untouched otherwise.
    pub fn submit_move(&mut self, mv: Move) -> Result<Move, EngineError> {
        let legal = self
            .valid_moves()
            .into_iter()
            .find(|candidate| *candidate == mv)
            .ok_or_else(|| EngineError::IllegalMove(mv.coordinate_notation()))?;
        self.make_move(legal);
        Ok(legal)
    }

    /// Resolves coordinate text such as `e2e4` (an optional trailing
    /// promotion letter is accepted) to a legal move without applying it.
    pub fn move_from_coordinates(&mut self, text: &str) -> Result<Move, EngineError> {
        let illegal = || EngineError::IllegalMove(text.to_string());
        if !(4..=5).contains(&text.len()) {
            return Err(illegal());
        }
        let start: Square = text.get(0..2).ok_or_else(illegal)?.parse()?;
        let end: Square = text.get(2..4).ok_or_else(illegal)?.parse()?;
        self.valid_moves()
            .into_iter()
            .find(|mv| mv.start == start && mv.end == end)
            .ok_or_else(illegal)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        write!(
            f,
            "{} to move, castling {}, en passant {}",
            self.side_to_move,
            self.castling_rights,
            self.en_passant
                .map_or_else(|| "-".to_string(), |sq| sq.to_string())
        )
    }
}

/// A move applied through `GameState::scoped_move`; undone on drop.
pub struct MoveGuard<'a> {
    state: &'a mut GameState,
}

impl Deref for MoveGuard<'_> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        self.state
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut GameState {
        self.state
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.state.undo_move() {
            error!("scoped move was already taken back: {}", err);
        }
    }
}
