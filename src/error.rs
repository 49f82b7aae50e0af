use thiserror::Error;

/// Errors surfaced by the engine core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `undo_move` was called with an empty move log.
    #[error("no move to undo")]
    InvalidState,
    /// A caller-submitted move that is not among the legal moves.
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error("invalid square `{0}`")]
    InvalidSquare(String),
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}
