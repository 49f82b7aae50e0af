pub mod attacks;
pub mod board;
pub mod error;
pub mod evaluation;
pub mod movegen;
pub mod moves;
pub mod search;
pub mod state;

pub use board::{Board, Color, Piece, PieceKind, Square};
pub use error::EngineError;
pub use evaluation::{Evaluator, CHECKMATE};
pub use movegen::{perft, LegalMoves, MoveGenerator};
pub use moves::Move;
pub use search::{Search, SearchConfig, SearchResult};
pub use state::{CastlingRights, GameState, MoveGuard, STARTING_FEN};

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: &mut GameState, list: &[&str]) -> Vec<String> {
        list.iter()
            .map(|text| {
                let mv = state.move_from_coordinates(text).unwrap();
                state.submit_move(mv).unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_initial_position() {
        let mut state = GameState::new();
        let moves = state.valid_moves();
        assert_eq!(moves.len(), 20);
        let knight_moves = moves
            .iter()
            .filter(|mv| mv.piece_moved.kind == PieceKind::Knight)
            .count();
        assert_eq!(knight_moves, 4);
        assert!(moves.iter().all(|mv| !mv.is_capture()));
    }

    #[test]
    fn test_fools_mate() {
        let mut state = GameState::new();
        let notation = play(&mut state, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(notation, vec!["f3", "e5", "g4", "Qh4"]);

        assert!(state.valid_moves().is_empty());
        assert!(state.checkmate);
        assert_eq!(Evaluator::new().evaluate(&state), -CHECKMATE);

        // Taking the mate back leaves a live position again.
        state.undo_move().unwrap();
        assert!(!state.checkmate);
        assert!(!state.valid_moves().is_empty());
    }

    #[test]
    fn test_game_notation() {
        let mut state = GameState::new();
        let notation = play(
            &mut state,
            &[
                "e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5", "g1f3", "c8g4", "f1e2", "b8c6",
                "e1g1", "e8c8",
            ],
        );
        assert_eq!(
            notation,
            vec![
                "e4", "d5", "exd5", "Qxd5", "Nc3", "Qa5", "Nf3", "Bg4", "Be2", "Nc6", "O-O",
                "O-O-O",
            ]
        );
        assert_eq!(
            state.to_fen(),
            "2kr1bnr/ppp1pppp/2n5/q7/6b1/2N2N2/PPPPBPPP/R1BQ1RK1 w - - 0 7"
        );
    }

    #[test]
    fn test_illegal_submission_leaves_state_alone() {
        let mut state = GameState::new();
        let before = state.to_fen();
        let board = state.board;
        let bogus = Move::new("e2".parse().unwrap(), "e5".parse().unwrap(), &board).unwrap();

        assert_eq!(
            state.submit_move(bogus),
            Err(EngineError::IllegalMove("e2e5".to_string()))
        );
        assert_eq!(state.to_fen(), before);
        assert!(state.move_log().is_empty());
    }

    #[test]
    fn test_self_play_then_take_back() {
        let mut state = GameState::new();
        let mut search = Search::with_config(SearchConfig {
            max_depth: 2,
            shuffle: true,
            seed: Some(2024),
        });

        for _ in 0..8 {
            let moves = state.valid_moves();
            let best = search.find_best_move(&mut state, moves).unwrap();
            state.submit_move(best).unwrap();
        }
        assert_eq!(state.move_log().len(), 8);
        assert_eq!(state.fullmove_number(), 5);

        while state.undo_move().is_ok() {}
        assert_eq!(state.to_fen(), STARTING_FEN);
        assert_eq!(state.undo_move(), Err(EngineError::InvalidState));
    }

    #[test]
    fn test_search_on_a_clone_leaves_the_game_untouched() {
        let mut game = GameState::new();
        play(&mut game, &["e2e4", "e7e5"]);
        let mut worker = game.clone();
        let moves = worker.valid_moves();
        let result = Search::with_config(SearchConfig {
            max_depth: 2,
            shuffle: false,
            seed: Some(1),
        })
        .search(&mut worker, moves);

        assert!(result.best_move.is_some());
        assert_eq!(worker.to_fen(), game.to_fen());
        let best = result.best_move.unwrap();
        assert_eq!(game.submit_move(best), Ok(best));
    }
}
