use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::board::Color;
use crate::evaluation::{Evaluator, CHECKMATE};
use crate::moves::Move;
use crate::state::GameState;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Plies searched below the root. Values below 1 are treated as 1.
    pub max_depth: u32,
    /// Shuffle root moves so equal scores do not always pick the same move.
    pub shuffle: bool,
    /// Fixed seed for the shuffle and for `random_move`.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            shuffle: true,
            seed: None,
        }
    }
}

/// Outcome of one search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Score from the point of view of the side to move at the root.
    pub score: i32,
    /// Principal line, starting with `best_move`.
    pub line: Vec<Move>,
    pub positions_evaluated: u64,
}

pub struct Search {
    evaluator: Evaluator,
    config: SearchConfig,
    rng: StdRng,
    positions_evaluated: u64,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            evaluator: Evaluator::new(),
            config,
            rng,
            positions_evaluated: 0,
        }
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.config.max_depth = depth;
    }

    pub fn get_positions_evaluated(&self) -> u64 {
        self.positions_evaluated
    }

    pub fn find_best_move(&mut self, state: &mut GameState, moves: Vec<Move>) -> Option<Move> {
        self.search(state, moves).best_move
    }

    /// Runs a fixed-depth negamax search over `moves`, the legal moves of
    /// `state`. The position is left exactly as it was found.
    pub fn search(&mut self, state: &mut GameState, mut moves: Vec<Move>) -> SearchResult {
        self.positions_evaluated = 0;
        if self.config.shuffle {
            moves.shuffle(&mut self.rng);
        }

        let depth = self.config.max_depth.max(1);
        let sign = match state.side_to_move {
            Color::White => 1,
            Color::Black => -1,
        };
        debug!("searching {} moves at depth {}", moves.len(), depth);

        // Child queries overwrite the terminal flags of the root position.
        let flags = (state.in_check, state.checkmate, state.stalemate);
        let (score, line) =
            self.negamax(state, &moves, depth, -2 * CHECKMATE, 2 * CHECKMATE, sign);
        (state.in_check, state.checkmate, state.stalemate) = flags;

        let result = SearchResult {
            best_move: line.first().copied(),
            score,
            line,
            positions_evaluated: self.positions_evaluated,
        };
        info!(
            "move {} {}: depth {} evaluated {} positions, best {} (score: {}) line: {}",
            state.fullmove_number(),
            state.side_to_move,
            depth,
            result.positions_evaluated,
            result
                .best_move
                .map_or_else(|| "none".to_string(), |mv| mv.to_string()),
            result.score,
            format_line(&result.line),
        );
        result
    }

    /// Fail-soft negamax with alpha-beta pruning.
    ///
    /// `sign` is 1 when White is to move in `state` and -1 otherwise. Returns
    /// the score for the side to move and the line that achieves it.
    fn negamax(
        &mut self,
        state: &mut GameState,
        moves: &[Move],
        depth: u32,
        mut alpha: i32,
        beta: i32,
        sign: i32,
    ) -> (i32, Vec<Move>) {
        if depth == 0 || moves.is_empty() {
            self.positions_evaluated += 1;
            let mut score = sign * self.evaluator.evaluate(state);
            // The mated side scores worse the sooner the mate lands.
            if state.checkmate {
                score -= depth as i32;
            }
            return (score, Vec::new());
        }

        let mut max_score = -2 * CHECKMATE;
        let mut best_line = Vec::new();
        for &mv in moves {
            let (score, child_line) = {
                let mut child = state.scoped_move(mv);
                let replies = child.valid_moves();
                let (score, line) =
                    self.negamax(&mut child, &replies, depth - 1, -beta, -alpha, -sign);
                (-score, line)
            };

            if score > max_score {
                max_score = score;
                best_line.clear();
                best_line.push(mv);
                best_line.extend(child_line);
            }
            alpha = alpha.max(max_score);
            if alpha >= beta {
                break;
            }
        }

        (max_score, best_line)
    }

    /// A uniformly random move from `moves`.
    pub fn random_move(&mut self, moves: &[Move]) -> Option<Move> {
        moves.choose(&mut self.rng).copied()
    }
}

fn format_line(line: &[Move]) -> String {
    line.iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(depth: u32) -> Search {
        Search::with_config(SearchConfig {
            max_depth: depth,
            shuffle: true,
            seed: Some(7),
        })
    }

    /// Plain negamax over the whole tree, used to check that pruning does not
    /// change the root score.
    fn full_width(
        search: &Search,
        state: &mut GameState,
        moves: &[Move],
        depth: u32,
        sign: i32,
    ) -> i32 {
        if depth == 0 || moves.is_empty() {
            let mut score = sign * search.evaluator.evaluate(state);
            if state.checkmate {
                score -= depth as i32;
            }
            return score;
        }
        let mut best = -2 * CHECKMATE;
        for &mv in moves {
            let mut child = state.scoped_move(mv);
            let replies = child.valid_moves();
            best = best.max(-full_width(search, &mut child, &replies, depth - 1, -sign));
        }
        best
    }

    #[test]
    fn test_finds_mate_in_one() {
        let fen = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
        for depth in 1..=3 {
            let mut state = GameState::from_fen(fen).unwrap();
            let moves = state.valid_moves();
            let mut search = seeded(depth);
            let result = search.search(&mut state, moves);

            let best = result.best_move.unwrap();
            assert_eq!(best.coordinate_notation(), "a1a8");
            assert_eq!(result.score, CHECKMATE + depth as i32 - 1);
            assert_eq!(result.line, vec![best]);

            state.make_move(best);
            assert!(state.valid_moves().is_empty());
            assert!(state.checkmate);
            assert_eq!(search.evaluator.evaluate(&state), CHECKMATE);
        }
    }

    #[test]
    fn test_black_finds_mate_in_one() {
        let mut state = GameState::from_fen("r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1").unwrap();
        let moves = state.valid_moves();
        let mut search = seeded(2);
        let best = search.find_best_move(&mut state, moves).unwrap();
        assert_eq!(best.coordinate_notation(), "a8a1");
    }

    #[test]
    fn test_pruning_keeps_the_root_score() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let mut state = GameState::from_fen(fen).unwrap();
        let moves = state.valid_moves();
        let mut search = seeded(3);

        let expected = full_width(&search, &mut state, &moves, 3, 1);
        let result = search.search(&mut state, moves);
        assert_eq!(result.score, expected);
        assert_eq!(result.line.len(), 3);
        assert!(result.positions_evaluated > 0);
        assert_eq!(search.get_positions_evaluated(), result.positions_evaluated);
    }

    #[test]
    fn test_search_restores_the_position() {
        let mut state = GameState::new();
        let opening = state.move_from_coordinates("e2e4").unwrap();
        state.make_move(opening);
        let moves = state.valid_moves();
        let before = state.clone();

        let mut search = seeded(3);
        search.search(&mut state, moves);

        assert_eq!(state.to_fen(), before.to_fen());
        assert_eq!(state.board, before.board);
        assert_eq!(state.move_log(), before.move_log());
        assert_eq!(state.in_check, before.in_check);
        assert!(!state.checkmate && !state.stalemate);
    }

    #[test]
    fn test_seeded_searches_agree() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let mut state = GameState::from_fen(fen).unwrap();
        let moves = state.valid_moves();

        let first = seeded(2).search(&mut state, moves.clone());
        let second = seeded(2).search(&mut state, moves);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_moves_means_no_best_move() {
        let mut state = GameState::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let moves = state.valid_moves();
        let mut search = seeded(3);
        let result = search.search(&mut state, moves);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
        assert!(state.stalemate);
    }

    #[test]
    fn test_random_move_is_legal() {
        let mut state = GameState::new();
        let moves = state.valid_moves();
        let mut search = seeded(1);
        let mv = search.random_move(&moves).unwrap();
        assert!(moves.contains(&mv));
        assert_eq!(search.random_move(&[]), None);
    }
}
