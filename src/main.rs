use std::env;
use std::str::FromStr;
use std::sync::mpsc::sync_channel;
use std::thread;

use anyhow::{anyhow, Context, Result};
use log::info;

use pinwheel::{GameState, Move, Search, SearchConfig, SearchResult};

const DEFAULT_PLY_LIMIT: usize = 200;

fn parse_arg<T>(args: &[String], index: usize, default: T, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match args.get(index) {
        Some(text) => text
            .parse()
            .with_context(|| format!("invalid {}: `{}`", name, text)),
        None => Ok(default),
    }
}

/// Searches a private copy of `state` on a worker thread.
fn think(state: &GameState, depth: u32) -> Result<SearchResult> {
    let (sender, receiver) = sync_channel(1);
    let mut position = state.clone();

    let worker = thread::spawn(move || {
        let moves = position.valid_moves();
        let mut search = Search::with_config(SearchConfig {
            max_depth: depth,
            ..SearchConfig::default()
        });
        // The receiver only goes away if the main thread has already failed.
        let _ = sender.send(search.search(&mut position, moves));
    });

    let result = receiver
        .recv()
        .context("search worker stopped without reporting a move")?;
    worker
        .join()
        .map_err(|_| anyhow!("search worker panicked"))?;
    Ok(result)
}

fn format_game(moves: &[Move]) -> String {
    moves
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let notation: Vec<String> = pair.iter().map(|mv| mv.to_string()).collect();
            format!("{}. {}", i + 1, notation.join(" "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let depth = parse_arg(&args, 1, SearchConfig::default().max_depth, "depth")?;
    let ply_limit = parse_arg(&args, 2, DEFAULT_PLY_LIMIT, "ply limit")?;
    info!("self-play at depth {} for at most {} plies", depth, ply_limit);

    let mut state = GameState::new();
    let mut played = Vec::new();
    loop {
        let moves = state.valid_moves();
        if moves.is_empty() || played.len() >= ply_limit {
            break;
        }

        let number = state.fullmove_number();
        let side = state.side_to_move;
        let result = think(&state, depth)?;
        let best = result
            .best_move
            .ok_or_else(|| anyhow!("search found no move in a live position"))?;
        let mv = state.submit_move(best)?;
        println!(
            "{}. {} {} ({} positions, score {})",
            number,
            side,
            mv,
            result.positions_evaluated,
            result.score
        );
        played.push(mv);
    }

    println!();
    println!("{}", state);
    println!("{}", format_game(&played));
    if state.checkmate {
        println!("{} is checkmated", state.side_to_move);
    } else if state.stalemate {
        println!("stalemate");
    } else {
        println!("stopped after {} plies", played.len());
    }
    Ok(())
}
