/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Instant;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use rookery::{
    apply_move, format_line, position_from_description, Engine, EngineConfig, Move, MATE,
};

/// Search a position for its best move.
#[derive(Debug, Parser)]
struct Cli {
    /// Depth to search to.
    depth: u8,

    /// The FEN string of the position to search.
    #[arg(required = false)]
    fen: Option<String>,

    /// List of moves to apply to the position before searching.
    #[arg(required = false)]
    moves: Vec<String>,

    /// Size of the transposition table, in megabytes.
    #[arg(long, default_value_t = 16)]
    hash: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let mut position = position_from_description(
        args.fen.as_deref().unwrap_or(rookery::FEN_STARTPOS),
    )?;

    for mv_str in &args.moves {
        let mv = Move::from_uci(&position, mv_str)?;
        let _ = apply_move(&mut position, mv)?;
    }

    println!("{position}\n");

    let mut engine = Engine::new(EngineConfig {
        hash_mb: args.hash,
        ..Default::default()
    });

    let now = Instant::now();
    let result = engine.search(&mut position, args.depth)?;
    let elapsed = now.elapsed();

    let score = match result.score {
        MATE => "mate".green().to_string(),
        score if score == -MATE => "mated".red().to_string(),
        score => score.to_string(),
    };
    let bestmove = result
        .bestmove
        .map_or_else(|| String::from("(none)"), |mv| mv.to_string());

    println!("    Best Move:\t{}", bestmove.bold());
    println!("        Score:\t{score}");
    println!("        Depth:\t{}", result.depth);
    println!("           PV:\t{}", format_line(&result.pv));
    println!("        Nodes:\t{}", result.nodes);
    println!(" Elapsed Time:\t{elapsed:.1?}");

    Ok(())
}
