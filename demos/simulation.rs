//! # Curiosity in a Grid World
//!
//! Runs the camera-free simulation: three Markov minds repaint a 16×16 grid,
//! rewarded by how hard its recent spectrum is to compress. Writes the run as
//! an animated GIF.
//!
//! ```text
//! cargo run --example simulation -- [seed] [output.gif]
//! RUST_LOG=debug cargo run --example simulation
//! ```

use curio_core::sim::{self, SimConfig};

fn main() -> curio_core::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s
            .parse()
            .map_err(|e| curio_core::CurioError::InvalidConfig(format!("seed {:?}: {}", s, e)))?,
        None => 1,
    };
    let output = args.next().unwrap_or_else(|| "sim.gif".to_string());

    let config = SimConfig {
        seed,
        ..SimConfig::default()
    };
    println!("Curiosity grid world");
    println!("====================\n");
    println!(
        "  seed {}  grid {}x{}  iterations {}",
        config.seed, config.width, config.height, config.iterations
    );

    let run = sim::run(&config)?;

    // ── Summary ──────────────────────────────────────────────────────────────
    let novelty: Vec<f64> = run.steps().iter().map(|s| s.novelty).collect();
    let mean = novelty.iter().sum::<f64>() / novelty.len().max(1) as f64;
    let max = novelty.iter().copied().fold(0.0, f64::max);
    let quarter = novelty.len() / 4;
    let early = novelty[..quarter].iter().sum::<f64>() / quarter.max(1) as f64;
    let late = novelty[novelty.len() - quarter..].iter().sum::<f64>() / quarter.max(1) as f64;

    let initial_black = run.initial().pixels().iter().filter(|p| **p < 128).count();
    let final_black = run.final_grid().pixels().iter().filter(|p| **p < 128).count();

    println!("\n  novelty   mean {:6.2}   max {:6.2}", mean, max);
    println!("            first quarter {:6.2}   last quarter {:6.2}", early, late);
    println!("  dark cells  {} -> {}", initial_black, final_black);

    run.save_gif(&output)?;
    println!("\n  wrote {}", output);
    Ok(())
}
