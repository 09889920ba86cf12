//! Null-model simulation: shuffled variants of a formatives table.
//!
//! Each call owns one `StdRng` seeded from the caller's seed and consumes it
//! column by column in declared cell order, so the same (table, mode, seed)
//! always reproduces the same output.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::ShuffleMode;
use crate::table::{ExponentList, FormativesTable, SimulatedTable};

/// Produce a shuffled variant of `table`.
pub fn simulate(table: &FormativesTable, mode: ShuffleMode, seed: u64) -> SimulatedTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shuffled = table.clone();

    for cell_idx in 0..table.cell_count() {
        let column = table.column(cell_idx);
        let column = match mode {
            ShuffleMode::TypefreqShuffled => permute_column(column, &mut rng),
            ShuffleMode::Allshuffled => redraw_column(&column, &mut rng),
        };
        shuffled.set_column(cell_idx, column);
    }

    log::debug!(
        "Simulated {mode} table: {} lexemes x {} cells, seed {seed}",
        table.lexeme_count(),
        table.cell_count()
    );

    SimulatedTable {
        table: shuffled,
        provenance: mode.into(),
        seed,
    }
}

/// Both null models, each drawn from its own stream seeded with `seed`.
pub fn simulate_all(table: &FormativesTable, seed: u64) -> [SimulatedTable; 2] {
    [
        simulate(table, ShuffleMode::TypefreqShuffled, seed),
        simulate(table, ShuffleMode::Allshuffled, seed),
    ]
}

/// Uniform permutation of the column; the value multiset is unchanged.
fn permute_column(mut column: Vec<ExponentList>, rng: &mut StdRng) -> Vec<ExponentList> {
    column.shuffle(rng);
    column
}

/// Independent uniform draw, with replacement, from the column's distinct values.
fn redraw_column(column: &[ExponentList], rng: &mut StdRng) -> Vec<ExponentList> {
    let distinct = distinct_values(column);
    if distinct.is_empty() {
        return Vec::new();
    }
    (0..column.len())
        .map(|_| distinct[rng.random_range(0..distinct.len())].clone())
        .collect()
}

/// Distinct values in first-occurrence order. The empty list counts as a value.
fn distinct_values(column: &[ExponentList]) -> Vec<&ExponentList> {
    let mut seen: HashSet<&ExponentList> = HashSet::new();
    column.iter().filter(|v| seen.insert(*v)).collect()
}
