//! Graph data structures: triphone decomposition and the lexeme–triphone network.

pub mod bipartite;
pub mod triphones;
