//! Analysis phases: simulate → build graph → detect communities → hierarchy.

pub mod communities;
pub mod graphs;
pub mod hierarchy;
pub mod simulation;
