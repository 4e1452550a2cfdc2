//! # I/O Module
//!
//! Readers and writers for the tabular files exchanged with the collaborators of
//! the clustering engine: similarity triple lists produced by a sequence search,
//! square similarity matrices, and edge lists consumed by downstream graph
//! tools.

pub mod dense;
pub mod triples;
