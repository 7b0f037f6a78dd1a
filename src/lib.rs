//! Hierarchical sparse grids: hash-based point storage, adaptive refinement
//! and coarsening, and operator application by the unidirectional principle.
//!
//! A grid point is one (level, index) pair per dimension with the unit
//! coordinate `index / 2^level`; level 0 denotes the two domain boundaries.
//! [`storage::GridStorage`] owns the point set and maps each point to a
//! stable sequence number that callers use to index coefficient vectors.
//! [`algorithms::refinement::HashRefinement`] and
//! [`algorithms::coarsening::HashCoarsening`] grow and shrink the grid under
//! a functor's scoring, always keeping the hierarchical ancestor closure.
//! [`operations`] applies mass and Laplace operators in linear time per
//! dimension via up-down sweeps.

pub mod algorithms;
pub mod errors;
pub mod generators;
pub mod iterators;
pub mod operations;
pub mod refinement;
pub mod serialization;
pub mod storage;
