pub mod coarsening;
pub mod refinement;
pub mod sweep;
