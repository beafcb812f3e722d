//! Colored Game of Life backdrop: the grid model, its tick clock and the
//! controller that drives it. Rendering lives in the binary.

pub mod config;
pub mod simulation;
