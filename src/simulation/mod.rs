pub mod clock;
pub mod color;
pub mod controller;
pub mod grid;

pub use clock::TickClock;
pub use color::{ColorDraw, Rgb, PALETTE};
pub use controller::{Simulation, Snapshot, Status, TickOutcome};
pub use grid::Grid;
