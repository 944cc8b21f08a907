//! Simulation, identification and search of cellular automata patterns.
//!
//! A [`Simulator`] runs a [`Grid`] under a [`Rule`](rules::Rule) on a
//! [`Topology`], and identifies still lifes, oscillators and spaceships.
//! Three search engines, all implementing [`SearchProgram`], are built on
//! top of it:
//!
//! * [`BruteForceSearch`] runs every soup in a box, or random soups;
//! * [`RuleSearch`] runs a fixed pattern under random rules in a range;
//! * [`ShipSearch`] builds spaceships of a given speed row by row.

mod cache;
mod cells;
mod config;
mod error;
mod grid;
mod identify;
pub mod rules;
mod search;
mod simulator;
mod topology;

pub use cache::LruCache;
pub use cells::{Coord, State, ALIVE, DEAD};
pub use config::{
    BruteForceParams, RuleSearchParams, ShipSearchParams, ShipSymmetry, Symmetry, Transform,
};
pub use error::Error;
pub use grid::Grid;
pub use identify::{IdentifyOptions, PatternKind, PatternResult};
pub use rules::{Hrot, HrotGenerations, Rule, Transition};
pub use search::{
    BruteForceSearch, Progress, RuleSearch, SearchProgram, ShipSearch, Status, REPORT_INTERVAL,
};
pub use simulator::Simulator;
pub use topology::Topology;
