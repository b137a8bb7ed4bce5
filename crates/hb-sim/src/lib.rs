//! # hb-sim — Batch Simulation for hb-engine
//!
//! Million-game runs, parallel sweeps across settings, statistics reports and
//! a terminal credit-history chart.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hb_sim::{Simulation, plot};
//!
//! let mut sim = Simulation::new(6, Some(42)).unwrap().with_history(true);
//! let report = sim.run(1_000_000, |p| eprint!("\r{:.0}%", p.fraction() * 100.0)).unwrap();
//! println!("{report}");
//! if let Some(history) = sim.history() {
//!     println!("{}", plot::render_history(history, 80, 20, &report.label));
//! }
//! ```

pub mod error;
pub mod history;
pub mod plot;
pub mod report;
pub mod runner;
pub mod sweep;

pub use error::*;
pub use history::*;
pub use report::*;
pub use runner::*;
pub use sweep::*;
