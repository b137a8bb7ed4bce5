//! # hb-engine — Heaven-Mode Pachislot Engine
//!
//! Deterministic per-spin outcome engine for a medal-based pachislot with a
//! "heaven" mode family. Every random decision goes through an injectable
//! [`RandomSource`], so a seed fully determines a run.
//!
//! ## Features
//!
//! - **Setting Profiles**: Operator levels 1, 2, 3, 5 and 6 (level 4 does not exist)
//! - **Mode Machine**: Six hidden modes with a post-bonus transition matrix
//! - **Heaven Family**: 32-game window, promotion rolls, symbol upgrades, streaks
//! - **Bonus Rounds**: BIG/REG per-game rounds with queued continuations,
//!   or a flat-payout reduction
//! - **Ceilings**: Forced bonus after 800 games or 10 consecutive throughs
//!
//! ## Architecture
//!
//! ```text
//! Run<R: RandomSource>
//!     │
//!     ├── MachineConfig (setting, paytable, heaven, ceilings, transitions)
//!     ├── GameState (ledger, mode, bonus round, streak, counters)
//!     └── ModeResolver (post-bonus draw, promotions, symbol upgrades)
//!           │
//!           v
//!     spin() → SpinOutcome
//! ```

mod bonus;
pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod paytable;
pub mod random;
pub mod resolver;
pub mod state;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use mode::*;
pub use paytable::*;
pub use random::*;
pub use resolver::*;
pub use state::*;
