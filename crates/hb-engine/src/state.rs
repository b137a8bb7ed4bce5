//! Per-run game state

use serde::{Deserialize, Serialize};

use crate::mode::{BonusTrigger, Mode};
use crate::paytable::{BonusKind, Symbol};

/// Hit and entry counters; every field starts at zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub replay: u64,
    pub bell: u64,
    pub watermelon: u64,
    pub cherry: u64,
    pub guaranteed: u64,
    pub middle_cherry: u64,
    pub big: u64,
    pub reg: u64,
    /// Bonuses forced by the game or through-count ceiling
    pub ceiling_hits: u64,
    /// Bonuses won from the heaven window table
    pub heaven_window_hits: u64,
    /// Queued extra BIG rounds that actually started
    pub continuations: u64,
    pub doki_doki_entries: u64,
    pub super_doki_doki_entries: u64,
    /// Heaven family left because the 32-game window ran out
    pub heaven_demotions: u64,
}

impl Counters {
    /// Count a symbol hit
    pub fn record_symbol(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::Replay => self.replay += 1,
            Symbol::Bell => self.bell += 1,
            Symbol::Watermelon => self.watermelon += 1,
            Symbol::Cherry => self.cherry += 1,
            Symbol::Guaranteed => self.guaranteed += 1,
        }
    }

    pub fn symbol(&self, symbol: Symbol) -> u64 {
        match symbol {
            Symbol::Replay => self.replay,
            Symbol::Bell => self.bell,
            Symbol::Watermelon => self.watermelon,
            Symbol::Cherry => self.cherry,
            Symbol::Guaranteed => self.guaranteed,
        }
    }

    pub fn record_bonus(&mut self, kind: BonusKind) {
        match kind {
            BonusKind::Big => self.big += 1,
            BonusKind::Reg => self.reg += 1,
        }
    }

    pub fn bonus(&self, kind: BonusKind) -> u64 {
        match kind {
            BonusKind::Big => self.big,
            BonusKind::Reg => self.reg,
        }
    }

    pub fn total_bonuses(&self) -> u64 {
        self.big + self.reg
    }

    /// Count a mode entry. Only DokiDoki and SuperDokiDoki entries are tracked.
    pub fn record_entry(&mut self, mode: Mode) {
        match mode {
            Mode::DokiDoki => self.doki_doki_entries += 1,
            Mode::SuperDokiDoki => self.super_doki_doki_entries += 1,
            Mode::NormalA | Mode::NormalB | Mode::Chance | Mode::Tengoku => {}
        }
    }
}

/// Consecutive bonuses won while continuously in the heaven family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub count: u32,
    pub payout: f64,
    pub max_count: u32,
    /// Payout of the streak that set `max_count`
    pub max_payout: f64,
}

impl Streak {
    pub fn is_open(&self) -> bool {
        self.count > 0
    }

    /// Start a new streak on entering the heaven family
    pub fn open(&mut self) {
        self.count = 1;
        self.payout = 0.0;
    }

    /// Count one more bonus inside the heaven family
    pub fn extend(&mut self) {
        self.count += 1;
    }

    /// Leave the heaven family: keep the streak if it is the longest so far,
    /// then reset
    pub fn close(&mut self) {
        if self.count > self.max_count {
            self.max_count = self.count;
            self.max_payout = self.payout;
        }
        self.count = 0;
        self.payout = 0.0;
    }
}

/// Mutable state of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub total_games: u64,
    /// Running ledger: payouts minus stakes
    pub total_payout: f64,
    pub games_since_bonus: u32,
    /// Consecutive bonuses that did not end in the heaven family
    pub bonus_through_count: u32,
    pub mode: Mode,
    pub bonus_active: bool,
    pub bonus_games_remaining: u32,
    /// An extra BIG round starts as soon as the current one ends
    pub queued_continuation: bool,
    /// Trigger of the round in progress; consumed by the post-bonus mode draw
    pub pending_trigger: Option<BonusTrigger>,
    pub streak: Streak,
    pub counters: Counters,
}

impl GameState {
    /// Fresh state in the given mode
    pub fn new(mode: Mode) -> Self {
        Self {
            total_games: 0,
            total_payout: 0.0,
            games_since_bonus: 0,
            bonus_through_count: 0,
            mode,
            bonus_active: false,
            bonus_games_remaining: 0,
            queued_continuation: false,
            pending_trigger: None,
            streak: Streak::default(),
            counters: Counters::default(),
        }
    }

    pub fn is_heaven(&self) -> bool {
        self.mode.is_heaven()
    }

    /// Medals staked so far
    pub fn total_invested(&self, stake: u32) -> f64 {
        self.total_games as f64 * stake as f64
    }

    /// Paid out / staked. Zero before the first game.
    pub fn payout_rate(&self, stake: u32) -> f64 {
        let invested = self.total_invested(stake);
        if invested > 0.0 {
            (self.total_payout + invested) / invested
        } else {
            0.0
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Mode::NormalA)
    }
}
