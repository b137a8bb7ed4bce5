//! Paytable: small-win symbols (koyaku) and bonus kinds

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Small-win symbol outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Replay,
    Bell,
    Watermelon,
    Cherry,
    /// Pays nothing itself; always grants a bonus
    Guaranteed,
}

impl Symbol {
    /// Fixed evaluation order. The payout lottery resolves overlaps in this
    /// order, so it is part of the table contract.
    pub const EVALUATION_ORDER: [Symbol; 5] = [
        Symbol::Replay,
        Symbol::Bell,
        Symbol::Watermelon,
        Symbol::Cherry,
        Symbol::Guaranteed,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Symbol::Replay => "Replay",
            Symbol::Bell => "Bell",
            Symbol::Watermelon => "Watermelon",
            Symbol::Cherry => "Cherry",
            Symbol::Guaranteed => "Guaranteed",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Bonus round kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Big,
    Reg,
}

impl BonusKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            BonusKind::Big => "BIG",
            BonusKind::Reg => "REG",
        }
    }
}

impl std::fmt::Display for BonusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Probability and medal payout of one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub symbol: Symbol,
    pub probability: f64,
    pub payout: u32,
}

impl PayoutEntry {
    pub fn new(symbol: Symbol, probability: f64, payout: u32) -> Self {
        Self {
            symbol,
            probability,
            payout,
        }
    }
}

/// Fixed-order symbol table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayTable {
    entries: Vec<PayoutEntry>,
}

impl PayTable {
    /// Standard table. CHERRY odds here are the setting-1 value; the active
    /// setting replaces them when a run's config is built.
    pub fn standard(stake: u32) -> Self {
        Self {
            entries: vec![
                PayoutEntry::new(Symbol::Replay, 1.0 / 7.3, stake),
                PayoutEntry::new(Symbol::Bell, 1.0 / 12.2, 10),
                PayoutEntry::new(Symbol::Watermelon, 1.0 / 143.7, 5),
                PayoutEntry::new(Symbol::Cherry, 1.0 / 46.8, 3),
                PayoutEntry::new(Symbol::Guaranteed, 1.0 / 4369.1, 0),
            ],
        }
    }

    /// Entries in evaluation order
    pub fn entries(&self) -> &[PayoutEntry] {
        &self.entries
    }

    pub fn entry(&self, symbol: Symbol) -> Option<&PayoutEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn probability(&self, symbol: Symbol) -> f64 {
        self.entry(symbol).map(|e| e.probability).unwrap_or(0.0)
    }

    pub fn payout(&self, symbol: Symbol) -> u32 {
        self.entry(symbol).map(|e| e.payout).unwrap_or(0)
    }

    /// Copy of this table with one symbol's probability replaced
    pub fn with_probability(&self, symbol: Symbol, probability: f64) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| {
                if e.symbol == symbol {
                    PayoutEntry { probability, ..*e }
                } else {
                    *e
                }
            })
            .collect();
        Self { entries }
    }

    /// Total mass of the payout lottery (every symbol except GUARANTEED)
    pub fn lottery_mass(&self) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.symbol != Symbol::Guaranteed)
            .map(|e| e.probability)
            .sum()
    }

    /// Lottery outcomes in evaluation order plus the miss remainder
    pub fn lottery(&self) -> Vec<(Option<Symbol>, f64)> {
        let mut outcomes: Vec<(Option<Symbol>, f64)> = self
            .entries
            .iter()
            .filter(|e| e.symbol != Symbol::Guaranteed)
            .map(|e| (Some(e.symbol), e.probability))
            .collect();
        outcomes.push((None, (1.0 - self.lottery_mass()).max(0.0)));
        outcomes
    }

    /// The table must list every symbol exactly once, in evaluation order,
    /// with probabilities in `[0, 1]` and a lottery mass of at most 1.
    pub fn validate(&self) -> EngineResult<()> {
        let symbols: Vec<Symbol> = self.entries.iter().map(|e| e.symbol).collect();
        if symbols != Symbol::EVALUATION_ORDER {
            return Err(EngineError::InvalidConfig(format!(
                "paytable order must be {:?}, got {:?}",
                Symbol::EVALUATION_ORDER,
                symbols
            )));
        }
        for entry in &self.entries {
            if !(0.0..=1.0).contains(&entry.probability) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} probability {} outside [0, 1]",
                    entry.symbol, entry.probability
                )));
            }
        }
        let mass = self.lottery_mass();
        if mass > 1.0 {
            return Err(EngineError::InvalidConfig(format!(
                "symbol lottery mass {mass} exceeds 1"
            )));
        }
        Ok(())
    }
}
