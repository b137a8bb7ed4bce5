//! Machine configuration
//!
//! A [`MachineConfig`] is built once per run from the chosen [`Setting`] and
//! never mutated afterwards. Parallel runs each own their own value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::mode::Mode;
use crate::paytable::{BonusKind, PayTable, Symbol};

/// Medals staked on every game
pub const MEDALS_PER_SPIN: u32 = 3;

/// Setting levels the machine ships with. Level 4 does not exist.
pub const VALID_LEVELS: [u8; 5] = [1, 2, 3, 5, 6];

const ROW_TOLERANCE: f64 = 1e-9;

// ═══════════════════════════════════════════════════════════════════════════
// SETTINGS
// ═══════════════════════════════════════════════════════════════════════════

/// Operator setting profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub level: u8,
    /// Base per-game bonus probability
    pub bonus_probability: f64,
    /// CHERRY probability for this level
    pub cherry_probability: f64,
    pub label: String,
    /// Long-run payout rate of the per-game bonus model at this level
    pub reference_payout_rate: f64,
    /// Rate quoted for the flat-payout bonus model
    pub flat_payout_rate: f64,
}

impl Setting {
    fn new(level: u8, bonus_odds: f64, cherry_odds: f64, reference: f64, flat: f64) -> Self {
        Self {
            level,
            bonus_probability: 1.0 / bonus_odds,
            cherry_probability: 1.0 / cherry_odds,
            label: format!("Setting {level}"),
            reference_payout_rate: reference,
            flat_payout_rate: flat,
        }
    }

    /// Look up a setting level
    pub fn for_level(level: u8) -> EngineResult<Self> {
        match level {
            1 => Ok(Self::new(1, 240.0, 46.8, 0.899, 0.972)),
            2 => Ok(Self::new(2, 230.2, 45.0, 0.911, 0.986)),
            3 => Ok(Self::new(3, 215.8, 43.3, 0.931, 1.024)),
            5 => Ok(Self::new(5, 192.1, 41.7, 0.971, 1.068)),
            6 => Ok(Self::new(6, 181.0, 40.3, 0.994, 1.10)),
            other => Err(EngineError::InvalidSetting(other)),
        }
    }

    /// Every valid setting, lowest level first
    pub fn all() -> Vec<Self> {
        VALID_LEVELS
            .iter()
            .filter_map(|&level| Self::for_level(level).ok())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BONUS
// ═══════════════════════════════════════════════════════════════════════════

/// How bonus rounds pay out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BonusModel {
    /// Bonus is an active regime of per-game spins with continuation
    /// queuing and streak payout tracking
    PerGame,
    /// Whole round paid when it starts; the round ends on the same spin
    Flat { big: u32, reg: u32 },
}

impl BonusModel {
    pub fn flat_default() -> Self {
        BonusModel::Flat { big: 204, reg: 84 }
    }
}

/// Continuation ("1-game") odds rolled when CHERRY or WATERMELON lands
/// during a bonus game
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuationOdds {
    pub cherry: f64,
    pub watermelon: f64,
}

/// Share of bonus hits that are BIG, by mode group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigRatio {
    pub heaven: f64,
    /// NormalA and NormalB
    pub normal: f64,
    /// Chance
    pub other: f64,
}

impl BigRatio {
    pub fn for_mode(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Tengoku | Mode::DokiDoki | Mode::SuperDokiDoki => self.heaven,
            Mode::NormalA | Mode::NormalB => self.normal,
            Mode::Chance => self.other,
        }
    }
}

/// Bonus round configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusConfig {
    pub model: BonusModel,
    /// BIG round length in games
    pub big_games: u32,
    /// REG round length in games
    pub reg_games: u32,
    /// Net medal gain per bonus game, stake already deducted
    pub net_gain_per_game: f64,
    pub big_ratio: BigRatio,
    pub continuation: ContinuationOdds,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            model: BonusModel::PerGame,
            big_games: 45,
            reg_games: 18,
            net_gain_per_game: 4.5,
            big_ratio: BigRatio {
                heaven: 0.9,
                normal: 0.6,
                other: 0.7,
            },
            continuation: ContinuationOdds {
                cherry: 0.02,
                watermelon: 0.06,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HEAVEN FAMILY
// ═══════════════════════════════════════════════════════════════════════════

/// Cumulative thresholds on one draw: below `super_doki_doki` promotes to
/// SuperDokiDoki, below `doki_doki` to DokiDoki, otherwise no change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromotionOdds {
    pub super_doki_doki: f64,
    pub doki_doki: f64,
}

impl PromotionOdds {
    /// Ordered lottery outcomes, `None` = stay
    pub fn outcomes(&self) -> [(Option<Mode>, f64); 3] {
        let super_w = self.super_doki_doki;
        let doki_w = (self.doki_doki - self.super_doki_doki).max(0.0);
        [
            (Some(Mode::SuperDokiDoki), super_w),
            (Some(Mode::DokiDoki), doki_w),
            (None, (1.0 - super_w - doki_w).max(0.0)),
        ]
    }

    fn validate(&self, what: &str) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&self.super_doki_doki)
            || !(0.0..=1.0).contains(&self.doki_doki)
            || self.super_doki_doki > self.doki_doki
        {
            return Err(EngineError::InvalidConfig(format!(
                "{what} thresholds must satisfy 0 <= super <= doki <= 1"
            )));
        }
        Ok(())
    }
}

/// Heaven-family configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeavenConfig {
    /// Games a heaven-family mode lasts without a bonus
    pub window: u32,
    /// Bonus probability by elapsed game (index 0 = first game)
    pub window_table: Vec<f64>,
    /// Promotion roll after the matrix lands on Tengoku
    pub tengoku_promotion: PromotionOdds,
    /// Mode draw after a middle-cherry round
    pub middle_cherry_landing: PromotionOdds,
    pub cherry_upgrade: PromotionOdds,
    pub watermelon_upgrade: PromotionOdds,
}

impl HeavenConfig {
    /// Raw window shape: front-loaded, dips mid-window, rises at the end
    pub fn raw_window_shape() -> Vec<f64> {
        let mut shape = Vec::with_capacity(32);
        shape.extend(std::iter::repeat_n(0.15, 5));
        shape.extend(std::iter::repeat_n(0.05, 5));
        shape.extend(std::iter::repeat_n(0.02, 10));
        shape.extend(std::iter::repeat_n(0.05, 5));
        shape.extend(std::iter::repeat_n(0.15, 7));
        shape
    }

    /// Scale a raw shape so its entries sum to `total`
    pub fn normalized_window(shape: &[f64], total: f64) -> Vec<f64> {
        let sum: f64 = shape.iter().sum();
        if sum <= 0.0 {
            return vec![0.0; shape.len()];
        }
        shape.iter().map(|p| p / sum * total).collect()
    }

    /// Bonus probability on the `elapsed`-th game of the window (1-based)
    pub fn window_probability(&self, elapsed: u32) -> f64 {
        if elapsed == 0 {
            return 0.0;
        }
        self.window_table
            .get(elapsed as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }

    /// Upgrade roll for a symbol hit during heaven-family play
    pub fn upgrade_for(&self, symbol: Symbol) -> Option<&PromotionOdds> {
        match symbol {
            Symbol::Cherry => Some(&self.cherry_upgrade),
            Symbol::Watermelon => Some(&self.watermelon_upgrade),
            Symbol::Replay | Symbol::Bell | Symbol::Guaranteed => None,
        }
    }
}

impl Default for HeavenConfig {
    fn default() -> Self {
        Self {
            window: 32,
            window_table: Self::normalized_window(&Self::raw_window_shape(), 1.1),
            tengoku_promotion: PromotionOdds {
                super_doki_doki: 0.005,
                doki_doki: 0.08,
            },
            middle_cherry_landing: PromotionOdds {
                super_doki_doki: 0.55,
                doki_doki: 0.95,
            },
            cherry_upgrade: PromotionOdds {
                super_doki_doki: 0.0,
                doki_doki: 0.05,
            },
            watermelon_upgrade: PromotionOdds {
                super_doki_doki: 0.01,
                doki_doki: 0.10,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CEILINGS, MIDDLE CHERRY, TRANSITIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Guaranteed-bonus ceilings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingConfig {
    /// Games since the last bonus
    pub games: u32,
    /// Consecutive bonuses that did not land in heaven
    pub through: u32,
}

impl Default for CeilingConfig {
    fn default() -> Self {
        Self {
            games: 800,
            through: 10,
        }
    }
}

/// Middle-row cherry: pays like a cherry and grants a bonus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiddleCherryConfig {
    pub probability: f64,
    pub payout: u32,
}

impl Default for MiddleCherryConfig {
    fn default() -> Self {
        Self {
            probability: 1.0 / 32768.0,
            payout: 3,
        }
    }
}

/// Outgoing transitions of one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRow {
    pub from: Mode,
    pub to: Vec<(Mode, f64)>,
}

/// Post-bonus mode transition matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    rows: Vec<TransitionRow>,
}

impl TransitionMatrix {
    pub fn new(rows: Vec<TransitionRow>) -> Self {
        Self { rows }
    }

    pub fn standard() -> Self {
        use Mode::*;
        let row = |from, to: &[(Mode, f64)]| TransitionRow {
            from,
            to: to.to_vec(),
        };
        Self::new(vec![
            row(NormalA, &[(NormalA, 0.53), (NormalB, 0.15), (Tengoku, 0.32)]),
            row(NormalB, &[(NormalB, 0.50), (Tengoku, 0.50)]),
            row(Chance, &[(NormalA, 0.40), (Tengoku, 0.60)]),
            row(
                Tengoku,
                &[(Tengoku, 0.75), (DokiDoki, 0.05), (NormalA, 0.10), (NormalB, 0.10)],
            ),
            row(
                DokiDoki,
                &[(DokiDoki, 0.78), (SuperDokiDoki, 0.20), (NormalA, 0.01), (NormalB, 0.01)],
            ),
            row(SuperDokiDoki, &[(SuperDokiDoki, 0.94), (NormalA, 0.06)]),
        ])
    }

    /// Outgoing row for a mode; empty when the mode has no row
    pub fn row(&self, from: Mode) -> &[(Mode, f64)] {
        self.rows
            .iter()
            .find(|r| r.from == from)
            .map(|r| r.to.as_slice())
            .unwrap_or(&[])
    }

    pub fn rows(&self) -> &[TransitionRow] {
        &self.rows
    }

    fn validate(&self) -> EngineResult<()> {
        for row in &self.rows {
            if row.to.iter().any(|(_, p)| !(0.0..=1.0).contains(p)) {
                return Err(EngineError::InvalidConfig(format!(
                    "transition row {} has a probability outside [0, 1]",
                    row.from
                )));
            }
            let sum: f64 = row.to.iter().map(|(_, p)| p).sum();
            if (sum - 1.0).abs() > ROW_TOLERANCE {
                return Err(EngineError::InvalidConfig(format!(
                    "transition row {} sums to {sum}, expected 1",
                    row.from
                )));
            }
        }
        Ok(())
    }
}

impl Default for TransitionMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MACHINE CONFIG
// ═══════════════════════════════════════════════════════════════════════════

/// Probability mass a normal game can land on, per category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityMass {
    pub bonus: f64,
    pub guaranteed: f64,
    pub symbols: f64,
    pub total: f64,
}

impl ProbabilityMass {
    pub fn exceeds_one(&self) -> bool {
        self.total > 1.0
    }
}

/// Full per-run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub setting: Setting,
    pub stake: u32,
    pub paytable: PayTable,
    pub middle_cherry: MiddleCherryConfig,
    pub bonus: BonusConfig,
    pub heaven: HeavenConfig,
    pub ceiling: CeilingConfig,
    pub transitions: TransitionMatrix,
    /// Mode draw when a run starts
    pub initial_modes: Vec<(Mode, f64)>,
}

impl MachineConfig {
    /// Standard tables with the given setting applied
    pub fn for_setting(level: u8) -> EngineResult<Self> {
        let setting = Setting::for_level(level)?;
        let config = Self::standard().with_setting(setting);
        config.validate()?;
        Ok(config)
    }

    /// Flat-payout reduction of the standard machine.
    ///
    /// Rounds pay 204/84 up front. The small-win odds are richer (REPLAY
    /// 1/7.2, BELL 1/8.2), BIG takes 70% of hits in every mode and the
    /// middle cherry is off. `flat_payout_rate` is quoted for these tables.
    pub fn flat_for_setting(level: u8) -> EngineResult<Self> {
        let mut config = Self::for_setting(level)?;
        config.bonus.model = BonusModel::flat_default();
        config.bonus.big_ratio = BigRatio {
            heaven: 0.7,
            normal: 0.7,
            other: 0.7,
        };
        config.paytable = config
            .paytable
            .with_probability(Symbol::Replay, 1.0 / 7.2)
            .with_probability(Symbol::Bell, 1.0 / 8.2);
        config.middle_cherry.probability = 0.0;
        config.validate()?;
        Ok(config)
    }

    fn standard() -> Self {
        let setting = Setting {
            level: 1,
            bonus_probability: 1.0 / 240.0,
            cherry_probability: 1.0 / 46.8,
            label: "Setting 1".into(),
            reference_payout_rate: 0.899,
            flat_payout_rate: 0.972,
        };
        Self {
            setting,
            stake: MEDALS_PER_SPIN,
            paytable: PayTable::standard(MEDALS_PER_SPIN),
            middle_cherry: MiddleCherryConfig::default(),
            bonus: BonusConfig::default(),
            heaven: HeavenConfig::default(),
            ceiling: CeilingConfig::default(),
            transitions: TransitionMatrix::standard(),
            initial_modes: vec![
                (Mode::NormalA, 0.50),
                (Mode::NormalB, 0.102),
                (Mode::Chance, 0.398),
            ],
        }
    }

    /// Apply a setting: replaces the setting record and CHERRY odds
    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.paytable = self
            .paytable
            .with_probability(Symbol::Cherry, setting.cherry_probability);
        self.setting = setting;
        self
    }

    /// Gross medals paid by one bonus game (net gain plus returned stake)
    pub fn bonus_payout_per_game(&self) -> f64 {
        self.bonus.net_gain_per_game + self.stake as f64
    }

    /// Round length for a bonus kind
    pub fn bonus_games(&self, kind: BonusKind) -> u32 {
        match kind {
            BonusKind::Big => self.bonus.big_games,
            BonusKind::Reg => self.bonus.reg_games,
        }
    }

    /// Mass of everything a normal game can hit
    pub fn probability_mass(&self) -> ProbabilityMass {
        let bonus = self.setting.bonus_probability;
        let guaranteed = self.paytable.probability(Symbol::Guaranteed);
        let symbols = self.paytable.lottery_mass();
        ProbabilityMass {
            bonus,
            guaranteed,
            symbols,
            total: bonus + guaranteed + symbols,
        }
    }

    /// Check every table. Total mass above 1 is reported, not rejected: the
    /// bonus checks use independent draws, only the symbol lottery shares one.
    pub fn validate(&self) -> EngineResult<()> {
        if !VALID_LEVELS.contains(&self.setting.level) {
            return Err(EngineError::InvalidSetting(self.setting.level));
        }
        let probabilities = [
            ("bonus probability", self.setting.bonus_probability),
            ("cherry probability", self.setting.cherry_probability),
            ("middle cherry probability", self.middle_cherry.probability),
            ("BIG ratio (heaven)", self.bonus.big_ratio.heaven),
            ("BIG ratio (normal)", self.bonus.big_ratio.normal),
            ("BIG ratio (other)", self.bonus.big_ratio.other),
            ("cherry continuation", self.bonus.continuation.cherry),
            ("watermelon continuation", self.bonus.continuation.watermelon),
        ];
        for (what, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(EngineError::InvalidConfig(format!(
                    "{what} {p} outside [0, 1]"
                )));
            }
        }
        if self.stake == 0 {
            return Err(EngineError::InvalidConfig("stake must be positive".into()));
        }
        if self.bonus.big_games == 0 || self.bonus.reg_games == 0 {
            return Err(EngineError::InvalidConfig(
                "bonus rounds must last at least one game".into(),
            ));
        }
        if self.heaven.window_table.len() < self.heaven.window as usize {
            return Err(EngineError::InvalidConfig(format!(
                "heaven window table has {} entries for a {}-game window",
                self.heaven.window_table.len(),
                self.heaven.window
            )));
        }
        if self
            .heaven
            .window_table
            .iter()
            .any(|p| !(0.0..=1.0).contains(p))
        {
            return Err(EngineError::InvalidConfig(
                "heaven window probability outside [0, 1]".into(),
            ));
        }
        self.heaven.tengoku_promotion.validate("tengoku promotion")?;
        self.heaven
            .middle_cherry_landing
            .validate("middle cherry landing")?;
        self.heaven.cherry_upgrade.validate("cherry upgrade")?;
        self.heaven.watermelon_upgrade.validate("watermelon upgrade")?;
        self.paytable.validate()?;
        self.transitions.validate()?;

        let initial: f64 = self.initial_modes.iter().map(|(_, p)| p).sum();
        if self.initial_modes.is_empty() || (initial - 1.0).abs() > ROW_TOLERANCE {
            return Err(EngineError::InvalidConfig(format!(
                "initial mode draw sums to {initial}, expected 1"
            )));
        }

        let mass = self.probability_mass();
        if mass.exceeds_one() {
            log::warn!(
                "{}: total hit mass {:.4} exceeds 1 (bonus {:.5}, guaranteed {:.5}, symbols {:.4})",
                self.setting.label,
                mass.total,
                mass.bonus,
                mass.guaranteed,
                mass.symbols
            );
        }
        Ok(())
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: MachineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
