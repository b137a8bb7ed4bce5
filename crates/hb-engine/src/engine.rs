//! Spin resolution engine
//!
//! [`Run`] owns one run's config, state and random source. [`Run::spin`] is
//! the only step function: it resolves one game, mutates the state and
//! reports what happened.

use serde::{Deserialize, Serialize};

use crate::config::MachineConfig;
use crate::error::EngineResult;
use crate::mode::{BonusTrigger, Mode};
use crate::paytable::{BonusKind, Symbol};
use crate::random::{RandomSource, SeededSource};
use crate::resolver::{ModeResolver, weighted_choice};
use crate::state::{Counters, GameState};

/// How a bonus round ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundEnd {
    /// Mode after the post-bonus transition (unchanged on continuation)
    pub next_mode: Mode,
    /// A queued extra BIG round started instead of a mode transition
    pub continued: bool,
}

/// What a single game resolved to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpinEvent {
    /// Nothing landed
    Miss,
    /// A small-win symbol landed; heaven-family cherries and watermelons may
    /// upgrade the mode
    Symbol {
        symbol: Symbol,
        upgraded_to: Option<Mode>,
    },
    /// A bonus round was won on this game
    BonusStart {
        kind: BonusKind,
        trigger: BonusTrigger,
    },
    /// One game of an active bonus round
    BonusGame {
        remaining: u32,
        continuation_queued: bool,
    },
    /// Last game of a bonus round
    BonusEnd { end: RoundEnd },
}

/// Result of one spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// 1-based game number
    pub game: u64,
    /// Medals paid this game
    pub payout: f64,
    /// Ledger change: payout minus stake
    pub net: f64,
    pub event: SpinEvent,
    pub mode_before: Mode,
    pub mode_after: Mode,
    /// The 32-game heaven window expired at the start of this game
    pub demoted: bool,
}

impl SpinOutcome {
    pub fn is_bonus_start(&self) -> bool {
        matches!(self.event, SpinEvent::BonusStart { .. })
    }
}

/// Read-only view of a run for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub setting_level: u8,
    pub total_games: u64,
    pub total_payout: f64,
    pub total_invested: f64,
    pub payout_rate: f64,
    pub mode: Mode,
    pub bonus_active: bool,
    pub bonus_games_remaining: u32,
    pub games_since_bonus: u32,
    pub bonus_through_count: u32,
    pub streak_count: u32,
    pub streak_payout: f64,
    pub max_streak_count: u32,
    pub max_streak_payout: f64,
    pub counters: Counters,
}

/// One simulation run
pub struct Run<R: RandomSource = SeededSource> {
    pub(crate) config: MachineConfig,
    pub(crate) state: GameState,
    pub(crate) source: R,
    symbol_lottery: Vec<(Option<Symbol>, f64)>,
    continuation_lottery: [(Option<Symbol>, f64); 3],
}

impl Run<SeededSource> {
    /// Start a run on a setting level. `None` seeds from the OS.
    pub fn new(level: u8, seed: Option<u64>) -> EngineResult<Self> {
        let config = MachineConfig::for_setting(level)?;
        Self::with_source(config, SeededSource::new(seed))
    }
}

impl<R: RandomSource> Run<R> {
    /// Start a run with an injected source. The initial mode is drawn from it.
    pub fn with_source(config: MachineConfig, mut source: R) -> EngineResult<Self> {
        config.validate()?;
        let mode = ModeResolver::new(&config).initial_mode(&mut source);
        log::debug!("{}: run starts in {}", config.setting.label, mode);
        Ok(Self::assemble(config, GameState::new(mode), source))
    }

    /// Resume from an explicit state
    pub fn from_state(config: MachineConfig, state: GameState, source: R) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, state, source))
    }

    fn assemble(config: MachineConfig, state: GameState, source: R) -> Self {
        let symbol_lottery = config.paytable.lottery();
        let cherry = config.paytable.probability(Symbol::Cherry);
        let watermelon = config.paytable.probability(Symbol::Watermelon);
        let continuation_lottery = [
            (Some(Symbol::Cherry), cherry),
            (Some(Symbol::Watermelon), watermelon),
            (None, (1.0 - cherry - watermelon).max(0.0)),
        ];
        Self {
            config,
            state,
            source,
            symbol_lottery,
            continuation_lottery,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let stake = self.config.stake;
        RunSnapshot {
            setting_level: self.config.setting.level,
            total_games: self.state.total_games,
            total_payout: self.state.total_payout,
            total_invested: self.state.total_invested(stake),
            payout_rate: self.state.payout_rate(stake),
            mode: self.state.mode,
            bonus_active: self.state.bonus_active,
            bonus_games_remaining: self.state.bonus_games_remaining,
            games_since_bonus: self.state.games_since_bonus,
            bonus_through_count: self.state.bonus_through_count,
            streak_count: self.state.streak.count,
            streak_payout: self.state.streak.payout,
            max_streak_count: self.state.streak.max_count,
            max_streak_payout: self.state.streak.max_payout,
            counters: self.state.counters.clone(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════

    /// Play one game
    pub fn spin(&mut self) -> SpinOutcome {
        self.state.total_games += 1;
        let mode_before = self.state.mode;

        let (payout, event, demoted) = if self.state.bonus_active {
            let (payout, event) = self.spin_bonus_game();
            (payout, event, false)
        } else {
            self.spin_normal_game()
        };

        let net = payout - self.config.stake as f64;
        self.state.total_payout += net;

        SpinOutcome {
            game: self.state.total_games,
            payout,
            net,
            event,
            mode_before,
            mode_after: self.state.mode,
            demoted,
        }
    }

    fn spin_bonus_game(&mut self) -> (f64, SpinEvent) {
        self.state.games_since_bonus = 0;
        self.state.bonus_games_remaining = self.state.bonus_games_remaining.saturating_sub(1);

        let payout = self.config.bonus_payout_per_game();
        if self.state.streak.is_open() {
            self.state.streak.payout += payout;
        }

        let landed = weighted_choice(&self.continuation_lottery, self.source.next_unit()).flatten();
        if let Some(symbol) = landed {
            let odds = match symbol {
                Symbol::Cherry => self.config.bonus.continuation.cherry,
                Symbol::Watermelon => self.config.bonus.continuation.watermelon,
                Symbol::Replay | Symbol::Bell | Symbol::Guaranteed => 0.0,
            };
            if self.source.next_unit() < odds {
                if !self.state.queued_continuation {
                    log::debug!("game {}: continuation queued on {}", self.state.total_games, symbol);
                }
                self.state.queued_continuation = true;
            }
        }

        if self.state.bonus_games_remaining == 0 {
            let (end, extra) = self.end_bonus();
            return (payout + extra, SpinEvent::BonusEnd { end });
        }

        let event = SpinEvent::BonusGame {
            remaining: self.state.bonus_games_remaining,
            continuation_queued: self.state.queued_continuation,
        };
        (payout, event)
    }

    fn spin_normal_game(&mut self) -> (f64, SpinEvent, bool) {
        self.state.games_since_bonus += 1;

        let demoted = self.state.is_heaven() && self.state.games_since_bonus > self.config.heaven.window;
        if demoted {
            log::debug!(
                "game {}: {} window expired, back to {}",
                self.state.total_games,
                self.state.mode,
                Mode::NormalA
            );
            self.state.mode = Mode::NormalA;
            self.state.bonus_through_count = 1;
            self.state.counters.heaven_demotions += 1;
            self.state.streak.close();
        }

        let mut payout = 0.0;
        let trigger = self.draw_bonus_trigger(&mut payout);

        let event = match trigger {
            Some(trigger) => {
                let ratio = self.config.bonus.big_ratio.for_mode(self.state.mode);
                let kind = if self.source.next_unit() < ratio {
                    BonusKind::Big
                } else {
                    BonusKind::Reg
                };
                payout += self.start_bonus(kind, Some(trigger));
                SpinEvent::BonusStart { kind, trigger }
            }
            None => self.draw_symbol(&mut payout),
        };

        (payout, event, demoted)
    }

    /// Bonus checks in priority order; the first success wins
    fn draw_bonus_trigger(&mut self, payout: &mut f64) -> Option<BonusTrigger> {
        let ceiling = self.config.ceiling;
        if self.state.games_since_bonus >= ceiling.games
            || self.state.bonus_through_count >= ceiling.through
        {
            self.state.counters.ceiling_hits += 1;
            return Some(BonusTrigger::Ceiling);
        }

        if self.source.next_unit() < self.config.middle_cherry.probability {
            self.state.counters.middle_cherry += 1;
            *payout += self.config.middle_cherry.payout as f64;
            return Some(BonusTrigger::MiddleCherry);
        }

        if self.source.next_unit() < self.config.paytable.probability(Symbol::Guaranteed) {
            self.state.counters.record_symbol(Symbol::Guaranteed);
            return Some(BonusTrigger::Guaranteed);
        }

        let elapsed = self.state.games_since_bonus;
        if self.state.is_heaven() && elapsed <= self.config.heaven.window {
            let probability = self.config.heaven.window_probability(elapsed);
            if self.source.next_unit() < probability {
                self.state.counters.heaven_window_hits += 1;
                return Some(BonusTrigger::HeavenWindow);
            }
        }

        if self.source.next_unit() < self.config.setting.bonus_probability {
            return Some(BonusTrigger::Base);
        }
        None
    }

    fn draw_symbol(&mut self, payout: &mut f64) -> SpinEvent {
        let Some(symbol) = weighted_choice(&self.symbol_lottery, self.source.next_unit()).flatten()
        else {
            return SpinEvent::Miss;
        };

        *payout += self.config.paytable.payout(symbol) as f64;
        self.state.counters.record_symbol(symbol);

        let mut upgraded_to = None;
        if self.state.is_heaven() {
            let resolver = ModeResolver::new(&self.config);
            if let Some(mode) = resolver.symbol_upgrade(self.state.mode, symbol, &mut self.source) {
                log::debug!(
                    "game {}: {} upgrades {} to {}",
                    self.state.total_games,
                    symbol,
                    self.state.mode,
                    mode
                );
                self.state.mode = mode;
                self.state.counters.record_entry(mode);
                upgraded_to = Some(mode);
            }
        }

        SpinEvent::Symbol {
            symbol,
            upgraded_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ConstantSource, ScriptedSource};
    use approx::assert_abs_diff_eq;

    fn run_from(state: GameState, source: impl RandomSource) -> Run<impl RandomSource> {
        Run::from_state(MachineConfig::for_setting(1).unwrap(), state, source).unwrap()
    }

    #[test]
    fn test_run_creation() {
        let run = Run::new(1, Some(12345)).unwrap();
        assert_eq!(run.state().total_games, 0);
        assert!(!run.state().bonus_active);
        assert!(matches!(
            run.state().mode,
            Mode::NormalA | Mode::NormalB | Mode::Chance
        ));
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(Run::new(4, Some(1)).is_err());
    }

    #[test]
    fn test_miss_costs_stake() {
        let mut run = run_from(GameState::new(Mode::NormalA), ConstantSource(0.999));
        let outcome = run.spin();
        assert_eq!(outcome.event, SpinEvent::Miss);
        assert_eq!(outcome.payout, 0.0);
        assert_eq!(outcome.net, -3.0);
        assert_eq!(run.state().total_payout, -3.0);
        assert_eq!(run.state().games_since_bonus, 1);
    }

    #[test]
    fn test_replay_breaks_even() {
        // middle cherry, guaranteed, base bonus miss; symbol draw 0.0 = REPLAY
        let source = ScriptedSource::new(vec![0.9, 0.9, 0.9, 0.0], 0.999);
        let mut run = run_from(GameState::new(Mode::NormalA), source);
        let outcome = run.spin();
        assert_eq!(
            outcome.event,
            SpinEvent::Symbol {
                symbol: Symbol::Replay,
                upgraded_to: None
            }
        );
        assert_eq!(outcome.net, 0.0);
        assert_eq!(run.state().counters.replay, 1);
    }

    #[test]
    fn test_middle_cherry_pays_and_starts_bonus() {
        // middle cherry hit, then BIG ratio draw
        let source = ScriptedSource::new(vec![0.0, 0.1], 0.999);
        let mut run = run_from(GameState::new(Mode::NormalA), source);
        let outcome = run.spin();
        assert_eq!(
            outcome.event,
            SpinEvent::BonusStart {
                kind: BonusKind::Big,
                trigger: BonusTrigger::MiddleCherry
            }
        );
        assert_eq!(outcome.payout, 3.0);
        assert_eq!(run.state().counters.middle_cherry, 1);
        assert_eq!(run.state().pending_trigger, Some(BonusTrigger::MiddleCherry));
        assert_eq!(run.state().bonus_games_remaining, 45);
    }

    #[test]
    fn test_bonus_game_pays_net_gain() {
        let mut state = GameState::new(Mode::NormalA);
        state.bonus_active = true;
        state.bonus_games_remaining = 10;
        state.games_since_bonus = 0;
        let mut run = run_from(state, ConstantSource(0.999));
        let outcome = run.spin();
        assert_abs_diff_eq!(outcome.payout, 7.5);
        assert_abs_diff_eq!(outcome.net, 4.5);
        assert_eq!(run.state().bonus_games_remaining, 9);
        assert_eq!(
            outcome.event,
            SpinEvent::BonusGame {
                remaining: 9,
                continuation_queued: false
            }
        );
    }

    #[test]
    fn test_continuation_queued_on_bonus_cherry() {
        let mut state = GameState::new(Mode::NormalA);
        state.bonus_active = true;
        state.bonus_games_remaining = 10;
        // first draw lands CHERRY (below 1/46.8), second wins the 2% roll
        let source = ScriptedSource::new(vec![0.001, 0.01], 0.999);
        let mut run = run_from(state, source);
        run.spin();
        assert!(run.state().queued_continuation);
    }

    #[test]
    fn test_watermelon_continuation_odds() {
        let mut state = GameState::new(Mode::NormalA);
        state.bonus_active = true;
        state.bonus_games_remaining = 10;
        let cherry = 1.0 / 46.8;
        // just past CHERRY's band lands WATERMELON; 0.05 wins 6% but not 2%
        let source = ScriptedSource::new(vec![cherry + 0.001, 0.05], 0.999);
        let mut run = run_from(state, source);
        run.spin();
        assert!(run.state().queued_continuation);
    }

    #[test]
    fn test_heaven_window_bonus() {
        let mut state = GameState::new(Mode::Tengoku);
        state.games_since_bonus = 0;
        // middle cherry miss, guaranteed miss, window hit, BIG
        let source = ScriptedSource::new(vec![0.9, 0.9, 0.0, 0.1], 0.999);
        let mut run = run_from(state, source);
        let outcome = run.spin();
        assert_eq!(
            outcome.event,
            SpinEvent::BonusStart {
                kind: BonusKind::Big,
                trigger: BonusTrigger::HeavenWindow
            }
        );
        assert_eq!(run.state().counters.heaven_window_hits, 1);
    }

    #[test]
    fn test_heaven_big_ratio() {
        let mut state = GameState::new(Mode::Tengoku);
        state.games_since_bonus = 0;
        // 0.85 is BIG in heaven (0.9) but would be REG in normal play (0.6)
        let source = ScriptedSource::new(vec![0.9, 0.9, 0.0, 0.85], 0.999);
        let mut run = run_from(state, source);
        assert!(matches!(
            run.spin().event,
            SpinEvent::BonusStart {
                kind: BonusKind::Big,
                ..
            }
        ));
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut run = Run::new(6, Some(99)).unwrap();
        for _ in 0..500 {
            run.spin();
        }
        let snapshot = run.snapshot();
        assert_eq!(snapshot.setting_level, 6);
        assert_eq!(snapshot.total_games, 500);
        assert_eq!(snapshot.total_invested, 1500.0);
        assert_eq!(snapshot.mode, run.state().mode);
        assert_eq!(snapshot.counters, run.state().counters);
    }
}
