//! Bonus round lifecycle
//!
//! Starting a round and ending it, including the queued-continuation
//! re-entry, the post-bonus mode draw and heaven streak bookkeeping.

use crate::config::BonusModel;
use crate::engine::{Run, RoundEnd};
use crate::mode::BonusTrigger;
use crate::paytable::BonusKind;
use crate::random::RandomSource;
use crate::resolver::ModeResolver;

impl<R: RandomSource> Run<R> {
    /// Start a round. `trigger` is `None` for a queued continuation, which
    /// keeps the trigger of the round that queued it.
    ///
    /// Returns medals paid immediately: zero for per-game rounds, the whole
    /// round for the flat model.
    pub(crate) fn start_bonus(&mut self, kind: BonusKind, trigger: Option<BonusTrigger>) -> f64 {
        let state = &mut self.state;

        if state.is_heaven() {
            state.streak.extend();
        }
        state.counters.record_bonus(kind);
        if let Some(trigger) = trigger {
            state.pending_trigger = Some(trigger);
        }
        state.games_since_bonus = 0;
        state.bonus_active = true;
        state.bonus_games_remaining = self.config.bonus_games(kind);

        log::debug!(
            "game {}: {} starts in {} ({})",
            state.total_games,
            kind,
            state.mode,
            trigger.map_or("continuation", |t| t.display_name())
        );

        match self.config.bonus.model {
            BonusModel::PerGame => 0.0,
            BonusModel::Flat { big, reg } => {
                let paid = f64::from(match kind {
                    BonusKind::Big => big,
                    BonusKind::Reg => reg,
                });
                if self.state.streak.is_open() {
                    self.state.streak.payout += paid;
                }
                let (_, extra) = self.end_bonus();
                paid + extra
            }
        }
    }

    /// Close the current round. A queued continuation starts a BIG round
    /// instead of drawing the next mode.
    ///
    /// Returns how the round ended plus any medals paid by a flat-model
    /// continuation.
    pub(crate) fn end_bonus(&mut self) -> (RoundEnd, f64) {
        self.state.bonus_active = false;
        self.state.bonus_games_remaining = 0;

        if self.state.queued_continuation {
            self.state.queued_continuation = false;
            self.state.counters.continuations += 1;
            let paid = self.start_bonus(BonusKind::Big, None);
            let end = RoundEnd {
                next_mode: self.state.mode,
                continued: true,
            };
            return (end, paid);
        }

        let trigger = self.state.pending_trigger.take().unwrap_or(BonusTrigger::Base);
        let before = self.state.mode;
        let next = ModeResolver::new(&self.config).next_mode(before, trigger, &mut self.source);

        if next != before {
            log::debug!("game {}: {} -> {}", self.state.total_games, before, next);
            self.state.mode = next;
            self.state.counters.record_entry(next);
        }

        match (before.is_heaven(), next.is_heaven()) {
            (true, false) => self.state.streak.close(),
            (false, true) => self.state.streak.open(),
            _ => {}
        }

        if next.is_heaven() {
            self.state.bonus_through_count = 0;
        } else {
            self.state.bonus_through_count += 1;
        }

        let end = RoundEnd {
            next_mode: next,
            continued: false,
        };
        (end, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::mode::Mode;
    use crate::random::{ConstantSource, ScriptedSource};
    use crate::state::GameState;

    fn run_with(state: GameState, draws: Vec<f64>) -> Run<ScriptedSource> {
        let config = MachineConfig::for_setting(1).unwrap();
        Run::from_state(config, state, ScriptedSource::new(draws, 0.5)).unwrap()
    }

    #[test]
    fn test_start_bonus_sets_round() {
        let mut run = run_with(GameState::new(Mode::NormalA), vec![]);
        run.state.games_since_bonus = 120;
        let paid = run.start_bonus(BonusKind::Reg, Some(BonusTrigger::Base));
        assert_eq!(paid, 0.0);
        assert!(run.state.bonus_active);
        assert_eq!(run.state.bonus_games_remaining, 18);
        assert_eq!(run.state.games_since_bonus, 0);
        assert_eq!(run.state.counters.reg, 1);
        assert_eq!(run.state.pending_trigger, Some(BonusTrigger::Base));
    }

    #[test]
    fn test_end_bonus_enters_heaven_opens_streak() {
        // NormalA row: 0.9 lands Tengoku, 0.5 skips the promotion
        let mut state = GameState::new(Mode::NormalA);
        state.bonus_through_count = 4;
        let mut run = run_with(state, vec![0.9, 0.5]);
        run.start_bonus(BonusKind::Big, Some(BonusTrigger::Base));
        let (end, _) = run.end_bonus();
        assert_eq!(end.next_mode, Mode::Tengoku);
        assert!(!end.continued);
        assert_eq!(run.state.mode, Mode::Tengoku);
        assert_eq!(run.state.streak.count, 1);
        assert_eq!(run.state.bonus_through_count, 0);
        assert_eq!(run.state.pending_trigger, None);
    }

    #[test]
    fn test_end_bonus_outside_heaven_counts_through() {
        let mut run = run_with(GameState::new(Mode::NormalA), vec![0.1]);
        run.start_bonus(BonusKind::Big, Some(BonusTrigger::Base));
        let (end, _) = run.end_bonus();
        assert_eq!(end.next_mode, Mode::NormalA);
        assert_eq!(run.state.bonus_through_count, 1);
        assert!(!run.state.streak.is_open());
    }

    #[test]
    fn test_heaven_bonus_extends_then_close_records() {
        let mut state = GameState::new(Mode::Tengoku);
        state.streak.open();
        // Tengoku row: 0.85 falls into NormalA (0.80..0.90)
        let mut run = run_with(state, vec![0.85]);
        run.start_bonus(BonusKind::Big, Some(BonusTrigger::HeavenWindow));
        assert_eq!(run.state.streak.count, 2);
        run.state.streak.payout = 337.5;
        let (end, _) = run.end_bonus();
        assert_eq!(end.next_mode, Mode::NormalA);
        assert!(!run.state.streak.is_open());
        assert_eq!(run.state.streak.max_count, 2);
        assert_eq!(run.state.streak.max_payout, 337.5);
        assert_eq!(run.state.bonus_through_count, 1);
    }

    #[test]
    fn test_queued_continuation_restarts_big() {
        let mut run = run_with(GameState::new(Mode::Chance), vec![]);
        run.start_bonus(BonusKind::Reg, Some(BonusTrigger::MiddleCherry));
        run.state.queued_continuation = true;
        let (end, _) = run.end_bonus();
        assert!(end.continued);
        assert_eq!(end.next_mode, Mode::Chance);
        assert!(run.state.bonus_active);
        assert!(!run.state.queued_continuation);
        assert_eq!(run.state.bonus_games_remaining, 45);
        assert_eq!(run.state.counters.continuations, 1);
        assert_eq!(run.state.counters.big, 1);
        // the first round's trigger survives the continuation
        assert_eq!(run.state.pending_trigger, Some(BonusTrigger::MiddleCherry));
        assert_eq!(run.source.consumed(), 0);
    }

    #[test]
    fn test_middle_cherry_round_lands_in_heaven() {
        let mut run = run_with(GameState::new(Mode::NormalB), vec![0.2]);
        run.start_bonus(BonusKind::Big, Some(BonusTrigger::MiddleCherry));
        let (end, _) = run.end_bonus();
        assert_eq!(end.next_mode, Mode::SuperDokiDoki);
        assert_eq!(run.state.counters.super_doki_doki_entries, 1);
        assert_eq!(run.state.streak.count, 1);
    }

    #[test]
    fn test_flat_model_pays_and_ends_immediately() {
        let config = MachineConfig::flat_for_setting(1).unwrap();
        let state = GameState::new(Mode::NormalA);
        let mut run = Run::from_state(config, state, ConstantSource(0.1)).unwrap();
        let paid = run.start_bonus(BonusKind::Big, Some(BonusTrigger::Base));
        assert_eq!(paid, 204.0);
        assert!(!run.state.bonus_active);
        assert_eq!(run.state.bonus_games_remaining, 0);
        assert_eq!(run.state.bonus_through_count, 1);
    }
}
