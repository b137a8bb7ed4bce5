//! Weighted-choice primitive and the post-bonus mode resolver
//!
//! Every lottery in the engine goes through [`weighted_choice`], so they all
//! share one tie-break rule and one fallback.

use crate::config::MachineConfig;
use crate::mode::{BonusTrigger, Mode};
use crate::paytable::Symbol;
use crate::random::RandomSource;

/// Pick from ordered `(value, weight)` outcomes with a single draw.
///
/// Weights accumulate in list order; the first outcome whose cumulative
/// weight exceeds `draw` wins. When rounding leaves the total just short of
/// the draw, the last outcome wins. Returns `None` only for an empty list.
#[inline]
pub fn weighted_choice<T: Copy>(outcomes: &[(T, f64)], draw: f64) -> Option<T> {
    let mut cumulative = 0.0;
    for &(value, weight) in outcomes {
        cumulative += weight;
        if draw < cumulative {
            return Some(value);
        }
    }
    outcomes.last().map(|&(value, _)| value)
}

/// Mode transition policy applied when a bonus round ends
pub struct ModeResolver<'a> {
    config: &'a MachineConfig,
}

impl<'a> ModeResolver<'a> {
    pub fn new(config: &'a MachineConfig) -> Self {
        Self { config }
    }

    /// Resolve the mode that follows a bonus round.
    ///
    /// Middle-cherry rounds skip the matrix and land in the heaven family
    /// directly. Otherwise the current mode's row is drawn (no row means a
    /// certain drop to NormalA), and a Tengoku landing gets one promotion roll.
    pub fn next_mode(
        &self,
        current: Mode,
        trigger: BonusTrigger,
        source: &mut impl RandomSource,
    ) -> Mode {
        let heaven = &self.config.heaven;

        if trigger.is_middle_cherry() {
            return weighted_choice(&heaven.middle_cherry_landing.outcomes(), source.next_unit())
                .flatten()
                .unwrap_or(Mode::Tengoku);
        }

        let row = self.config.transitions.row(current);
        let resolved = weighted_choice(row, source.next_unit()).unwrap_or(Mode::NormalA);

        if resolved == Mode::Tengoku {
            return weighted_choice(&heaven.tengoku_promotion.outcomes(), source.next_unit())
                .flatten()
                .unwrap_or(Mode::Tengoku);
        }
        resolved
    }

    /// Upgrade rolled when CHERRY or WATERMELON lands during heaven-family
    /// play. Returns the new mode only if it ranks above the current one.
    pub fn symbol_upgrade(
        &self,
        current: Mode,
        symbol: Symbol,
        source: &mut impl RandomSource,
    ) -> Option<Mode> {
        let odds = self.config.heaven.upgrade_for(symbol)?;
        let target = weighted_choice(&odds.outcomes(), source.next_unit()).flatten()?;
        // upgrade only: a DokiDoki roll while in SuperDokiDoki keeps the mode
        // and counts no entry
        (target.heaven_rank() > current.heaven_rank()).then_some(target)
    }

    /// Starting mode of a fresh run
    pub fn initial_mode(&self, source: &mut impl RandomSource) -> Mode {
        weighted_choice(&self.config.initial_modes, source.next_unit()).unwrap_or(Mode::NormalA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ConstantSource, ScriptedSource};

    fn config() -> MachineConfig {
        MachineConfig::for_setting(1).unwrap()
    }

    #[test]
    fn test_weighted_choice_cumulative() {
        let outcomes = [('a', 0.5), ('b', 0.3), ('c', 0.2)];
        assert_eq!(weighted_choice(&outcomes, 0.0), Some('a'));
        assert_eq!(weighted_choice(&outcomes, 0.4999), Some('a'));
        assert_eq!(weighted_choice(&outcomes, 0.5), Some('b'));
        assert_eq!(weighted_choice(&outcomes, 0.79), Some('b'));
        assert_eq!(weighted_choice(&outcomes, 0.81), Some('c'));
    }

    #[test]
    fn test_weighted_choice_falls_back_to_last() {
        // weights deliberately short of 1
        let outcomes = [('a', 0.2), ('b', 0.2)];
        assert_eq!(weighted_choice(&outcomes, 0.9), Some('b'));
        let empty: [(char, f64); 0] = [];
        assert_eq!(weighted_choice(&empty, 0.1), None);
    }

    #[test]
    fn test_weighted_choice_skips_zero_weight() {
        let outcomes = [('a', 0.0), ('b', 1.0)];
        assert_eq!(weighted_choice(&outcomes, 0.0), Some('b'));
    }

    #[test]
    fn test_middle_cherry_landing() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        let trigger = BonusTrigger::MiddleCherry;
        let land = |draw| resolver.next_mode(Mode::NormalA, trigger, &mut ConstantSource(draw));
        assert_eq!(land(0.10), Mode::SuperDokiDoki);
        assert_eq!(land(0.60), Mode::DokiDoki);
        assert_eq!(land(0.97), Mode::Tengoku);
    }

    #[test]
    fn test_middle_cherry_consumes_one_draw() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        let mut source = ScriptedSource::new(vec![0.97], 0.0);
        let mode = resolver.next_mode(Mode::Chance, BonusTrigger::MiddleCherry, &mut source);
        // landing on Tengoku via middle cherry gets no promotion roll
        assert_eq!(mode, Mode::Tengoku);
        assert_eq!(source.consumed(), 1);
    }

    #[test]
    fn test_matrix_row_draw() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        let mut stay = ConstantSource(0.10);
        assert_eq!(resolver.next_mode(Mode::NormalA, BonusTrigger::Base, &mut stay), Mode::NormalA);
        let mut to_b = ConstantSource(0.60);
        assert_eq!(resolver.next_mode(Mode::NormalA, BonusTrigger::Base, &mut to_b), Mode::NormalB);
        let mut drop = ConstantSource(0.95);
        assert_eq!(
            resolver.next_mode(Mode::SuperDokiDoki, BonusTrigger::Base, &mut drop),
            Mode::NormalA
        );
    }

    #[test]
    fn test_tengoku_promotion_roll() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        // 0.9 lands Tengoku from NormalA (0.68..1.0); second draw promotes
        let mut to_super = ScriptedSource::new(vec![0.9, 0.001], 0.5);
        assert_eq!(
            resolver.next_mode(Mode::NormalA, BonusTrigger::Base, &mut to_super),
            Mode::SuperDokiDoki
        );
        let mut to_doki = ScriptedSource::new(vec![0.9, 0.05], 0.5);
        assert_eq!(
            resolver.next_mode(Mode::NormalA, BonusTrigger::Base, &mut to_doki),
            Mode::DokiDoki
        );
        let mut stay = ScriptedSource::new(vec![0.9, 0.5], 0.5);
        assert_eq!(
            resolver.next_mode(Mode::NormalA, BonusTrigger::Base, &mut stay),
            Mode::Tengoku
        );
    }

    #[test]
    fn test_missing_row_drops_to_normal_a() {
        let mut config = config();
        config.transitions = crate::config::TransitionMatrix::new(Vec::new());
        let resolver = ModeResolver::new(&config);
        let mut source = ConstantSource(0.3);
        assert_eq!(
            resolver.next_mode(Mode::Chance, BonusTrigger::Base, &mut source),
            Mode::NormalA
        );
    }

    #[test]
    fn test_symbol_upgrade_thresholds() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        let up = |mode, symbol, draw| resolver.symbol_upgrade(mode, symbol, &mut ConstantSource(draw));
        assert_eq!(up(Mode::Tengoku, Symbol::Watermelon, 0.005), Some(Mode::SuperDokiDoki));
        assert_eq!(up(Mode::Tengoku, Symbol::Watermelon, 0.05), Some(Mode::DokiDoki));
        assert_eq!(up(Mode::Tengoku, Symbol::Watermelon, 0.5), None);
        assert_eq!(up(Mode::Tengoku, Symbol::Cherry, 0.0), Some(Mode::DokiDoki));
        assert_eq!(up(Mode::Tengoku, Symbol::Bell, 0.0), None);
    }

    #[test]
    fn test_symbol_upgrade_never_demotes() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        let mut source = ConstantSource(0.05);
        assert_eq!(
            resolver.symbol_upgrade(Mode::SuperDokiDoki, Symbol::Watermelon, &mut source),
            None
        );
        assert_eq!(
            resolver.symbol_upgrade(Mode::DokiDoki, Symbol::Watermelon, &mut source),
            None
        );
    }

    #[test]
    fn test_initial_mode_draw() {
        let config = config();
        let resolver = ModeResolver::new(&config);
        assert_eq!(resolver.initial_mode(&mut ConstantSource(0.2)), Mode::NormalA);
        assert_eq!(resolver.initial_mode(&mut ConstantSource(0.55)), Mode::NormalB);
        assert_eq!(resolver.initial_mode(&mut ConstantSource(0.7)), Mode::Chance);
    }
}
