//! Report generation for simulation results

use std::time::Duration;

use hb_engine::{BonusKind, BonusModel, Mode, ProbabilityMass, RandomSource, Run, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Hit count with its `1/N` rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub count: u64,
    /// Games per hit; `None` while the count is zero
    pub games_per: Option<f64>,
}

impl Rate {
    pub fn new(count: u64, games: u64) -> Self {
        let games_per = (count > 0).then(|| games as f64 / count as f64);
        Self { count, games_per }
    }

    /// `1/N` with one decimal, or `-` when never hit
    pub fn format_odds(&self) -> String {
        match self.games_per {
            Some(n) => format!("1/{n:.1}"),
            None => "-".to_string(),
        }
    }
}

/// Symbol hit line of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRate {
    pub symbol: Symbol,
    pub rate: Rate,
}

/// Summary of one finished simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub setting: u8,
    pub label: String,
    pub bonus_model: BonusModel,
    pub games: u64,
    /// Medals staked
    pub invested: f64,
    /// Signed ledger: payouts minus stakes
    pub total_payout: f64,
    pub payout_rate: f64,
    /// Long-run rate quoted for this setting and bonus model
    pub reference_payout_rate: f64,
    pub big: Rate,
    pub reg: Rate,
    pub symbols: Vec<SymbolRate>,
    pub middle_cherry: Rate,
    pub doki_doki_entries: Rate,
    pub super_doki_doki_entries: Rate,
    pub continuations: u64,
    pub ceiling_hits: u64,
    pub heaven_window_hits: u64,
    pub heaven_demotions: u64,
    pub max_streak_count: u32,
    pub max_streak_payout: f64,
    pub final_mode: Mode,
    pub probability_mass: ProbabilityMass,
    pub elapsed_secs: f64,
}

impl SimulationReport {
    /// Build a report from a run's current state
    pub fn from_run<R: RandomSource>(run: &Run<R>, elapsed: Duration) -> Self {
        let config = run.config();
        let state = run.state();
        let counters = &state.counters;
        let games = state.total_games;

        let reference_payout_rate = match config.bonus.model {
            BonusModel::PerGame => config.setting.reference_payout_rate,
            BonusModel::Flat { .. } => config.setting.flat_payout_rate,
        };

        let symbols = Symbol::EVALUATION_ORDER
            .iter()
            .map(|&symbol| SymbolRate {
                symbol,
                rate: Rate::new(counters.symbol(symbol), games),
            })
            .collect();

        Self {
            setting: config.setting.level,
            label: config.setting.label.clone(),
            bonus_model: config.bonus.model,
            games,
            invested: state.total_invested(config.stake),
            total_payout: state.total_payout,
            payout_rate: state.payout_rate(config.stake),
            reference_payout_rate,
            big: Rate::new(counters.bonus(BonusKind::Big), games),
            reg: Rate::new(counters.bonus(BonusKind::Reg), games),
            symbols,
            middle_cherry: Rate::new(counters.middle_cherry, games),
            doki_doki_entries: Rate::new(counters.doki_doki_entries, games),
            super_doki_doki_entries: Rate::new(counters.super_doki_doki_entries, games),
            continuations: counters.continuations,
            ceiling_hits: counters.ceiling_hits,
            heaven_window_hits: counters.heaven_window_hits,
            heaven_demotions: counters.heaven_demotions,
            max_streak_count: state.streak.max_count,
            max_streak_payout: state.streak.max_payout,
            final_mode: state.mode,
            probability_mass: config.probability_mass(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Combined BIG + REG rate
    pub fn bonus_total(&self) -> Rate {
        Rate::new(self.big.count + self.reg.count, self.games)
    }

    /// Gap between the measured and quoted payout rate
    pub fn rate_deviation(&self) -> f64 {
        self.payout_rate - self.reference_payout_rate
    }

    /// Generate text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let title = format!("{} simulation ({} games)", self.label, self.games);

        output.push_str(&format!("{title}\n"));
        output.push_str(&format!("{}\n\n", "=".repeat(title.len())));

        output.push_str(&format!(
            "Payout rate:      {:.2}% (reference {:.1}%)\n",
            self.payout_rate * 100.0,
            self.reference_payout_rate * 100.0
        ));
        output.push_str(&format!("Invested:         {:.0} medals\n", self.invested));
        output.push_str(&format!("Final credits:    {:+.0} medals\n", self.total_payout));
        output.push_str(&format!("Final mode:       {}\n\n", self.final_mode));

        output.push_str("Bonuses:\n");
        let bonus_lines = [
            ("BIG", self.big),
            ("REG", self.reg),
            ("Total", self.bonus_total()),
            ("Middle cherry", self.middle_cherry),
        ];
        for (name, rate) in bonus_lines {
            output.push_str(&format!(
                "  {name:<14} {:>9} ({})\n",
                rate.count,
                rate.format_odds()
            ));
        }
        output.push_str(&format!("  {:<14} {:>9}\n", "Continuations", self.continuations));
        output.push_str(&format!("  {:<14} {:>9}\n", "Ceiling", self.ceiling_hits));
        output.push_str(&format!("  {:<14} {:>9}\n\n", "Heaven window", self.heaven_window_hits));

        output.push_str("Symbols:\n");
        for line in &self.symbols {
            output.push_str(&format!(
                "  {:<14} {:>9} ({})\n",
                line.symbol.display_name(),
                line.rate.count,
                line.rate.format_odds()
            ));
        }

        output.push_str("\nHeaven family:\n");
        output.push_str(&format!(
            "  {:<14} {:>9} ({})\n",
            "DokiDoki",
            self.doki_doki_entries.count,
            self.doki_doki_entries.format_odds()
        ));
        output.push_str(&format!(
            "  {:<14} {:>9} ({})\n",
            "SuperDokiDoki",
            self.super_doki_doki_entries.count,
            self.super_doki_doki_entries.format_odds()
        ));
        output.push_str(&format!("  {:<14} {:>9}\n", "Demotions", self.heaven_demotions));
        output.push_str(&format!(
            "  Max streak:    {} bonuses, {:.0} medals\n\n",
            self.max_streak_count, self.max_streak_payout
        ));

        let mass = &self.probability_mass;
        output.push_str(&format!(
            "Hit mass: {:.4} (bonus {:.5}, guaranteed {:.5}, symbols {:.4})\n",
            mass.total, mass.bonus, mass.guaranteed, mass.symbols
        ));
        output.push_str(&format!("Elapsed: {:.2}s\n", self.elapsed_secs));

        output
    }

    /// Generate JSON report
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// One-line-per-setting comparison table for a sweep
pub fn sweep_table(reports: &[SimulationReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<8} {:>10} {:>9} {:>9} {:>9} {:>11} {:>11} {:>7}\n",
        "Setting", "Games", "Rate", "Ref", "Diff", "BIG", "REG", "Streak"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');

    for report in reports {
        output.push_str(&format!(
            "{:<8} {:>10} {:>8.2}% {:>8.1}% {:>+8.2}% {:>11} {:>11} {:>7}\n",
            report.setting,
            report.games,
            report.payout_rate * 100.0,
            report.reference_payout_rate * 100.0,
            report.rate_deviation() * 100.0,
            report.big.format_odds(),
            report.reg.format_odds(),
            report.max_streak_count
        ));
    }

    output
}
