//! Batch simulation runner

use std::time::{Duration, Instant};

use hb_engine::{MachineConfig, Run, SeededSource};

use crate::error::{SimError, SimResult};
use crate::history::CreditHistory;
use crate::report::SimulationReport;

/// Default number of spins between progress callbacks
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100_000;

/// Progress snapshot passed to the callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub done: u64,
    pub total: u64,
    pub elapsed: Duration,
    /// Payout rate so far
    pub payout_rate: f64,
}

impl Progress {
    /// Completed fraction in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.done as f64 / self.total as f64
    }
}

/// A single-setting batch run
pub struct Simulation {
    run: Run,
    progress_interval: u64,
    history: Option<CreditHistory>,
}

impl Simulation {
    /// Simulation on a standard setting. `None` seeds from the OS.
    pub fn new(level: u8, seed: Option<u64>) -> SimResult<Self> {
        Ok(Self::from_run(Run::new(level, seed)?))
    }

    /// Simulation on a custom config
    pub fn with_config(config: MachineConfig, seed: Option<u64>) -> SimResult<Self> {
        Self::with_source(config, SeededSource::new(seed))
    }

    /// Simulation on a custom config and random stream
    pub fn with_source(config: MachineConfig, source: SeededSource) -> SimResult<Self> {
        Ok(Self::from_run(Run::with_source(config, source)?))
    }

    fn from_run(run: Run) -> Self {
        Self {
            run,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            history: None,
        }
    }

    /// Spins between progress callbacks (at least 1)
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Record the running ledger, down-sampled to a bounded number of points
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.history = enabled.then(CreditHistory::default);
        self
    }

    /// Running ledger, starting at the pre-run balance; `None` unless enabled
    pub fn history(&self) -> Option<&CreditHistory> {
        self.history.as_ref()
    }

    /// Play `spins` games and report. Calling again continues the same run.
    pub fn run<F>(&mut self, spins: u64, mut progress: F) -> SimResult<SimulationReport>
    where
        F: FnMut(&Progress),
    {
        if spins == 0 {
            return Err(SimError::InvalidSpinCount(spins));
        }

        let config = self.run.config();
        log::info!(
            "{}: simulating {} games ({:?} bonus model)",
            config.setting.label,
            spins,
            config.bonus.model
        );

        if let Some(history) = self.history.as_mut() {
            if history.is_empty() {
                history.push(self.run.state().total_payout);
            }
        }

        let start = Instant::now();
        let stake = self.run.config().stake;

        for done in 1..=spins {
            self.run.spin();
            if let Some(history) = self.history.as_mut() {
                history.push(self.run.state().total_payout);
            }
            if done % self.progress_interval == 0 || done == spins {
                let update = Progress {
                    done,
                    total: spins,
                    elapsed: start.elapsed(),
                    payout_rate: self.run.state().payout_rate(stake),
                };
                log::debug!(
                    "{}/{} games, rate {:.4}",
                    update.done,
                    update.total,
                    update.payout_rate
                );
                progress(&update);
            }
        }

        let report = SimulationReport::from_run(&self.run, start.elapsed());
        log::info!(
            "{}: finished {} games in {:.2}s, payout rate {:.4}",
            report.label,
            report.games,
            report.elapsed_secs,
            report.payout_rate
        );
        Ok(report)
    }
}
