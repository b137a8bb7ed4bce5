//! Interactive terminal play

use std::io::{BufRead, Write};

use anyhow::Result;
use hb_engine::{
    BonusKind, MachineConfig, Mode, RandomSource, Run, SeededSource, SpinEvent, SpinOutcome,
};

/// A bonus start seen during play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusRecord {
    pub game: u64,
    pub kind: BonusKind,
    /// Normal games since the previous round, this one included; zero for a
    /// continuation
    pub games_from_previous: u32,
    pub mode: Mode,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySummary {
    pub games: u64,
    pub credits: f64,
    pub bonuses: Vec<BonusRecord>,
}

/// Play a seeded session on stdin/stdout-like streams
pub fn run<I: BufRead, O: Write>(
    config: MachineConfig,
    credits: u64,
    seed: Option<u64>,
    input: I,
    output: O,
) -> Result<PlaySummary> {
    let run = Run::with_source(config, SeededSource::new(seed))?;
    session(run, credits as f64, input, output)
}

/// Enter spins once, `s` spins until the next bonus, `q` quits. The session
/// also ends on end of input or when credits drop below the stake.
pub fn session<R: RandomSource, I: BufRead, O: Write>(
    mut run: Run<R>,
    mut credits: f64,
    mut input: I,
    mut output: O,
) -> Result<PlaySummary> {
    let stake = f64::from(run.config().stake);
    let start = credits;
    let mut bonuses = Vec::new();

    writeln!(
        output,
        "{} - {credits:.0} credits. [Enter] spin, s skip to next bonus, q quit",
        run.config().setting.label
    )?;

    loop {
        if credits < stake {
            writeln!(output, "Not enough credits!")?;
            break;
        }
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "q" | "quit" => break,
            "" => {
                let outcome = spin_once(&mut run, &mut credits, &mut bonuses);
                writeln!(output, "{}", describe(&outcome))?;
            }
            "s" | "skip" => {
                let mut skipped = 0u64;
                loop {
                    if credits < stake {
                        writeln!(output, "Not enough credits! ({skipped} games skipped)")?;
                        break;
                    }
                    let outcome = spin_once(&mut run, &mut credits, &mut bonuses);
                    skipped += 1;
                    if let SpinEvent::BonusStart { kind, .. } = outcome.event {
                        writeln!(
                            output,
                            "*** SKIPPED TO {kind} BONUS after {skipped} games! +{:.0} ***",
                            outcome.payout
                        )?;
                        break;
                    }
                }
            }
            other => {
                writeln!(output, "Unknown command {other:?}")?;
                continue;
            }
        }

        let state = run.state();
        writeln!(
            output,
            "  credits {credits:.1} | mode {} | since bonus {} | game {}",
            state.mode, state.games_since_bonus, state.total_games
        )?;
    }

    let summary = PlaySummary {
        games: run.state().total_games,
        credits,
        bonuses,
    };

    writeln!(
        output,
        "\nPlayed {} games: {:.1} -> {:.1} credits, {} bonuses",
        summary.games,
        start,
        summary.credits,
        summary.bonuses.len()
    )?;
    for bonus in &summary.bonuses {
        writeln!(
            output,
            "  {} at game {} ({}G, mode {})",
            bonus.kind, bonus.game, bonus.games_from_previous, bonus.mode
        )?;
    }
    log::debug!("play session ended after {} games", summary.games);
    Ok(summary)
}

fn spin_once<R: RandomSource>(
    run: &mut Run<R>,
    credits: &mut f64,
    bonuses: &mut Vec<BonusRecord>,
) -> SpinOutcome {
    let since = run.state().games_since_bonus;
    let outcome = run.spin();
    *credits += outcome.net;

    let started = match outcome.event {
        SpinEvent::BonusStart { kind, .. } => Some((kind, since + 1)),
        SpinEvent::BonusEnd { end } if end.continued => Some((BonusKind::Big, 0)),
        _ => None,
    };
    if let Some((kind, games_from_previous)) = started {
        bonuses.push(BonusRecord {
            game: outcome.game,
            kind,
            games_from_previous,
            mode: outcome.mode_after,
        });
    }
    outcome
}

/// One-line narration of a spin
pub fn describe(outcome: &SpinOutcome) -> String {
    match outcome.event {
        SpinEvent::Miss => "...".to_string(),
        SpinEvent::Symbol {
            symbol,
            upgraded_to,
        } => match upgraded_to {
            Some(mode) => format!("{symbol} +{:.0} (mode up: {mode})", outcome.payout),
            None => format!("{symbol} +{:.0}", outcome.payout),
        },
        SpinEvent::BonusStart { kind, trigger } => {
            format!("*** {kind} BONUS! ({trigger}) +{:.0} ***", outcome.payout)
        }
        SpinEvent::BonusGame {
            remaining,
            continuation_queued,
        } => {
            let queued = if continuation_queued { ", BIG queued!" } else { "" };
            format!("bonus game +{:.1}, {remaining} left{queued}", outcome.payout)
        }
        SpinEvent::BonusEnd { end } if end.continued => {
            format!("bonus game +{:.1}, next BIG starts now!", outcome.payout)
        }
        SpinEvent::BonusEnd { end } => {
            format!("bonus game +{:.1}, round over ({})", outcome.payout, end.next_mode)
        }
    }
}
