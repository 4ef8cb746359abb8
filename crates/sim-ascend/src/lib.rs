#![deny(warnings)]

//! Branch-and-bound search over ascend timings.
//!
//! Each node of the search answers "given this multiplier from this start
//! step, how fast can the goal be reached?". Its baseline is the no-ascend
//! oracle time; its children try ascending at candidate offsets, where the
//! multiplier earned at offset `i` comes from the richest state reachable in
//! `i` ticks. A shared [`SearchBound`] carries the best total found anywhere
//! in the tree plus per-step multiplier records, both updated monotonically
//! and used only to prune. The tree is walked depth-first over an explicit
//! frame stack, so search depth never meets the machine call stack, and
//! children inside a node are picked by bisecting the remaining candidate
//! list, which lets the bulk prunes discard whole flanks at once.

use serde::Serialize;
use sim_core::EconomyState;
use sim_oracle::{max_reachable_by, time_to_goal, SimError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Tuning knobs for one `solve` call.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// Enable best-time, gain-flank, and dominance pruning. Disabling turns
    /// the search exhaustive; the answer must not change, only the cost.
    pub pruning: bool,
    /// Optional search budget in oracle invocations; exhausting it yields a
    /// best-effort report with `complete: false`.
    pub max_oracle_calls: Option<u64>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            pruning: true,
            max_oracle_calls: None,
        }
    }
}

/// One chosen ascend point: the absolute step it happens at and the
/// multiplier held from then on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AscendCombo {
    /// Absolute step of the reset (or of the branch start for the leading
    /// entry).
    pub step: u64,
    /// Income multiplier in force from this step.
    pub multiplier: f64,
}

/// Caller-owned instrumentation filled in during the search.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchStats {
    /// Nodes expanded (baseline oracles run).
    pub nodes: u64,
    /// Total oracle invocations (baselines plus candidate evaluations).
    pub oracle_calls: u64,
    /// Candidates discarded because the global best already covers them.
    pub pruned_by_best_time: u64,
    /// Candidates discarded for insufficient multiplier gain.
    pub pruned_by_gain: u64,
    /// Candidates dominated by an earlier, stronger recorded ascend.
    pub pruned_dominated: u64,
}

/// Final answer: the minimum time found and the ascend schedule achieving
/// it. The schedule always opens with the branch-start entry
/// `(start_time, multiplier)`.
#[derive(Clone, Debug, Serialize)]
pub struct SolverReport {
    /// Ticks from `start_time` to the goal.
    pub total_time: u64,
    /// Ordered `(step, multiplier)` pairs, starting entry included.
    pub schedule: Vec<AscendCombo>,
    /// False when the oracle budget ran out and flanks went unexplored.
    pub complete: bool,
    /// Search instrumentation.
    pub stats: SearchStats,
}

/// Search failures.
#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    /// The underlying simulation reported the goal unreachable (or tripped
    /// its defensive round cap).
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Shared pruning state: scalar bounds only, never schedules. `best_time`
/// is absolute (root start included) and only ever decreases; recorded
/// multipliers only ever increase. Stale reads therefore cost redundant
/// work, never wrong answers.
struct SearchBound {
    best_time: u64,
    best_mult_by_step: BTreeMap<u64, f64>,
}

impl SearchBound {
    fn new() -> Self {
        Self {
            best_time: u64::MAX,
            best_mult_by_step: BTreeMap::new(),
        }
    }

    fn update_best(&mut self, total: u64) {
        if total < self.best_time {
            self.best_time = total;
        }
    }

    fn record_mult(&mut self, step: u64, mult: f64) {
        let entry = self.best_mult_by_step.entry(step).or_insert(mult);
        if *entry < mult {
            *entry = mult;
        }
    }

    /// A strictly stronger multiplier is already known at this step or
    /// earlier.
    fn dominated(&self, step: u64, mult: f64) -> bool {
        self.best_mult_by_step.range(..=step).any(|(_, &m)| m > mult)
    }
}

/// One node of the depth-first walk: "continue from `multiplier` at
/// `start_time`".
struct Frame {
    start_time: u64,
    multiplier: f64,
    /// Reset template this node's ghosts are cloned from.
    state: EconomyState,
    /// Sorted candidate offsets not yet visited.
    remaining: Vec<u64>,
    /// Best ticks-to-goal from this node's start found so far.
    best_total: u64,
    /// Schedule of the winning child, if any child won.
    best_child: Option<Vec<AscendCombo>>,
    /// Offset of the child currently being explored.
    pending: Option<u64>,
}

struct Search {
    goal: f64,
    options: SolverOptions,
    bound: SearchBound,
    stats: SearchStats,
    truncated: bool,
}

impl Search {
    /// Budget gate for candidate evaluations; flips `truncated` once spent.
    fn budget_ok(&mut self) -> bool {
        if let Some(max) = self.options.max_oracle_calls {
            if self.stats.oracle_calls >= max {
                self.truncated = true;
                return false;
            }
        }
        true
    }

    fn enter(&mut self, state: EconomyState, start_time: u64) -> Result<Frame, SolverError> {
        self.stats.nodes += 1;
        let mut ghost = state.clone();
        let baseline = time_to_goal(&mut ghost, self.goal)?;
        self.stats.oracle_calls += 1;
        // The no-ascend continuation is itself a complete solution.
        self.bound.update_best(start_time + baseline);

        let cfg = state.config();
        let lo = cfg.min_ascend_offset;
        let hi = baseline.saturating_sub(cfg.min_ascend_offset);
        // A goal at or below the equilibrium can never fund a multiplier:
        // the node is terminal.
        let remaining: Vec<u64> = if cfg.ascend_value(self.goal) > 1.0 && lo <= hi {
            (lo..=hi).collect()
        } else {
            Vec::new()
        };
        debug!(
            start_time,
            multiplier = state.income_multiplier,
            baseline,
            candidates = remaining.len(),
            "node entered"
        );
        Ok(Frame {
            start_time,
            multiplier: state.income_multiplier,
            state,
            remaining,
            best_total: baseline,
            best_child: None,
            pending: None,
        })
    }
}

/// Minimum ticks from `start_time` for `state` to reach `goal`, ascending
/// whenever that is strictly faster. The returned time is never worse than
/// the plain no-ascend oracle time.
pub fn solve(
    state: &EconomyState,
    goal: f64,
    start_time: u64,
    options: &SolverOptions,
) -> Result<SolverReport, SolverError> {
    let mut search = Search {
        goal,
        options: options.clone(),
        bound: SearchBound::new(),
        stats: SearchStats::default(),
        truncated: false,
    };

    if goal <= state.money {
        return Ok(SolverReport {
            total_time: 0,
            schedule: vec![AscendCombo {
                step: start_time,
                multiplier: state.income_multiplier,
            }],
            complete: true,
            stats: search.stats,
        });
    }

    let root = search.enter(state.clone(), start_time)?;
    let mut stack: Vec<Frame> = vec![root];
    let mut finished: Option<(u64, Vec<AscendCombo>)> = None;

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };

        // Fold the just-finished child, if any, into this node.
        if let (Some(offset), Some((child_total, child_sched))) =
            (frame.pending.take(), finished.take())
        {
            let total = offset + child_total;
            if total < frame.best_total {
                frame.best_total = total;
                frame.best_child = Some(child_sched);
                search.bound.update_best(frame.start_time + total);
            }
        }

        // Pick the next surviving candidate by bisection.
        let mut child: Option<(u64, f64)> = None;
        while !frame.remaining.is_empty() {
            if search.truncated {
                frame.remaining.clear();
                break;
            }
            let i = frame.remaining.remove(frame.remaining.len() / 2);

            if search.options.pruning && search.bound.best_time <= frame.start_time + i {
                // Even an instant finish after ascending at `i` cannot beat
                // the best known total; every larger offset is worse still.
                let before = frame.remaining.len() as u64;
                frame.remaining.retain(|&c| c < i);
                search.stats.pruned_by_best_time += 1 + before - frame.remaining.len() as u64;
                continue;
            }
            if !search.budget_ok() {
                continue;
            }

            let mut ghost = frame.state.clone();
            let money_i = max_reachable_by(&mut ghost, i);
            search.stats.oracle_calls += 1;

            let cfg = frame.state.config();
            let mult_i = cfg.ascend_value(money_i);
            if mult_i < frame.multiplier * cfg.ascend_gain_threshold {
                // Not enough gain to pay for the reset. Gain grows with the
                // offset, so the smaller flank is dead too; the skip itself
                // applies even without pruning, as the termination
                // guarantee.
                if search.options.pruning {
                    let before = frame.remaining.len() as u64;
                    frame.remaining.retain(|&c| c > i);
                    search.stats.pruned_by_gain += 1 + before - frame.remaining.len() as u64;
                }
                continue;
            }

            let abs_step = frame.start_time + i;
            if search.options.pruning && search.bound.dominated(abs_step, mult_i) {
                search.stats.pruned_dominated += 1;
                continue;
            }
            search.bound.record_mult(abs_step, mult_i);
            // Ascending never lowers the multiplier.
            child = Some((i, mult_i.max(frame.multiplier)));
            break;
        }

        if let Some((offset, mult)) = child {
            frame.pending = Some(offset);
            let mut child_state = frame.state.clone();
            child_state.reset(mult);
            let abs_step = frame.start_time + offset;
            let child_frame = search.enter(child_state, abs_step)?;
            stack.push(child_frame);
            continue;
        }

        // Node exhausted: report the winner up the stack.
        let mut schedule = vec![AscendCombo {
            step: frame.start_time,
            multiplier: frame.multiplier,
        }];
        if let Some(child_sched) = frame.best_child.take() {
            schedule.extend(child_sched);
        }
        finished = Some((frame.best_total, schedule));
        stack.pop();
    }

    let Some((total_time, schedule)) = finished else {
        unreachable!("root frame always produces a result");
    };
    debug!(
        total_time,
        ascends = schedule.len() - 1,
        complete = !search.truncated,
        "search finished"
    );
    Ok(SolverReport {
        total_time,
        schedule,
        complete: !search.truncated,
        stats: search.stats,
    })
}
