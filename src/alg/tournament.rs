//! Tournament-based priority rule heuristic for RCPSP/t, after Hartmann
//! (2013).
//!
//! The algorithm preprocesses the instance into a per-activity CPRU priority
//! value (critical path length times extended resource utilization) and then
//! runs a fixed number of serial schedule generation passes. Each pass
//! repeatedly draws a random tournament from the eligible activities, places
//! the highest-priority sample at its earliest resource-feasible finish time,
//! and commits its demand; the best makespan over all passes wins. Serial
//! generation keeps every partial schedule resource-feasible by construction,
//! so no pass ever backtracks.

use std::collections::VecDeque;
use std::time::Instant;

use log::debug;
use ordered_float::OrderedFloat;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::alg::core::{Solution, SolveError, Stats};
use crate::problem::Problem;
use crate::Time;

/// Fraction of the eligible set sampled into each tournament.
const TOURN_FACTOR: f64 = 0.5;
/// Weight of an activity's own demand/availability ratio in its utilization.
const OMEGA_1: f64 = 0.4;
/// Weight of the accumulated successor utilization.
const OMEGA_2: f64 = 0.6;

/// Run `passes` tournament passes on `problem` and keep the best schedule.
///
/// Scratch buffers are allocated once up front and reused by every pass.
pub(crate) fn schedule<R>(
    problem: &Problem,
    passes: usize,
    rng: &mut R,
) -> Result<(Solution, Stats), SolveError>
where
    R: Rng + ?Sized,
{
    let start = Instant::now();
    let n = problem.njobs();

    let ef = earliest_feasible_finish(problem)?;
    let ls = latest_feasible_start(problem)?;
    let ru = resource_utilization(problem, &ef, &ls);
    // CPRU: critical path length from the latest feasible start, scaled by
    // the resource pressure below the activity. Higher is better.
    let cpru: Vec<f64> = (0..n)
        .map(|job| (problem.horizon() - ls[job]) as f64 * ru[job])
        .collect();
    debug!(
        "preprocessing done: critical path bound {}, horizon {}",
        ef[problem.sink()],
        problem.horizon()
    );

    let unit = Uniform::new(0.0f64, 1.0);

    let mut available = problem.capacities().to_vec();
    let mut schedule: Vec<Option<Time>> = vec![None; n];
    let mut eligible: Vec<usize> = Vec::with_capacity(n);
    let mut selected: Vec<usize> = Vec::with_capacity(n);
    let mut best = vec![0; n];
    let mut best_value = Time::MAX;
    let mut improvements = 0;

    for pass in 0..passes {
        for (row, capacities) in available.iter_mut().zip(problem.capacities()) {
            row.copy_from_slice(capacities);
        }
        schedule.fill(None);
        schedule[0] = Some(0);

        for _ in 1..n {
            eligible.clear();
            eligible.extend((1..n).filter(|&job| {
                schedule[job].is_none()
                    && problem
                        .predecessors(job)
                        .iter()
                        .all(|&p| schedule[p].is_some())
            }));

            // Sample a fraction of the eligible activities with replacement.
            let z = ((TOURN_FACTOR * eligible.len() as f64) as usize).max(2);
            selected.clear();
            for _ in 0..z {
                let choice = (unit.sample(rng) * eligible.len() as f64) as usize;
                selected.push(eligible[choice]);
            }

            let winner = pick_winner(&selected, &cpru);

            // Earliest finish under precedence, then advanced until the
            // remaining availabilities admit the activity.
            let duration = problem.duration(winner);
            let mut finish = problem
                .predecessors(winner)
                .iter()
                .map(|&p| schedule[p].expect("eligible implies scheduled predecessors") + duration)
                .max()
                .unwrap_or(duration);
            loop {
                if finish > problem.horizon() {
                    return Err(SolveError::ScheduleConstructionFailed);
                }
                if !violates_finish(problem, winner, finish, &available) {
                    break;
                }
                finish += 1;
            }

            schedule[winner] = Some(finish);
            for (resource, row) in available.iter_mut().enumerate() {
                let requests = problem.requests(winner, resource);
                for t in 0..duration {
                    row[finish - duration + t] -= requests[t];
                }
            }
        }

        let makespan = schedule[problem.sink()].expect("complete pass schedules every activity");
        if makespan < best_value {
            debug!("pass {pass}: makespan improved to {makespan}");
            best_value = makespan;
            for (slot, finish) in best.iter_mut().zip(&schedule) {
                *slot = finish.expect("complete pass schedules every activity");
            }
            improvements += 1;
        }
    }

    if best_value > problem.horizon() {
        return Err(SolveError::ScheduleConstructionFailed);
    }

    let stats = Stats {
        value: best_value,
        passes,
        improvements,
        elapsed: start.elapsed(),
    };
    let solution = Solution {
        finish: best,
        value: best_value,
    };
    Ok((solution, stats))
}

/// Earliest feasible finish time of every activity: a breadth-first forward
/// traversal from the dummy source propagates precedence lower bounds, and
/// each visited activity advances its tentative finish past every period
/// where its demand exceeds the raw capacity.
///
/// Re-visiting an activity through another predecessor path is safe: finish
/// times only grow and the feasibility advance resumes from the prior value.
fn earliest_feasible_finish(problem: &Problem) -> Result<Vec<Time>, SolveError> {
    let mut ef = vec![0; problem.njobs()];
    let mut queue = VecDeque::new();
    queue.push_back(0);

    while let Some(job) = queue.pop_front() {
        loop {
            if ef[job] > problem.horizon() {
                return Err(SolveError::InstanceInfeasible);
            }
            if !violates_finish(problem, job, ef[job], problem.capacities()) {
                break;
            }
            ef[job] += 1;
        }
        for &s in problem.successors(job) {
            ef[s] = ef[s].max(ef[job] + problem.duration(s));
            queue.push_back(s);
        }
    }
    Ok(ef)
}

/// Latest feasible start time of every activity; the mirror image of
/// [`earliest_feasible_finish`], traversing backward from the dummy sink with
/// starts initialized to the horizon and decremented below every violation.
fn latest_feasible_start(problem: &Problem) -> Result<Vec<Time>, SolveError> {
    let mut ls = vec![problem.horizon(); problem.njobs()];
    let mut queue = VecDeque::new();
    queue.push_back(problem.sink());

    while let Some(job) = queue.pop_front() {
        loop {
            if !violates_start(problem, job, ls[job]) {
                break;
            }
            if ls[job] == 0 {
                return Err(SolveError::InstanceInfeasible);
            }
            ls[job] -= 1;
        }
        for &p in problem.predecessors(job) {
            let start = ls[job]
                .checked_sub(problem.duration(p))
                .ok_or(SolveError::InstanceInfeasible)?;
            ls[p] = ls[p].min(start);
            queue.push_back(p);
        }
    }
    Ok(ls)
}

/// Extended resource utilization of every activity: its own demand relative
/// to the capacity available between earliest start and latest finish,
/// weighted against the accumulated utilization of its successors.
///
/// Activities are processed in reverse topological order so each successor's
/// value is final before any predecessor reads it. Degenerate values (no
/// resources, an empty availability window) collapse to 0.
fn resource_utilization(problem: &Problem, ef: &[Time], ls: &[Time]) -> Vec<f64> {
    let mut ru = vec![0.0; problem.njobs()];

    for &job in problem.topological_order().iter().rev() {
        let duration = problem.duration(job);
        let earliest_start = ef[job] - duration;
        let latest_finish = ls[job] + duration;

        let demand: Time = (0..problem.nresources())
            .map(|k| problem.requests(job, k).iter().sum::<Time>())
            .sum();
        let availability: Time = if earliest_start < latest_finish {
            (0..problem.nresources())
                .map(|k| problem.capacity(k)[earliest_start..latest_finish].iter().sum::<Time>())
                .sum()
        } else {
            0
        };

        let own = (problem.successors(job).len() as f64 / problem.nresources() as f64)
            * (demand as f64 / availability as f64);
        let mut value = OMEGA_1 * own;
        for &s in problem.successors(job) {
            value += OMEGA_2 * ru[s];
        }
        ru[job] = if value.is_finite() && value >= 0.0 {
            value
        } else {
            0.0
        };
    }
    ru
}

/// The tournament winner: the sample with the highest priority, later
/// samples winning ties (`max_by_key` keeps the last maximum).
fn pick_winner(selected: &[usize], cpru: &[f64]) -> usize {
    selected
        .iter()
        .copied()
        .max_by_key(|&job| OrderedFloat(cpru[job]))
        .expect("tournament selects at least two candidates")
}

/// Does finishing `job` at `finish` exceed any remaining availability?
fn violates_finish(problem: &Problem, job: usize, finish: Time, available: &[Vec<Time>]) -> bool {
    let duration = problem.duration(job);
    (0..problem.nresources()).any(|k| {
        let requests = problem.requests(job, k);
        (0..duration).any(|t| requests[t] > available[k][finish - duration + t])
    })
}

/// Does starting `job` at `start` exceed the raw capacities?
fn violates_start(problem: &Problem, job: usize, start: Time) -> bool {
    let duration = problem.duration(job);
    (0..problem.nresources()).any(|k| {
        let requests = problem.requests(job, k);
        (0..duration).any(|t| requests[t] > problem.capacity(k)[start + t])
    })
}
