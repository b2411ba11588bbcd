//! Post-hoc feasibility check of a finish-time assignment.
//!
//! The solver keeps its schedules feasible by construction, so this module is
//! an independent witness: it re-derives start times from the finish times
//! and replays every demand against the raw capacities.

use thiserror::Error;

use crate::problem::Problem;
use crate::Time;

/// First constraint violation found in a finish-time assignment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("expected {expected} finish times, got {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("activity {job} finishes at {finish}, before its own duration has elapsed")]
    ImpossibleFinish { job: usize, finish: Time },
    #[error("activity {job} finishes at {finish}, past the horizon")]
    HorizonExceeded { job: usize, finish: Time },
    #[error("activity {job} starts before predecessor {predecessor} finishes")]
    Precedence { job: usize, predecessor: usize },
    #[error("resource {resource} demand exceeds availability at t={time}")]
    Overcommitted { resource: usize, time: Time },
}

/// Verify that `finish` satisfies every precedence and resource constraint of
/// `problem`.
///
/// Returns the first violation encountered; `Ok(())` means the assignment is
/// a feasible schedule assigning a time to every activity.
pub fn validate(problem: &Problem, finish: &[Time]) -> Result<(), Violation> {
    if finish.len() != problem.njobs() {
        return Err(Violation::LengthMismatch {
            expected: problem.njobs(),
            found: finish.len(),
        });
    }

    for job in 0..problem.njobs() {
        let duration = problem.duration(job);
        if finish[job] < duration {
            return Err(Violation::ImpossibleFinish {
                job,
                finish: finish[job],
            });
        }
        if finish[job] > problem.horizon() {
            return Err(Violation::HorizonExceeded {
                job,
                finish: finish[job],
            });
        }
        let start = finish[job] - duration;
        for &predecessor in problem.predecessors(job) {
            if start < finish[predecessor] {
                return Err(Violation::Precedence { job, predecessor });
            }
        }
    }

    let mut available = problem.capacities().to_vec();
    for job in 0..problem.njobs() {
        let duration = problem.duration(job);
        for (resource, row) in available.iter_mut().enumerate() {
            let requests = problem.requests(job, resource);
            for t in 0..duration {
                let time = finish[job] - duration + t;
                if requests[t] > row[time] {
                    return Err(Violation::Overcommitted { resource, time });
                }
                row[time] -= requests[t];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    /// Diamond `0 -> {1, 2} -> 3` over one unit-capacity resource.
    fn diamond() -> Problem {
        Problem::new(
            10,
            vec![0, 3, 3, 0],
            vec![vec![1, 2], vec![3], vec![3], vec![]],
            vec![
                vec![vec![]],
                vec![vec![1, 1, 1]],
                vec![vec![1, 1, 1]],
                vec![vec![]],
            ],
            vec![vec![1; 10]],
        )
        .expect("well-formed instance")
    }

    #[rstest]
    #[case::sequential(&[0, 3, 6, 6])]
    #[case::reversed(&[0, 6, 3, 6])]
    #[case::with_idle_time(&[0, 3, 8, 8])]
    fn feasible_schedules_pass(#[case] finish: &[Time]) {
        assert_eq!(validate(&diamond(), finish), Ok(()));
    }

    #[test]
    fn overlapping_demands_are_caught() {
        assert_eq!(
            validate(&diamond(), &[0, 3, 3, 3]),
            Err(Violation::Overcommitted {
                resource: 0,
                time: 0
            })
        );
    }

    #[test]
    fn precedence_violations_are_caught() {
        assert_eq!(
            validate(&diamond(), &[0, 6, 3, 5]),
            Err(Violation::Precedence {
                job: 3,
                predecessor: 1
            })
        );
    }

    #[test]
    fn horizon_overruns_are_caught() {
        assert_eq!(
            validate(&diamond(), &[0, 3, 11, 11]),
            Err(Violation::HorizonExceeded { job: 2, finish: 11 })
        );
    }

    #[test]
    fn incomplete_assignments_are_caught() {
        assert_eq!(
            validate(&diamond(), &[0, 3, 6]),
            Err(Violation::LengthMismatch {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn finish_below_duration_is_caught() {
        assert_eq!(
            validate(&diamond(), &[0, 2, 6, 6]),
            Err(Violation::ImpossibleFinish { job: 1, finish: 2 })
        );
    }
}
