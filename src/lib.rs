//! Heuristic solver for **RCPSP/t** task scheduling problems.
//!
//! RCPSP/t is the *resource-constrained project scheduling problem with
//! time-varying resource capacities and requests*: a set of non-preemptive
//! activities with integer durations and a precedence relation (a DAG with a
//! dummy source and sink) competes for renewable resources whose per-period
//! capacity, and per-activity per-period demand, vary over a discrete time
//! horizon. The objective is to **minimize the maximum completion time**
//! (makespan), i.e. the finish time of the dummy sink.
//!
//! Finding an optimal schedule is NP-hard already for constant capacities, so
//! this crate implements the tournament heuristic described by Hartmann (2013):
//! activities are ranked by a *critical path and resource utilization* (CPRU)
//! priority value and a serial schedule generation scheme repeatedly extends a
//! partial schedule with the winner of a random tournament among the eligible
//! activities. The best schedule over a fixed number of passes is kept.
//!
//! # Scheduler instances
//!
//! [`Scheduler`] selects the scheduling algorithm at construction. The
//! tournament heuristic is currently the only variant; it is approximate and
//! runs in `O(passes * n^2 * horizon)` worst-case time for `n` activities.
//!
//! # Examples
//!
//! A three-activity chain with a single unit-capacity resource:
//! ```
//! use rcpspt::{Problem, Scheduler};
//!
//! let problem = Problem::new(
//!     8,                                                   // horizon
//!     vec![0, 5, 0],                                       // durations
//!     vec![vec![1], vec![2], vec![]],                      // successors
//!     vec![vec![vec![]], vec![vec![1; 5]], vec![vec![]]],  // requests[j][k][t]
//!     vec![vec![1; 8]],                                    // capacities[k][t]
//! )
//! .expect("well-formed instance");
//!
//! let scheduler = Scheduler::Tournament { passes: 100, seed: Some(7) };
//! let (solution, stats) = scheduler.schedule(&problem).expect("feasible instance");
//!
//! assert_eq!(solution.finish, vec![0, 5, 5]);
//! assert_eq!(solution.value, 5);
//! assert_eq!(stats.value, solution.value);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

mod alg;
pub mod parser;
pub mod problem;
pub mod validate;

pub use alg::{Solution, SolveError, Stats};
pub use problem::{Problem, ProblemError};

/// Discrete time unit shared by durations, finish times, demands and
/// capacities. Absolute times range over `0..=horizon`.
pub type Time = usize;

/// Number of schedule generation passes run by [`Scheduler::default`].
pub const DEFAULT_PASSES: usize = 1000;

/// Scheduling algorithm for a RCPSP/t [`Problem`], chosen at construction.
///
/// The enum models the capability "given a problem, produce a finish-time
/// assignment"; further algorithms for the same problem class (e.g. a genetic
/// one) would slot in as additional variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    /// Tournament-based priority rule heuristic after Hartmann (2013).
    ///
    /// Runs `passes` independent serial schedule generation passes and keeps
    /// the best. `seed: None` seeds the generator from OS entropy; pass
    /// `Some` for reproducible schedules.
    Tournament { passes: usize, seed: Option<u64> },
}

impl Scheduler {
    /// Run the scheduling algorithm selected by this instance on `problem`.
    ///
    /// On success the returned [`Solution`] holds a finish time for every
    /// activity and the achieved makespan; [`Stats`] records how the search
    /// went. Failure means the instance admits no schedule within its horizon
    /// ([`SolveError::InstanceInfeasible`]) or no pass managed to place every
    /// activity ([`SolveError::ScheduleConstructionFailed`]).
    pub fn schedule(&self, problem: &Problem) -> Result<(Solution, Stats), SolveError> {
        match self {
            Self::Tournament { passes, seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                alg::tournament::schedule(problem, *passes, &mut rng)
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::Tournament {
            passes: DEFAULT_PASSES,
            seed: None,
        }
    }
}
