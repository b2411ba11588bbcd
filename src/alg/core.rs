use std::time::Duration;

use thiserror::Error;

use crate::problem::Problem;
use crate::Time;

/// Data structure holding the resulting finish times and objective `value`.
///
/// The schedule is represented as a vector of absolute finish times indexed
/// by activity; the dummy source always finishes at 0 and the sink's finish
/// time equals `value`, the makespan of the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// assignment: activity `j` -> finish time (i.e. `finish[j] = f`)
    pub finish: Vec<Time>,
    /// total makespan (finish time of the dummy sink)
    pub value: Time,
}

impl Solution {
    /// Starting times implied by the finish times, i.e.
    /// `start[j] = finish[j] - durations[j]`.
    pub fn start_times(&self, problem: &Problem) -> Vec<Time> {
        self.finish
            .iter()
            .zip(problem.durations())
            .map(|(&finish, &duration)| finish - duration)
            .collect()
    }
}

/// Data structure that contains various statistics collected during the
/// scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// total makespan of the best schedule found
    pub value: Time,
    /// no. schedule generation passes run
    pub passes: usize,
    /// no. passes that improved the retained best makespan
    pub improvements: u32,
    /// elapsed time since scheduling started
    pub elapsed: Duration,
}

/// Why a solve call produced no schedule.
///
/// Neither failure is recoverable within the call: the solve aborts and the
/// caller decides whether to retry with a longer horizon.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SolveError {
    /// Preprocessing proved that some activity cannot fit within the horizon
    /// under precedence and resource bounds alone.
    #[error("an activity cannot meet the horizon under precedence and resource bounds")]
    InstanceInfeasible,
    /// A schedule generation pass ran an activity past the horizon.
    #[error("a scheduling pass could not place an activity within the horizon")]
    ScheduleConstructionFailed,
}
