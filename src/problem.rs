//! Immutable RCPSP/t problem instances.
//!
//! A [`Problem`] is constructed once (by [`Problem::new`] or the
//! [`parser`](crate::parser)), validated eagerly, and only read afterwards.
//! Activities are indexed `0..njobs`; activity `0` is the dummy source and
//! `njobs - 1` the dummy sink, both with zero duration and no demand. An
//! activity finishing at `f` occupies the absolute periods
//! `f - duration .. f` and consumes `requests[j][k][t]` units of resource `k`
//! at absolute time `f - duration + t`.

use std::collections::VecDeque;

use daggy::petgraph::algo::toposort;
use daggy::Dag;
use thiserror::Error;

use crate::Time;

/// Precedence relation over activities.
type Prec = Dag<(), (), u32>;

/// Error raised by [`Problem::new`] for malformed instances.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProblemError {
    #[error("an instance needs at least the two dummy activities, got {0}")]
    TooFewJobs(usize),
    #[error("the scheduling horizon must be positive")]
    EmptyHorizon,
    #[error("expected {expected} {what}, got {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("activity {job} lists successor {successor} outside the instance")]
    SuccessorOutOfRange { job: usize, successor: usize },
    #[error("the precedence relation contains a cycle")]
    CyclicPrecedence,
    #[error("dummy activity {job} must have zero duration")]
    DummyDuration { job: usize },
    #[error("activity {job} is not connected to both dummy activities")]
    Disconnected { job: usize },
}

/// An immutable RCPSP/t instance.
///
/// Owns the precedence relation in both directions (successor lists as given,
/// predecessor lists derived by inversion) together with a topological order
/// of the activities, so solver passes never have to re-derive graph facts.
#[derive(Debug, Clone)]
pub struct Problem {
    horizon: Time,
    durations: Vec<Time>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// `requests[j][k][t]` for `t < durations[j]`; jagged in the last axis.
    requests: Vec<Vec<Vec<Time>>>,
    /// `capacities[k][t]` for `t < horizon`; rectangular.
    capacities: Vec<Vec<Time>>,
    topo: Vec<usize>,
}

impl Problem {
    /// Build and validate an instance.
    ///
    /// The number of activities is `durations.len()` and the number of
    /// resources `capacities.len()`. Rejects instances with fewer than two
    /// activities, a zero horizon, mismatched array shapes, successor indices
    /// out of range, cyclic precedence, non-zero dummy durations, or
    /// activities not connected to both dummies.
    pub fn new(
        horizon: Time,
        durations: Vec<Time>,
        successors: Vec<Vec<usize>>,
        requests: Vec<Vec<Vec<Time>>>,
        capacities: Vec<Vec<Time>>,
    ) -> Result<Self, ProblemError> {
        let njobs = durations.len();
        let nresources = capacities.len();

        if njobs < 2 {
            return Err(ProblemError::TooFewJobs(njobs));
        }
        if horizon == 0 {
            return Err(ProblemError::EmptyHorizon);
        }
        check_shape("successor lists", njobs, successors.len())?;
        check_shape("request matrices", njobs, requests.len())?;
        for (job, rows) in requests.iter().enumerate() {
            check_shape("request rows per activity", nresources, rows.len())?;
            for row in rows {
                check_shape("request periods per row", durations[job], row.len())?;
            }
        }
        for row in &capacities {
            check_shape("capacity periods per resource", horizon, row.len())?;
        }
        for job in [0, njobs - 1] {
            if durations[job] > 0 {
                return Err(ProblemError::DummyDuration { job });
            }
        }

        for (job, succs) in successors.iter().enumerate() {
            if let Some(&successor) = succs.iter().find(|&&s| s >= njobs) {
                return Err(ProblemError::SuccessorOutOfRange { job, successor });
            }
        }

        // The DAG both rejects cycles (daggy refuses closing edges) and
        // yields the topological order reused by the solver passes.
        let mut precedence = Prec::new();
        let nodes: Vec<_> = (0..njobs).map(|_| precedence.add_node(())).collect();
        for (job, succs) in successors.iter().enumerate() {
            for &s in succs {
                precedence
                    .add_edge(nodes[job], nodes[s], ())
                    .map_err(|_| ProblemError::CyclicPrecedence)?;
            }
        }
        let topo = toposort(&precedence, None)
            .expect("daggy rejects cycles at edge insertion")
            .into_iter()
            .map(|node| node.index())
            .collect();

        let mut predecessors = vec![Vec::new(); njobs];
        for (job, succs) in successors.iter().enumerate() {
            for &s in succs {
                predecessors[s].push(job);
            }
        }

        let problem = Self {
            horizon,
            durations,
            successors,
            predecessors,
            requests,
            capacities,
            topo,
        };
        problem.check_connected()?;
        Ok(problem)
    }

    /// Every activity must descend from the source and reach the sink.
    fn check_connected(&self) -> Result<(), ProblemError> {
        let from_source = self.reachable(0, |job| &self.successors[job]);
        let to_sink = self.reachable(self.sink(), |job| &self.predecessors[job]);
        match (0..self.njobs()).find(|&job| !from_source[job] || !to_sink[job]) {
            Some(job) => Err(ProblemError::Disconnected { job }),
            None => Ok(()),
        }
    }

    fn reachable<'a>(&'a self, start: usize, adj: impl Fn(usize) -> &'a [usize]) -> Vec<bool> {
        let mut seen = vec![false; self.njobs()];
        seen[start] = true;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(job) = queue.pop_front() {
            for &next in adj(job) {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Number of activities, dummies included.
    pub fn njobs(&self) -> usize {
        self.durations.len()
    }

    /// Number of renewable resources.
    pub fn nresources(&self) -> usize {
        self.capacities.len()
    }

    /// Maximum admissible finish time.
    pub fn horizon(&self) -> Time {
        self.horizon
    }

    /// Index of the dummy sink activity.
    pub fn sink(&self) -> usize {
        self.durations.len() - 1
    }

    pub fn duration(&self, job: usize) -> Time {
        self.durations[job]
    }

    pub fn durations(&self) -> &[Time] {
        &self.durations
    }

    pub fn successors(&self, job: usize) -> &[usize] {
        &self.successors[job]
    }

    pub fn predecessors(&self, job: usize) -> &[usize] {
        &self.predecessors[job]
    }

    /// Demand of `job` on `resource` at each local period of its execution.
    pub fn requests(&self, job: usize, resource: usize) -> &[Time] {
        &self.requests[job][resource]
    }

    /// Capacity of `resource` at each absolute period of the horizon.
    pub fn capacity(&self, resource: usize) -> &[Time] {
        &self.capacities[resource]
    }

    pub fn capacities(&self) -> &[Vec<Time>] {
        &self.capacities
    }

    /// Activities in an order compatible with the precedence relation.
    pub(crate) fn topological_order(&self) -> &[usize] {
        &self.topo
    }
}

fn check_shape(what: &'static str, expected: usize, found: usize) -> Result<(), ProblemError> {
    if expected == found {
        Ok(())
    } else {
        Err(ProblemError::ShapeMismatch {
            what,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn diamond() -> Result<Problem, ProblemError> {
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
    }

    #[test]
    fn diamond_is_well_formed() {
        let problem = diamond().expect("well-formed instance");
        assert_eq!(problem.njobs(), 4);
        assert_eq!(problem.nresources(), 1);
        assert_eq!(problem.sink(), 3);
        assert_eq!(problem.predecessors(3), &[1, 2]);
        assert_eq!(problem.requests(1, 0), &[1, 1, 1]);
    }

    #[test]
    fn topological_order_respects_precedence() {
        let problem = diamond().expect("well-formed instance");
        let position = |job: usize| {
            problem
                .topological_order()
                .iter()
                .position(|&j| j == job)
                .expect("every activity is ordered")
        };
        for job in 0..problem.njobs() {
            for &s in problem.successors(job) {
                assert!(position(job) < position(s));
            }
        }
    }

    #[test]
    fn cyclic_precedence_is_rejected() {
        let result = Problem::new(
            5,
            vec![0, 1, 1, 0],
            vec![vec![1], vec![2], vec![1, 3], vec![]],
            vec![vec![], vec![], vec![], vec![]],
            vec![],
        );
        assert_eq!(result.unwrap_err(), ProblemError::CyclicPrecedence);
    }

    #[test]
    fn dangling_successor_is_rejected() {
        let result = Problem::new(
            5,
            vec![0, 0],
            vec![vec![7], vec![]],
            vec![vec![], vec![]],
            vec![],
        );
        assert_eq!(
            result.unwrap_err(),
            ProblemError::SuccessorOutOfRange {
                job: 0,
                successor: 7
            }
        );
    }

    #[test]
    fn isolated_activity_is_rejected() {
        let result = Problem::new(
            5,
            vec![0, 1, 0],
            vec![vec![2], vec![2], vec![]],
            vec![vec![], vec![], vec![]],
            vec![],
        );
        assert_eq!(result.unwrap_err(), ProblemError::Disconnected { job: 1 });
    }

    #[rstest]
    #[case::no_jobs(vec![], vec![], vec![])]
    #[case::single_job(vec![0], vec![vec![]], vec![vec![]])]
    fn too_few_jobs_are_rejected(
        #[case] durations: Vec<Time>,
        #[case] successors: Vec<Vec<usize>>,
        #[case] requests: Vec<Vec<Vec<Time>>>,
    ) {
        let njobs = durations.len();
        let result = Problem::new(5, durations, successors, requests, vec![]);
        assert_eq!(result.unwrap_err(), ProblemError::TooFewJobs(njobs));
    }

    #[test]
    fn misshapen_request_row_is_rejected() {
        let result = Problem::new(
            5,
            vec![0, 2, 0],
            vec![vec![1], vec![2], vec![]],
            vec![vec![vec![]], vec![vec![1]], vec![vec![]]],
            vec![vec![1; 5]],
        );
        assert_eq!(
            result.unwrap_err(),
            ProblemError::ShapeMismatch {
                what: "request periods per row",
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn nonzero_dummy_duration_is_rejected() {
        let result = Problem::new(
            5,
            vec![1, 0],
            vec![vec![1], vec![]],
            vec![vec![], vec![]],
            vec![],
        );
        assert_eq!(result.unwrap_err(), ProblemError::DummyDuration { job: 0 });
    }
}
