//! Plain-text RCPSP/t instance parser.
//!
//! Instances are whitespace-separated integer tokens; line breaks carry no
//! meaning. The token order is:
//!
//! 1. `njobs nresources horizon`
//! 2. for each activity `j` in `0..njobs`:
//!    - `duration`
//!    - `nsucc s_1 .. s_nsucc` (successor indices)
//!    - `nresources` rows of `duration` demands, one per resource
//! 3. `nresources` rows of `horizon` capacities, one per resource
//!
//! # Examples
//!
//! ```
//! use rcpspt::parser::parse_instance;
//!
//! let instance = "\
//! 3 1 5
//! 0 1 1
//! 2 1 2
//! 1 1
//! 0 0
//! 0 1 1 0 0";
//!
//! let problem = parse_instance(instance.as_bytes()).expect("well-formed instance");
//! assert_eq!(problem.njobs(), 3);
//! assert_eq!(problem.requests(1, 0), &[1, 1]);
//! ```

use std::io::{BufReader, Read};
use std::str::SplitWhitespace;

use thiserror::Error;

use crate::problem::{Problem, ProblemError};
use crate::Time;

/// Error raised for unreadable or malformed instance files.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid integer `{token}` at token {position}")]
    InvalidToken { position: usize, token: String },
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Parse a problem instance from `input`.
///
/// Anything [`Problem::new`] rejects surfaces as [`ParseError::Problem`], so
/// a successfully parsed instance is always well-formed.
pub fn parse_instance(input: impl Read) -> Result<Problem, ParseError> {
    let mut text = String::new();
    BufReader::new(input).read_to_string(&mut text)?;
    let mut tokens = Tokens::new(&text);

    let njobs = tokens.next()?;
    let nresources = tokens.next()?;
    let horizon = tokens.next()?;

    let mut durations = Vec::with_capacity(njobs);
    let mut successors = Vec::with_capacity(njobs);
    let mut requests = Vec::with_capacity(njobs);
    for _ in 0..njobs {
        let duration = tokens.next()?;
        let nsucc = tokens.next()?;
        durations.push(duration);
        successors.push(tokens.next_row(nsucc)?);
        let mut rows = Vec::with_capacity(nresources);
        for _ in 0..nresources {
            rows.push(tokens.next_row(duration)?);
        }
        requests.push(rows);
    }

    let capacities = (0..nresources)
        .map(|_| tokens.next_row(horizon))
        .collect::<Result<_, _>>()?;

    Ok(Problem::new(
        horizon,
        durations,
        successors,
        requests,
        capacities,
    )?)
}

/// Integer token stream tracking its position for error reporting.
struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_whitespace(),
            position: 0,
        }
    }

    fn next(&mut self) -> Result<Time, ParseError> {
        let token = self.iter.next().ok_or(ParseError::UnexpectedEnd)?;
        self.position += 1;
        token.parse().map_err(|_| ParseError::InvalidToken {
            position: self.position,
            token: token.to_owned(),
        })
    }

    fn next_row(&mut self, len: usize) -> Result<Vec<Time>, ParseError> {
        (0..len).map(|_| self.next()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chain `0 -> 1 -> 2` with one resource only available in `[1, 3)`.
    const GAP_CHAIN: &str = "\
3 1 5
0 1 1
2 1 2
1 1
0 0
0 1 1 0 0";

    #[test]
    fn gap_chain_parses() {
        let problem = parse_instance(GAP_CHAIN.as_bytes()).expect("well-formed instance");
        assert_eq!(problem.njobs(), 3);
        assert_eq!(problem.nresources(), 1);
        assert_eq!(problem.horizon(), 5);
        assert_eq!(problem.durations(), &[0, 2, 0]);
        assert_eq!(problem.successors(0), &[1]);
        assert_eq!(problem.successors(1), &[2]);
        assert_eq!(problem.requests(1, 0), &[1, 1]);
        assert_eq!(problem.capacity(0), &[0, 1, 1, 0, 0]);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let result = parse_instance("3 1 5\n0 1 1\n2 1".as_bytes());
        assert!(matches!(result, Err(ParseError::UnexpectedEnd)));
    }

    #[test]
    fn stray_token_is_reported_with_its_position() {
        let result = parse_instance("3 one 5".as_bytes());
        match result {
            Err(ParseError::InvalidToken { position, token }) => {
                assert_eq!(position, 2);
                assert_eq!(token, "one");
            }
            other => panic!("expected an invalid token error, got {other:?}"),
        }
    }

    #[test]
    fn cyclic_instance_is_rejected() {
        // 1 and 2 form a precedence cycle
        let cyclic = "4 0 5\n0 1 1\n1 1 2\n1 2 1 3\n0 0";
        let result = parse_instance(cyclic.as_bytes());
        assert!(matches!(
            result,
            Err(ParseError::Problem(ProblemError::CyclicPrecedence))
        ));
    }
}
