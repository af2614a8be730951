//! Retry-until-approved policy shared by both execution strategies

use fluxo_core::{Error, Payload, Result, Stage};
use tracing::warn;

use crate::stages::is_approved;

/// Decides where the pipeline goes after an approval stage
///
/// A rejected result is sent back to the processor at most `max_retries`
/// times; the next rejection ends the run with
/// [`Error::ApprovalRetriesExhausted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalPolicy {
    pub max_retries: u32,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl ApprovalPolicy {
    /// Create a policy with the given retry bound
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Next stage after the `attempts`-th approval, given the accumulated data
    pub fn next_stage(&self, data: &Payload, attempts: u32) -> Result<Stage> {
        let approved = data
            .get(Stage::Approve.result_key())
            .is_some_and(is_approved);

        if approved {
            return Ok(Stage::Optimize);
        }

        if attempts > self.max_retries {
            return Err(Error::ApprovalRetriesExhausted { attempts });
        }

        warn!(
            attempt = attempts,
            max_retries = self.max_retries,
            "Result not approved, re-processing"
        );
        Ok(Stage::Process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verdict(approved: bool) -> Payload {
        Payload::new().with("approval", json!({"approved": approved}))
    }

    #[test]
    fn test_approved_goes_to_optimize() {
        let policy = ApprovalPolicy::default();
        assert_eq!(
            policy.next_stage(&verdict(true), 1).unwrap(),
            Stage::Optimize
        );
        assert_eq!(
            policy.next_stage(&verdict(true), 10).unwrap(),
            Stage::Optimize
        );
    }

    #[test]
    fn test_rejected_loops_until_bound() {
        let policy = ApprovalPolicy::new(2);
        assert_eq!(
            policy.next_stage(&verdict(false), 1).unwrap(),
            Stage::Process
        );
        assert_eq!(
            policy.next_stage(&verdict(false), 2).unwrap(),
            Stage::Process
        );

        let err = policy.next_stage(&verdict(false), 3).unwrap_err();
        assert!(matches!(err, Error::ApprovalRetriesExhausted { attempts: 3 }));
    }

    #[test]
    fn test_zero_retries_fails_on_first_rejection() {
        let policy = ApprovalPolicy::new(0);
        assert!(policy.next_stage(&verdict(false), 1).is_err());
    }

    #[test]
    fn test_missing_verdict_is_a_rejection() {
        let policy = ApprovalPolicy::new(1);
        assert_eq!(
            policy.next_stage(&Payload::new(), 1).unwrap(),
            Stage::Process
        );
    }
}
