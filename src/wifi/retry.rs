//! Bounded retry policy for reassociation.

/// What to do after a failed association attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Issue another association request.
    Retry,
    /// Stop and publish a failed outcome.
    GiveUp,
}

/// Decide whether a station that has already retried `attempts` times may try again.
///
/// Retries while `attempts < max_retry`. A budget of zero gives up on the
/// very first failure.
pub fn decide(attempts: u8, max_retry: u8) -> RetryDecision {
    if attempts < max_retry {
        RetryDecision::Retry
    } else {
        RetryDecision::GiveUp
    }
}
