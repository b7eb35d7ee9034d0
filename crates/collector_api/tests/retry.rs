use std::time::Duration;

use collector_api::retry::*;

#[test]
fn default_policy_allows_five_attempts() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, MAX_ATTEMPTS);
    assert_eq!(policy.max_attempts, 5);
}

#[test]
fn retry_delay_is_exponential_in_failed_attempt() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_after_attempt(1), Some(Duration::from_secs(2)));
    assert_eq!(policy.delay_after_attempt(2), Some(Duration::from_secs(4)));
    assert_eq!(policy.delay_after_attempt(3), Some(Duration::from_secs(8)));
    assert_eq!(policy.delay_after_attempt(4), Some(Duration::from_secs(16)));
}

#[test]
fn no_wait_follows_the_final_attempt() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_after_attempt(5), None);
    assert_eq!(policy.delays().count(), 4);
    assert_eq!(policy.total_max_wait(), Duration::from_secs(30));
}

#[test]
fn scheduled_waits_strictly_increase() {
    let policy = RetryPolicy::new(5, Duration::from_millis(3));
    let delays = policy.delays().collect::<Vec<_>>();
    assert!(delays.windows(2).all(|pair| pair[0] < pair[1]), "{delays:?}");
}

#[test]
fn policy_always_allows_one_attempt() {
    let policy = RetryPolicy::new(0, Duration::from_secs(1));
    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.delays().count(), 0);
}

#[test]
fn only_http_200_is_accepted() {
    assert!(is_accepted_status(200));
    assert!(!is_accepted_status(201));
    assert!(!is_accepted_status(204));
    assert!(!is_accepted_status(500));
}
