/// Failed login tracking
///
/// Counts failed logins per email address within a window of
/// [`FAILURE_WINDOW_MINUTES`] from the first failure. Once an address reaches
/// [`MAX_FAILED_ATTEMPTS`] inside that window it is blocked for
/// [`BLOCK_DURATION_MINUTES`]; a successful login clears its record. Records
/// whose window and block have both elapsed are dropped on the next failure.
///
/// State lives in process memory and is shared between request handlers
/// through `Arc<LoginAttemptTracker>`. Every method has an `_at` variant
/// taking the current time so the expiry rules can be tested without sleeping.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::login_attempts::LoginAttemptTracker;
///
/// let tracker = LoginAttemptTracker::new();
/// for _ in 0..5 {
///     tracker.record_failure("ada@example.com");
/// }
/// assert!(tracker.is_blocked("ada@example.com"));
///
/// tracker.record_success("ada@example.com");
/// assert!(!tracker.is_blocked("ada@example.com"));
/// ```

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Failures allowed before an address is blocked
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long a blocked address stays blocked
pub const BLOCK_DURATION_MINUTES: i64 = 5;

/// Failures older than this no longer count towards a block
pub const FAILURE_WINDOW_MINUTES: i64 = BLOCK_DURATION_MINUTES;

#[derive(Debug, Clone)]
struct AttemptRecord {
    failures: u32,
    first_failure_at: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            failures: 0,
            first_failure_at: now,
            blocked_until: None,
        }
    }

    fn window_elapsed(&self, now: DateTime<Utc>) -> bool {
        now >= self.first_failure_at + Duration::minutes(FAILURE_WINDOW_MINUTES)
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.map_or(true, |until| until <= now) && self.window_elapsed(now)
    }
}

/// In-memory failed-login counter keyed by normalized email
#[derive(Debug, Default)]
pub struct LoginAttemptTracker {
    records: Mutex<HashMap<String, AttemptRecord>>,
}

impl LoginAttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether logins for `email` are currently refused
    pub fn is_blocked(&self, email: &str) -> bool {
        self.is_blocked_at(email, Utc::now())
    }

    /// Records a failed login, returning true if the address is now blocked
    pub fn record_failure(&self, email: &str) -> bool {
        self.record_failure_at(email, Utc::now())
    }

    /// Clears the record for `email` after a successful login
    pub fn record_success(&self, email: &str) {
        let mut records = self.lock();
        records.remove(email);
    }

    /// Remaining block time for `email`, if blocked
    pub fn remaining_block(&self, email: &str) -> Option<Duration> {
        self.remaining_block_at(email, Utc::now())
    }

    pub fn is_blocked_at(&self, email: &str, now: DateTime<Utc>) -> bool {
        self.remaining_block_at(email, now).is_some()
    }

    pub fn remaining_block_at(&self, email: &str, now: DateTime<Utc>) -> Option<Duration> {
        let mut records = self.lock();

        let blocked_until = records.get(email)?.blocked_until?;
        if blocked_until > now {
            return Some(blocked_until - now);
        }

        // Block elapsed; start counting from zero again
        records.remove(email);
        None
    }

    pub fn record_failure_at(&self, email: &str, now: DateTime<Utc>) -> bool {
        let mut records = self.lock();
        records.retain(|_, record| !record.is_stale(now));

        let record = records
            .entry(email.to_string())
            .or_insert_with(|| AttemptRecord::new(now));

        if let Some(until) = record.blocked_until {
            if until > now {
                return true;
            }
            *record = AttemptRecord::new(now);
        }

        record.failures += 1;
        if record.failures >= MAX_FAILED_ATTEMPTS {
            record.blocked_until = Some(now + Duration::minutes(BLOCK_DURATION_MINUTES));
            tracing::warn!(email = %email, "Login blocked after repeated failures");
            return true;
        }

        false
    }

    /// Number of failures recorded for `email`
    pub fn failure_count(&self, email: &str) -> u32 {
        self.failure_count_at(email, Utc::now())
    }

    pub fn failure_count_at(&self, email: &str, now: DateTime<Utc>) -> u32 {
        self.lock()
            .get(email)
            .filter(|record| !record.is_stale(now))
            .map(|record| record.failures)
            .unwrap_or(0)
    }

    /// Number of addresses currently tracked
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AttemptRecord>> {
        // Records are replaced whole, so a poisoned map is still consistent
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL: &str = "ada@example.com";

    #[test]
    fn test_blocks_after_max_failures() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for attempt in 1..MAX_FAILED_ATTEMPTS {
            assert!(!tracker.record_failure_at(EMAIL, now), "attempt {}", attempt);
            assert!(!tracker.is_blocked_at(EMAIL, now));
        }

        assert!(tracker.record_failure_at(EMAIL, now));
        assert!(tracker.is_blocked_at(EMAIL, now));
    }

    #[test]
    fn test_block_expires() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            tracker.record_failure_at(EMAIL, now);
        }

        let almost = now + Duration::minutes(BLOCK_DURATION_MINUTES) - Duration::seconds(1);
        assert!(tracker.is_blocked_at(EMAIL, almost));

        let after = now + Duration::minutes(BLOCK_DURATION_MINUTES);
        assert!(!tracker.is_blocked_at(EMAIL, after));
        assert_eq!(tracker.failure_count(EMAIL), 0);
    }

    #[test]
    fn test_failures_after_expiry_start_over() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            tracker.record_failure_at(EMAIL, now);
        }

        let later = now + Duration::minutes(BLOCK_DURATION_MINUTES + 1);
        assert!(!tracker.record_failure_at(EMAIL, later));
        assert_eq!(tracker.failure_count(EMAIL), 1);
    }

    #[test]
    fn test_success_resets() {
        let tracker = LoginAttemptTracker::new();

        tracker.record_failure(EMAIL);
        tracker.record_failure(EMAIL);
        tracker.record_success(EMAIL);

        assert_eq!(tracker.failure_count(EMAIL), 0);
        assert!(!tracker.is_blocked(EMAIL));
    }

    #[test]
    fn test_addresses_are_independent() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for _ in 0..MAX_FAILED_ATTEMPTS {
            tracker.record_failure_at(EMAIL, now);
        }

        assert!(tracker.is_blocked_at(EMAIL, now));
        assert!(!tracker.is_blocked_at("grace@example.com", now));
    }

    #[test]
    fn test_remaining_block() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        assert!(tracker.remaining_block_at(EMAIL, now).is_none());

        for _ in 0..MAX_FAILED_ATTEMPTS {
            tracker.record_failure_at(EMAIL, now);
        }

        let remaining = tracker.remaining_block_at(EMAIL, now + Duration::minutes(2)).unwrap();
        assert_eq!(remaining, Duration::minutes(BLOCK_DURATION_MINUTES - 2));
    }

    #[test]
    fn test_old_failures_do_not_count() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for _ in 1..MAX_FAILED_ATTEMPTS {
            tracker.record_failure_at(EMAIL, now);
        }

        let later = now + Duration::days(30);
        assert_eq!(tracker.failure_count_at(EMAIL, later), 0);
        assert!(!tracker.record_failure_at(EMAIL, later));
        assert_eq!(tracker.failure_count_at(EMAIL, later), 1);
    }

    #[test]
    fn test_failures_inside_window_accumulate() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for i in 0..i64::from(MAX_FAILED_ATTEMPTS) - 1 {
            tracker.record_failure_at(EMAIL, now + Duration::seconds(i * 30));
        }

        let last = now + Duration::minutes(FAILURE_WINDOW_MINUTES) - Duration::seconds(1);
        assert!(tracker.record_failure_at(EMAIL, last));
    }

    #[test]
    fn test_stale_records_are_dropped() {
        let tracker = LoginAttemptTracker::new();
        let now = Utc::now();

        for i in 0..1000 {
            tracker.record_failure_at(&format!("user{}@example.com", i), now);
        }
        assert_eq!(tracker.tracked(), 1000);

        tracker.record_failure_at(EMAIL, now + Duration::days(365));
        assert_eq!(tracker.tracked(), 1);
    }
}
