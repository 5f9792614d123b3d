//! crates/mooproof_core/src/rate_limit.rs
//!
//! Rolling per-(resource, user) submission quota.
//!
//! The limiter only decides. It hands back the usage record the caller should
//! persist once the submission has actually gone through, so a request that
//! fails later never consumes quota and never writes a row.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{RatePeriod, ResourceConfig, UsageRecord};

/// The outcome of a quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    /// The submission may proceed.
    Allow {
        /// The record to increment and save on success; `None` when rate limiting is off.
        pending: Option<UsageRecord>,
    },
    Deny { limit: u32, period: RatePeriod },
}

/// Decides whether `user_id` may submit to `resource` at `now`.
pub fn check_and_reserve(
    resource: &ResourceConfig,
    user_id: Uuid,
    usage: Option<UsageRecord>,
    now: DateTime<Utc>,
) -> RateDecision {
    if !resource.rate_limit_enabled {
        return RateDecision::Allow { pending: None };
    }

    let limit = resource.rate_limit_count;
    let period = resource.rate_limit_period;

    let usage = match usage {
        None => UsageRecord::fresh(resource.id, user_id, now),
        Some(existing) if window_expired(&existing, period, now) => {
            UsageRecord::fresh(resource.id, user_id, now)
        }
        Some(existing) => existing,
    };

    if usage.submission_count >= limit {
        return RateDecision::Deny { limit, period };
    }

    RateDecision::Allow { pending: Some(usage) }
}

/// Records an accepted submission and returns the quota left afterwards.
pub fn commit(usage: &mut UsageRecord, limit: u32, now: DateTime<Utc>) -> u32 {
    usage.submission_count += 1;
    usage.last_submission = now;
    limit.saturating_sub(usage.submission_count)
}

fn window_expired(usage: &UsageRecord, period: RatePeriod, now: DateTime<Utc>) -> bool {
    (now - usage.first_submission).num_seconds() >= period.seconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn resource(limit: u32, period: RatePeriod) -> ResourceConfig {
        let mut config = ResourceConfig::with_defaults(Uuid::new_v4(), "Essay proofer");
        config.rate_limit_count = limit;
        config.rate_limit_period = period;
        config
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn usage(config: &ResourceConfig, user: Uuid, count: u32, first: DateTime<Utc>) -> UsageRecord {
        UsageRecord {
            resource_id: config.id,
            user_id: user,
            submission_count: count,
            first_submission: first,
            last_submission: first,
        }
    }

    #[test]
    fn disabled_limiter_allows_without_a_record() {
        let mut config = resource(1, RatePeriod::Hour);
        config.rate_limit_enabled = false;
        let user = Uuid::new_v4();
        let existing = usage(&config, user, 50, at(9, 0));

        let decision = check_and_reserve(&config, user, Some(existing), at(9, 1));

        assert_eq!(decision, RateDecision::Allow { pending: None });
    }

    #[test]
    fn first_submission_starts_a_fresh_window() {
        let config = resource(3, RatePeriod::Hour);
        let user = Uuid::new_v4();

        let decision = check_and_reserve(&config, user, None, at(9, 0));

        let RateDecision::Allow { pending: Some(pending) } = decision else {
            panic!("expected an allow with a pending record, got {decision:?}");
        };
        assert_eq!(pending.submission_count, 0);
        assert_eq!(pending.first_submission, at(9, 0));
        assert_eq!(pending.last_submission, at(9, 0));
    }

    #[test]
    fn exhausted_window_denies() {
        let config = resource(2, RatePeriod::Hour);
        let user = Uuid::new_v4();
        let existing = usage(&config, user, 2, at(9, 0));

        let decision = check_and_reserve(&config, user, Some(existing), at(9, 59));

        assert_eq!(
            decision,
            RateDecision::Deny {
                limit: 2,
                period: RatePeriod::Hour
            }
        );
    }

    #[test]
    fn window_resets_exactly_at_the_period_boundary() {
        let config = resource(2, RatePeriod::Hour);
        let user = Uuid::new_v4();
        let existing = usage(&config, user, 2, at(9, 0));

        let decision = check_and_reserve(&config, user, Some(existing), at(10, 0));

        let RateDecision::Allow { pending: Some(pending) } = decision else {
            panic!("expected the window to reset, got {decision:?}");
        };
        assert_eq!(pending.submission_count, 0);
        assert_eq!(pending.first_submission, at(10, 0));
    }

    #[test]
    fn day_period_keeps_the_window_open_for_a_day() {
        let config = resource(1, RatePeriod::Day);
        let user = Uuid::new_v4();
        let existing = usage(&config, user, 1, at(0, 0));

        let later_same_day = at(0, 0) + Duration::hours(23);
        assert!(matches!(
            check_and_reserve(&config, user, Some(existing.clone()), later_same_day),
            RateDecision::Deny { .. }
        ));
        let next_day = at(0, 0) + Duration::days(1);
        assert!(matches!(
            check_and_reserve(&config, user, Some(existing), next_day),
            RateDecision::Allow { .. }
        ));
    }

    #[test]
    fn commit_counts_the_submission_inside_the_window() {
        let config = resource(5, RatePeriod::Day);
        let user = Uuid::new_v4();
        let existing = usage(&config, user, 3, at(8, 0));

        let decision = check_and_reserve(&config, user, Some(existing), at(9, 0));

        let RateDecision::Allow { pending: Some(mut pending) } = decision else {
            panic!("expected allow");
        };
        let left = commit(&mut pending, config.rate_limit_count, at(9, 5));
        assert_eq!(left, 1);
        assert_eq!(pending.submission_count, 4);
        assert_eq!(pending.last_submission, at(9, 5));
        assert_eq!(pending.first_submission, at(8, 0));
    }
}
