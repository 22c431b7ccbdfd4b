// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! CronClock: given a cron expression or interval, returns the next-run instant.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CronParseError {
    #[error("invalid cron expression {expression:?}: {source}")]
    Invalid {
        expression: String,
        #[source]
        source: cron::error::Error,
    },
    #[error("cron expression {0:?} has no upcoming occurrence")]
    Exhausted(String),
}

pub trait CronClock: Send + Sync {
    fn next(&self, expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>, CronParseError>;
    fn next_interval(&self, after: DateTime<Utc>, seconds: i64) -> DateTime<Utc>;
    fn random(&self, after: DateTime<Utc>, seconds: i64) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCronClock;

impl CronClock for SystemCronClock {
    fn next(&self, expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>, CronParseError> {
        let schedule = cron::Schedule::from_str(expression).map_err(|source| CronParseError::Invalid {
            expression: expression.to_string(),
            source,
        })?;
        schedule
            .after(&after)
            .next()
            .ok_or_else(|| CronParseError::Exhausted(expression.to_string()))
    }

    fn next_interval(&self, after: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
        after + chrono::Duration::seconds(seconds.max(0))
    }

    fn random(&self, after: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
        let bound = seconds.max(1);
        let offset = rand::thread_rng().gen_range(1..=bound);
        after + chrono::Duration::seconds(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn fixed_interval_adds_exactly_the_configured_seconds() {
        let clock = SystemCronClock;
        assert_eq!(clock.next_interval(now(), 60), now() + chrono::Duration::seconds(60));
    }

    #[test]
    fn random_offset_lands_within_the_interval() {
        let clock = SystemCronClock;
        for _ in 0..50 {
            let next = clock.random(now(), 60);
            assert!(next > now());
            assert!(next <= now() + chrono::Duration::seconds(60));
        }
    }

    #[test]
    fn invalid_expression_is_rejected() {
        let clock = SystemCronClock;
        assert!(clock.next("not a cron expression", now()).is_err());
    }

    #[test]
    fn every_minute_expression_resolves_after_the_given_instant() {
        let clock = SystemCronClock;
        let next = clock.next("0 * * * * *", now()).unwrap();
        assert!(next > now());
    }
}
