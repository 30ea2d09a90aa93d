//! Provider failure classification and backoff
//!
//! Structured fields (HTTP status, provider error code, `Retry-After`) decide
//! first; the message text is only consulted when they are absent.

use crate::providers::ProviderError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

/// "try again in 500ms"
static MILLIS_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)try again in\s+(\d+(?:\.\d+)?)\s*ms").expect("valid millisecond hint pattern")
});

/// "try again in 2.5s", "try again in 1m2.5s", "try again in 1h2m", "try again in 3 seconds"
static CLOCK_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)try again in\s+(?:(\d+)h)?(?:(\d+)m)?(?:(\d+(?:\.\d+)?)\s*(?:seconds?|secs?|s)\b)?")
        .expect("valid clock hint pattern")
});

/// "retry after 30 seconds"
static SECONDS_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:retry after|wait)\s+(\d+(?:\.\d+)?)\s*(?:seconds?|secs?|s)\b")
        .expect("valid seconds hint pattern")
});

/// How the completion client should react to a provider failure
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// Throttled; retry after the hinted wait or the next backoff step
    RateLimit { retry_after: Option<Duration> },
    /// 5xx-class failure; never retried
    ServerError,
    /// Anything else; propagated as-is
    Unclassified,
}

/// Classify a provider failure
pub fn classify(error: &ProviderError) -> FailureKind {
    let rate_limit = || FailureKind::RateLimit {
        retry_after: error.retry_after.or_else(|| parse_wait_hint(&error.message)),
    };

    match error.status {
        Some(429) => return rate_limit(),
        Some(status) if (500..600).contains(&status) => return FailureKind::ServerError,
        _ => {}
    }

    if let Some(code) = &error.code {
        if code.to_lowercase().contains("rate_limit") {
            return rate_limit();
        }
    }

    if is_rate_limit_text(&error.message) {
        return rate_limit();
    }

    if error.status.is_none() && error.message.contains("503") {
        return FailureKind::ServerError;
    }

    FailureKind::Unclassified
}

fn is_rate_limit_text(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate_limit")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("try again in")
}

/// Extract a suggested wait from a provider message
pub fn parse_wait_hint(message: &str) -> Option<Duration> {
    if let Some(caps) = MILLIS_HINT.captures(message) {
        let millis: f64 = caps[1].parse().ok()?;
        return seconds(millis / 1000.0);
    }

    if let Some(caps) = CLOCK_HINT.captures(message) {
        let part = |idx: usize| -> Option<f64> { caps.get(idx).and_then(|m| m.as_str().parse().ok()) };
        let (hours, minutes, secs) = (part(1), part(2), part(3));
        if hours.is_some() || minutes.is_some() || secs.is_some() {
            let total = hours.unwrap_or(0.0) * 3600.0 + minutes.unwrap_or(0.0) * 60.0 + secs.unwrap_or(0.0);
            return seconds(total);
        }
    }

    if let Some(caps) = SECONDS_HINT.captures(message) {
        let secs: f64 = caps[1].parse().ok()?;
        return seconds(secs);
    }

    None
}

fn seconds(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs).ok()
}

/// Exponential backoff: starts at `initial`, doubles per step, never exceeds `max`
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    /// Delay to apply now; advances the schedule
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}
