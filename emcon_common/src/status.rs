//! Per-gear status evaluation.
//!
//! [`evaluate`] maps one [`GearReading`] plus the unit's [`Expectations`] and
//! the evaluation instant to a [`Classification`]. It is a pure function:
//! identical inputs always give identical output.
//!
//! Rule order per test type (function, duration), highest precedence first:
//! - timestamp later than `now` -> Fail (malformed snapshot)
//! - last result Fail -> Fail
//! - `now >= due_at + timeout` -> Overdue
//! - `now >= due_at` -> Pending
//! - otherwise Pass
//!
//! `due_at` is `last_test + interval`, or `now` for gear never tested. Fault
//! flags and gear-reported rated duration or test timing that differ from the
//! expectations force the whole unit to Fail. The unit's category is the worst
//! contribution.

use crate::config::Expectations;
use crate::gear::{GearReading, GearSnapshot, SnapshotError, TestResult};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Detail line for gear that did not answer.
pub const NO_RESPONSE: &str = "no response from gear";

/// Detail line for control gear without emergency features.
pub const NOT_EMERGENCY: &str = "Not an emergency unit";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Status category, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatusCategory {
    Pass,
    Pending,
    Overdue,
    Fail,
    /// The bus did not return a reading. Counts as failing.
    Unreachable,
}

impl StatusCategory {
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
            Self::Fail => "Fail",
            Self::Unreachable => "Unreachable",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Evaluation result for one gear unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    category: StatusCategory,
    details: Vec<String>,
}

impl Classification {
    pub fn new(category: StatusCategory, details: Vec<String>) -> Self {
        Self { category, details }
    }

    pub fn unreachable() -> Self {
        Self::new(StatusCategory::Unreachable, vec![NO_RESPONSE.to_string()])
    }

    pub fn category(&self) -> StatusCategory {
        self.category
    }

    /// Explanation lines, worst first.
    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn is_pass(&self) -> bool {
        self.category.is_pass()
    }
}

#[derive(Debug, Clone, Copy)]
enum TestKind {
    Function,
    Duration,
}

impl TestKind {
    const fn label(&self) -> &'static str {
        match self {
            Self::Function => "Function test",
            Self::Duration => "Duration test",
        }
    }
}

/// One test type's share of the classification.
#[derive(Debug)]
struct Contribution {
    category: StatusCategory,
    detail: String,
}

impl Contribution {
    fn new(category: StatusCategory, detail: String) -> Self {
        Self { category, detail }
    }
}

/// Classify one gear unit.
pub fn evaluate(
    reading: &GearReading,
    expectations: &Expectations,
    now: DateTime<Utc>,
) -> Classification {
    match reading {
        GearReading::Unreachable { .. } => Classification::unreachable(),
        GearReading::NotEmergency => {
            Classification::new(StatusCategory::Fail, vec![NOT_EMERGENCY.to_string()])
        }
        GearReading::Reachable(snapshot) => evaluate_snapshot(snapshot, expectations, now),
    }
}

fn evaluate_snapshot(
    snapshot: &GearSnapshot,
    expectations: &Expectations,
    now: DateTime<Utc>,
) -> Classification {
    let mut unit_faults = snapshot.failures.detail_lines();
    unit_faults.extend(setting_mismatches(snapshot, expectations));

    let mut contributions = [
        function_test(snapshot, expectations, now),
        duration_test(snapshot, expectations, now),
    ];
    // Stable: function test stays ahead of duration test on ties.
    contributions.sort_by(|a, b| b.category.cmp(&a.category));

    let worst = contributions
        .iter()
        .map(|c| c.category)
        .max()
        .unwrap_or(StatusCategory::Pass);
    let category = if unit_faults.is_empty() {
        worst
    } else {
        StatusCategory::Fail
    };

    let mut details = unit_faults;
    details.extend(contributions.into_iter().map(|c| c.detail));

    if snapshot.emergency_mode.is_active() {
        details.push(format!("Current mode: {}", snapshot.emergency_mode));
    }
    if let Some(charge) = snapshot.battery_charge
        && charge < 100.0
    {
        details.push(format!("Battery charge: {charge:.1}%"));
    }

    Classification::new(category, details)
}

/// Gear-reported settings that differ from the expectations.
fn setting_mismatches(snapshot: &GearSnapshot, expectations: &Expectations) -> Vec<String> {
    let checks = [
        (
            "rated duration",
            snapshot.rated_duration,
            expectations.rated_duration_min,
            "minutes",
        ),
        (
            "function test interval",
            snapshot.function_test_interval,
            expectations.function_test_interval_days,
            "days",
        ),
        (
            "duration test interval",
            snapshot.duration_test_interval,
            expectations.duration_test_interval_weeks,
            "weeks",
        ),
        (
            "test execution timeout",
            snapshot.test_execution_timeout,
            expectations.test_execution_timeout_days,
            "days",
        ),
    ];
    checks
        .into_iter()
        .filter_map(|(setting, reported, expected, unit)| match reported {
            Some(value) if value != expected => Some(format!(
                "Unexpected {setting}: {value} {unit} (expected {expected})"
            )),
            _ => None,
        })
        .collect()
}

fn function_test(
    snapshot: &GearSnapshot,
    expectations: &Expectations,
    now: DateTime<Utc>,
) -> Contribution {
    let kind = TestKind::Function;
    let interval = expectations.function_test_interval();
    let timeout = expectations.test_execution_timeout();

    let Some(record) = &snapshot.function_test else {
        return schedule(kind, None, interval, timeout, now);
    };
    if let Some(malformed) = future_timestamp(kind, record.at, now) {
        return malformed;
    }
    if record.result == TestResult::Fail {
        return Contribution::new(
            StatusCategory::Fail,
            format!("{} failed on {}", kind.label(), record.at.format(DATE_FORMAT)),
        );
    }
    schedule(kind, Some(record.at), interval, timeout, now)
}

fn duration_test(
    snapshot: &GearSnapshot,
    expectations: &Expectations,
    now: DateTime<Utc>,
) -> Contribution {
    let kind = TestKind::Duration;
    let interval = expectations.duration_test_interval();
    let timeout = expectations.test_execution_timeout();

    let Some(record) = &snapshot.duration_test else {
        return schedule(kind, None, interval, timeout, now);
    };
    if let Some(malformed) = future_timestamp(kind, record.at, now) {
        return malformed;
    }
    let on = record.at.format(DATE_FORMAT);
    if record.result == TestResult::Fail {
        let detail = match record.achieved_minutes {
            Some(achieved) => format!("{} failed on {on} after {achieved} minutes", kind.label()),
            None => format!("{} failed on {on}", kind.label()),
        };
        return Contribution::new(StatusCategory::Fail, detail);
    }
    if let Some(achieved) = record.achieved_minutes
        && achieved < expectations.rated_duration_min
    {
        return Contribution::new(
            StatusCategory::Fail,
            format!(
                "{} on {on} lasted {achieved} of {} minutes",
                kind.label(),
                expectations.rated_duration_min
            ),
        );
    }
    schedule(kind, Some(record.at), interval, timeout, now)
}

fn future_timestamp(kind: TestKind, at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Contribution> {
    (at > now).then(|| {
        let err = SnapshotError::FutureTimestamp {
            field: kind.label(),
            at,
        };
        Contribution::new(StatusCategory::Fail, err.to_string())
    })
}

/// Timing rule shared by both test types.
fn schedule(
    kind: TestKind,
    last: Option<DateTime<Utc>>,
    interval: Duration,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Contribution {
    let label = kind.label();
    let due_at = match last {
        Some(at) => at.checked_add_signed(interval),
        None => Some(now),
    };
    let Some((due_at, overdue_at)) =
        due_at.and_then(|due| due.checked_add_signed(timeout).map(|overdue| (due, overdue)))
    else {
        return Contribution::new(
            StatusCategory::Fail,
            format!("{label} next due date is out of range"),
        );
    };

    if now < due_at {
        // `last` is always set here: a never-tested unit is due immediately.
        let done = last.map(|at| at.format(DATE_FORMAT).to_string()).unwrap_or_default();
        return Contribution::new(
            StatusCategory::Pass,
            format!("{label} done {done}, next due {}", due_at.format(DATE_FORMAT)),
        );
    }

    if now >= overdue_at {
        return Contribution::new(
            StatusCategory::Overdue,
            format!("{label} overdue since {}", overdue_at.format(DATE_FORMAT)),
        );
    }

    let left = days_left(overdue_at - now);
    let unit = if left == 1 { "day" } else { "days" };
    let detail = match last {
        None => format!("{label} never performed, {left} {unit} left before overdue"),
        Some(_) => format!(
            "{label} due since {}, {left} {unit} left before overdue",
            due_at.format(DATE_FORMAT)
        ),
    };
    Contribution::new(StatusCategory::Pending, detail)
}

/// Whole days remaining, rounded up.
fn days_left(remaining: Duration) -> i64 {
    const DAY: i64 = 86_400;
    (remaining.num_seconds() + DAY - 1) / DAY
}
