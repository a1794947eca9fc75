//! Elapsed-lifetime statistics.

use crate::facts::{Slot, SlotMap};
use chrono::{Datelike, Months, NaiveDate};
use core::num::NonZeroU32;

/// Log target for the uptime calculator
const LOG_TARGET: &str = "uptime";

const DAYS_PER_YEAR: f64 = 365.0;

/// Time elapsed since a birth date, decomposed the civil-calendar way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptimeStats {
    /// Complete years since the birth date.
    pub years: u32,

    /// Complete months left over after the years, 0..=11.
    pub months: u32,

    /// Days left over after the years and months.
    pub days: u32,

    /// Plain day difference between the two dates.
    pub total_days: i64,

    /// Share of the assumed lifespan already elapsed, in percent, rounded to two decimals.
    pub life_percentage: f64,

    /// `total_days` expressed in 365-day years, rounded to two decimals.
    pub years_rounded: f64,
}

/// Compute the uptime statistics for `birth_date` as seen on `today`.
///
/// A birth date after `today` produces all-zero statistics.
#[must_use]
pub fn compute_uptime(birth_date: NaiveDate, today: NaiveDate, lifespan_days: NonZeroU32) -> UptimeStats {
    if today < birth_date {
        log::warn!(target: LOG_TARGET, "Birth date {birth_date} is after {today}, reporting zero uptime");
        return UptimeStats {
            years: 0,
            months: 0,
            days: 0,
            total_days: 0,
            life_percentage: 0.0,
            years_rounded: 0.0,
        };
    }

    let (whole_months, days) = civil_difference(birth_date, today);
    let total_days = (today - birth_date).num_days();

    #[expect(clippy::cast_precision_loss, reason = "day counts are far below 2^52")]
    let total = total_days as f64;

    let stats = UptimeStats {
        years: whole_months / 12,
        months: whole_months % 12,
        days,
        total_days,
        life_percentage: round2(total / f64::from(lifespan_days.get()) * 100.0),
        years_rounded: round2(total / DAYS_PER_YEAR),
    };

    log::debug!(target: LOG_TARGET, "Computed uptime from {birth_date} to {today}: {stats:?}");
    stats
}

/// Whole months and leftover days between two dates, `from <= to`.
///
/// Months are added to `from` with the day clamped to the end of the target month, stepping back while the
/// result overshoots `to`.
fn civil_difference(from: NaiveDate, to: NaiveDate) -> (u32, u32) {
    let month_span = (to.year() - from.year()) * 12 + i32::try_from(to.month()).unwrap_or(0)
        - i32::try_from(from.month()).unwrap_or(0);
    let mut months = u32::try_from(month_span).unwrap_or(0);

    loop {
        match from.checked_add_months(Months::new(months)) {
            Some(anchor) if anchor <= to => return (months, days_between(anchor, to)),
            _ if months == 0 => return (0, days_between(from, to)),
            _ => months -= 1,
        }
    }
}

fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    u32::try_from((to - from).num_days()).unwrap_or(0)
}

/// Two decimal places, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Render a float as its shortest round-trip decimal, always with a fractional part (`26` renders as `26.0`).
fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() { text } else { format!("{text}.0") }
}

const fn plural(count: u32, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

impl UptimeStats {
    /// Human-readable `"{y} years, {m} months, {d} days"` summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} years, {} {}, {} {}",
            self.years,
            self.months,
            plural(self.months, "month", "months"),
            self.days,
            plural(self.days, "day", "days"),
        )
    }

    /// The banner slots fed by these statistics.
    #[must_use]
    pub fn slots(&self) -> SlotMap {
        let mut slots = SlotMap::new();
        slots.insert(Slot::Uptime, self.summary());
        slots.insert(Slot::TotalDays, format!("({}d)", self.total_days));
        slots.insert(Slot::LifePercentage, format!("({}%)", format_decimal(self.life_percentage)));
        slots.insert(Slot::YearsRounded, format!("({}y)", format_decimal(self.years_rounded)));
        slots
    }
}
