//! Consumption-rate and depletion forecasting over a borrowed ledger.
//!
//! Model:
//! - Take every withdrawal in the trailing window `[now - window, now]`.
//! - Average them per calendar day since the earliest one (minimum one day).
//! - Divide the quantity on hand by that rate.
//!
//! "No withdrawals in the window" is a regular outcome and is reported as
//! such, never as a zero rate or an infinite day count.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use stockwatch_events::replay;

use crate::ledger::{Ledger, TransactionKind};
use crate::overview::MaterialOverview;
use crate::series::{StockPoint, StockTimeSeries};

/// Trailing window used when the caller does not pick one.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Average withdrawal per day over a trailing window.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsumptionRate {
    /// No withdrawal fell inside the window.
    NoRecentConsumption,
    PerDay {
        total_withdrawn: f64,
        span_days: i64,
        per_day: f64,
    },
}

impl ConsumptionRate {
    pub fn per_day(&self) -> Option<f64> {
        match self {
            ConsumptionRate::NoRecentConsumption => None,
            ConsumptionRate::PerDay { per_day, .. } => Some(*per_day),
        }
    }
}

/// Estimated time until the quantity on hand reaches zero.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DepletionProjection {
    /// Stock will not run out on the current trend.
    Unbounded,
    Days { days_remaining: f64 },
}

impl DepletionProjection {
    pub fn days_remaining(&self) -> Option<f64> {
        match self {
            DepletionProjection::Unbounded => None,
            DepletionProjection::Days { days_remaining } => Some(*days_remaining),
        }
    }
}

impl core::fmt::Display for DepletionProjection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DepletionProjection::Unbounded => f.write_str("no recent consumption"),
            DepletionProjection::Days { days_remaining } => {
                write!(f, "runs out in {days_remaining:.1} days")
            }
        }
    }
}

/// Read-only forecasting view over a ledger.
///
/// Holds nothing but the borrowed ledger and the default window used by
/// `overview`; every result is a pure function of the ledger at call time.
#[derive(Debug, Clone, Copy)]
pub struct Forecaster<'a> {
    ledger: &'a Ledger,
    window: Duration,
}

impl<'a> Forecaster<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self {
            ledger,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Withdrawal rate for `material` over `[now - window, now]`.
    ///
    /// The day span counts whole elapsed days since the earliest withdrawal in
    /// the window, plus one, so several withdrawals on the same day divide by
    /// one rather than by a fraction of a day.
    pub fn consumption_rate(&self, material: &str, now: DateTime<Utc>, window: Duration) -> ConsumptionRate {
        let since = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let withdrawals: Vec<_> = self
            .ledger
            .transactions_for(material, since..=now)
            .into_iter()
            .filter(|tx| tx.kind == TransactionKind::Withdrawal)
            .collect();

        // Sorted ascending, so the first entry is the earliest.
        let Some(earliest) = withdrawals.first().map(|tx| tx.timestamp) else {
            return ConsumptionRate::NoRecentConsumption;
        };

        let total_withdrawn: f64 = withdrawals.iter().map(|tx| tx.quantity.value()).sum();
        let span_days = ((now - earliest).num_days() + 1).max(1);
        let per_day = total_withdrawn / span_days as f64;

        trace!(material, total_withdrawn, span_days, per_day, "consumption rate computed");

        ConsumptionRate::PerDay {
            total_withdrawn,
            span_days,
            per_day,
        }
    }

    /// Days until `material` runs out at its recent consumption rate.
    pub fn project_depletion(&self, material: &str, now: DateTime<Utc>, window: Duration) -> DepletionProjection {
        let rate = match self.consumption_rate(material, now, window).per_day() {
            Some(rate) if rate > 0.0 => rate,
            _ => return DepletionProjection::Unbounded,
        };

        let on_hand = self
            .ledger
            .stock_record(material)
            .map(|r| r.quantity.value())
            .unwrap_or(0.0);

        DepletionProjection::Days {
            days_remaining: on_hand / rate,
        }
    }

    /// Stock level after each of `material`'s transactions, from its first
    /// delivery onwards. Never time-bounded, so the series is exact.
    pub fn stock_time_series(&self, material: &str) -> Vec<StockPoint> {
        let Some(record) = self.ledger.stock_record(material) else {
            return Vec::new();
        };

        let series = StockTimeSeries::new(record.material.clone());
        replay(series, self.ledger.transactions_for(material, ..)).into_points()
    }

    /// One row per known material using this forecaster's default window.
    pub fn overview(&self, now: DateTime<Utc>) -> Vec<MaterialOverview> {
        self.ledger
            .records()
            .map(|record| MaterialOverview {
                material: record.material.clone(),
                quantity: record.quantity.value(),
                critical_threshold: record.critical_threshold.value(),
                last_updated: record.last_updated,
                status: record.status(),
                depletion: self.project_depletion(record.material.as_str(), now, self.window),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    use crate::alert::StockStatus;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn week() -> Duration {
        Duration::days(DEFAULT_WINDOW_DAYS)
    }

    /// 100 units delivered on day 0, then 10 withdrawn on each of days 0..=4.
    fn steady_consumption() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Cement", 100.0, 10.0, day(0)).unwrap();
        for n in 0..5 {
            ledger.record_withdrawal("Cement", 10.0, day(n)).unwrap();
        }
        ledger
    }

    #[test]
    fn steady_consumption_rate_and_depletion() {
        let ledger = steady_consumption();
        let forecaster = Forecaster::new(&ledger);

        let rate = forecaster.consumption_rate("Cement", day(4), week());
        assert_eq!(
            rate,
            ConsumptionRate::PerDay {
                total_withdrawn: 50.0,
                span_days: 5,
                per_day: 10.0,
            }
        );

        let projection = forecaster.project_depletion("Cement", day(4), week());
        assert_eq!(projection, DepletionProjection::Days { days_remaining: 5.0 });
        assert_eq!(projection.to_string(), "runs out in 5.0 days");
    }

    #[test]
    fn no_withdrawals_in_window_is_distinguished() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Sand", 40.0, 5.0, day(0)).unwrap();
        let forecaster = Forecaster::new(&ledger);

        assert_eq!(
            forecaster.consumption_rate("Sand", day(1), week()),
            ConsumptionRate::NoRecentConsumption
        );
        assert_eq!(
            forecaster.project_depletion("Sand", day(1), week()),
            DepletionProjection::Unbounded
        );
        assert_eq!(DepletionProjection::Unbounded.to_string(), "no recent consumption");
    }

    #[test]
    fn withdrawals_outside_the_window_are_ignored() {
        let ledger = steady_consumption();
        let forecaster = Forecaster::new(&ledger);

        // On day 12 the window starts at day 5: nothing left in it.
        assert_eq!(
            forecaster.consumption_rate("Cement", day(12), week()),
            ConsumptionRate::NoRecentConsumption
        );

        // Window start is inclusive: day 10 - 7 = day 3.
        let rate = forecaster.consumption_rate("Cement", day(10), week());
        assert_eq!(
            rate,
            ConsumptionRate::PerDay {
                total_withdrawn: 20.0,
                span_days: 8,
                per_day: 2.5,
            }
        );
    }

    #[test]
    fn window_is_configurable() {
        let ledger = steady_consumption();
        let forecaster = Forecaster::new(&ledger);

        let rate = forecaster.consumption_rate("Cement", day(4), Duration::days(1));
        // Withdrawals on days 3 and 4; earliest is one full day back.
        assert_eq!(rate.per_day(), Some(10.0));

        let wide = forecaster.with_window(Duration::days(30));
        assert_eq!(wide.window(), Duration::days(30));
    }

    #[test]
    fn same_day_withdrawals_use_a_one_day_span() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Steel", 30.0, 0.0, day(0)).unwrap();
        ledger.record_withdrawal("Steel", 4.0, day(0)).unwrap();
        ledger
            .record_withdrawal("Steel", 6.0, day(0) + Duration::hours(3))
            .unwrap();

        let now = day(0) + Duration::hours(5);
        let rate = Forecaster::new(&ledger).consumption_rate("Steel", now, week());
        assert_eq!(
            rate,
            ConsumptionRate::PerDay {
                total_withdrawn: 10.0,
                span_days: 1,
                per_day: 10.0,
            }
        );
    }

    #[test]
    fn span_uses_whole_days_not_fractions() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Steel", 30.0, 0.0, day(0)).unwrap();
        ledger.record_withdrawal("Steel", 9.0, day(0)).unwrap();

        // 47 hours elapsed → 1 whole day → span 2.
        let rate = Forecaster::new(&ledger).consumption_rate("Steel", day(0) + Duration::hours(47), week());
        assert_eq!(rate.per_day(), Some(4.5));
    }

    #[test]
    fn empty_stock_with_consumption_projects_zero_days() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Bricks", 20.0, 5.0, day(0)).unwrap();
        ledger.record_withdrawal("Bricks", 20.0, day(1)).unwrap();

        let projection = Forecaster::new(&ledger).project_depletion("Bricks", day(1), week());
        assert_eq!(projection, DepletionProjection::Days { days_remaining: 0.0 });
    }

    #[test]
    fn zero_quantity_withdrawals_do_not_produce_a_rate() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Gravel", 20.0, 5.0, day(0)).unwrap();
        ledger.record_withdrawal("Gravel", 0.0, day(1)).unwrap();

        let forecaster = Forecaster::new(&ledger);
        assert_eq!(forecaster.consumption_rate("Gravel", day(1), week()).per_day(), Some(0.0));
        assert_eq!(
            forecaster.project_depletion("Gravel", day(1), week()),
            DepletionProjection::Unbounded
        );
    }

    #[test]
    fn unknown_material_has_no_rate_or_series() {
        let ledger = Ledger::new();
        let forecaster = Forecaster::new(&ledger);
        assert_eq!(
            forecaster.consumption_rate("Nope", day(0), week()),
            ConsumptionRate::NoRecentConsumption
        );
        assert_eq!(
            forecaster.project_depletion("Nope", day(0), week()),
            DepletionProjection::Unbounded
        );
        assert!(forecaster.stock_time_series("Nope").is_empty());
    }

    #[test]
    fn time_series_replays_deliveries_and_withdrawals() {
        let mut ledger = Ledger::new();
        ledger.record_delivery("Steel", 50.0, 10.0, day(0)).unwrap();
        ledger.record_withdrawal("Steel", 20.0, day(1)).unwrap();
        ledger.record_delivery("Steel", 30.0, 10.0, day(2)).unwrap();

        let points = Forecaster::new(&ledger).stock_time_series("Steel");
        let totals: Vec<f64> = points.iter().map(|p| p.quantity).collect();
        assert_eq!(totals, vec![50.0, 30.0, 60.0]);
        let stamps: Vec<_> = points.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![day(0), day(1), day(2)]);
    }

    #[test]
    fn overview_reports_status_and_projection_per_material() {
        let mut ledger = steady_consumption();
        ledger.record_delivery("Sand", 3.0, 5.0, day(1)).unwrap();

        let rows = Forecaster::new(&ledger).overview(day(4));
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].material.as_str(), "Cement");
        assert_eq!(rows[0].status, StockStatus::Healthy);
        assert_eq!(rows[0].depletion, DepletionProjection::Days { days_remaining: 5.0 });

        assert_eq!(rows[1].material.as_str(), "Sand");
        assert_eq!(rows[1].status, StockStatus::Critical);
        assert_eq!(rows[1].depletion, DepletionProjection::Unbounded);
    }

    #[test]
    fn unbounded_projection_serializes_without_a_number() {
        let json = serde_json::to_value(DepletionProjection::Unbounded).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "unbounded" }));

        let json = serde_json::to_value(ConsumptionRate::NoRecentConsumption).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "no_recent_consumption" }));
    }

    proptest! {
        /// Property: the last point of the series always equals the quantity on
        /// hand, even when movements arrive with tied or out-of-order timestamps.
        #[test]
        fn series_ends_at_current_quantity(
            moves in prop::collection::vec((any::<bool>(), 0u32..300, 0i64..6), 1..40)
        ) {
            let mut ledger = Ledger::new();
            ledger.record_delivery("Cement", 0.0, 0.0, day(0)).unwrap();
            for (deliver, q, at) in moves {
                let now = day(at);
                if deliver {
                    ledger.record_delivery("Cement", q as f64, 0.0, now).unwrap();
                } else {
                    let _ = ledger.record_withdrawal("Cement", q as f64, now);
                }
            }

            let points = Forecaster::new(&ledger).stock_time_series("Cement");
            let last = points.last().unwrap().quantity;
            prop_assert_eq!(last, ledger.stock_record("Cement").unwrap().quantity.value());
        }

        /// Property: a numeric projection is never negative nor infinite.
        #[test]
        fn projection_is_finite_and_non_negative(
            start in 1u32..1_000,
            takes in prop::collection::vec(0u32..50, 0..10)
        ) {
            let mut ledger = Ledger::new();
            ledger.record_delivery("Sand", start as f64, 0.0, day(0)).unwrap();
            for (i, q) in takes.iter().enumerate() {
                let _ = ledger.record_withdrawal("Sand", *q as f64, day(i as i64));
            }

            match Forecaster::new(&ledger).project_depletion("Sand", day(9), week()) {
                DepletionProjection::Unbounded => {}
                DepletionProjection::Days { days_remaining } => {
                    prop_assert!(days_remaining.is_finite());
                    prop_assert!(days_remaining >= 0.0);
                }
            }
        }
    }
}
