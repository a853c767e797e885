use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::position::PortfolioId;

/// One day of historical portfolio risk figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskHistoryPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
    /// 99% Value-at-Risk as a positive currency amount.
    pub var_99: Decimal,
    /// 99% Expected Shortfall as a positive currency amount.
    pub es_99: Decimal,
    /// Drawdown from running NAV peak, as a non-positive fraction.
    pub drawdown_pct: Decimal,
}

/// Time-indexed risk history of one portfolio, kept sorted by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskHistory {
    portfolio: PortfolioId,
    points: Vec<RiskHistoryPoint>,
}

impl RiskHistory {
    pub fn new(portfolio: PortfolioId, mut points: Vec<RiskHistoryPoint>) -> Self {
        points.sort_by(|a, b| a.date.cmp(&b.date));
        Self { portfolio, points }
    }

    pub fn portfolio(&self) -> &PortfolioId {
        &self.portfolio
    }

    pub fn points(&self) -> &[RiskHistoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn latest(&self) -> Option<&RiskHistoryPoint> {
        self.points.last()
    }

    /// Replace every drawdown with the NAV's distance from its running peak,
    /// as a non-positive fraction. Used for sources that publish no drawdown.
    pub fn with_nav_drawdowns(mut self) -> Self {
        let mut peak: Option<Decimal> = None;
        for point in &mut self.points {
            let running_peak = peak.map_or(point.nav, |p| p.max(point.nav));
            peak = Some(running_peak);

            point.drawdown_pct = if running_peak > Decimal::ZERO {
                (point.nav - running_peak)
                    .checked_div(running_peak)
                    .unwrap_or_default()
            } else {
                Decimal::ZERO
            };
        }
        self
    }

    /// Points with `start <= date <= end`; an open bound is unbounded.
    pub fn window(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> RiskHistory {
        let points = self
            .points
            .iter()
            .filter(|p| start.map_or(true, |s| p.date >= s))
            .filter(|p| end.map_or(true, |e| p.date <= e))
            .cloned()
            .collect();

        RiskHistory {
            portfolio: self.portfolio.clone(),
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(day: u32, nav: Decimal) -> RiskHistoryPoint {
        RiskHistoryPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            nav,
            var_99: dec!(1_000),
            es_99: dec!(1_300),
            drawdown_pct: dec!(0),
        }
    }

    #[test]
    fn points_are_sorted() {
        let history = RiskHistory::new(
            "Portfolio A".into(),
            vec![point(3, dec!(103)), point(1, dec!(101)), point(2, dec!(102))],
        );
        let dates: Vec<u32> = history
            .points()
            .iter()
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(dates, vec![1, 2, 3]);
        assert_eq!(history.latest().map(|p| p.nav), Some(dec!(103)));
    }

    #[test]
    fn drawdowns_from_running_nav_peak() {
        let history = RiskHistory::new(
            "Portfolio A".into(),
            vec![point(3, dec!(99)), point(1, dec!(100)), point(2, dec!(110)), point(4, dec!(121))],
        )
        .with_nav_drawdowns();
        let drawdowns: Vec<Decimal> = history.points().iter().map(|p| p.drawdown_pct).collect();
        assert_eq!(drawdowns, vec![dec!(0), dec!(0), dec!(-0.1), dec!(0)]);
    }

    #[test]
    fn window_is_inclusive() {
        let history = RiskHistory::new(
            "Portfolio A".into(),
            (1..=10).map(|d| point(d, Decimal::from(d))).collect(),
        );

        let start = NaiveDate::from_ymd_opt(2024, 1, 3);
        let end = NaiveDate::from_ymd_opt(2024, 1, 5);
        let window = history.window(start, end);
        assert_eq!(window.len(), 3);
        assert_eq!(window.first_date(), start);
        assert_eq!(window.last_date(), end);

        assert_eq!(history.window(None, None).len(), 10);
        assert_eq!(history.window(start, None).len(), 8);
        assert!(history.window(end, start).is_empty());
    }
}
