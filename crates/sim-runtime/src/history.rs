//! Append-only log of decisions, in round order.

use serde::{Deserialize, Serialize};
use sim_core::{DecisionRecord, MetricsSnapshot};

/// A tracked metric, for trend queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Capital,
    Employees,
    Satisfaction,
    CustomerSatisfaction,
    MarketShare,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Capital,
        Metric::Employees,
        Metric::Satisfaction,
        Metric::CustomerSatisfaction,
        Metric::MarketShare,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Capital => "Capital",
            Metric::Employees => "Employees",
            Metric::Satisfaction => "Employee satisfaction",
            Metric::CustomerSatisfaction => "Customer satisfaction",
            Metric::MarketShare => "Market share",
        }
    }

    pub fn read(self, m: &MetricsSnapshot) -> f64 {
        match self {
            Metric::Capital => m.capital as f64,
            Metric::Employees => f64::from(m.employees),
            Metric::Satisfaction => m.satisfaction,
            Metric::CustomerSatisfaction => m.customer_satisfaction,
            Metric::MarketShare => m.market_share,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    records: Vec<DecisionRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from records that were already checked for round order.
    pub(crate) fn from_records(records: Vec<DecisionRecord>) -> Self {
        Self { records }
    }

    pub(crate) fn append(&mut self, record: DecisionRecord) {
        debug_assert_eq!(record.round as usize, self.records.len() + 1);
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DecisionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecisionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&DecisionRecord> {
        self.records.last()
    }

    /// `(round, value)` pairs for `metric`, starting with `start` at round 0.
    pub fn trend(&self, start: &MetricsSnapshot, metric: Metric) -> Vec<(u32, f64)> {
        std::iter::once((0, metric.read(start)))
            .chain(self.records.iter().map(|r| (r.round, metric.read(&r.metrics))))
            .collect()
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a DecisionRecord;
    type IntoIter = std::slice::Iter<'a, DecisionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::OptionLabel;

    fn snapshot(capital: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            capital,
            employees: 10,
            satisfaction: 70.0,
            customer_satisfaction: 70.0,
            market_share: 20.0,
        }
    }

    fn record(round: u32, capital: i64) -> DecisionRecord {
        DecisionRecord {
            round,
            challenge: format!("challenge {round}"),
            choice: OptionLabel::B,
            consequence: "ok".into(),
            metrics: snapshot(capital),
        }
    }

    #[test]
    fn trend_starts_with_initial_state() {
        let mut log = HistoryLog::new();
        log.append(record(1, 110));
        log.append(record(2, 90));
        let t = log.trend(&snapshot(100), Metric::Capital);
        assert_eq!(t, vec![(0, 100.0), (1, 110.0), (2, 90.0)]);
        assert_eq!(log.last().map(|r| r.round), Some(2));
        assert_eq!((&log).into_iter().count(), 2);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = HistoryLog::new();
        log.append(record(1, 5));
        let v = serde_json::to_value(&log).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["round"], 1);
    }
}
