// Frozen annotations
// Captions that quote figures computed once, offline. They are rendered
// verbatim; this audit recomputes each figure from the loaded tables so
// drift is visible instead of silent.

use crate::analytics::{annual_mean, annual_sum, monthly_basket_yoy, AffordabilityField};
use crate::data::Dataset;
use crate::format;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    /// "largest YoY spike occurred in Jan 2023, with a 13.87% increase"
    PeakMonthlyYoy,
    /// "Total yearly food spending climbed from €3,265.41 in 2014"
    AnnualTotal2014,
    /// "... to €3,688.87 in 2024"
    AnnualTotal2024,
    /// "In 2024, households spent an average of just 7.3% of income"
    MeanRatio2024,
    /// "The Affordability Index peaked in Jan 2014 (102.38)"
    PeakIndexJan2014,
    /// "... dropped to an average of 79.17 in 2024"
    MeanIndex2024,
}

impl Annotation {
    pub const ALL: [Annotation; 6] = [
        Annotation::PeakMonthlyYoy,
        Annotation::AnnualTotal2014,
        Annotation::AnnualTotal2024,
        Annotation::MeanRatio2024,
        Annotation::PeakIndexJan2014,
        Annotation::MeanIndex2024,
    ];

    /// The figure exactly as the caption prints it.
    pub fn claim(&self) -> &'static str {
        match self {
            Annotation::PeakMonthlyYoy => "13.87% (Jan 2023)",
            Annotation::AnnualTotal2014 => "€3,265.41",
            Annotation::AnnualTotal2024 => "€3,688.87",
            Annotation::MeanRatio2024 => "7.3%",
            Annotation::PeakIndexJan2014 => "102.38 (Jan 2014)",
            Annotation::MeanIndex2024 => "79.17",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Annotation::PeakMonthlyYoy => "Largest monthly YoY basket cost increase",
            Annotation::AnnualTotal2014 => "Total basket cost in 2014",
            Annotation::AnnualTotal2024 => "Total basket cost in 2024",
            Annotation::MeanRatio2024 => "Mean affordability ratio in 2024",
            Annotation::PeakIndexJan2014 => "Peak affordability index",
            Annotation::MeanIndex2024 => "Mean affordability index in 2024",
        }
    }

    /// Recompute the figure at the caption's precision.
    pub fn live_value(&self, dataset: &Dataset) -> Option<String> {
        let records = &dataset.affordability;
        match self {
            Annotation::PeakMonthlyYoy => monthly_basket_yoy(records)
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(date, change)| format!("{} ({})", format::percent(change, 2), month_label(date))),
            Annotation::AnnualTotal2014 => year_value(&annual_sum(records, AffordabilityField::BasketCost), 2014)
                .map(format::euro_grouped),
            Annotation::AnnualTotal2024 => year_value(&annual_sum(records, AffordabilityField::BasketCost), 2024)
                .map(format::euro_grouped),
            Annotation::MeanRatio2024 => year_value(&annual_mean(records, AffordabilityField::Ratio), 2024)
                .map(|v| format::percent(v, 1)),
            Annotation::PeakIndexJan2014 => records
                .iter()
                .max_by(|a, b| a.affordability_index.total_cmp(&b.affordability_index))
                .map(|r| format!("{} ({})", format::fixed(r.affordability_index, 2), month_label(r.date))),
            Annotation::MeanIndex2024 => year_value(&annual_mean(records, AffordabilityField::Index), 2024)
                .map(|v| format::fixed(v, 2)),
        }
    }
}

fn year_value(annual: &[(i32, f64)], year: i32) -> Option<f64> {
    annual.iter().find(|(y, _)| *y == year).map(|(_, v)| *v)
}

fn month_label(date: NaiveDate) -> String {
    format!("{} {}", date.format("%b"), date.year())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Matches,
    Drifted { live: String },
    /// The tables do not cover the period the caption talks about.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub annotation: Annotation,
    pub description: &'static str,
    pub claim: &'static str,
    pub outcome: AuditOutcome,
}

pub fn audit(dataset: &Dataset) -> Vec<AuditEntry> {
    Annotation::ALL
        .iter()
        .map(|annotation| audit_one(dataset, *annotation))
        .collect()
}

pub fn audit_one(dataset: &Dataset, annotation: Annotation) -> AuditEntry {
    let outcome = match annotation.live_value(dataset) {
        None => AuditOutcome::Unavailable,
        Some(live) if live == annotation.claim() => AuditOutcome::Matches,
        Some(live) => AuditOutcome::Drifted { live },
    };
    AuditEntry {
        annotation,
        description: annotation.description(),
        claim: annotation.claim(),
        outcome,
    }
}

/// Log the audit once at start-up.
pub fn log_audit(entries: &[AuditEntry]) {
    for entry in entries {
        match &entry.outcome {
            AuditOutcome::Matches => debug!(annotation = ?entry.annotation, claim = entry.claim, "Frozen caption matches data"),
            AuditOutcome::Drifted { live } => warn!(
                annotation = ?entry.annotation,
                claim = entry.claim,
                live = %live,
                "Frozen caption no longer matches data"
            ),
            AuditOutcome::Unavailable => warn!(
                annotation = ?entry.annotation,
                claim = entry.claim,
                "Frozen caption refers to a period missing from the data"
            ),
        }
    }
}

/// e.g. "4/6 frozen captions match data"
pub fn summary(entries: &[AuditEntry]) -> String {
    let matching = entries
        .iter()
        .filter(|e| e.outcome == AuditOutcome::Matches)
        .count();
    format!("{}/{} frozen captions match data", matching, entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AffordabilityRecord;

    /// 2014-01 .. 2024-12 with figures chosen to reproduce every caption.
    fn matching_dataset() -> Dataset {
        let mut affordability = Vec::new();
        for year in 2014..=2024 {
            for month in 1..=12u32 {
                let cost = match year {
                    2014 => 3265.41 / 12.0,
                    2022 => 300.0,
                    2023 if month == 1 => 341.61,
                    2023 => 310.0,
                    2024 => 3688.87 / 12.0,
                    _ => 290.0,
                };
                let index = match (year, month) {
                    (2014, 1) => 102.38,
                    (2024, _) => 79.17,
                    _ => 90.0,
                };
                affordability.push(AffordabilityRecord {
                    date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
                    basket_cost_euro: cost,
                    affordability_ratio: if year == 2024 { 7.3 } else { 8.5 },
                    affordability_index: index,
                });
            }
        }
        Dataset {
            affordability,
            ..Dataset::default()
        }
    }

    #[test]
    fn test_audit_matches_reproducing_data() {
        let entries = audit(&matching_dataset());
        for entry in &entries {
            assert_eq!(entry.outcome, AuditOutcome::Matches, "{:?}", entry.annotation);
        }
        assert_eq!(summary(&entries), "6/6 frozen captions match data");
    }

    #[test]
    fn test_audit_reports_drift_with_live_value() {
        let mut dataset = matching_dataset();
        for record in dataset.affordability.iter_mut().filter(|r| r.date.year() == 2024) {
            record.affordability_ratio = 7.0;
        }

        let entries = audit(&dataset);
        let ratio = entries
            .iter()
            .find(|e| e.annotation == Annotation::MeanRatio2024)
            .unwrap();
        assert_eq!(ratio.outcome, AuditOutcome::Drifted { live: "7.0%".to_string() });
    }

    #[test]
    fn test_audit_unavailable_without_data() {
        let entries = audit(&Dataset::default());
        assert!(entries.iter().all(|e| e.outcome == AuditOutcome::Unavailable));
    }
}
