// User controls: navigation view, metric radio, granularity radio, item pick.

use crate::error::SelectionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    ProjectOverview,
    AffordabilityOverview,
    ItemLevel,
    CategoryLevel,
}

impl View {
    /// Sidebar order.
    pub const ALL: [View; 4] = [
        View::ProjectOverview,
        View::AffordabilityOverview,
        View::ItemLevel,
        View::CategoryLevel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            View::ProjectOverview => "Project Overview",
            View::AffordabilityOverview => "Affordability Overview",
            View::ItemLevel => "Item-Level Analysis",
            View::CategoryLevel => "Category-Level Analysis",
        }
    }

    /// URL-friendly name used by the web surface.
    pub fn slug(&self) -> &'static str {
        match self {
            View::ProjectOverview => "overview",
            View::AffordabilityOverview => "affordability",
            View::ItemLevel => "item",
            View::CategoryLevel => "category",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            View::ProjectOverview => View::AffordabilityOverview,
            View::AffordabilityOverview => View::ItemLevel,
            View::ItemLevel => View::CategoryLevel,
            View::CategoryLevel => View::ProjectOverview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            View::ProjectOverview => View::CategoryLevel,
            View::AffordabilityOverview => View::ProjectOverview,
            View::ItemLevel => View::AffordabilityOverview,
            View::CategoryLevel => View::ItemLevel,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the sidebar label or the slug, case-insensitively.
impl FromStr for View {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        View::ALL
            .iter()
            .copied()
            .find(|v| v.label().eq_ignore_ascii_case(wanted) || v.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SelectionError::UnknownView(s.to_string()))
    }
}

/// Price metric for the category view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    Mean,
    Median,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Mean => "Mean",
            Metric::Median => "Median",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Metric::Mean => Metric::Median,
            Metric::Median => Metric::Mean,
        }
    }
}

impl FromStr for Metric {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Metric::Mean),
            "median" => Ok(Metric::Median),
            _ => Err(SelectionError::UnknownMetric(s.to_string())),
        }
    }
}

/// Time granularity for the affordability view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    #[default]
    Monthly,
    Annual,
}

impl Granularity {
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Monthly => "Monthly",
            Granularity::Annual => "Annual",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Granularity::Monthly => Granularity::Annual,
            Granularity::Annual => Granularity::Monthly,
        }
    }
}

impl FromStr for Granularity {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Granularity::Monthly),
            "annual" => Ok(Granularity::Annual),
            _ => Err(SelectionError::UnknownGranularity(s.to_string())),
        }
    }
}

/// Everything one interaction decides. Rendering is a pure function of
/// (Dataset, Selection).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub view: View,
    pub metric: Metric,
    pub granularity: Granularity,
    /// `None` means the first item alphabetically.
    pub item: Option<String>,
}

impl Selection {
    pub fn new(view: View) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_parses_labels_and_slugs() {
        for view in View::ALL {
            assert_eq!(view.label().parse::<View>().unwrap(), view);
            assert_eq!(view.slug().parse::<View>().unwrap(), view);
        }
        assert_eq!("item-level analysis".parse::<View>().unwrap(), View::ItemLevel);
    }

    #[test]
    fn test_unknown_view_is_rejected() {
        let err = "Settings".parse::<View>().unwrap_err();
        assert_eq!(err, SelectionError::UnknownView("Settings".to_string()));
    }

    #[test]
    fn test_view_cycle_visits_every_view() {
        let mut view = View::default();
        let mut seen = vec![view];
        for _ in 0..3 {
            view = view.next();
            seen.push(view);
        }
        assert_eq!(seen, View::ALL.to_vec());
        assert_eq!(view.next(), View::ProjectOverview);
        assert_eq!(View::ProjectOverview.previous(), View::CategoryLevel);
    }

    #[test]
    fn test_toggles() {
        assert_eq!("MEDIAN".parse::<Metric>().unwrap(), Metric::Median);
        assert_eq!(Metric::Mean.toggled(), Metric::Median);
        assert_eq!("annual".parse::<Granularity>().unwrap(), Granularity::Annual);
        assert_eq!(Granularity::Annual.toggled(), Granularity::Monthly);
        assert!("weekly".parse::<Granularity>().is_err());
        assert!("mode".parse::<Metric>().is_err());
    }
}
