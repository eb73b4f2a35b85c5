// Aggregations behind the dashboard charts
// Group-bys, rankings, pivots and year-over-year change over the loaded tables.

use crate::data::{parse_flexible_date, AffordabilityRecord, FoodPriceRecord};
use crate::selection::Metric;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// DESCRIPTIVE STATISTICS
// ============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1). Undefined below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Percent change against the value `periods` positions earlier.
///
/// The first `periods` entries are always `None`. A missing value on either
/// side, or a zero base, also yields `None`.
pub fn pct_change(series: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| {
            if i < periods {
                return None;
            }
            match (series[i], series[i - periods]) {
                (Some(current), Some(base)) if base != 0.0 => Some((current / base - 1.0) * 100.0),
                _ => None,
            }
        })
        .collect()
}

/// Chronological sort key for the text dates of the food table.
pub fn date_order_key(date: &str) -> (Option<NaiveDate>, &str) {
    (parse_flexible_date(date), date)
}

// ============================================================================
// ITEM LEVEL
// ============================================================================

/// The selected item's observations, in file order.
pub fn item_series<'a>(food: &'a [FoodPriceRecord], item: &str) -> Vec<&'a FoodPriceRecord> {
    food.iter().filter(|r| r.item == item).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub item: String,
    /// `None` when the statistic is undefined for the item.
    pub value: Option<f64>,
}

/// Items ordered by a statistic, highest first; undefined values sort last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedItem>,
}

impl Ranking {
    fn from_groups(groups: BTreeMap<&str, Vec<f64>>, stat: fn(&[f64]) -> Option<f64>) -> Self {
        let mut entries: Vec<RankedItem> = groups
            .into_iter()
            .map(|(item, prices)| RankedItem {
                item: item.to_string(),
                value: stat(&prices),
            })
            .collect();

        // Stable: ties keep alphabetical order.
        entries.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ranking { entries }
    }

    pub fn head(&self, n: usize) -> &[RankedItem] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Last `n` entries, still in descending order.
    pub fn tail(&self, n: usize) -> &[RankedItem] {
        let len = self.entries.len();
        &self.entries[len - n.min(len)..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn prices_by_item(food: &[FoodPriceRecord]) -> BTreeMap<&str, Vec<f64>> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in food {
        let prices = groups.entry(record.item.as_str()).or_default();
        if let Some(price) = record.price {
            prices.push(price);
        }
    }
    groups
}

/// Price volatility (sample std) per item across the whole table.
pub fn rank_by_volatility(food: &[FoodPriceRecord]) -> Ranking {
    Ranking::from_groups(prices_by_item(food), sample_std)
}

/// Average price per item across the whole table.
pub fn rank_by_mean_price(food: &[FoodPriceRecord]) -> Ranking {
    Ranking::from_groups(prices_by_item(food), mean)
}

// ============================================================================
// CATEGORY LEVEL
// ============================================================================

/// Mean and median price of one tag in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagMonthStat {
    pub date: String,
    pub tag: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl TagMonthStat {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Mean => self.mean,
            Metric::Median => self.median,
        }
    }
}

/// Group prices by (Date, Tag), ordered by date then tag.
pub fn monthly_tag_stats(food: &[FoodPriceRecord]) -> Vec<TagMonthStat> {
    let mut groups: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for record in food {
        let prices = groups
            .entry((record.date.clone(), record.tag.clone()))
            .or_default();
        if let Some(price) = record.price {
            prices.push(price);
        }
    }

    let mut stats: Vec<TagMonthStat> = groups
        .into_iter()
        .map(|((date, tag), prices)| TagMonthStat {
            mean: mean(&prices),
            median: median(&prices),
            date,
            tag,
        })
        .collect();

    stats.sort_by(|a, b| {
        date_order_key(&a.date)
            .cmp(&date_order_key(&b.date))
            .then_with(|| a.tag.cmp(&b.tag))
    });
    stats
}

/// Wide form: one row per date, one column per tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagPivot {
    pub dates: Vec<String>,
    /// Column per tag, aligned with `dates`; absent (date, tag) cells are `None`.
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

/// One (Date, Tag, value) row of the long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagPoint {
    pub date: String,
    pub tag: String,
    pub value: Option<f64>,
}

impl TagPivot {
    pub fn from_stats(stats: &[TagMonthStat], metric: Metric) -> Self {
        let mut dates: Vec<String> = stats
            .iter()
            .map(|s| s.date.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        dates.sort_by(|a, b| date_order_key(a).cmp(&date_order_key(b)));
        let rows: HashMap<&str, usize> = dates
            .iter()
            .enumerate()
            .map(|(i, d)| (d.as_str(), i))
            .collect();

        let tags: BTreeSet<&str> = stats.iter().map(|s| s.tag.as_str()).collect();
        let mut columns: BTreeMap<String, Vec<Option<f64>>> = tags
            .into_iter()
            .map(|tag| (tag.to_string(), vec![None; dates.len()]))
            .collect();

        for stat in stats {
            if let (Some(&row), Some(column)) = (rows.get(stat.date.as_str()), columns.get_mut(&stat.tag)) {
                column[row] = stat.value(metric);
            }
        }

        TagPivot { dates, columns }
    }

    /// Percent change per tag column against `periods` rows earlier.
    pub fn pct_change(&self, periods: usize) -> Self {
        TagPivot {
            dates: self.dates.clone(),
            columns: self
                .columns
                .iter()
                .map(|(tag, values)| (tag.clone(), pct_change(values, periods)))
                .collect(),
        }
    }

    /// Back to long form, tag-major like a melt over the tag columns.
    pub fn melt(&self) -> Vec<TagPoint> {
        self.columns
            .iter()
            .flat_map(|(tag, values)| {
                self.dates.iter().zip(values).map(move |(date, value)| TagPoint {
                    date: date.clone(),
                    tag: tag.clone(),
                    value: *value,
                })
            })
            .collect()
    }
}

// ============================================================================
// AFFORDABILITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordabilityField {
    BasketCost,
    Ratio,
    Index,
}

impl AffordabilityField {
    pub fn of(&self, record: &AffordabilityRecord) -> f64 {
        match self {
            AffordabilityField::BasketCost => record.basket_cost_euro,
            AffordabilityField::Ratio => record.affordability_ratio,
            AffordabilityField::Index => record.affordability_index,
        }
    }
}

fn by_year(records: &[AffordabilityRecord], field: AffordabilityField) -> BTreeMap<i32, Vec<f64>> {
    let mut years: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for record in records {
        years.entry(record.date.year()).or_default().push(field.of(record));
    }
    years
}

/// Calendar-year mean of a field, by ascending year.
pub fn annual_mean(records: &[AffordabilityRecord], field: AffordabilityField) -> Vec<(i32, f64)> {
    by_year(records, field)
        .into_iter()
        .filter_map(|(year, values)| mean(&values).map(|m| (year, m)))
        .collect()
}

/// Calendar-year total of a field, by ascending year.
pub fn annual_sum(records: &[AffordabilityRecord], field: AffordabilityField) -> Vec<(i32, f64)> {
    by_year(records, field)
        .into_iter()
        .map(|(year, values)| (year, values.iter().sum()))
        .collect()
}

/// Year-over-year change of an annual series (lag 1); undefined years dropped.
pub fn annual_yoy(annual: &[(i32, f64)]) -> Vec<(i32, f64)> {
    let values: Vec<Option<f64>> = annual.iter().map(|(_, v)| Some(*v)).collect();
    annual
        .iter()
        .zip(pct_change(&values, 1))
        .filter_map(|((year, _), change)| change.map(|c| (*year, c)))
        .collect()
}

/// Monthly basket cost change against 12 months earlier; the undefined
/// leading points are dropped, not kept as gaps.
pub fn monthly_basket_yoy(records: &[AffordabilityRecord]) -> Vec<(NaiveDate, f64)> {
    let costs: Vec<Option<f64>> = records.iter().map(|r| Some(r.basket_cost_euro)).collect();
    records
        .iter()
        .zip(pct_change(&costs, 12))
        .filter_map(|(record, change)| change.map(|c| (record.date, c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(item: &str, date: &str, value: f64, tag: &str) -> FoodPriceRecord {
        FoodPriceRecord {
            item: item.to_string(),
            date: date.to_string(),
            price: Some(value),
            tag: tag.to_string(),
        }
    }

    fn month(year: i32, month: u32, cost: f64) -> AffordabilityRecord {
        AffordabilityRecord {
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            basket_cost_euro: cost,
            affordability_ratio: 8.0,
            affordability_index: 100.0,
        }
    }

    fn month_label(i: usize) -> String {
        format!("{}-{:02}-01", 2014 + i / 12, i % 12 + 1)
    }

    #[test]
    fn test_descriptive_stats() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), Some(2.5));
        assert_eq!(median(&[5.0]), Some(5.0));
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138089935).abs() < 1e-9);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_item_series_round_trips_source_rows() {
        let food = vec![
            price("Milk", "2014-01-01", 1.0, "Neutral"),
            price("Salmon", "2014-01-01", 30.0, "Healthy"),
            price("Milk", "2014-02-01", 1.1, "Neutral"),
        ];
        let series = item_series(&food, "Milk");
        let pairs: Vec<(&str, Option<f64>)> = series.iter().map(|r| (r.date.as_str(), r.price)).collect();
        assert_eq!(pairs, vec![("2014-01-01", Some(1.0)), ("2014-02-01", Some(1.1))]);
        assert!(item_series(&food, "Bread").is_empty());
    }

    #[test]
    fn test_rankings_disjoint_with_many_items() {
        let mut food = Vec::new();
        for i in 0..12 {
            let item = format!("Item {:02}", i);
            food.push(price(&item, "2014-01-01", i as f64, "Healthy"));
            food.push(price(&item, "2014-02-01", i as f64 * 2.0, "Healthy"));
        }

        for ranking in [rank_by_volatility(&food), rank_by_mean_price(&food)] {
            assert_eq!(ranking.len(), 12);
            let top: Vec<&str> = ranking.head(5).iter().map(|r| r.item.as_str()).collect();
            let bottom: Vec<&str> = ranking.tail(5).iter().map(|r| r.item.as_str()).collect();
            assert_eq!(top[0], "Item 11");
            assert_eq!(bottom[4], "Item 00");
            assert!(top.iter().all(|t| !bottom.contains(t)));
        }
    }

    #[test]
    fn test_rankings_single_item_overlap() {
        let food = vec![
            price("Flour", "2014-01-01", 1.0, "Neutral"),
            price("Flour", "2014-02-01", 1.2, "Neutral"),
        ];
        let ranking = rank_by_mean_price(&food);
        assert_eq!(ranking.head(5), ranking.tail(5));
        assert_eq!(ranking.head(5)[0].item, "Flour");
    }

    #[test]
    fn test_single_point_item_has_undefined_volatility_ranked_last() {
        let food = vec![
            price("Apples", "2014-01-01", 2.0, "Healthy"),
            price("Beef", "2014-01-01", 9.0, "Healthy"),
            price("Beef", "2014-02-01", 12.0, "Healthy"),
        ];
        let ranking = rank_by_volatility(&food);
        assert_eq!(ranking.entries[0].item, "Beef");
        assert_eq!(ranking.entries[1], RankedItem { item: "Apples".to_string(), value: None });
    }

    #[test]
    fn test_pct_change_on_flat_series() {
        let flat = vec![Some(4.2); 30];
        let yoy = pct_change(&flat, 12);
        assert!(yoy[..12].iter().all(Option::is_none));
        assert!(yoy[12..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_pct_change_zero_base_is_undefined() {
        let yoy = pct_change(&[Some(0.0), Some(5.0), Some(10.0)], 1);
        assert_eq!(yoy, vec![None, None, Some(100.0)]);
    }

    #[test]
    fn test_category_yoy_keeps_leading_gaps() {
        let mut food = Vec::new();
        for i in 0..24 {
            food.push(price("Kale", &month_label(i), 3.0, "Healthy"));
            food.push(price("Crisps", &month_label(i), 5.0, "Unhealthy"));
            food.push(price("Cola", &month_label(i), 7.0, "Unhealthy"));
        }

        let stats = monthly_tag_stats(&food);
        assert_eq!(stats.len(), 48);
        assert_eq!(stats[1].tag, "Unhealthy");
        assert_eq!(stats[1].mean, Some(6.0));

        let pivot = TagPivot::from_stats(&stats, Metric::Median);
        assert_eq!(pivot.dates.len(), 24);
        assert_eq!(pivot.columns["Unhealthy"][0], Some(6.0));

        let long = pivot.pct_change(12).melt();
        assert_eq!(long.len(), 48);
        assert_eq!(long[0].tag, "Healthy");
        assert!(long.iter().filter(|p| p.value.is_none()).count() == 24);
        assert!(long
            .iter()
            .filter(|p| p.value.is_some())
            .all(|p| p.value == Some(0.0)));
    }

    #[test]
    fn test_pivot_orders_dates_chronologically() {
        let food = vec![
            price("Kale", "2015 February", 3.0, "Healthy"),
            price("Kale", "2014 December", 2.0, "Healthy"),
            price("Kale", "2015 January", 2.5, "Healthy"),
        ];
        let pivot = TagPivot::from_stats(&monthly_tag_stats(&food), Metric::Mean);
        assert_eq!(pivot.dates, vec!["2014 December", "2015 January", "2015 February"]);
    }

    #[test]
    fn test_annual_sum_of_flat_months() {
        let records: Vec<AffordabilityRecord> = (0..24)
            .map(|i| month(2014 + i / 12, (i % 12) as u32 + 1, 100.0))
            .collect();

        assert_eq!(
            annual_sum(&records, AffordabilityField::BasketCost),
            vec![(2014, 1200.0), (2015, 1200.0)]
        );
        assert_eq!(
            annual_mean(&records, AffordabilityField::BasketCost),
            vec![(2014, 100.0), (2015, 100.0)]
        );
    }

    #[test]
    fn test_annual_yoy_drops_first_year() {
        let annual = vec![(2014, 100.0), (2015, 110.0), (2016, 99.0)];
        let yoy = annual_yoy(&annual);
        assert_eq!(yoy.len(), 2);
        assert_eq!(yoy[0].0, 2015);
        assert!((yoy[0].1 - 10.0).abs() < 1e-9);
        assert!((yoy[1].1 + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_basket_yoy_drops_leading_points() {
        let records: Vec<AffordabilityRecord> = (0..24)
            .map(|i| month(2014 + i / 12, (i % 12) as u32 + 1, if i < 12 { 100.0 } else { 105.0 }))
            .collect();
        let yoy = monthly_basket_yoy(&records);
        assert_eq!(yoy.len(), 12);
        assert_eq!(yoy[0].0, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert!(yoy.iter().all(|(_, c)| (c - 5.0).abs() < 1e-9));
    }
}
