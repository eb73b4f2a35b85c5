// View Router + Render Routines
// One pure function per navigation view; each reads the Dataset and returns a Page.

use crate::analytics::{
    annual_mean, annual_sum, annual_yoy, item_series, monthly_basket_yoy, monthly_tag_stats,
    rank_by_mean_price, rank_by_volatility, AffordabilityField, RankedItem, TagPivot,
};
use crate::annotations::{audit, audit_one, Annotation, AuditOutcome};
use crate::data::{parse_flexible_date, Dataset};
use crate::format;
use crate::page::{Chart, Page, Series, Table, Widget, XValue};
use crate::selection::{Granularity, Metric, Selection, View};

pub const DASHBOARD_TITLE: &str = "📊 Food Affordability in Ireland (2014–2024)";

/// Exhaustive over [`View`]: every view renders exactly one routine.
pub fn render(dataset: &Dataset, selection: &Selection) -> Page {
    match selection.view {
        View::ProjectOverview => render_home(dataset),
        View::ItemLevel => render_item_level(dataset, selection.item.as_deref()),
        View::CategoryLevel => render_category_level(dataset, selection.metric),
        View::AffordabilityOverview => render_affordability(dataset, selection.granularity),
    }
}

/// Fixed color per nutrition tag; other tags take the renderer's palette.
pub fn tag_color(tag: &str) -> Option<&'static str> {
    match tag {
        "Healthy" => Some("green"),
        "Neutral" => Some("blue"),
        "Unhealthy" => Some("red"),
        _ => None,
    }
}

fn food_x(date: &str) -> XValue {
    parse_flexible_date(date)
        .map(XValue::Date)
        .unwrap_or_else(|| XValue::Label(date.to_string()))
}

fn frozen(dataset: &Dataset, text: &str, annotations: &[Annotation]) -> Widget {
    Widget::FrozenCaption {
        text: text.to_string(),
        checks: annotations.iter().map(|a| audit_one(dataset, *a)).collect(),
    }
}

// ============================================================================
// PROJECT OVERVIEW
// ============================================================================

pub fn render_home(dataset: &Dataset) -> Page {
    let mut page = Page::new(View::ProjectOverview.label());
    page.push(Widget::Header("📘 About This Project".into()));
    page.push(Widget::Markdown(
        "Welcome to the **Food Affordability Dashboard** for Ireland (2014–2024).
This interactive dashboard allows you to explore how the cost of maintaining a healthy diet has changed over time — and how it compares to household income levels.

### 🎯 Goals of the Project
- Understand food price trends at **item** and **category** levels.
- Track how **affordability** has shifted monthly and annually.
- Compare trends across **Healthy**, **Unhealthy**, and **Neutral** food groups.
- Provide data-driven **insights for policy**, budgeting, and personal health decisions.

### 📈 Data Sources
- Central Statistics Office (CSO).
- The Food and Agriculture Organization Guidelines (FAO).
- SafeFood & HSE dietary guidelines.

---
Use the **sidebar** to explore different views and explore more."
            .into(),
    ));

    let mut tables = Table::new(["Table", "Rows", "Columns"]).titled("Loaded Tables");
    tables.push_row([
        "affordability_final.csv".to_string(),
        dataset.affordability.len().to_string(),
        "4".to_string(),
    ]);
    tables.push_row([
        "food_afford.csv".to_string(),
        dataset.food_prices.len().to_string(),
        "4".to_string(),
    ]);
    tables.push_row([
        "item_summary.csv".to_string(),
        dataset.item_summary.len().to_string(),
        dataset.item_summary.headers.len().to_string(),
    ]);
    tables.push_row([
        "tag_summary.csv".to_string(),
        dataset.tag_summary.len().to_string(),
        dataset.tag_summary.headers.len().to_string(),
    ]);
    page.push(Widget::Table(tables));

    let entries = audit(dataset);
    let mut audit_table = Table::new(["Caption figure", "As printed", "Live data"]).titled("Frozen Caption Check");
    for entry in &entries {
        let live = match &entry.outcome {
            AuditOutcome::Matches => "matches".to_string(),
            AuditOutcome::Drifted { live } => live.clone(),
            AuditOutcome::Unavailable => "not in data".to_string(),
        };
        audit_table.push_row([entry.description.to_string(), entry.claim.to_string(), live]);
    }
    page.push(Widget::Table(audit_table));
    page.push(Widget::Caption(crate::annotations::summary(&entries)));

    page
}

// ============================================================================
// ITEM LEVEL
// ============================================================================

fn ranking_table(title: &str, column: &str, entries: &[RankedItem], render: fn(f64) -> String) -> Widget {
    let mut table = Table::new(["Item", column]).titled(title);
    for entry in entries {
        table.push_row([entry.item.clone(), format::optional(entry.value, render)]);
    }
    Widget::Table(table)
}

fn std_dev(value: f64) -> String {
    format::fixed(value, 2)
}

pub fn render_item_level(dataset: &Dataset, item: Option<&str>) -> Page {
    let mut page = Page::new(View::ItemLevel.label());
    page.push(Widget::Header("🧾 Item-Level Cost Drivers".into()));
    page.push(Widget::Title("📊 Food Prices – Item Level Analysis".into()));

    let items = dataset.items();
    let selected = item
        .filter(|wanted| items.iter().any(|i| i == wanted))
        .map(str::to_string)
        .or_else(|| items.first().cloned());

    match &selected {
        Some(selected) => {
            let mut series = Series::new(selected.clone());
            for record in item_series(&dataset.food_prices, selected) {
                series.push(food_x(&record.date), record.price);
            }
            let chart = Chart::line(
                format!("{} Price Over Time (€/kg or €/litre)", selected),
                "Date",
                "Price (€/kg or L)",
            )
            .with_series(series);
            page.push(Widget::Chart(chart));
        }
        None => {
            page.push(Widget::Caption("No food items loaded.".into()));
        }
    }

    page.push(Widget::Caption(
        "🧠 Price trend reveals how external factors (e.g. inflation, supply chain disruptions) may have impacted this item."
            .into(),
    ));

    let volatility = rank_by_volatility(&dataset.food_prices);
    page.push(Widget::Markdown("#### 📉 Price Volatility Insights".into()));
    page.push(Widget::Columns(vec![
        vec![ranking_table("Top 5 Most Volatile Items", "Std Dev", volatility.head(5), std_dev)],
        vec![ranking_table("Top 5 Least Volatile Items", "Std Dev", volatility.tail(5), std_dev)],
    ]));
    page.push(Widget::Caption(
        "🔍 Volatility highlights which foods fluctuate most — helpful indicator for budgeting or subsidies.".into(),
    ));

    let avg_price = rank_by_mean_price(&dataset.food_prices);
    page.push(Widget::Columns(vec![
        vec![ranking_table("Top 5 Most Expensive Items", "Avg Price (€)", avg_price.head(5), format::euro)],
        vec![ranking_table("Top 5 Least Expensive Items", "Avg Price (€)", avg_price.tail(5), format::euro)],
    ]));
    page.push(Widget::Caption(
        "💡 Consistently expensive items tend to be lean proteins or premium items like smoked salmon.".into(),
    ));

    page.push(Widget::Markdown("### 🧠 Key Insights".into()));
    page.push(Widget::Info(
        "- The most **price-volatile items** were **the meats**, showing significant fluctuations over time.
- In contrast, staple items like **flour and milk** had the most stable pricing.
- The **most expensive item on average** was the **smoked salmon per kg**, while **Full Fat Milk** was the cheapest.
- Price volatility could be related to imported or seasonal products, while staples remain steady.
- Understanding volatility helps policymakers and consumers plan for **price shocks**."
            .into(),
    ));

    page
}

// ============================================================================
// CATEGORY LEVEL
// ============================================================================

/// Summary figures from a one-off analysis; reproduced as printed.
pub const CATEGORY_SUMMARY: [[&str; 5]; 3] = [
    ["Healthy", "€7.52", "€3.65", "High", "Medium (7.01)"],
    ["Neutral", "€6.53", "€2.20", "Very High", "High (9.64)"],
    ["Unhealthy", "€6.45", "€5.27", "Low", "Stable (5.40)"],
];

pub const CATEGORY_SUMMARY_COLUMNS: [&str; 5] = [
    "Category",
    "Mean Price",
    "Median Price (50%)",
    "Skew (Mean > Median?)",
    "Price Stability (std)",
];

fn tag_series(tag: &str) -> Series {
    let series = Series::new(tag);
    match tag_color(tag) {
        Some(color) => series.with_color(color),
        None => series,
    }
}

pub fn render_category_level(dataset: &Dataset, metric: Metric) -> Page {
    let mut page = Page::new(View::CategoryLevel.label());
    page.push(Widget::Header("🥦 Healthy-Related Category Food Trends".into()));
    page.push(Widget::Markdown(
        "**Healthy foods** have become more expensive faster than processed foods.".into(),
    ));

    let stats = monthly_tag_stats(&dataset.food_prices);

    // Long form straight from the group-by: one series per tag.
    let mut price_chart = Chart::line(
        format!("📈 Monthly Prices by Category ({})", metric.label()),
        "Date",
        "Price (€/kg or L)",
    );
    for stat in &stats {
        if !price_chart.series.iter().any(|s| s.name == stat.tag) {
            price_chart.series.push(tag_series(&stat.tag));
        }
        if let Some(series) = price_chart.series.iter_mut().find(|s| s.name == stat.tag) {
            series.push(food_x(&stat.date), stat.value(metric));
        }
    }
    page.push(Widget::Chart(price_chart));
    page.push(Widget::Caption(format!(
        "📌 Healthy food prices ({}) have trended higher than others.",
        metric.label()
    )));

    // YoY on the wide form; the first 12 months of each tag stay undefined.
    let yoy = TagPivot::from_stats(&stats, metric).pct_change(12).melt();
    let mut yoy_chart = Chart::line(
        format!("📉 Year-over-Year % Change in Prices ({})", metric.label()),
        "Date",
        "% Change",
    );
    for point in yoy {
        if yoy_chart.series.last().map(|s| s.name.as_str()) != Some(point.tag.as_str()) {
            yoy_chart.series.push(tag_series(&point.tag));
        }
        if let Some(series) = yoy_chart.series.last_mut() {
            series.push(food_x(&point.date), point.value);
        }
    }
    page.push(Widget::Chart(yoy_chart));
    page.push(Widget::Caption(
        "⚠️ Year-over-year price shifts show volatility, it highlights the magnitude of the increase between 2022 and 2024."
            .into(),
    ));

    page.push(Widget::Markdown("### 📊 Nutrition Category Summary".into()));
    let mut summary = Table::new(CATEGORY_SUMMARY_COLUMNS);
    for row in CATEGORY_SUMMARY {
        summary.push_row(row);
    }
    page.push(Widget::Table(summary));
    page.push(Widget::Caption(
        "📋 A large gap between mean and median (e.g. Healthy: €7.52 vs €3.65) suggests a few expensive items (mainly proteins) drive up the average — indicating price inequality within that category."
            .into(),
    ));

    page.push(Widget::Markdown("### 🧠 Key Insights".into()));
    page.push(Widget::Info(
        "- Among categories:
    - **Healthy** foods had the **highest average price** (€7.52), but a **low median** (€3.65), indicating price skew due to high number of proteins in the category.
    - **Neutral** foods were the most **volatile** (std = 9.64), showing inconsistent pricing across time.
    - **Unhealthy** foods were **more stable and affordable**, with a lower std (5.40) and a small gap between mean (€6.45) and median (€5.27).
- These patterns suggest that maintaining a healthy diet may be **less predictable and more expensive**, potentially impacting food equity and public health."
            .into(),
    ));

    page
}

// ============================================================================
// AFFORDABILITY
// ============================================================================

fn monthly_series(dataset: &Dataset, name: &str, field: AffordabilityField) -> Series {
    let mut series = Series::new(name);
    for record in &dataset.affordability {
        series.push(XValue::Date(record.date), Some(field.of(record)));
    }
    series
}

fn annual_series(name: &str, values: &[(i32, f64)]) -> Series {
    let mut series = Series::new(name);
    for (year, value) in values {
        series.push(XValue::Year(*year), Some(*value));
    }
    series
}

pub fn render_affordability(dataset: &Dataset, granularity: Granularity) -> Page {
    let mut page = Page::new(View::AffordabilityOverview.label());
    page.push(Widget::Header("💶 Affordability Analysis (2014–2024)".into()));
    page.push(Widget::Markdown(
        "This section shows how affordable a healthy food basket is relative to household income in Ireland.".into(),
    ));

    let records = &dataset.affordability;

    match granularity {
        Granularity::Monthly => {
            page.push(Widget::Subheader("📅 Monthly Basket Cost (€)".into()));
            page.push(Widget::Chart(
                Chart::line("Monthly Basket Cost (€)", "Date", "€").with_series(monthly_series(
                    dataset,
                    "Basket_Cost_Euro",
                    AffordabilityField::BasketCost,
                )),
            ));
            page.push(Widget::Caption(
                "📌 Basket costs rose steadily across the decade, with post-2021 showing the steepest increases.".into(),
            ));

            // Undefined leading months are dropped here, not drawn as gaps.
            page.push(Widget::Subheader("📉 Monthly Year-over-Year % Change".into()));
            let mut yoy = Series::new("Monthly_YoY_%");
            for (date, change) in monthly_basket_yoy(records) {
                yoy.push(XValue::Date(date), Some(change));
            }
            page.push(Widget::Chart(
                Chart::line("Monthly YoY % Change in Basket Cost", "Date", "% Change").with_series(yoy),
            ));
            page.push(frozen(
                dataset,
                "📌 The largest YoY spike occurred in **Jan 2023**, with a **13.87%** increase — likely reflecting inflation shocks.",
                &[Annotation::PeakMonthlyYoy],
            ));
        }
        Granularity::Annual => {
            page.push(Widget::Subheader("📊 Average Annual Basket Cost (Per Month Average × 12)".into()));
            let yearly_avg = annual_mean(records, AffordabilityField::BasketCost);
            page.push(Widget::Chart(
                Chart::bar("Average Monthly Basket Cost (Annual View)", "Year", "€")
                    .with_series(annual_series("Avg_Basket_Cost", &yearly_avg)),
            ));
            page.push(Widget::Caption(
                "📋 Although this shows monthly averages, the annual trend reveals steady cost increases — indicating a sustained rise in essential food prices."
                    .into(),
            ));

            page.push(Widget::Subheader("📈 Year-over-Year % Change (Based on Avg Monthly)".into()));
            page.push(Widget::Chart(
                Chart::bar("Year-over-Year % Change in Avg Basket Cost", "Year", "YoY Change (%)")
                    .with_series(annual_series("YoY Change (%)", &annual_yoy(&yearly_avg))),
            ));
            page.push(Widget::Caption(
                "📈 Sharp jumps (e.g. 2022–2023) highlight how had inflationary spikes hit household food budgets in recent years."
                    .into(),
            ));

            page.push(Widget::Subheader("🧾 Total Annual Basket Cost (€ per Year)".into()));
            let yearly_total = annual_sum(records, AffordabilityField::BasketCost);
            page.push(Widget::Chart(
                Chart::bar("Total Basket Cost Spent per Year (€)", "Year", "€")
                    .with_series(annual_series("Total_Basket_Cost", &yearly_total)),
            ));
            page.push(frozen(
                dataset,
                "💸 Total yearly food spending climbed from €3,265.41 in 2014 to €3,688.87 in 2024 — widening the affordability gap, especially for low-income families.",
                &[Annotation::AnnualTotal2014, Annotation::AnnualTotal2024],
            ));
        }
    }

    page.push(Widget::Subheader("📉 % of Income Spent on Food Basket".into()));
    page.push(Widget::Chart(
        Chart::line("Affordability Ratio Over Time", "Date", "% of Income").with_series(monthly_series(
            dataset,
            "Affordability_Ratio",
            AffordabilityField::Ratio,
        )),
    ));
    page.push(frozen(
        dataset,
        "📌 In 2024, households spent an average of just **7.3%** of income on food — a drop from 9% in 2014.",
        &[Annotation::MeanRatio2024],
    ));

    page.push(Widget::Subheader("📈 Affordability Index (2014 = 100)".into()));
    match granularity {
        Granularity::Monthly => {
            page.push(Widget::Chart(
                Chart::line("Affordability Index (Monthly)", "Date", "Index").with_series(monthly_series(
                    dataset,
                    "Affordability_Index",
                    AffordabilityField::Index,
                )),
            ));
            page.push(frozen(
                dataset,
                "📌 The Affordability Index peaked in **Jan 2014 (102.38)**, but has since dropped to an average of **79.17** in 2024 — indicating food is less affordable relative to income.",
                &[Annotation::PeakIndexJan2014, Annotation::MeanIndex2024],
            ));
        }
        Granularity::Annual => {
            let annual_index = annual_mean(records, AffordabilityField::Index);
            page.push(Widget::Chart(
                Chart::bar("Affordability Index (Annual Avg)", "Year", "Index")
                    .with_series(annual_series("Avg_Index", &annual_index)),
            ));
        }
    }

    page.push(Widget::Markdown("### 🧠 Summary Insights".into()));
    page.push(Widget::Info(
        "- Over the past 10 years, the cost of a healthy food basket increased by **13%**, but affordability has improved due to stronger income growth.
- The **Affordability Ratio** has declined from ~9% to **7.3%**, signaling reduced financial pressure from food costs.
- Despite improved ratios, the **Affordability Index** fell by ~23 points — showing that while food is a smaller share of income, it's still harder to buy the same basket.
- YoY volatility highlights economic stress points like **2023**.
- These insights support further research or **policy** targeting affordability gaps, especially for lower-income households."
            .into(),
    ));

    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AffordabilityRecord, FoodPriceRecord};
    use crate::page::ChartKind;
    use chrono::NaiveDate;

    fn price(item: &str, date: &str, value: f64, tag: &str) -> FoodPriceRecord {
        FoodPriceRecord {
            item: item.to_string(),
            date: date.to_string(),
            price: Some(value),
            tag: tag.to_string(),
        }
    }

    fn sample_dataset() -> Dataset {
        let mut food = Vec::new();
        let mut affordability = Vec::new();
        for i in 0..36u32 {
            let year = 2014 + (i / 12) as i32;
            let month = i % 12 + 1;
            let date = format!("{}-{:02}-01", year, month);
            food.push(price("Smoked Salmon", &date, 30.0 + i as f64, "Healthy"));
            food.push(price("Full Fat Milk", &date, 1.0, "Neutral"));
            food.push(price("Crisps", &date, 8.0, "Unhealthy"));
            affordability.push(AffordabilityRecord {
                date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
                basket_cost_euro: 250.0 + i as f64,
                affordability_ratio: 9.0 - i as f64 * 0.05,
                affordability_index: 100.0 - i as f64 * 0.5,
            });
        }
        Dataset {
            affordability,
            food_prices: food,
            ..Dataset::default()
        }
    }

    #[test]
    fn test_router_dispatches_each_view() {
        let dataset = sample_dataset();
        for view in View::ALL {
            let page = render(&dataset, &Selection::new(view));
            assert_eq!(page.title, view.label());
        }
    }

    #[test]
    fn test_overview_is_static_text_plus_load_summary() {
        let page = render_home(&sample_dataset());
        assert!(page.charts().is_empty());
        let tables = page.tables();
        assert_eq!(tables[0].rows[0][1], "36");
        assert_eq!(tables[0].rows[1][1], "108");
        assert_eq!(tables[1].rows.len(), Annotation::ALL.len());
    }

    #[test]
    fn test_item_view_defaults_to_first_item() {
        let page = render_item_level(&sample_dataset(), None);
        let charts = page.charts();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].series[0].name, "Crisps");
        assert_eq!(charts[0].point_count(), 36);
        assert_eq!(page.tables().len(), 4);
    }

    #[test]
    fn test_item_view_series_matches_source_rows() {
        let dataset = sample_dataset();
        let page = render_item_level(&dataset, Some("Smoked Salmon"));
        let series = &page.charts()[0].series[0];
        let expected: Vec<(XValue, Option<f64>)> = dataset
            .food_prices
            .iter()
            .filter(|r| r.item == "Smoked Salmon")
            .map(|r| (food_x(&r.date), r.price))
            .collect();
        let actual: Vec<(XValue, Option<f64>)> = series.points.iter().map(|p| (p.x.clone(), p.y)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_item_view_ranking_tables_are_formatted() {
        let page = render_item_level(&sample_dataset(), None);
        let tables = page.tables();
        assert_eq!(tables[0].title.as_deref(), Some("Top 5 Most Volatile Items"));
        assert_eq!(tables[0].rows[0][0], "Smoked Salmon");
        assert_eq!(tables[2].rows[0], vec!["Smoked Salmon".to_string(), "€47.50".to_string()]);
        assert_eq!(tables[3].rows.last().unwrap()[1], "€1.00");
    }

    #[test]
    fn test_item_view_with_no_data_does_not_panic() {
        let page = render_item_level(&Dataset::default(), None);
        assert!(page.charts().is_empty());
        assert!(page.tables().iter().all(|t| t.rows.is_empty()));
    }

    #[test]
    fn test_category_view_yoy_gaps_and_static_summary() {
        let page = render_category_level(&sample_dataset(), Metric::Median);
        let charts = page.charts();
        assert_eq!(charts.len(), 2);
        assert!(charts[0].title.ends_with("(Median)"));

        let yoy = charts[1];
        assert_eq!(yoy.series.len(), 3);
        for series in &yoy.series {
            assert_eq!(series.points.len(), 36);
            assert!(series.points[..12].iter().all(|p| p.y.is_none()));
            assert!(series.points[12..].iter().all(|p| p.y.is_some()));
        }
        let neutral = yoy.series.iter().find(|s| s.name == "Neutral").unwrap();
        assert_eq!(neutral.color.as_deref(), Some("blue"));
        assert!(neutral.points[12..].iter().all(|p| p.y == Some(0.0)));

        let summary = page.tables()[0];
        assert_eq!(summary.columns, CATEGORY_SUMMARY_COLUMNS.to_vec());
        assert_eq!(summary.rows[1], vec!["Neutral", "€6.53", "€2.20", "Very High", "High (9.64)"]);
    }

    #[test]
    fn test_affordability_monthly_drops_leading_yoy_points() {
        let page = render_affordability(&sample_dataset(), Granularity::Monthly);
        let charts = page.charts();
        assert_eq!(charts.len(), 4);
        assert!(charts.iter().all(|c| c.kind == ChartKind::Line));
        let yoy = &charts[1].series[0];
        assert_eq!(yoy.points.len(), 24);
        assert!(yoy.points.iter().all(|p| p.y.is_some()));
    }

    #[test]
    fn test_affordability_annual_branch() {
        let page = render_affordability(&sample_dataset(), Granularity::Annual);
        let charts = page.charts();
        assert_eq!(charts.len(), 5);
        assert_eq!(charts[0].kind, ChartKind::Bar);
        assert_eq!(charts[0].series[0].points.len(), 3);
        assert_eq!(charts[1].series[0].points.len(), 2);
        assert_eq!(charts[2].series[0].points[0].y, Some((250..262).sum::<i32>() as f64));
        assert_eq!(charts[3].kind, ChartKind::Line);
        assert_eq!(charts[4].title, "Affordability Index (Annual Avg)");
    }

    #[test]
    fn test_rendering_does_not_mutate_dataset() {
        let dataset = sample_dataset();
        let before = dataset.clone();
        for granularity in [Granularity::Monthly, Granularity::Annual, Granularity::Monthly] {
            render(&dataset, &Selection::new(View::AffordabilityOverview).with_granularity(granularity));
        }
        render(&dataset, &Selection::new(View::CategoryLevel).with_metric(Metric::Median));
        assert_eq!(dataset, before);
    }

    #[test]
    fn test_same_selection_renders_identically() {
        let dataset = sample_dataset();
        let selection = Selection::new(View::ItemLevel).with_item("Full Fat Milk");
        assert_eq!(render(&dataset, &selection), render(&dataset, &selection));
    }

    #[test]
    fn test_frozen_captions_carry_audit_results() {
        let page = render_affordability(&sample_dataset(), Granularity::Monthly);
        let frozen: Vec<&Widget> = page
            .widgets
            .iter()
            .filter(|w| matches!(w, Widget::FrozenCaption { .. }))
            .collect();
        assert_eq!(frozen.len(), 3);
        if let Widget::FrozenCaption { checks, .. } = frozen[0] {
            assert_eq!(checks[0].annotation, Annotation::PeakMonthlyYoy);
            assert!(matches!(checks[0].outcome, AuditOutcome::Drifted { .. }));
        }
    }
}
