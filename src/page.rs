// Page model emitted by the render routines.
// The TUI and the HTML renderer draw it; the JSON API serializes it as-is.

use crate::annotations::AuditEntry;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub title: String,
    pub widgets: Vec<Widget>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            widgets: Vec::new(),
        }
    }

    pub fn push(&mut self, widget: Widget) -> &mut Self {
        self.widgets.push(widget);
        self
    }

    /// Every chart on the page, including those nested in columns.
    pub fn charts(&self) -> Vec<&Chart> {
        fn walk<'a>(widgets: &'a [Widget], out: &mut Vec<&'a Chart>) {
            for widget in widgets {
                match widget {
                    Widget::Chart(chart) => out.push(chart),
                    Widget::Columns(columns) => {
                        for column in columns {
                            walk(column, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.widgets, &mut out);
        out
    }

    /// Every table on the page, including those nested in columns.
    pub fn tables(&self) -> Vec<&Table> {
        fn walk<'a>(widgets: &'a [Widget], out: &mut Vec<&'a Table>) {
            for widget in widgets {
                match widget {
                    Widget::Table(table) => out.push(table),
                    Widget::Columns(columns) => {
                        for column in columns {
                            walk(column, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.widgets, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Widget {
    Header(String),
    Title(String),
    Subheader(String),
    /// Light markdown: `**bold**`, `### heading`, `- bullet`.
    Markdown(String),
    Caption(String),
    /// Caption quoting figures computed offline, shown verbatim next to the
    /// result of re-checking them against the loaded data.
    FrozenCaption {
        text: String,
        checks: Vec<AuditEntry>,
    },
    /// Highlighted insight box.
    Info(String),
    Chart(Chart),
    Table(Table),
    /// Side-by-side groups of widgets.
    Columns(Vec<Vec<Widget>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// CSS / terminal color name, when the series has a fixed color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: XValue,
    /// `None` is a gap: drawn as a break in the line, never as zero.
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum XValue {
    Date(NaiveDate),
    Year(i32),
    Label(String),
}

impl XValue {
    /// Natural numeric position on a time axis, if there is one.
    pub fn position(&self) -> Option<f64> {
        match self {
            XValue::Date(date) => Some(date.num_days_from_ce() as f64),
            XValue::Year(year) => Some(*year as f64),
            XValue::Label(_) => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            XValue::Date(date) => date.format("%b %Y").to_string(),
            XValue::Year(year) => year.to_string(),
            XValue::Label(label) => label.clone(),
        }
    }
}

/// A series flattened for plotting: (x, y) with gaps kept as `None`.
pub type PlotSeries<'a> = (&'a Series, Vec<(f64, Option<f64>)>);

impl Chart {
    pub fn line(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: ChartKind::Line,
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
        }
    }

    pub fn bar(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Bar,
            ..Self::line(title, x_label, y_label)
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Numeric x positions for every point. When any x lacks a natural
    /// position, all series fall back to ordinal positions over the
    /// distinct x labels in first-seen order.
    pub fn plot_series(&self) -> Vec<PlotSeries<'_>> {
        let natural = self
            .series
            .iter()
            .flat_map(|s| &s.points)
            .all(|p| p.x.position().is_some());

        if natural {
            return self
                .series
                .iter()
                .map(|s| {
                    let pts = s
                        .points
                        .iter()
                        .filter_map(|p| p.x.position().map(|x| (x, p.y)))
                        .collect();
                    (s, pts)
                })
                .collect();
        }

        let labels = self.x_labels();
        self.series
            .iter()
            .map(|s| {
                let pts = s
                    .points
                    .iter()
                    .map(|p| {
                        let label = p.x.display();
                        let x = labels.iter().position(|l| *l == label).unwrap_or(0) as f64;
                        (x, p.y)
                    })
                    .collect();
                (s, pts)
            })
            .collect()
    }

    /// Distinct x labels in first-seen order.
    pub fn x_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for point in self.series.iter().flat_map(|s| &s.points) {
            let label = point.x.display();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// (min, max) over defined y values, or `None` for an empty chart.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self
            .series
            .iter()
            .flat_map(|s| &s.points)
            .filter_map(|p| p.y)
            .filter(|y| y.is_finite());
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }

    /// (min, max) over plotted x positions.
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        let plotted = self.plot_series();
        let mut xs = plotted.iter().flat_map(|(_, pts)| pts.iter().map(|(x, _)| *x));
        let first = xs.next()?;
        Some(xs.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
    }
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            points: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn push(&mut self, x: XValue, y: Option<f64>) {
        self.points.push(Point { x, y });
    }

    /// Runs of consecutive defined points; a gap ends a run.
    pub fn segments(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, y) in points {
            match y {
                Some(y) if y.is_finite() => current.push((*x, *y)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: None,
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }
}
