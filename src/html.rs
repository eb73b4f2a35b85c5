//! HTML rendering of dashboard pages
//!
//! Produces one self-contained document per request: sidebar navigation,
//! the selected view's widgets and inline SVG charts. No client-side
//! charting library is needed; the only script submits the control form.

use crate::annotations::{AuditEntry, AuditOutcome};
use crate::page::{Chart, ChartKind, Page, Series, Table, Widget};
use crate::selection::{Granularity, Metric, Selection, View};
use crate::views::DASHBOARD_TITLE;

const PALETTE: [&str; 6] = ["#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3"];

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

/// Render a full dashboard document.
///
/// `items` feeds the item selector; `audit_summary` goes in the footer.
pub fn render_document(page: &Page, selection: &Selection, items: &[String], audit_summary: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Food Affordability - {page_title}</title>
    <style>{css}</style>
</head>
<body>
    <aside class="sidebar">
        {sidebar}
    </aside>
    <main class="container">
        <h1 class="app-title">{app_title}</h1>
        <hr>
        {controls}
        {content}
        <footer>{footer}</footer>
    </main>
    <script>{js}</script>
</body>
</html>"#,
        page_title = escape(&page.title),
        css = inline_css(),
        js = inline_javascript(),
        app_title = escape(DASHBOARD_TITLE),
        sidebar = render_sidebar(selection),
        controls = render_controls(selection, items),
        content = render_widgets(&page.widgets),
        footer = escape(audit_summary),
    )
}

/// Query string that reproduces a selection, e.g. `?view=item&item=Full%20Fat%20Milk`.
pub fn query_string(selection: &Selection) -> String {
    let mut query = format!(
        "?view={}&metric={}&granularity={}",
        selection.view.slug(),
        selection.metric.label(),
        selection.granularity.label()
    );
    if let Some(item) = &selection.item {
        query.push_str("&item=");
        query.push_str(&urlencoding::encode(item));
    }
    query
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ============================================================================
// CHROME
// ============================================================================

fn render_sidebar(selection: &Selection) -> String {
    let mut links = String::new();
    for view in View::ALL {
        let target = Selection {
            view,
            ..selection.clone()
        };
        let class = if view == selection.view { " class=\"active\"" } else { "" };
        links.push_str(&format!(
            "<li><a href=\"/{}\"{}>{}</a></li>",
            escape(&query_string(&target)),
            class,
            escape(view.label())
        ));
    }
    format!("<h2>🧭 Navigation</h2><p class=\"muted\">Choose Analysis Level</p><ul class=\"nav\">{}</ul>", links)
}

fn radio_group(name: &str, legend: &str, options: &[&str], checked: &str) -> String {
    let mut html = format!("<fieldset><legend>{}</legend>", escape(legend));
    for option in options {
        let mark = if *option == checked { " checked" } else { "" };
        html.push_str(&format!(
            "<label><input type=\"radio\" name=\"{name}\" value=\"{value}\"{mark}> {value}</label>",
            name = name,
            value = escape(option),
            mark = mark
        ));
    }
    html.push_str("</fieldset>");
    html
}

fn render_controls(selection: &Selection, items: &[String]) -> String {
    let mut html = format!(
        "<form class=\"controls\" method=\"get\" action=\"/\"><input type=\"hidden\" name=\"view\" value=\"{}\">",
        selection.view.slug()
    );

    // Carry toggles not shown on this view so switching views keeps them.
    match selection.view {
        View::CategoryLevel => {
            html.push_str(&radio_group(
                "metric",
                "Select price metric:",
                &[Metric::Mean.label(), Metric::Median.label()],
                selection.metric.label(),
            ));
        }
        _ => html.push_str(&format!(
            "<input type=\"hidden\" name=\"metric\" value=\"{}\">",
            selection.metric.label()
        )),
    }

    match selection.view {
        View::AffordabilityOverview => {
            html.push_str(&radio_group(
                "granularity",
                "Select time granularity:",
                &[Granularity::Monthly.label(), Granularity::Annual.label()],
                selection.granularity.label(),
            ));
        }
        _ => html.push_str(&format!(
            "<input type=\"hidden\" name=\"granularity\" value=\"{}\">",
            selection.granularity.label()
        )),
    }

    if selection.view == View::ItemLevel {
        let current = selection.item.as_deref().or(items.first().map(String::as_str));
        html.push_str("<label>Select a Food Item <select name=\"item\">");
        for item in items {
            let mark = if Some(item.as_str()) == current { " selected" } else { "" };
            html.push_str(&format!(
                "<option value=\"{v}\"{mark}>{v}</option>",
                v = escape(item),
                mark = mark
            ));
        }
        html.push_str("</select></label>");
    }

    html.push_str("</form>");
    html
}

// ============================================================================
// WIDGETS
// ============================================================================

pub fn render_widgets(widgets: &[Widget]) -> String {
    widgets.iter().map(render_widget).collect::<Vec<_>>().join("\n")
}

fn render_widget(widget: &Widget) -> String {
    match widget {
        Widget::Header(text) => format!("<h2>{}</h2>", escape(text)),
        Widget::Title(text) => format!("<h1>{}</h1>", escape(text)),
        Widget::Subheader(text) => format!("<h3>{}</h3>", escape(text)),
        Widget::Markdown(text) => markdown_to_html(text),
        Widget::Caption(text) => format!("<p class=\"caption\">{}</p>", inline_markdown(text)),
        Widget::FrozenCaption { text, checks } => format!(
            "<p class=\"caption\">{} {}</p>",
            inline_markdown(text),
            render_checks(checks)
        ),
        Widget::Info(text) => format!("<div class=\"info\">{}</div>", markdown_to_html(text)),
        Widget::Chart(chart) => render_chart(chart),
        Widget::Table(table) => render_table(table),
        Widget::Columns(columns) => {
            let cols: String = columns
                .iter()
                .map(|c| format!("<div class=\"column\">{}</div>", render_widgets(c)))
                .collect();
            format!("<div class=\"columns\">{}</div>", cols)
        }
    }
}

fn render_checks(checks: &[AuditEntry]) -> String {
    checks
        .iter()
        .map(|check| match &check.outcome {
            AuditOutcome::Matches => format!(
                "<span class=\"frozen ok\" title=\"{}\">frozen figure · matches data</span>",
                escape(check.description)
            ),
            AuditOutcome::Drifted { live } => format!(
                "<span class=\"frozen drift\" title=\"{}\">frozen figure {} · live data: {}</span>",
                escape(check.description),
                escape(check.claim),
                escape(live)
            ),
            AuditOutcome::Unavailable => format!(
                "<span class=\"frozen missing\" title=\"{}\">frozen figure {} · period not in data</span>",
                escape(check.description),
                escape(check.claim)
            ),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_table(table: &Table) -> String {
    let mut html = String::new();
    if let Some(title) = &table.title {
        html.push_str(&format!("<h4>{}</h4>", escape(title)));
    }
    html.push_str("<table><thead><tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// `**bold**` only; everything else is escaped.
fn inline_markdown(text: &str) -> String {
    let mut out = String::new();
    for (i, part) in escape(text).split("**").enumerate() {
        if i % 2 == 1 {
            out.push_str("<strong>");
            out.push_str(part);
            out.push_str("</strong>");
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Headings, rules, two-level bullet lists and paragraphs.
pub fn markdown_to_html(text: &str) -> String {
    let mut html = String::new();
    let mut depth = 0;

    for line in text.lines() {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if let Some(item) = trimmed.strip_prefix("- ") {
            let level = if indent >= 2 { 2 } else { 1 };
            while depth < level {
                html.push_str("<ul>");
                depth += 1;
            }
            while depth > level {
                html.push_str("</ul>");
                depth -= 1;
            }
            html.push_str(&format!("<li>{}</li>", inline_markdown(item)));
            continue;
        }

        while depth > 0 {
            html.push_str("</ul>");
            depth -= 1;
        }

        if trimmed.is_empty() {
            continue;
        } else if trimmed == "---" {
            html.push_str("<hr>");
        } else if let Some(h) = trimmed.strip_prefix("#### ") {
            html.push_str(&format!("<h4>{}</h4>", inline_markdown(h)));
        } else if let Some(h) = trimmed.strip_prefix("### ") {
            html.push_str(&format!("<h3>{}</h3>", inline_markdown(h)));
        } else {
            html.push_str(&format!("<p>{}</p>", inline_markdown(trimmed)));
        }
    }

    while depth > 0 {
        html.push_str("</ul>");
        depth -= 1;
    }
    html
}

// ============================================================================
// SVG CHARTS
// ============================================================================

fn series_color(series: &Series, index: usize) -> String {
    series
        .color
        .clone()
        .unwrap_or_else(|| PALETTE[index % PALETTE.len()].to_string())
}

fn scale(value: f64, (lo, hi): (f64, f64), (out_lo, out_hi): (f64, f64)) -> f64 {
    if (hi - lo).abs() < f64::EPSILON {
        return (out_lo + out_hi) / 2.0;
    }
    out_lo + (value - lo) / (hi - lo) * (out_hi - out_lo)
}

fn tick_label(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else if value.abs() >= 10.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.2}", value)
    }
}

pub fn render_chart(chart: &Chart) -> String {
    let plot_x = (MARGIN_LEFT, CHART_WIDTH - MARGIN_RIGHT);
    let plot_y = (CHART_HEIGHT - MARGIN_BOTTOM, MARGIN_TOP);

    let mut svg = format!(
        "<figure class=\"chart\"><svg viewBox=\"0 0 {w} {h}\" role=\"img\" aria-label=\"{title}\">\
         <text x=\"{cx}\" y=\"22\" class=\"chart-title\" text-anchor=\"middle\">{title}</text>",
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        cx = CHART_WIDTH / 2.0,
        title = escape(&chart.title),
    );

    let y_bounds = match (chart.kind, chart.y_bounds()) {
        (_, None) => {
            svg.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" class=\"muted\">No data</text></svg></figure>",
                CHART_WIDTH / 2.0,
                CHART_HEIGHT / 2.0
            ));
            return svg;
        }
        // Bars grow from zero.
        (ChartKind::Bar, Some((lo, hi))) => (lo.min(0.0), hi.max(0.0)),
        (ChartKind::Line, Some(bounds)) => bounds,
    };

    // Y axis ticks
    for i in 0..=4 {
        let value = y_bounds.0 + (y_bounds.1 - y_bounds.0) * i as f64 / 4.0;
        let y = scale(value, y_bounds, plot_y);
        svg.push_str(&format!(
            "<line x1=\"{x1}\" x2=\"{x2}\" y1=\"{y:.1}\" y2=\"{y:.1}\" class=\"grid\"/>\
             <text x=\"{tx}\" y=\"{ty:.1}\" text-anchor=\"end\" class=\"tick\">{label}</text>",
            x1 = plot_x.0,
            x2 = plot_x.1,
            y = y,
            tx = plot_x.0 - 6.0,
            ty = y + 4.0,
            label = tick_label(value)
        ));
    }

    match chart.kind {
        ChartKind::Line => render_lines(&mut svg, chart, y_bounds, plot_x, plot_y),
        ChartKind::Bar => render_bars(&mut svg, chart, y_bounds, plot_x, plot_y),
    }

    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" class=\"axis-label\">{label}</text>\
         <text x=\"16\" y=\"{cy}\" text-anchor=\"middle\" class=\"axis-label\" transform=\"rotate(-90 16 {cy})\">{ylabel}</text>",
        x = (plot_x.0 + plot_x.1) / 2.0,
        y = CHART_HEIGHT - 8.0,
        label = escape(&chart.x_label),
        cy = CHART_HEIGHT / 2.0,
        ylabel = escape(&chart.y_label),
    ));

    if chart.series.len() > 1 {
        for (i, series) in chart.series.iter().enumerate() {
            let x = plot_x.0 + 10.0 + i as f64 * 120.0;
            svg.push_str(&format!(
                "<rect x=\"{x}\" y=\"30\" width=\"10\" height=\"10\" fill=\"{c}\"/>\
                 <text x=\"{tx}\" y=\"39\" class=\"tick\">{name}</text>",
                x = x,
                c = escape(&series_color(series, i)),
                tx = x + 14.0,
                name = escape(&series.name)
            ));
        }
    }

    svg.push_str("</svg></figure>");
    svg
}

fn render_lines(svg: &mut String, chart: &Chart, y_bounds: (f64, f64), plot_x: (f64, f64), plot_y: (f64, f64)) {
    let Some(x_bounds) = chart.x_bounds() else {
        return;
    };

    let plotted = chart.plot_series();
    for (i, (series, points)) in plotted.iter().enumerate() {
        let color = escape(&series_color(series, i));
        for segment in Series::segments(points) {
            let coords: Vec<(f64, f64)> = segment
                .iter()
                .map(|(x, y)| (scale(*x, x_bounds, plot_x), scale(*y, y_bounds, plot_y)))
                .collect();
            if let [(cx, cy)] = coords.as_slice() {
                svg.push_str(&format!("<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"/>", cx, cy, color));
            } else {
                let points: Vec<String> = coords.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect();
                svg.push_str(&format!(
                    "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
                    points.join(" "),
                    color
                ));
            }
        }
    }

    // First, middle and last x labels of the first series
    if let Some((series, points)) = plotted.first() {
        let mut picks = vec![0, points.len() / 2, points.len().saturating_sub(1)];
        picks.dedup();
        for idx in picks {
            if let (Some((x, _)), Some(point)) = (points.get(idx), series.points.get(idx)) {
                svg.push_str(&format!(
                    "<text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" class=\"tick\">{}</text>",
                    scale(*x, x_bounds, plot_x),
                    plot_y.0 + 16.0,
                    escape(&point.x.display())
                ));
            }
        }
    }
}

fn render_bars(svg: &mut String, chart: &Chart, y_bounds: (f64, f64), plot_x: (f64, f64), plot_y: (f64, f64)) {
    let Some(series) = chart.series.first() else {
        return;
    };
    let count = series.points.len().max(1) as f64;
    let slot = (plot_x.1 - plot_x.0) / count;
    let width = slot * 0.7;
    let zero = scale(0.0, y_bounds, plot_y);
    let color = escape(&series_color(series, 0));

    for (i, point) in series.points.iter().enumerate() {
        let x = plot_x.0 + slot * i as f64 + (slot - width) / 2.0;
        if let Some(y) = point.y {
            let top = scale(y, y_bounds, plot_y);
            svg.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"><title>{}: {:.2}</title></rect>",
                x,
                top.min(zero),
                width,
                (zero - top).abs(),
                color,
                escape(&point.x.display()),
                y
            ));
        }
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" class=\"tick\">{}</text>",
            x + width / 2.0,
            plot_y.0 + 16.0,
            escape(&point.x.display())
        ));
    }
}

fn inline_css() -> &'static str {
    r#"
* { box-sizing: border-box; }
body { margin: 0; display: flex; font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; color: #262730; line-height: 1.6; }
.sidebar { width: 260px; min-height: 100vh; padding: 2rem 1rem; background: #f0f2f6; }
.sidebar .nav { list-style: none; padding: 0; }
.sidebar .nav a { display: block; padding: .4rem .6rem; border-radius: 6px; color: #262730; text-decoration: none; }
.sidebar .nav a.active { background: #ff4b4b; color: #fff; }
.container { flex: 1; max-width: 1200px; padding: 2rem 3rem; }
.controls { display: flex; gap: 2rem; align-items: center; margin-bottom: 1rem; }
.controls fieldset { border: none; padding: 0; }
.caption { color: #6b7280; font-size: .9rem; }
.muted { color: #6b7280; }
.info { background: #e8f1fb; border-radius: 8px; padding: .8rem 1.2rem; margin: 1rem 0; }
.columns { display: flex; gap: 2rem; }
.column { flex: 1; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1rem; }
th, td { border-bottom: 1px solid #e5e7eb; padding: .35rem .6rem; text-align: left; }
.chart svg { width: 100%; height: auto; }
.chart-title { font-size: 18px; font-weight: 600; }
.tick { font-size: 11px; fill: #6b7280; }
.axis-label { font-size: 12px; fill: #374151; }
.grid { stroke: #e5e7eb; }
.frozen { font-size: .75rem; padding: .1rem .4rem; border-radius: 4px; }
.frozen.ok { background: #dcfce7; }
.frozen.drift { background: #fee2e2; }
.frozen.missing { background: #f3f4f6; }
footer { margin-top: 2rem; color: #6b7280; font-size: .8rem; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
document.querySelectorAll('.controls input[type=radio], .controls select').forEach(function (el) {
    el.addEventListener('change', function () { el.form.submit(); });
});
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::XValue;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"Fish & Chips\"</b>"), "&lt;b&gt;&quot;Fish &amp; Chips&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_query_string_encodes_item() {
        let selection = Selection::new(View::ItemLevel).with_item("Full Fat Milk");
        assert_eq!(
            query_string(&selection),
            "?view=item&metric=Mean&granularity=Monthly&item=Full%20Fat%20Milk"
        );
    }

    #[test]
    fn test_markdown_lists_and_bold() {
        let html = markdown_to_html("### Goals\n- **item** level\n    - nested\n- back\n---\nDone");
        assert_eq!(
            html,
            "<h3>Goals</h3><ul><li><strong>item</strong> level</li><ul><li>nested</li></ul><li>back</li></ul><hr><p>Done</p>"
        );
    }

    #[test]
    fn test_line_chart_breaks_at_gaps() {
        let mut series = Series::new("Healthy");
        series.push(XValue::Year(2014), Some(1.0));
        series.push(XValue::Year(2015), Some(2.0));
        series.push(XValue::Year(2016), None);
        series.push(XValue::Year(2017), Some(3.0));
        series.push(XValue::Year(2018), Some(1.5));
        let svg = render_chart(&Chart::line("YoY", "Date", "%").with_series(series));
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn test_bar_chart_draws_one_rect_per_value() {
        let mut series = Series::new("Total");
        series.push(XValue::Year(2014), Some(1200.0));
        series.push(XValue::Year(2015), Some(-3.0));
        let svg = render_chart(&Chart::bar("Totals", "Year", "€").with_series(series));
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(">2015<"));
    }

    #[test]
    fn test_empty_chart_says_no_data() {
        let svg = render_chart(&Chart::line("Empty", "Date", "€"));
        assert!(svg.contains("No data"));
    }

    #[test]
    fn test_document_marks_active_view_and_selected_item() {
        let page = Page::new("Item-Level Analysis");
        let selection = Selection::new(View::ItemLevel).with_item("Eggs");
        let items = vec!["Bread".to_string(), "Eggs".to_string()];
        let html = render_document(&page, &selection, &items, "6/6 frozen captions match data");
        assert!(html.contains("class=\"active\">Item-Level Analysis"));
        assert!(html.contains("<option value=\"Eggs\" selected>"));
        assert!(html.contains("6/6 frozen captions match data"));
    }
}
