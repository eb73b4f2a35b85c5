use crate::annotations::{self, AuditOutcome};
use crate::data::Dataset;
use crate::page::{Chart, ChartKind, Page, Series, Table as PageTable, Widget};
use crate::selection::{Selection, View};
use crate::views::{self, DASHBOARD_TITLE};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart as ChartWidget, Dataset as ChartDataset,
        GraphType, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
    },
    Frame, Terminal,
};
use std::io;

const CHART_HEIGHT: u16 = 16;
const ITEM_LIST_WIDTH: u16 = 32;
const PALETTE: [Color; 5] = [Color::Cyan, Color::Yellow, Color::Magenta, Color::LightBlue, Color::LightGreen];

pub struct App {
    pub dataset: Dataset,
    pub items: Vec<String>,
    pub selection: Selection,
    pub item_state: ListState,
    /// Index of the first widget shown.
    pub scroll: usize,
    pub audit_summary: String,
    pub audit_clean: bool,
}

impl App {
    pub fn new(dataset: Dataset) -> Self {
        let items = dataset.items();
        let entries = annotations::audit(&dataset);
        let audit_clean = entries.iter().all(|e| e.outcome == AuditOutcome::Matches);

        let mut item_state = ListState::default();
        if !items.is_empty() {
            item_state.select(Some(0));
        }

        Self {
            audit_summary: annotations::summary(&entries),
            audit_clean,
            selection: Selection {
                item: items.first().cloned(),
                ..Selection::default()
            },
            items,
            item_state,
            scroll: 0,
            dataset,
        }
    }

    /// Re-run the selected view against the loaded tables.
    pub fn page(&self) -> Page {
        views::render(&self.dataset, &self.selection)
    }

    pub fn next_view(&mut self) {
        self.selection.view = self.selection.view.next();
        self.scroll = 0;
    }

    pub fn previous_view(&mut self) {
        self.selection.view = self.selection.view.previous();
        self.scroll = 0;
    }

    pub fn toggle_metric(&mut self) {
        self.selection.metric = self.selection.metric.toggled();
    }

    pub fn toggle_granularity(&mut self) {
        self.selection.granularity = self.selection.granularity.toggled();
        self.scroll = 0;
    }

    pub fn next_item(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let i = match self.item_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select_item(i);
    }

    pub fn previous_item(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let i = match self.item_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select_item(i);
    }

    fn select_item(&mut self, i: usize) {
        self.item_state.select(Some(i));
        self.selection.item = self.items.get(i).cloned();
    }

    pub fn scroll_down(&mut self) {
        let widgets = self.page().widgets.len();
        if self.scroll + 1 < widgets {
            self.scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_view();
                    } else {
                        app.next_view();
                    }
                }
                KeyCode::BackTab => app.previous_view(),
                KeyCode::Char('m') => app.toggle_metric(),
                KeyCode::Char('g') => app.toggle_granularity(),
                KeyCode::Down | KeyCode::Char('j') if app.selection.view == View::ItemLevel => app.next_item(),
                KeyCode::Up | KeyCode::Char('k') if app.selection.view == View::ItemLevel => app.previous_item(),
                KeyCode::PageDown | KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
                KeyCode::PageUp | KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
                KeyCode::Home => app.scroll = 0,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let page = app.page();
    if app.selection.view == View::ItemLevel {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(ITEM_LIST_WIDTH), Constraint::Min(0)])
            .split(chunks[1]);

        render_item_list(f, content_chunks[0], app);
        render_page(f, content_chunks[1], &page, app.scroll);
    } else {
        render_page(f, chunks[1], &page, app.scroll);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![Span::styled(
        format!("{}  ", DASHBOARD_TITLE),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    for (i, view) in View::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *view == app.selection.view {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(view.label(), style));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_item_list(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| ListItem::new(truncate(item, ITEM_LIST_WIDTH as usize - 4)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Select a Food Item "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.item_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.selection.view.label()),
        Style::default().fg(Color::Cyan),
    )];

    match app.selection.view {
        View::CategoryLevel => {
            status_spans.push(Span::raw("| Metric: "));
            status_spans.push(Span::styled(app.selection.metric.label(), Style::default().fg(Color::Green)));
            status_spans.push(Span::raw(" ("));
            status_spans.push(Span::styled("m", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(") "));
        }
        View::AffordabilityOverview => {
            status_spans.push(Span::raw("| Granularity: "));
            status_spans.push(Span::styled(
                app.selection.granularity.label(),
                Style::default().fg(Color::Green),
            ));
            status_spans.push(Span::raw(" ("));
            status_spans.push(Span::styled("g", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(") "));
        }
        View::ItemLevel | View::ProjectOverview => {}
    }

    status_spans.push(Span::raw("| "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" View | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Item | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Scroll | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit | "));
    let audit_color = if app.audit_clean { Color::Green } else { Color::Red };
    status_spans.push(Span::styled(app.audit_summary.clone(), Style::default().fg(audit_color)));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White)));
    f.render_widget(status_bar, area);
}

// ============================================================================
// PAGE WIDGETS
// ============================================================================

fn render_page(f: &mut Frame, area: Rect, page: &Page, scroll: usize) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", page.title));
    let inner = block.inner(area);
    f.render_widget(block, area);

    render_stack(f, inner, &page.widgets[scroll.min(page.widgets.len())..]);
}

/// Lay widgets out top to bottom until the area is full.
fn render_stack(f: &mut Frame, area: Rect, widgets: &[Widget]) {
    let mut y = area.y;
    let bottom = area.y + area.height;
    for widget in widgets {
        if y >= bottom {
            break;
        }
        let height = widget_height(widget, area.width).min(bottom - y);
        render_widget(f, Rect::new(area.x, y, area.width, height), widget);
        y += height;
    }
}

fn widget_height(widget: &Widget, width: u16) -> u16 {
    match widget {
        Widget::Header(_) | Widget::Title(_) | Widget::Subheader(_) => 2,
        Widget::Markdown(text) | Widget::Caption(text) => wrapped_height(text, width) + 1,
        Widget::FrozenCaption { text, checks } => wrapped_height(text, width) + checks.len() as u16 + 1,
        Widget::Info(text) => wrapped_height(text, width.saturating_sub(2)) + 2,
        Widget::Chart(_) => CHART_HEIGHT,
        Widget::Table(table) => table.rows.len() as u16 + 3 + u16::from(table.title.is_some()),
        Widget::Columns(columns) => {
            let column_width = width / columns.len().max(1) as u16;
            columns
                .iter()
                .map(|c| c.iter().map(|w| widget_height(w, column_width)).sum::<u16>())
                .max()
                .unwrap_or(0)
        }
    }
}

fn wrapped_height(text: &str, width: u16) -> u16 {
    let width = width.max(1) as usize;
    text.lines()
        .map(|line| (line.chars().count().max(1) + width - 1) / width)
        .sum::<usize>() as u16
}

fn render_widget(f: &mut Frame, area: Rect, widget: &Widget) {
    match widget {
        Widget::Header(text) | Widget::Title(text) => {
            let style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
            f.render_widget(Paragraph::new(Line::from(Span::styled(text.as_str(), style))), area);
        }
        Widget::Subheader(text) => {
            let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
            f.render_widget(Paragraph::new(Line::from(Span::styled(text.as_str(), style))), area);
        }
        Widget::Markdown(text) => {
            f.render_widget(Paragraph::new(markdown_lines(text)).wrap(Wrap { trim: false }), area);
        }
        Widget::Caption(text) => {
            let caption = Paragraph::new(markdown_lines(text))
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: false });
            f.render_widget(caption, area);
        }
        Widget::FrozenCaption { text, checks } => {
            let mut lines = markdown_lines(text);
            for check in checks {
                let (label, color) = match &check.outcome {
                    AuditOutcome::Matches => (format!("  ❄ frozen figure {} · matches data", check.claim), Color::Green),
                    AuditOutcome::Drifted { live } => (
                        format!("  ❄ frozen figure {} · live data: {}", check.claim, live),
                        Color::Red,
                    ),
                    AuditOutcome::Unavailable => (
                        format!("  ❄ frozen figure {} · period not in data", check.claim),
                        Color::DarkGray,
                    ),
                };
                lines.push(Line::from(Span::styled(label, Style::default().fg(color))));
            }
            let caption = Paragraph::new(lines)
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: false });
            f.render_widget(caption, area);
        }
        Widget::Info(text) => {
            let info = Paragraph::new(markdown_lines(text))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Blue)));
            f.render_widget(info, area);
        }
        Widget::Chart(chart) => match chart.kind {
            ChartKind::Line => render_line_chart(f, area, chart),
            ChartKind::Bar => render_bar_chart(f, area, chart),
        },
        Widget::Table(table) => render_table(f, area, table),
        Widget::Columns(columns) => {
            let constraints: Vec<Constraint> = columns
                .iter()
                .map(|_| Constraint::Ratio(1, columns.len() as u32))
                .collect();
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(constraints)
                .split(area);
            for (column, chunk) in columns.iter().zip(chunks.iter()) {
                render_stack(f, *chunk, column);
            }
        }
    }
}

fn series_color(series: &Series, index: usize) -> Color {
    match series.color.as_deref() {
        Some("green") => Color::Green,
        Some("blue") => Color::Blue,
        Some("red") => Color::Red,
        _ => PALETTE[index % PALETTE.len()],
    }
}

fn render_line_chart(f: &mut Frame, area: Rect, chart: &Chart) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", chart.title));
    let (Some(x_bounds), Some(y_bounds)) = (chart.x_bounds(), chart.y_bounds()) else {
        f.render_widget(Paragraph::new("No data").block(block), area);
        return;
    };

    // Gaps split a series into segments; only the first segment carries the name.
    let plotted = chart.plot_series();
    let segments: Vec<(String, Color, Vec<Vec<(f64, f64)>>)> = plotted
        .iter()
        .enumerate()
        .map(|(i, (series, points))| (series.name.clone(), series_color(series, i), Series::segments(points)))
        .collect();

    let mut datasets = Vec::new();
    for (name, color, runs) in &segments {
        for (j, run) in runs.iter().enumerate() {
            let mut dataset = ChartDataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(run);
            if j == 0 && plotted.len() > 1 {
                dataset = dataset.name(name.clone());
            }
            datasets.push(dataset);
        }
    }

    let x_labels = match plotted.first() {
        Some((series, _)) if !series.points.is_empty() => vec![
            Span::raw(series.points[0].x.display()),
            Span::raw(series.points[series.points.len() - 1].x.display()),
        ],
        _ => Vec::new(),
    };
    let y_labels = vec![
        Span::raw(format!("{:.2}", y_bounds.0)),
        Span::raw(format!("{:.2}", (y_bounds.0 + y_bounds.1) / 2.0)),
        Span::raw(format!("{:.2}", y_bounds.1)),
    ];

    let widget = ChartWidget::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(chart.x_label.as_str())
                .style(Style::default().fg(Color::Gray))
                .bounds([x_bounds.0, x_bounds.1])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label.as_str())
                .style(Style::default().fg(Color::Gray))
                .bounds([y_bounds.0, y_bounds.1])
                .labels(y_labels),
        );
    f.render_widget(widget, area);
}

fn render_bar_chart(f: &mut Frame, area: Rect, chart: &Chart) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", chart.title));
    let Some(series) = chart.series.first() else {
        f.render_widget(Paragraph::new("No data").block(block), area);
        return;
    };

    // Bars are unsigned: negatives draw at zero height but keep their printed value.
    let color = series_color(series, 0);
    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|point| {
            let value = point.y.unwrap_or(0.0);
            Bar::default()
                .value((value.max(0.0) * 100.0).round() as u64)
                .text_value(format!("{:.1}", value))
                .label(Line::from(point.x.display()))
                .style(Style::default().fg(color))
        })
        .collect();

    let count = bars.len().max(1) as u16;
    let bar_width = (area.width.saturating_sub(2) / count).saturating_sub(1).clamp(3, 9);

    let widget = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::Black).bg(color))
        .data(BarGroup::default().bars(&bars));
    f.render_widget(widget, area);
}

fn render_table(f: &mut Frame, area: Rect, table: &PageTable) {
    let header_cells = table.columns.iter().map(|h| {
        Cell::from(h.as_str()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.as_str()))).height(1));

    let widths: Vec<Constraint> = table
        .columns
        .iter()
        .map(|_| Constraint::Ratio(1, table.columns.len().max(1) as u32))
        .collect();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));
    if let Some(title) = &table.title {
        block = block.title(format!(" {} ", title));
    }

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

/// `**bold**` spans, `###` headings and bullets for terminal output.
fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|raw| {
            let trimmed = raw.trim_start();
            if let Some(heading) = trimmed
                .strip_prefix("#### ")
                .or_else(|| trimmed.strip_prefix("### "))
            {
                return Line::from(Span::styled(
                    heading.replace("**", ""),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            }
            let line = match trimmed.strip_prefix("- ") {
                Some(rest) => format!("{}• {}", " ".repeat(raw.len() - trimmed.len()), rest),
                None => raw.to_string(),
            };
            let spans: Vec<Span> = line
                .split("**")
                .enumerate()
                .map(|(i, part)| {
                    if i % 2 == 1 {
                        Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD))
                    } else {
                        Span::raw(part.to_string())
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
