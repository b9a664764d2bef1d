//! Frame rendering: entry list on the left, description and plot panes on the right.

use crate::app::{App, Focus};
use crate::panels::{self, PlotData};
use datashed_source::PlotKind;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, List, ListItem,
    Paragraph, Wrap,
};
use ratatui::Frame;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(panes[1]);

    draw_entry_list(frame, app, panes[0]);
    draw_description(frame, app, right[0]);
    draw_plots(frame, app, right[1]);
    draw_footer(frame, app, outer[1]);
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().fg(Color::Cyan))
    } else {
        block
    }
}

fn draw_entry_list(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let title = format!("Catalog: {}", app.catalog().name());
    let items: Vec<ListItem<'_>> = app
        .entries()
        .iter()
        .map(|entry| {
            let mut line = entry.name().to_string();
            if let Some(description) = entry.description() {
                line.push_str(" - ");
                line.push_str(description.lines().next().unwrap_or_default());
            }
            ListItem::new(line)
        })
        .collect();
    let focused = app.focus() == Focus::Entries;
    let list = List::new(items)
        .block(pane_block(&title, focused))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, app.list_state());
}

fn draw_description(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(label) = panels::description_label(app.source()) {
        lines.push(Line::from(Span::styled(
            label,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
    }
    for line in panels::description_contents(app.source()).lines() {
        lines.push(Line::from(line.to_string()));
    }
    let paragraph = Paragraph::new(lines)
        .block(pane_block("Description", false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_plots(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let focused = app.focus() == Focus::Plots;
    let block = pane_block("Plot", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let has_plots = app.plot().has_plots();
    frame.render_widget(
        Paragraph::new(panels::plot_instructions(has_plots)),
        sections[0],
    );

    if !has_plots {
        return;
    }

    let mut selector = Vec::new();
    for (index, option) in app.plot().options().iter().enumerate() {
        if index > 0 {
            selector.push(Span::raw("  "));
        }
        let style = if index == app.plot().selected_index() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        selector.push(Span::styled(option.clone(), style));
    }
    selector.push(Span::raw(if app.plot().show_spec() {
        "  [x] show spec"
    } else {
        "  [ ] show spec"
    }));
    frame.render_widget(Paragraph::new(Line::from(selector)), sections[1]);

    if app.plot().show_spec() {
        if let Some(spec) = app.plot().spec_contents(app.source()) {
            let paragraph = Paragraph::new(spec).wrap(Wrap { trim: false });
            frame.render_widget(paragraph, sections[2]);
            return;
        }
    }

    match app.plot_data() {
        Some(data) => draw_chart(frame, data, sections[2]),
        None => frame.render_widget(
            Paragraph::new("press Enter to render the selected plot"),
            sections[2],
        ),
    }
}

const SERIES_COLORS: [Color; 4] = [Color::Cyan, Color::Yellow, Color::Green, Color::Magenta];

fn draw_chart(frame: &mut Frame<'_>, data: &PlotData, area: Rect) {
    match data {
        PlotData::Xy {
            kind,
            title,
            x_label,
            series,
            x_bounds,
            y_bounds,
        } => {
            let graph_type = match kind {
                PlotKind::Scatter => GraphType::Scatter,
                _ => GraphType::Line,
            };
            let datasets = series
                .iter()
                .enumerate()
                .map(|(index, series)| {
                    Dataset::default()
                        .name(series.name.clone())
                        .marker(symbols::Marker::Braille)
                        .graph_type(graph_type)
                        .style(Style::default().fg(SERIES_COLORS[index % SERIES_COLORS.len()]))
                        .data(&series.points)
                })
                .collect();
            let chart = Chart::new(datasets)
                .block(Block::default().title(title.clone()))
                .x_axis(
                    Axis::default()
                        .title(x_label.clone())
                        .bounds(*x_bounds)
                        .labels([
                            format!("{:.1}", x_bounds[0]),
                            format!("{:.1}", x_bounds[1]),
                        ]),
                )
                .y_axis(
                    Axis::default()
                        .bounds(*y_bounds)
                        .labels([
                            format!("{:.1}", y_bounds[0]),
                            format!("{:.1}", y_bounds[1]),
                        ]),
                );
            frame.render_widget(chart, area);
        }
        PlotData::Bars {
            title,
            labels,
            values,
        } => {
            let bars: Vec<Bar<'_>> = labels
                .iter()
                .zip(values)
                .map(|(label, value)| {
                    Bar::default()
                        .label(Line::from(label.clone()))
                        .value(*value)
                })
                .collect();
            let chart = BarChart::default()
                .block(Block::default().title(title.clone()))
                .bar_width(9)
                .bar_gap(1)
                .data(BarGroup::default().bars(&bars));
            frame.render_widget(chart, area);
        }
    }
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let text = match app.status() {
        Some(status) => status.to_string(),
        None => {
            "q quit | tab focus | up/down select | enter render plot | s spec | p persist"
                .to_string()
        }
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
