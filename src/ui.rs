//! Three-column layout: search + list, map canvas, summary + details.

use crate::api::SearchHit;
use crate::state::{AppState, ResultsPane};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(f.area());

    draw_left(f, state, columns[0]);
    draw_map(f, state, columns[1]);
    draw_right(f, state, columns[2]);
}

fn draw_left(f: &mut Frame, state: &mut AppState, area: ratatui::layout::Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    // Search input; the block title doubles as the mode indicator.
    let input = if state.editing_search {
        format!("{}\u{258c}", state.search_input)
    } else {
        state.search_input.clone()
    };
    let search = Paragraph::new(input).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Search [{} mode]", state.resolver.mode.label())),
    );
    f.render_widget(search, rows[0]);

    let (title, items, selected) = match &state.results {
        ResultsPane::Hidden => (
            "Countries",
            state
                .features
                .features
                .iter()
                .map(|c| ListItem::new(c.display_name().to_string()))
                .collect::<Vec<_>>(),
            state.selected,
        ),
        ResultsPane::Searching => (
            "Results",
            vec![ListItem::new("Searching\u{2026}")],
            0,
        ),
        ResultsPane::NoResults => ("Results", vec![ListItem::new("No results")], 0),
        ResultsPane::Error(msg) => (
            "Results",
            vec![ListItem::new(format!("Error searching: {}", msg))],
            0,
        ),
        ResultsPane::Hits(hits) => (
            "Results",
            hits.iter()
                .map(|h| ListItem::new(hit_label(h)))
                .collect::<Vec<_>>(),
            state.result_selected,
        ),
    };

    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_stateful_widget(list, rows[1], &mut list_state);
}

fn draw_map(f: &mut Frame, state: &AppState, area: ratatui::layout::Rect) {
    // The map title plays the tooltip role: it names the hovered country.
    let title = state
        .hovered()
        .and_then(|idx| state.features.features.get(idx))
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| "World".to_string());
    state
        .map
        .render(f, area, &state.features, &title, state.hovered());
}

fn draw_right(f: &mut Frame, state: &AppState, area: ratatui::layout::Rect) {
    // The details panel stays hidden until a country has been clicked.
    match &state.detail {
        Some(detail) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
                .split(area);
            draw_summary(f, state, rows[0]);

            let body = serde_json::to_string_pretty(&detail.payload)
                .unwrap_or_else(|_| detail.payload.to_string());
            let details = Paragraph::new(format!("{}\n{}", detail.label, body))
                .block(Block::default().borders(Borders::ALL).title("Details"))
                .wrap(Wrap { trim: false });
            f.render_widget(details, rows[1]);
        }
        None => draw_summary(f, state, area),
    }
}

fn draw_summary(f: &mut Frame, state: &AppState, area: ratatui::layout::Rect) {
    let summary = Paragraph::new(state.summary.clone())
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .wrap(Wrap { trim: true });
    f.render_widget(summary, area);
}

fn hit_label(hit: &SearchHit) -> String {
    match &hit.snippet {
        Some(snippet) => format!("{} - {}", hit.name, snippet),
        None => format!("{} ({})", hit.name, hit.iso),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_labels_show_snippet_or_identifier() {
        let with_snippet = SearchHit {
            iso: "BR".to_string(),
            name: "Brazil".to_string(),
            snippet: Some("Amazon basin".to_string()),
        };
        assert_eq!(hit_label(&with_snippet), "Brazil - Amazon basin");

        let plain = SearchHit {
            iso: "IN".to_string(),
            name: "India".to_string(),
            snippet: None,
        };
        assert_eq!(hit_label(&plain), "India (IN)");
    }
}
