//! Result cards laid out as a grid.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::theme::ThemePalette;
use crate::model::{ResultItem, watch_url};

pub const CARD_MIN_WIDTH: u16 = 34;
pub const CARD_HEIGHT: u16 = 8;

/// Columns that fit in `width`, at least one.
pub fn grid_columns(width: u16) -> usize {
    usize::from((width / CARD_MIN_WIDTH).max(1))
}

/// First row to draw so that `selected` stays visible.
pub fn first_visible_row(selected: usize, columns: usize, visible_rows: usize) -> usize {
    let row = selected / columns.max(1);
    let visible_rows = visible_rows.max(1);
    row.saturating_sub(visible_rows - 1)
}

/// Lines shown inside one card.
pub fn card_lines(item: &ResultItem, palette: ThemePalette) -> Vec<Line<'static>> {
    let kind = item.id.as_ref().map(|id| id.kind_label()).unwrap_or("item");
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{kind} "), palette.kind_style(kind)),
            Span::styled(item.channel_title.clone(), palette.hint_style()),
        ]),
        Line::from(Span::styled(item.title.clone(), palette.text())),
    ];
    if !item.description.is_empty() {
        lines.push(Line::from(Span::styled(
            item.description.clone(),
            palette.body(),
        )));
    }
    lines.push(Line::from(Span::styled(watch_url(item), palette.hint_style())));
    if let Some(thumb) = &item.thumbnail_url {
        lines.push(Line::from(vec![
            Span::styled("thumb ", palette.hint_style()),
            Span::styled(thumb.clone(), palette.hint_style()),
        ]));
    }
    lines
}

/// Draw `items` into `area`. Returns the number of columns used.
pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    items: &[ResultItem],
    selected: Option<usize>,
    palette: ThemePalette,
) -> usize {
    let columns = grid_columns(area.width);
    let visible_rows = usize::from((area.height / CARD_HEIGHT).max(1));
    let first_row = first_visible_row(selected.unwrap_or(0), columns, visible_rows);

    let rows = Layout::vertical(vec![Constraint::Length(CARD_HEIGHT); visible_rows]).split(area);
    for (row_idx, row_area) in rows.iter().enumerate() {
        let cells = Layout::horizontal(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);
        for (col_idx, cell) in cells.iter().enumerate() {
            let idx = (first_row + row_idx) * columns + col_idx;
            let Some(item) = items.get(idx) else {
                return columns;
            };
            let is_selected = selected == Some(idx);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(if is_selected {
                    palette.border_focus_style()
                } else {
                    palette.border_style()
                })
                .style(if is_selected {
                    palette.selected_style()
                } else {
                    palette.surface_style()
                });
            let card = Paragraph::new(card_lines(item, palette))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(card, *cell);
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResultId;

    #[test]
    fn columns_from_width() {
        assert_eq!(grid_columns(10), 1);
        assert_eq!(grid_columns(CARD_MIN_WIDTH * 3 + 5), 3);
    }

    #[test]
    fn scrolls_to_keep_selection_visible() {
        assert_eq!(first_visible_row(0, 3, 2), 0);
        assert_eq!(first_visible_row(5, 3, 2), 0);
        assert_eq!(first_visible_row(6, 3, 2), 1);
        assert_eq!(first_visible_row(11, 3, 1), 3);
    }

    #[test]
    fn card_shows_kind_title_and_link() {
        let item = ResultItem {
            id: Some(ResultId::Playlist("PLx".into())),
            title: "Mix".into(),
            description: String::new(),
            thumbnail_url: Some("https://i.ytimg.com/x.jpg".into()),
            channel_title: "Someone".into(),
        };
        let text: Vec<String> = card_lines(&item, ThemePalette::dark())
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text[0], "playlist Someone");
        assert_eq!(text[1], "Mix");
        assert_eq!(text[2], "https://www.youtube.com/playlist?list=PLx");
        assert_eq!(text[3], "thumb https://i.ytimg.com/x.jpg");
        assert_eq!(text.len(), 4);
    }

    #[test]
    fn card_without_thumbnail_omits_line() {
        let item = ResultItem {
            id: None,
            title: "Orphan".into(),
            description: "desc".into(),
            thumbnail_url: None,
            channel_title: "Nobody".into(),
        };
        let lines = card_lines(&item, ThemePalette::dark());
        assert_eq!(lines.len(), 4);
        let last: String = lines[3].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(last, "#");
    }
}
