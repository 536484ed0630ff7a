//! Previous/next page buttons.

use ratatui::text::{Line, Span};

use super::theme::ThemePalette;
use crate::ui::app::PagerState;

pub const PREV_LABEL: &str = "[ ◀ Prev ]";
pub const NEXT_LABEL: &str = "[ Next ▶ ]";

pub fn pager_line(state: PagerState, palette: ThemePalette) -> Line<'static> {
    let style = |enabled: bool| {
        if enabled {
            palette.button_style()
        } else {
            palette.disabled_style()
        }
    };
    Line::from(vec![
        Span::styled(PREV_LABEL, style(state.prev_enabled)),
        Span::raw("   "),
        Span::styled(NEXT_LABEL, style(state.next_enabled)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_follow_cursor_presence() {
        let palette = ThemePalette::dark();
        let line = pager_line(
            PagerState {
                prev_enabled: false,
                next_enabled: true,
            },
            palette,
        );
        assert_eq!(line.spans[0].content, PREV_LABEL);
        assert_eq!(line.spans[0].style, palette.disabled_style());
        assert_eq!(line.spans[2].content, NEXT_LABEL);
        assert_eq!(line.spans[2].style, palette.button_style());

        let line = pager_line(
            PagerState {
                prev_enabled: true,
                next_enabled: false,
            },
            palette,
        );
        assert_eq!(line.spans[0].style, palette.button_style());
        assert_eq!(line.spans[2].style, palette.disabled_style());
    }
}
