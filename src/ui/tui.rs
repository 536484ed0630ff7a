//! Terminal rendering and the view loop.

use std::time::Duration;

use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};

use super::app::{Alert, App, Focus};
use super::components::cards::render_grid;
use super::components::pager::pager_line;
use super::components::theme::{ThemePalette, kbd_style, session_style};
use super::form::FormField;
use crate::ready::ReadyState;
use crate::search::SearchBackend;

const TICK: Duration = Duration::from_millis(100);

/// Key legend for the footer; `long` adds the less common bindings.
pub fn footer_legend(long: bool) -> String {
    let mut parts = vec![
        "Enter search",
        "Tab next field",
        "F2 sign in",
        "PgUp/PgDn page",
        "Esc quit",
    ];
    if long {
        parts.extend([
            "←/→ change option",
            "o open result",
            "Ctrl-C quit",
        ]);
    }
    parts.join(" · ")
}

/// Drive the view until the user quits.
pub fn run<B: SearchBackend>(terminal: &mut DefaultTerminal, mut app: App<B>) -> Result<()> {
    loop {
        app.check_pending();
        terminal
            .draw(|frame| ui(frame, &mut app))
            .context("Failed to draw terminal frame")?;

        if event::poll(TICK).context("Failed to poll for terminal events")? {
            match event::read().context("Failed to read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    app.shutdown();
    Ok(())
}

pub fn handle_key<B: SearchBackend>(app: &mut App<B>, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Alerts block everything else until dismissed.
    if let Some(alert) = app.alert {
        match key.code {
            KeyCode::Enter => {
                app.alert = None;
                if alert == Alert::AuthorizationRequired {
                    app.authorize();
                }
            }
            KeyCode::Esc => app.alert = None,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::F(2) => return app.authorize(),
        KeyCode::Char('l') if ctrl => return app.authorize(),
        KeyCode::PageDown => {
            app.next_page();
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.next_page();
            return;
        }
        KeyCode::PageUp => {
            app.prev_page();
            return;
        }
        KeyCode::Char('p') if ctrl => {
            app.prev_page();
            return;
        }
        KeyCode::Tab => return app.focus_next(),
        KeyCode::BackTab => return app.focus_prev(),
        _ => {}
    }

    match app.focus {
        Focus::Form(field) => handle_form_key(app, field, key),
        Focus::Results => handle_results_key(app, key),
    }
}

fn handle_form_key<B: SearchBackend>(app: &mut App<B>, field: FormField, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.trigger_search();
        }
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Up => app.focus_prev(),
        KeyCode::Down => app.focus_next(),
        KeyCode::Left if !field.is_text() => field.cycle(&mut app.params, false),
        KeyCode::Right if !field.is_text() => field.cycle(&mut app.params, true),
        KeyCode::Char(' ') if !field.is_text() => field.cycle(&mut app.params, true),
        KeyCode::Char(c) => field.insert_char(&mut app.params, c),
        KeyCode::Backspace => field.backspace(&mut app.params),
        _ => {}
    }
}

fn handle_results_key<B: SearchBackend>(app: &mut App<B>, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_rows(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_rows(1),
        KeyCode::Enter | KeyCode::Char('o') => app.open_selected(),
        KeyCode::Char('n') => {
            app.next_page();
        }
        KeyCode::Char('p') => {
            app.prev_page();
        }
        KeyCode::Esc => app.focus = Focus::Form(FormField::Term),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

// -----------------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------------

pub fn ui<B: SearchBackend>(frame: &mut Frame, app: &mut App<B>) {
    let palette = ThemePalette::dark();
    let area = frame.area();
    frame.render_widget(
        Block::default().style(ratatui::style::Style::default().bg(palette.bg)),
        area,
    );

    let [header, form, results, pager, status, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header, app, palette);
    render_form(frame, form, app, palette);
    render_results(frame, results, app, palette);
    frame.render_widget(
        Paragraph::new(pager_line(app.pager(), palette)).alignment(Alignment::Center),
        pager,
    );
    frame.render_widget(
        Paragraph::new(app.status.clone().unwrap_or_default()).style(palette.hint_style()),
        status,
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            footer_legend(area.width > 110),
            kbd_style(palette),
        )),
        footer,
    );

    if let Some(alert) = app.alert {
        render_alert(frame, area, alert, palette);
    }
}

fn render_header<B: SearchBackend>(
    frame: &mut Frame,
    area: Rect,
    app: &App<B>,
    palette: ThemePalette,
) {
    let readiness = app.readiness();
    let clients = [
        (readiness.identity.state(), readiness.identity.name()),
        (readiness.api.state(), readiness.api.name()),
    ];
    let names_in = |wanted: ReadyState| -> Vec<&'static str> {
        clients
            .iter()
            .filter(|(state, _)| *state == wanted)
            .map(|(_, name)| *name)
            .collect()
    };
    let loading = names_in(ReadyState::Pending);
    let failed = names_in(ReadyState::Failed);

    let signed_in = app.has_valid_token();
    let mut spans = vec![
        Span::styled("tubesearch ", palette.title()),
        Span::styled(
            if signed_in { "● signed in" } else { "○ signed out" },
            session_style(signed_in),
        ),
    ];
    if app.is_authorizing() {
        spans.push(Span::styled("  (signing in…)", palette.hint_style()));
    }
    if !loading.is_empty() {
        spans.push(Span::styled(
            format!("  loading {}…", loading.join(", ")),
            palette.hint_style(),
        ));
    }
    if !failed.is_empty() {
        spans.push(Span::styled(
            format!("  {} failed to initialize (see log)", failed.join(", ")),
            palette.title(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn field_spans<B: SearchBackend>(
    app: &App<B>,
    field: FormField,
    palette: ThemePalette,
) -> Vec<Span<'static>> {
    let focused = app.focus == Focus::Form(field);
    let value = field.value(&app.params);
    let shown = match (field.is_text(), focused) {
        (true, true) => format!("{value}▏"),
        (true, false) => value,
        (false, true) => format!("‹ {value} ›"),
        (false, false) => value,
    };
    let value_style = if focused {
        palette.selected_style().fg(palette.fg)
    } else {
        palette.body()
    };
    vec![
        Span::styled(format!("{}: ", field.label()), palette.hint_style()),
        Span::styled(shown, value_style),
        Span::raw("   "),
    ]
}

fn render_form<B: SearchBackend>(
    frame: &mut Frame,
    area: Rect,
    app: &App<B>,
    palette: ThemePalette,
) {
    let first_row = [FormField::Term, FormField::MaxResults, FormField::Region];
    let second_row = [
        FormField::Order,
        FormField::Type,
        FormField::Duration,
        FormField::Definition,
        FormField::Recency,
    ];
    let line = |fields: &[FormField]| {
        Line::from(
            fields
                .iter()
                .flat_map(|f| field_spans(app, *f, palette))
                .collect::<Vec<_>>(),
        )
    };

    let focused = matches!(app.focus, Focus::Form(_));
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Query ", palette.title()))
        .border_style(if focused {
            palette.border_focus_style()
        } else {
            palette.border_style()
        });
    frame.render_widget(
        Paragraph::new(vec![line(&first_row), line(&second_row)]).block(block),
        area,
    );
}

fn render_results<B: SearchBackend>(
    frame: &mut Frame,
    area: Rect,
    app: &mut App<B>,
    palette: ThemePalette,
) {
    let focused = app.focus == Focus::Results;
    let title = match &app.current_query {
        Some(q) if !q.term.is_empty() => format!(" Results for '{}' ", q.term),
        _ => " Results ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, palette.title()))
        .border_style(if focused {
            palette.border_focus_style()
        } else {
            palette.border_style()
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.page.items.is_empty() {
        let hint = if app.is_busy() {
            "Searching…"
        } else {
            "Type a query and press Enter."
        };
        frame.render_widget(
            Paragraph::new(hint)
                .style(palette.hint_style())
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let selected = focused.then_some(app.selected);
    app.grid_columns = render_grid(frame, inner, &app.page.items, selected, palette);
}

fn render_alert(frame: &mut Frame, area: Rect, alert: Alert, palette: ThemePalette) {
    let popup = centered(area, 56, 5);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", alert.title()), palette.title()))
        .border_style(palette.border_focus_style())
        .style(palette.surface_style());
    frame.render_widget(
        Paragraph::new(alert.message())
            .style(palette.text())
            .wrap(Wrap { trim: true })
            .block(block),
        popup,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, IdentityClient};
    use crate::model::{ResultId, ResultItem, SearchPage, SearchParams};
    use crate::ready::{ReadySignal, Readiness};
    use crate::ui::app::fake::{FakeBackend, Scripted};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn app(script: Vec<Scripted>) -> App<FakeBackend> {
        let (_resolver, identity) = ReadySignal::<IdentityClient>::new("identity client");
        let api = ReadySignal::ready("API client", FakeBackend::new(script));
        App::new(
            SearchParams {
                term: "cats".into(),
                ..SearchParams::default()
            },
            Readiness::new(identity, api, Vec::new()),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(app: &mut App<FakeBackend>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn legend_mentions_core_keys() {
        let short = footer_legend(false);
        assert!(short.contains("F2 sign in"));
        assert!(!short.contains("o open result"));
        assert!(footer_legend(true).contains("o open result"));
    }

    #[tokio::test]
    async fn enter_without_token_shows_sign_in_modal() {
        let mut app = app(vec![]);
        handle_key(&mut app, key(KeyCode::Enter));
        assert_eq!(app.alert, Some(Alert::AuthorizationRequired));

        let text = screen(&mut app);
        assert!(text.contains("Sign in required"));

        // Modal swallows other keys.
        handle_key(&mut app, key(KeyCode::Char('x')));
        assert_eq!(app.params.term, "cats");
        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.alert.is_none());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn renders_cards_and_pager() {
        let page = SearchPage {
            items: vec![ResultItem {
                id: Some(ResultId::Video("vid1".into())),
                title: "Funny cat".into(),
                description: "meow".into(),
                thumbnail_url: None,
                channel_title: "Cats Inc".into(),
            }],
            next_page_token: Some("N".into()),
            prev_page_token: None,
        };
        let mut app = app(vec![Scripted::Page(page)]);
        app.set_token(AccessToken::external("t"));
        handle_key(&mut app, key(KeyCode::Enter));
        app.settle().await;

        let text = screen(&mut app);
        assert!(text.contains("Funny cat"));
        assert!(text.contains("Cats Inc"));
        assert!(text.contains("Next"));
        assert!(text.contains("Prev"));
        assert!(text.contains("signed in"));
    }

    #[tokio::test]
    async fn header_distinguishes_loading_from_failed() {
        let (identity_resolver, identity) = ReadySignal::<IdentityClient>::new("identity client");
        let (_api_resolver, api) = ReadySignal::<FakeBackend>::new("API client");
        drop(identity_resolver);
        let mut app = App::new(
            SearchParams::default(),
            Readiness::new(identity, api, Vec::new()),
        );

        let text = screen(&mut app);
        assert!(text.contains("loading API client"));
        assert!(text.contains("identity client failed to initialize"));
        assert!(!text.contains("loading identity client"));
    }

    #[tokio::test]
    async fn typing_edits_focused_field() {
        let mut app = app(vec![]);
        handle_key(&mut app, key(KeyCode::Char('!')));
        assert_eq!(app.params.term, "cats!");

        handle_key(&mut app, key(KeyCode::Tab));
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Form(FormField::Order));
        handle_key(&mut app, key(KeyCode::Right));
        assert_eq!(app.params.order, crate::model::Order::Date);
        // Letters do not land in choice fields.
        handle_key(&mut app, key(KeyCode::Char('z')));
        assert_eq!(app.params.term, "cats!");
    }
}
