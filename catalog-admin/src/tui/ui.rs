use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use super::app::{App, InputMode};
use crate::state::{
    editor::{ItemEditor, Tier},
    form::{Field, format_price},
    nav::Screen,
};

const HELP_TEXT: &[(&str, &str)] = &[
    ("j / Down", "Move down"),
    ("k / Up", "Move up"),
    ("PgDn / Ctrl-d", "Page down"),
    ("PgUp / Ctrl-u", "Page up"),
    ("g / Home", "Jump to first"),
    ("G / End", "Jump to last"),
    ("/", "Search titles / filter picker"),
    ("s", "Toggle sort"),
    ("Enter", "Open item / edit field / confirm picker"),
    ("Space", "Toggle selection"),
    ("u", "Unselect all in picker"),
    ("i", "Pick images"),
    ("l", "Pick locations"),
    ("Ctrl-s", "Save item"),
    ("r", "Retry failed load"),
    ("Ctrl-a/e/k", "In input: start/end/kill-to-eol"),
    ("Esc / b", "Close / clear search"),
    ("?", "Toggle help"),
    ("q", "Quit"),
];

const ACCENT: Color = Color::Cyan;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_status_bar(frame, app, outer[0]);
    draw_list(frame, app, outer[1]);

    match app.nav.screen() {
        Screen::List => {}
        Screen::Editor => draw_editor(frame, app, popup(outer[1], 80, 90)),
        Screen::ImagePicker => {
            draw_editor(frame, app, popup(outer[1], 80, 90));
            draw_image_picker(frame, app, popup(outer[1], 70, 80));
        }
        Screen::LocationPicker => {
            draw_editor(frame, app, popup(outer[1], 80, 90));
            draw_location_picker(frame, app, popup(outer[1], 60, 60));
        }
    }

    draw_footer(frame, app, outer[2]);

    if app.show_help {
        draw_help_overlay(frame, frame.area());
    }
}

fn popup(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let scale = |len: u16, percent: u16| {
        u16::try_from(u32::from(len) * u32::from(percent) / 100).unwrap_or(len)
    };
    let width = scale(area.width, percent_x);
    let height = scale(area.height, percent_y);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(ACCENT))
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let list = app.nav.list();
    let query = list.query();
    let search = if query.search.is_empty() {
        "no search".to_string()
    } else {
        format!("search=\"{}\"", query.search)
    };
    let total = list
        .total()
        .map_or_else(|| "?".to_string(), |total| total.to_string());
    let mut status = format!(
        " catalog | {}/{} products | {} | sort: title {}",
        list.rows().len(),
        total,
        search,
        query.sort,
    );
    if list.is_loading() {
        status.push_str(" | loading...");
    }
    let bar = Paragraph::new(status).style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(bar, area);
}

fn draw_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let list = app.nav.list();
    app.list_visible_rows = usize::from(area.height.saturating_sub(3));

    if list.rows().is_empty() {
        let (text, style) = if let Some(err) = list.error() {
            (
                format!("Could not load products: {err}\nPress r to retry."),
                Style::default().fg(Color::Red),
            )
        } else if list.is_loading() {
            ("Loading products...".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            ("No products found.".to_string(), Style::default().fg(Color::DarkGray))
        };
        let body = Paragraph::new(text)
            .style(style)
            .block(panel(" Products ".to_string()));
        frame.render_widget(body, area);
        return;
    }

    let header = Row::new([
        Cell::from("Id"),
        Cell::from("Title"),
        Cell::from("Category"),
        Cell::from("Price"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
    .height(1);

    let rows: Vec<Row> = list
        .rows()
        .iter()
        .map(|row| {
            Row::new([
                Cell::from(row.id.to_string()),
                Cell::from(row.title.as_str()),
                Cell::from(row.category.as_deref().unwrap_or("-")),
                Cell::from(format_price(row.price)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(10),
    ];

    let mut title = format!(" Products ({}) ", list.rows().len());
    if let Some(err) = list.error() {
        title.push_str(&format!("- error: {err} (r to retry) "));
    } else if list.is_loading() {
        title.push_str("- loading more... ");
    } else if !list.has_more() {
        title.push_str("- end ");
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn tier_note<T>(tier: &Tier<T>, what: &str) -> Option<Span<'static>> {
    match tier {
        Tier::Pending => Some(Span::styled(
            format!(" (loading {what}...)"),
            Style::default().fg(Color::DarkGray),
        )),
        Tier::Failed(err) => Some(Span::styled(
            format!(" ({what} failed: {err}, r to retry)"),
            Style::default().fg(Color::Red),
        )),
        Tier::Ready(_) => None,
    }
}

fn field_value(editor: &ItemEditor, field: Field) -> Vec<Span<'static>> {
    let form = editor.form();
    match field {
        Field::Name | Field::Description | Field::Price => vec![Span::raw(form.text(field))],
        Field::ItemType => vec![Span::raw(form.item_type.to_string())],
        Field::Available => vec![Span::raw(if form.available { "[x]" } else { "[ ]" })],
        Field::Images => {
            let names: Vec<&str> = editor
                .selected_images()
                .iter()
                .map(|image| image.name.as_str())
                .collect();
            let mut spans = vec![Span::raw(if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            })];
            spans.extend(tier_note(editor.images(), "library"));
            spans
        }
        Field::Locations => {
            let names = editor.location_names();
            let mut spans = vec![Span::raw(if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            })];
            spans.extend(tier_note(editor.locations(), "locations"));
            spans
        }
    }
}

fn draw_editor(frame: &mut Frame, app: &App, area: Rect) {
    let Some(editor) = app.nav.editor() else {
        return;
    };
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();
    let detail_ready = editor.detail().ready().is_some();
    if let Some(note) = tier_note(editor.detail(), "item") {
        lines.push(Line::from(note));
        lines.push(Line::from(""));
    }

    for field in editor.fields() {
        if field.is_text() && !detail_ready {
            continue;
        }
        let focused = field == editor.focus();
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut spans = vec![
            Span::raw(marker),
            Span::styled(format!("{:<12}", field.label()), label_style),
        ];
        spans.extend(field_value(editor, field));
        lines.push(Line::from(spans));
        if let Some(err) = editor.errors().and_then(|errors| errors.get(field)) {
            lines.push(Line::from(Span::styled(
                format!("    {err}"),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: edit  Space: toggle  i: images  l: locations  Ctrl-s: save  r: retry  Esc: close",
        Style::default().fg(Color::DarkGray),
    )));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel(format!(" Edit item #{} ", editor.product_id())));
    frame.render_widget(body, area);
}

fn checkbox(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

fn picker_table<'a>(rows: Vec<Row<'a>>, widths: &[Constraint], title: String) -> Table<'a> {
    Table::new(rows, widths.to_vec())
        .block(panel(title))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ")
}

fn draw_picker_hint(frame: &mut Frame, area: Rect, text: &str) {
    let hint = Rect::new(
        area.x + 1,
        area.y + area.height.saturating_sub(1),
        area.width.saturating_sub(2),
        1,
    );
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        hint,
    );
}

fn draw_pending_picker(frame: &mut Frame, area: Rect, title: String, note: Option<Span<'static>>) {
    let note = note.unwrap_or_else(|| Span::raw("Nothing to show."));
    frame.render_widget(Paragraph::new(Line::from(note)).block(panel(title)), area);
}

fn draw_image_picker(frame: &mut Frame, app: &App, area: Rect) {
    let (Some(picker), Some(editor)) = (app.nav.image_picker(), app.nav.editor()) else {
        return;
    };
    frame.render_widget(Clear, area);

    let mut title = format!(
        " Image library ({} selected) - sort: {} ",
        picker.selected().len(),
        picker.sort()
    );
    if !picker.filter().is_empty() {
        title.push_str(&format!("- filter: \"{}\" ", picker.filter()));
    }

    if !picker.is_loaded() {
        draw_pending_picker(frame, area, title, tier_note(editor.images(), "images"));
        return;
    }

    let rows: Vec<Row> = picker
        .visible()
        .into_iter()
        .map(|image| {
            Row::new([
                Cell::from(checkbox(picker.is_selected(&image.id))),
                Cell::from(image.name.clone()),
                Cell::from(image.url.clone()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(3),
        Constraint::Length(8),
        Constraint::Min(20),
    ];
    let table = picker_table(rows, &widths, title);
    let mut state = TableState::default().with_selected(Some(picker.cursor()));
    frame.render_stateful_widget(table, area, &mut state);
    draw_picker_hint(
        frame,
        area,
        "Space: toggle  /: filter  s: sort  u: unselect all  Enter: update images  Esc: cancel",
    );
}

fn draw_location_picker(frame: &mut Frame, app: &App, area: Rect) {
    let (Some(picker), Some(editor)) = (app.nav.location_picker(), app.nav.editor()) else {
        return;
    };
    frame.render_widget(Clear, area);

    let mut title = format!(" Locations ({} selected) ", picker.selected().len());
    if !picker.filter().is_empty() {
        title.push_str(&format!("- filter: \"{}\" ", picker.filter()));
    }

    if !picker.is_loaded() {
        draw_pending_picker(frame, area, title, tier_note(editor.locations(), "locations"));
        return;
    }

    let rows: Vec<Row> = picker
        .visible()
        .into_iter()
        .map(|location| {
            Row::new([
                Cell::from(checkbox(picker.is_selected(&location.id))),
                Cell::from(location.name.clone()),
            ])
        })
        .collect();
    let widths = [Constraint::Length(3), Constraint::Min(20)];
    let table = picker_table(rows, &widths, title);
    let mut state = TableState::default().with_selected(Some(picker.cursor()));
    frame.render_stateful_widget(table, area, &mut state);
    draw_picker_hint(
        frame,
        area,
        "Space: toggle  /: filter  u: unselect all  Enter: save  Esc: cancel",
    );
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let prompt = match app.input_mode {
        InputMode::Search => Some("Search title: ".to_string()),
        InputMode::Filter => Some("Filter: ".to_string()),
        InputMode::Edit(field) => Some(format!("{}: ", field.label())),
        InputMode::None => None,
    };
    let (text, prefix_len) = match &prompt {
        Some(prefix) => (format!("{prefix}{}", app.input_buffer), prefix.chars().count()),
        None => {
            let t = app.status_message.clone().unwrap_or_else(|| {
                " j/k:move  /:search  s:sort  Enter:open  r:retry  ?:help  q:quit".to_string()
            });
            (t, 0)
        }
    };
    let style = if prompt.is_none() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };
    frame.render_widget(Paragraph::new(text).style(style), area);

    if prompt.is_some() {
        let chars_before_cursor = app.input_buffer[..app.input_cursor].chars().count();
        #[allow(clippy::cast_possible_truncation)]
        let cursor_x = area.x + (prefix_len + chars_before_cursor) as u16;
        if cursor_x < area.x + area.width {
            frame.set_cursor_position((cursor_x, area.y));
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let width = 60u16.min(area.width.saturating_sub(4));
    let height = (HELP_TEXT.len() as u16 + 4).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let popup_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = HELP_TEXT
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!("  {key:<16}"),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*desc),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(panel(" Keybindings ".to_string()));
    frame.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::state::{
        editor::{EditorDefaults, EditorOptions, TierKind},
        fixtures::{image_set, page, product},
        list::{CatalogList, ListQuery},
        nav::{LoadEvent, Request},
    };
    use crate::tui::keys::KeyAction;

    fn loaded_app() -> App {
        let (list, first) = CatalogList::new(ListQuery::default(), 10);
        let mut app = App::new(
            list,
            first.clone(),
            EditorOptions {
                with_price_field: true,
                with_availability_panel: false,
            },
            EditorDefaults::default(),
        );
        app.take_requests();
        app.on_load_event(LoadEvent::Page {
            request: first,
            result: Ok(page(30, 0, 10)),
        });
        app
    }

    fn buffer_to_lines(term: &Terminal<TestBackend>) -> Vec<String> {
        let buf = term.backend().buffer();
        let area = buf.area();
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(110, 32);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        buffer_to_lines(&terminal).join("\n")
    }

    #[test]
    fn snapshot_list_shows_rows_and_status() {
        let mut app = loaded_app();
        let screen = render(&mut app);
        assert!(screen.contains("10/30 products"));
        assert!(screen.contains("Products (10)"));
        assert!(screen.contains("Product 001"));
        assert!(screen.contains("beauty"));
        assert!(screen.contains("9.99"));
        assert!(app.list_visible_rows > 0);
    }

    #[test]
    fn snapshot_first_load_and_error_states() {
        let (list, first) = CatalogList::new(ListQuery::default(), 10);
        let mut app = App::new(list, first.clone(), EditorOptions::default(), EditorDefaults::default());
        assert!(render(&mut app).contains("Loading products..."));

        app.on_load_event(LoadEvent::Page {
            request: first,
            result: Err("connection refused".into()),
        });
        let screen = render(&mut app);
        assert!(screen.contains("Could not load products: connection refused"));
        assert!(screen.contains("Press r to retry"));
    }

    #[test]
    fn snapshot_editor_tiers_render_independently() {
        let mut app = loaded_app();
        app.handle_action(KeyAction::Activate);
        let requests = app.take_requests();
        assert!(render(&mut app).contains("loading item..."));

        for request in requests {
            let Request::Tier(request) = request else {
                continue;
            };
            match request.kind {
                TierKind::Detail => app.on_load_event(LoadEvent::Detail {
                    request,
                    result: Ok(product(1)),
                }),
                TierKind::Images => app.on_load_event(LoadEvent::Images {
                    request,
                    result: Err("timeout".into()),
                }),
                TierKind::Locations => {}
            }
        }
        let screen = render(&mut app);
        assert!(screen.contains("Edit item #1"));
        assert!(screen.contains("Product 001"));
        assert!(screen.contains("12.50"));
        assert!(screen.contains("library failed: timeout"));
        assert!(screen.contains("loading locations..."));
    }

    #[test]
    fn snapshot_image_picker_checkboxes() {
        let mut app = loaded_app();
        app.handle_action(KeyAction::Activate);
        for request in app.take_requests() {
            if let Request::Tier(request) = request
                && request.kind == TierKind::Images
            {
                app.on_load_event(LoadEvent::Images {
                    request,
                    result: Ok(image_set(1)),
                });
            }
        }
        app.handle_action(KeyAction::OpenImages);
        app.handle_action(KeyAction::Toggle);
        let screen = render(&mut app);
        assert!(screen.contains("Image library (1 selected)"));
        assert!(screen.contains("[x]"));
        assert!(screen.contains("[ ]"));
        assert!(screen.contains("Enter: update images"));
    }

    #[test]
    fn snapshot_search_prompt_and_help_overlay_render() {
        let mut app = loaded_app();
        app.handle_action(KeyAction::StartSearch);
        for ch in "mascara".chars() {
            app.handle_action(KeyAction::InputChar(ch));
        }
        app.show_help = true;
        let screen = render(&mut app);
        assert!(screen.contains("Search title: mascara"));
        assert!(screen.contains("Keybindings"));
        assert!(screen.contains("Pick images"));
    }

    #[test]
    fn snapshot_validation_error_inline() {
        let mut app = loaded_app();
        app.handle_action(KeyAction::Activate);
        app.take_requests();
        app.handle_action(KeyAction::Save);
        let screen = render(&mut app);
        assert!(screen.contains("Not saved"));
        // fields hidden while detail loads, so the name error is in the status line
        assert!(screen.contains("name is required"));
    }
}
