// File: src/tui/view.rs
use crate::calendar::{WEEKDAY_LABELS, day_key};
use crate::color_utils;
use crate::config::AppTheme;
use crate::model::display::CardDisplay;
use crate::model::{Card, Priority};
use crate::tui::action::Screen;
use crate::tui::state::{AppState, InputMode};

use chrono::{Datelike, Local};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};
use unicode_width::UnicodeWidthStr;

/// Colors derived from the active theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Dark => Self {
                fg: Color::Gray,
                bg: Color::Reset,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                highlight_bg: Color::Rgb(40, 48, 64),
                error: Color::LightRed,
            },
            AppTheme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::Gray,
                accent: Color::Blue,
                highlight_bg: Color::Rgb(210, 225, 245),
                error: Color::Red,
            },
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

fn priority_color(priority: Priority, theme: AppTheme) -> Color {
    rgb(color_utils::priority_rgb(priority, theme.is_dark()))
}

fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + 1 >= width {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    out
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let palette = Palette::for_theme(state.theme);
    f.render_widget(
        Block::default().style(Style::default().fg(palette.fg).bg(palette.bg)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_tabs(f, state, &palette, chunks[0]);
    match state.screen {
        Screen::Courses => draw_courses(f, state, &palette, chunks[1]),
        Screen::Board => draw_board(f, state, &palette, chunks[1]),
        Screen::Calendar => draw_calendar(f, state, &palette, chunks[1]),
        Screen::Tasks => draw_tasks(f, state, &palette, chunks[1]),
    }
    draw_footer(f, state, &palette, chunks[2]);
}

fn draw_tabs(f: &mut Frame, state: &AppState, palette: &Palette, area: Rect) {
    let titles: Vec<Line> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(i, s)| Line::from(format!("{} {}", i + 1, s.title())))
        .collect();
    let user = state.username();
    let tabs = Tabs::new(titles)
        .select(state.screen.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    " Tablero · {} ",
                    if user.is_empty() { "?" } else { user.as_str() }
                )),
        )
        .style(Style::default().fg(palette.muted))
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn draw_courses(f: &mut Frame, state: &mut AppState, palette: &Palette, area: Rect) {
    let picking = state.mode == InputMode::PickingTemplate;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(if picking {
            [Constraint::Percentage(55), Constraint::Percentage(45)]
        } else {
            [Constraint::Percentage(100), Constraint::Percentage(0)]
        })
        .split(area);

    let items: Vec<ListItem> = state
        .boards
        .iter()
        .map(|b| {
            let swatch = rgb(color_utils::board_rgb(&b.color, &b.name));
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(swatch)),
                Span::raw(b.name.clone()),
                Span::styled(
                    format!("  {} members", b.members.len()),
                    Style::default().fg(palette.muted),
                ),
            ]))
        })
        .collect();

    let hint = if state.is_teacher() {
        " Courses (Enter:open  n:new  p:from template  i:invite) "
    } else {
        " Courses (Enter:open) "
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(hint))
        .highlight_style(Style::default().bg(palette.highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, chunks[0], &mut state.board_list);

    if picking {
        let items: Vec<ListItem> = state
            .templates
            .iter()
            .map(|t| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<8} ", t.code), Style::default().fg(palette.accent)),
                    Span::raw(t.name.clone()),
                    Span::styled(format!("  {}", t.room), Style::default().fg(palette.muted)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent))
                    .title(" Templates (Enter:create  Esc:cancel) "),
            )
            .highlight_style(Style::default().bg(palette.highlight_bg))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, chunks[1], &mut state.template_list);
    }
}

fn draw_board(f: &mut Frame, state: &AppState, palette: &Palette, area: Rect) {
    let columns = state.board.columns();
    if columns.is_empty() {
        let text = if state.board.is_loading() {
            "Loading board..."
        } else {
            "No lists on this board. Open a course from the Courses tab."
        };
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Board ")),
            area,
        );
        return;
    }

    let constraints: Vec<Constraint> = columns
        .iter()
        .map(|_| Constraint::Ratio(1, columns.len() as u32))
        .collect();
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let armed = state.board.armed().map(|c| c.id);
    let pending = state.board.pending().map(|p| p.card);

    for (idx, (column, rect)) in columns.iter().zip(areas.iter()).enumerate() {
        let focused = idx == state.column;
        let inner_width = rect.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = column
            .cards
            .iter()
            .enumerate()
            .map(|(row, card)| {
                let marker = if Some(card.id) == pending {
                    "… "
                } else if Some(card.id) == armed {
                    "» "
                } else {
                    "  "
                };
                let mut style = Style::default().fg(priority_color(card.priority, state.theme));
                if focused && row == state.row {
                    style = style.bg(palette.highlight_bg).add_modifier(Modifier::BOLD);
                }
                ListItem::new(Line::from(Span::styled(
                    truncate(&format!("{}{}", marker, card.title), inner_width),
                    style,
                )))
            })
            .collect();

        let border = if focused { palette.accent } else { palette.muted };
        let title = format!(" {} ({}) ", column.list.title, column.cards.len());
        f.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(title),
            ),
            *rect,
        );
    }
}

fn draw_calendar(f: &mut Frame, state: &AppState, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    let counts = state.calendar.counts();
    let selected = state.calendar.selected();
    let today = Local::now().date_naive();

    let mut lines = vec![Line::from(
        WEEKDAY_LABELS
            .iter()
            .map(|d| Span::styled(format!("{:>6}", d), Style::default().fg(palette.muted)))
            .collect::<Vec<_>>(),
    )];

    for week in state.calendar.grid().chunks(7) {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| {
                let n = counts.get(&day_key(cell.date)).copied().unwrap_or(0);
                let text = if n > 0 {
                    format!("{:>4}*{}", cell.date.day(), n.min(9))
                } else {
                    format!("{:>6}", cell.date.day())
                };
                let mut style = Style::default().fg(if cell.in_month {
                    palette.fg
                } else {
                    palette.muted
                });
                if n > 0 {
                    style = style.fg(palette.accent);
                }
                if cell.date == today {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                if Some(cell.date) == selected {
                    style = style.bg(palette.highlight_bg).add_modifier(Modifier::BOLD);
                }
                Span::styled(text, style)
            })
            .collect();
        lines.push(Line::from(spans));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {}  ([ ]:month  hjkl:day) ", state.calendar.label())),
        ),
        chunks[0],
    );

    let day_cards = state.calendar.selected_cards();
    let title = match state.calendar.selected_key() {
        Some(key) => format!(" Due on {} ", key),
        None => " Select a day ".to_string(),
    };
    let items: Vec<ListItem> = day_cards.iter().map(|c| card_item(c, state)).collect();
    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "Nothing due.",
            Style::default().fg(palette.muted),
        ))])
    } else {
        List::new(items)
    };
    f.render_widget(
        list.block(Block::default().borders(Borders::ALL).title(title)),
        chunks[1],
    );
}

fn card_item<'a>(card: &Card, state: &AppState) -> ListItem<'a> {
    let mine = state.my_id().is_some_and(|me| card.is_assigned_to(me));
    let prefix = if mine { "● " } else { "  " };
    ListItem::new(Line::from(Span::styled(
        format!("{}{}", prefix, card.to_row_string()),
        Style::default().fg(priority_color(card.priority, state.theme)),
    )))
}

fn draw_tasks(f: &mut Frame, state: &mut AppState, palette: &Palette, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(area);

    let items: Vec<ListItem> = state.tasks.iter().map(|c| card_item(c, state)).collect();
    let title = format!(
        " Tasks: {}, {} (f/d:filter  a:assignees  n:new) ",
        state.task_filter.assignee, state.task_filter.due
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(palette.highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, chunks[0], &mut state.task_list);

    if state.mode == InputMode::PickingAssignees {
        draw_member_picker(f, state, palette, chunks[1]);
        return;
    }

    let details = match state.selected_task() {
        Some(card) if !card.description.is_empty() => {
            format!("{} priority. {}", card.priority.label(), card.description)
        }
        Some(card) => format!("{} priority. No description.", card.priority.label()),
        None => String::new(),
    };
    f.render_widget(
        Paragraph::new(details)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Details ")),
        chunks[1],
    );
}

fn draw_member_picker(f: &mut Frame, state: &mut AppState, palette: &Palette, area: Rect) {
    let me = state.my_id();
    let items: Vec<ListItem> = match state.assign.as_ref() {
        Some(draft) => state
            .members
            .iter()
            .map(|u| {
                let mark = if draft.contains(u.id) { "[x] " } else { "[ ] " };
                let you = if Some(u.id) == me { " (you)" } else { "" };
                ListItem::new(format!("{}{}{}", mark, u.username, you))
            })
            .collect(),
        None => Vec::new(),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent))
                .title(" Assignees (Space:toggle  m:me  Enter:save  Esc:cancel) "),
        )
        .highlight_style(Style::default().bg(palette.highlight_bg))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut state.member_list);
}

fn draw_footer(f: &mut Frame, state: &AppState, palette: &Palette, area: Rect) {
    let (title, text, style) = match state.mode {
        InputMode::Normal => {
            let style = if state.message.starts_with("Error") || state.board.error().is_some() {
                Style::default().fg(palette.error)
            } else {
                Style::default().fg(palette.fg)
            };
            let title = if state.loading { " Working... " } else { " Status " };
            (
                title.to_string(),
                format!("{}   [t:theme r:reload q:quit]", state.message),
                style,
            )
        }
        InputMode::CreatingBoard => (
            " New course name (Enter/Esc) ".to_string(),
            state.input_buffer.clone(),
            Style::default().fg(palette.accent),
        ),
        InputMode::Inviting => (
            " Invite username (Enter/Esc) ".to_string(),
            state.input_buffer.clone(),
            Style::default().fg(palette.accent),
        ),
        InputMode::CreatingCard => (
            format!(
                " New card in {} (title | due | priority | description  Tab:list) ",
                state.new_card_list_title().unwrap_or("?")
            ),
            state.input_buffer.clone(),
            Style::default().fg(palette.accent),
        ),
        InputMode::PickingTemplate | InputMode::PickingAssignees => (
            " Pick (j/k Enter Esc) ".to_string(),
            state.message.clone(),
            Style::default().fg(palette.fg),
        ),
    };

    f.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
    if state.mode.is_text() {
        let x = area.x + 1 + state.input_buffer.width() as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}
