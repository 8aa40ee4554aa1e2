use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, LoginField, Screen};
use crate::models::SummaryStatus;
use crate::store::ViewFilter;

pub fn draw(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => render_login(frame, app),
        Screen::Library => render_library(frame, app),
    }

    // Render prompt popup if active
    if app.prompt.is_some() {
        render_prompt(frame, app);
    }

    if app.suggestions.is_some() {
        render_suggestions(frame, app);
    }

    // Render help popup if active
    if app.show_help {
        render_help(frame);
    }
}

fn render_login(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 50, frame.area());
    let form = &app.login;

    let title = if form.register {
        " Markly - Register (Ctrl+R to log in instead) "
    } else {
        " Markly - Log in (Ctrl+R to register) "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{label:>10}: "), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let mut lines = vec![Line::from("")];
    if form.register {
        lines.push(field("Name", form.name.clone(), form.focus == LoginField::Name));
    }
    lines.push(field("Email", form.email.clone(), form.focus == LoginField::Email));
    lines.push(field(
        "Password",
        "*".repeat(form.password.chars().count()),
        form.focus == LoginField::Password,
    ));
    lines.push(Line::from(""));
    lines.push(Line::styled(
        " Tab: next field  Enter: submit  Esc: clear",
        Style::default().fg(Color::DarkGray),
    ));
    if let Some(status) = &app.status {
        lines.push(Line::from(""));
        lines.push(Line::styled(format!(" {}", status.text), status_style(status.is_error)));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_library(frame: &mut Frame, app: &App) {
    // Sidebar, bookmark list, details
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(2, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(frame.area());

    let middle_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // Bookmark list
            Constraint::Length(1), // Status line
        ])
        .split(main_chunks[1]);

    render_sidebar(frame, app, main_chunks[0]);
    render_header(frame, app, middle_chunks[0]);
    render_bookmark_list(frame, app, middle_chunks[1]);
    render_status(frame, app, middle_chunks[2]);
    render_details(frame, app, main_chunks[2]);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let library = &app.library;
    let total = library.bookmarks().len();
    let favorites = library.favorites().len();
    let category_counts = library.category_counts();
    let collection_counts = library.collection_counts();
    let tag_counts = library.tag_counts();

    // Counts are derived from the hydrated set on every frame
    let count_for = |view: &ViewFilter| -> usize {
        match view {
            ViewFilter::All => total,
            ViewFilter::Favorites => favorites,
            ViewFilter::Category(id) => category_counts
                .iter()
                .find(|(c, _)| &c.id == id)
                .map_or(0, |(_, n)| *n),
            ViewFilter::Collection(id) => collection_counts
                .iter()
                .find(|(c, _)| &c.id == id)
                .map_or(0, |(_, n)| *n),
            ViewFilter::Tag(id) => tag_counts
                .iter()
                .find(|(t, _)| &t.id == id)
                .map_or(0, |(_, n)| *n),
        }
    };

    let items: Vec<ListItem> = library
        .views()
        .iter()
        .map(|view| {
            let color = match view {
                ViewFilter::All | ViewFilter::Favorites => Color::White,
                ViewFilter::Category(_) => Color::Green,
                ViewFilter::Collection(_) => Color::Blue,
                ViewFilter::Tag(_) => Color::Magenta,
            };
            let mut spans = vec![
                Span::styled(library.view_label(view), Style::default().fg(color)),
                Span::styled(format!(" ({})", count_for(view)), Style::default().fg(Color::DarkGray)),
            ];
            if let ViewFilter::Tag(id) = view {
                let trend = tag_counts
                    .iter()
                    .find(|(t, _)| &t.id == id)
                    .and_then(|(t, _)| t.trend());
                match trend {
                    Some(n) if n > 0 => spans.push(Span::styled(format!(" ▲{n}"), Style::default().fg(Color::Green))),
                    Some(n) if n < 0 => spans.push(Span::styled(format!(" ▼{}", -n), Style::default().fg(Color::Red))),
                    _ => {}
                }
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Library ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.view_index));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.current_view();
    let title = format!(" {} ", app.library.view_label(&view));
    let user = app
        .user
        .as_ref()
        .map(|u| format!(" | {}", u.display_name()))
        .unwrap_or_default();
    let stats = format!(" {} bookmarks{}", app.visible_bookmarks().len(), user);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(stats).style(Style::default().fg(Color::White)), inner);
}

fn render_bookmark_list(frame: &mut Frame, app: &App, area: Rect) {
    let bookmarks = app.visible_bookmarks();

    let items: Vec<ListItem> = bookmarks
        .iter()
        .map(|bookmark| {
            let star = if app.is_toggle_pending(&bookmark.id) {
                "… "
            } else if bookmark.is_fav {
                "★ "
            } else {
                "  "
            };
            let category = bookmark
                .category()
                .map(|c| format!("[{}] ", c.label()))
                .unwrap_or_default();

            ListItem::new(Line::from(vec![
                Span::styled(star, Style::default().fg(Color::Yellow)),
                Span::styled(category, Style::default().fg(Color::Green)),
                Span::styled(bookmark.display_title(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !bookmarks.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.is_loading {
        ("Loading...".to_string(), Style::default().fg(Color::DarkGray))
    } else if let Some(status) = &app.status {
        (status.text.clone(), status_style(status.is_error))
    } else {
        (
            "j/k:nav  tab:view  f:fav  a:add  s:summary  ?:help  q:quit".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Bookmark ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let Some(bookmark) = app.selected_bookmark() else {
        let paragraph = Paragraph::new("No bookmark selected").block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::styled(bookmark.display_title().to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Line::styled(bookmark.url.clone(), Style::default().fg(Color::Blue)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Saved: ", label),
            Span::raw(bookmark.created_at.format("%Y-%m-%d").to_string()),
        ]),
    ];

    if let Some(category) = bookmark.category() {
        lines.push(Line::from(vec![Span::styled("Category: ", label), Span::raw(category.label())]));
    }
    if !bookmark.collections.is_empty() {
        let names: Vec<&str> = bookmark.collections.iter().map(|c| c.name.as_str()).collect();
        lines.push(Line::from(vec![Span::styled("Collections: ", label), Span::raw(names.join(", "))]));
    }
    if !bookmark.tags.is_empty() {
        let names: Vec<String> = bookmark.tags.iter().map(|t| format!("#{}", t.name)).collect();
        lines.push(Line::from(vec![
            Span::styled("Tags: ", label),
            Span::styled(names.join(" "), Style::default().fg(Color::Magenta)),
        ]));
    }

    lines.push(Line::from(""));
    let summary = match app.summary_status {
        SummaryStatus::Generating => "Generating summary...".to_string(),
        SummaryStatus::Failed => "Failed to generate summary. Press 's' to retry.".to_string(),
        SummaryStatus::Idle | SummaryStatus::Generated if bookmark.summary.is_empty() => {
            "No summary yet. Press 's' to generate one.".to_string()
        }
        SummaryStatus::Idle | SummaryStatus::Generated => bookmark.summary.clone(),
    };
    lines.push(Line::from(summary));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_prompt(frame: &mut Frame, app: &App) {
    let Some(prompt) = &app.prompt else {
        return;
    };
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(prompt.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    // Clear the area first
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {}_", prompt.input);
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_suggestions(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 60, frame.area());
    let suggestions = app.suggestions.as_deref().unwrap_or_default();

    let mut lines: Vec<Line> = Vec::new();
    if suggestions.is_empty() {
        lines.push(Line::from(" No suggestions right now"));
    }
    for suggestion in suggestions {
        let title = if suggestion.title.is_empty() {
            suggestion.url.clone()
        } else {
            suggestion.title.clone()
        };
        lines.push(Line::styled(format!(" {title}"), Style::default().add_modifier(Modifier::BOLD)));
        lines.push(Line::styled(format!("   {}", suggestion.url), Style::default().fg(Color::Blue)));
        if let Some(reason) = &suggestion.reason {
            lines.push(Line::styled(format!("   {reason}"), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(""));
    }

    let block = Block::default()
        .title(" Suggestions - press any key to close ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 70, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓      Move down",
        "   k / ↑      Move up",
        "   < / >      Top / bottom",
        "   Tab / l    Next sidebar view",
        "   S-Tab / h  Previous sidebar view",
        "",
        " Bookmarks:",
        "   f          Toggle favorite",
        "   o / Enter  Open in browser",
        "   a          Add bookmark",
        "   s          Generate AI summary",
        "   S          Show AI suggestions",
        "",
        " Organize:",
        "   c          New category",
        "   n          New collection",
        "   t          New tag",
        "   D          Delete selected collection",
        "",
        " General:",
        "   r          Reload",
        "   L          Log out",
        "   ?          Toggle this help",
        "   q          Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn status_style(is_error: bool) -> Style {
    if is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
