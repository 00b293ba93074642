use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::emphasis::EmphasizedWord;
use crate::session::ReadingSession;

/// Which edit field receives keystrokes while idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Text,
    Rate,
}

/// Everything the renderer needs for one frame.
pub struct View<'a> {
    pub session: &'a ReadingSession,
    pub flash: Option<&'a EmphasizedWord>,
    pub focus: Focus,
    pub rate_input: &'a str,
    pub rate_valid: bool,
    pub status: Option<&'a str>,
}

pub fn draw(f: &mut Frame, view: &View) {
    if view.session.is_playing() {
        if view.session.fullscreen() {
            render_word(f, view, f.area(), false);
            return;
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(5),    // Word display
                Constraint::Length(2), // Status strip
            ])
            .split(f.area());

        render_title(f, chunks[0]);
        render_word(f, view, chunks[1], true);
        render_playing_strip(f, view, chunks[2]);
        return;
    }

    render_editor(f, view);
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new("skimr — paste text, set a pace, read one word at a time")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    f.render_widget(title, area);
}

/// The flashed word, with the emphasized letter pinned to the focal column
/// so the eye's fixation point stays put across words.
fn render_word(f: &mut Frame, view: &View, area: Rect, bordered: bool) {
    let inner = if bordered {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);
        inner
    } else {
        area
    };

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let center_x = inner.x + inner.width / 2;
    let center_y = inner.y + inner.height / 2;

    // Fixed focal guides above and below the emphasized letter.
    let marker_style = Style::default().fg(Color::DarkGray);
    if center_y >= inner.y + 2 {
        let marker = Paragraph::new("|").style(marker_style);
        f.render_widget(marker, Rect::new(center_x, center_y - 2, 1, 1));
    }
    if center_y + 2 < inner.bottom() {
        let marker = Paragraph::new("|").style(marker_style);
        f.render_widget(marker, Rect::new(center_x, center_y + 2, 1, 1));
    }

    let flash = match view.flash {
        Some(flash) => flash,
        None => return,
    };

    let before_width = flash.before.as_str().width() as u16;
    let letter_width = flash.letter.as_str().width() as u16;
    let after_width = flash.after.as_str().width() as u16;

    let left_room = center_x - inner.x;
    let width = before_width.min(left_room);
    if width > 0 {
        let before = Paragraph::new(flash.before.as_str()).alignment(Alignment::Right);
        f.render_widget(before, Rect::new(center_x - width, center_y, width, 1));
    }

    if letter_width > 0 && center_x < inner.right() {
        let letter = Paragraph::new(flash.letter.as_str()).style(
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        );
        let width = letter_width.min(inner.right() - center_x);
        f.render_widget(letter, Rect::new(center_x, center_y, width, 1));
    }

    let after_x = center_x + letter_width;
    if after_width > 0 && after_x < inner.right() {
        let after = Paragraph::new(flash.after.as_str());
        let width = after_width.min(inner.right() - after_x);
        f.render_widget(after, Rect::new(after_x, center_y, width, 1));
    }
}

fn render_playing_strip(f: &mut Frame, view: &View, area: Rect) {
    let session = view.session;
    let strip = Line::from(vec![
        Span::styled(
            format!("WPM: {} ", session.wpm()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("| "),
        Span::styled(
            format!(
                "Word: {}/{} ",
                session.position() + 1,
                session.word_count().max(1)
            ),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("| "),
        Span::styled(
            session.playback().to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(
            "space: stop  f: fullscreen",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let strip = Paragraph::new(strip).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(strip, area);
}

fn render_editor(f: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Text area
            Constraint::Length(3), // Rate + stats
            Constraint::Length(1), // Key hints
        ])
        .split(f.area());

    render_title(f, chunks[0]);

    let focused = |this: Focus| {
        if view.focus == this {
            Style::default().fg(Color::Blue)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut text = view.session.text().to_string();
    if view.focus == Focus::Text {
        text.push('▌');
    }
    let text_area = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused(Focus::Text))
                .title(" text "),
        );
    f.render_widget(text_area, chunks[1]);

    let rate_style = if !view.rate_valid {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if view.focus == Focus::Rate {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let mut rate_display = view.rate_input.to_string();
    if view.focus == Focus::Rate {
        rate_display.push('▌');
    }

    let mut controls = vec![
        Span::styled("WPM: ", Style::default().fg(Color::Cyan)),
        Span::styled(rate_display, rate_style),
        Span::raw("  |  "),
        Span::styled(
            format!("Word Count: {}", view.session.word_count()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("ETR: {:.2} sec", view.session.reading_time_secs()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(status) = view.status {
        controls.push(Span::raw("  |  "));
        controls.push(Span::styled(status, Style::default().fg(Color::Yellow)));
    }

    let controls = Paragraph::new(Line::from(controls))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focused(Focus::Rate))
                .title(" controls "),
        );
    f.render_widget(controls, chunks[2]);

    let hints = Paragraph::new(
        "tab: switch field | ctrl+r: start | ctrl+f: fullscreen | ctrl+s: copy share link | esc: quit",
    )
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )
    .alignment(Alignment::Center);
    f.render_widget(hints, chunks[3]);
}
