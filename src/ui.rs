use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use crate::app::App;
use crate::conversation::{Conversation, Role};

const MAX_CHAT_LINES: usize = u16::MAX as usize;

const ACCENT: Color = Color::Rgb(0, 120, 215);
const NEUTRAL_DARK: Color = Color::Rgb(58, 58, 58);
const LIGHT_TEXT: Color = Color::Rgb(240, 240, 240);
const ALERT: Color = Color::Rgb(255, 68, 68);
const USER_LABEL: Color = Color::Rgb(0, 170, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleAlign {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleTone {
    /// Filled accent color
    Accent,
    /// Filled dark neutral
    Neutral,
    /// Italic, dimmed, unfilled
    Muted,
    /// Red text, unfilled
    Alert,
}

impl BubbleTone {
    fn body_style(self) -> Style {
        match self {
            BubbleTone::Accent => Style::default().fg(Color::White).bg(ACCENT),
            BubbleTone::Neutral => Style::default().fg(LIGHT_TEXT).bg(NEUTRAL_DARK),
            BubbleTone::Muted => Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            BubbleTone::Alert => Style::default().fg(ALERT),
        }
    }

    fn label_style(self) -> Style {
        let fg = match self {
            BubbleTone::Accent => USER_LABEL,
            BubbleTone::Neutral => Color::Yellow,
            BubbleTone::Muted => Color::DarkGray,
            BubbleTone::Alert => ALERT,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }

    fn filled(self) -> bool {
        matches!(self, BubbleTone::Accent | BubbleTone::Neutral)
    }
}

/// Display description of one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub align: BubbleAlign,
    pub tone: BubbleTone,
    pub sender: Option<String>,
    pub body: String,
}

/// Map the conversation to bubbles, one per turn, in log order
pub fn bubbles(conversation: &Conversation, assistant_name: &str) -> Vec<Bubble> {
    conversation
        .turns()
        .iter()
        .map(|turn| {
            let (align, tone, sender) = match turn.role {
                Role::User => (BubbleAlign::Right, BubbleTone::Accent, Some("You".to_string())),
                Role::Assistant => (BubbleAlign::Left, BubbleTone::Neutral, Some(assistant_name.to_string())),
                Role::Thinking => (BubbleAlign::Left, BubbleTone::Muted, None),
                Role::System => (BubbleAlign::Left, BubbleTone::Alert, Some("System".to_string())),
            };
            Bubble {
                role: turn.role,
                align,
                tone,
                sender,
                body: turn.content.clone(),
            }
        })
        .collect()
}

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Wrap text to fit within a given number of terminal columns.
/// Breaks on word boundaries, keeps explicit newlines, and splits words
/// wider than the line.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(2);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            let mut word_width = UnicodeWidthStr::width(word.as_str());

            // Hard-split words that can never fit
            while word_width > width {
                if current_width > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_width = 0;
                }
                let mut taken = 0;
                let mut split_at = word.len();
                for (i, c) in word.char_indices() {
                    if taken + char_width(c) > width {
                        split_at = i;
                        break;
                    }
                    taken += char_width(c);
                }
                let rest = word.split_off(split_at);
                lines.push(word);
                word = rest;
                word_width = UnicodeWidthStr::width(word.as_str());
            }

            if word.is_empty() {
                continue;
            }
            if current_width == 0 {
                // First word on line
                current_line = word;
                current_width = word_width;
            } else if current_width + 1 + word_width <= width {
                // Word fits on current line
                current_line.push(' ');
                current_line.push_str(&word);
                current_width += 1 + word_width;
            } else {
                // Word doesn't fit, start new line
                lines.push(std::mem::replace(&mut current_line, word));
                current_width = word_width;
            }
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Lay bubbles out as terminal lines for a viewport `width` columns wide
pub fn bubble_lines(bubbles: &[Bubble], width: u16) -> Vec<Line<'static>> {
    let width = width as usize;
    let max_bubble = (width * 3 / 4).max(12).min(width.max(1));
    let inner = max_bubble.saturating_sub(2).max(1);

    let mut lines = Vec::new();
    for bubble in bubbles {
        let alignment = match bubble.align {
            BubbleAlign::Left => Alignment::Left,
            BubbleAlign::Right => Alignment::Right,
        };

        if let Some(sender) = &bubble.sender {
            lines.push(
                Line::from(Span::styled(sender.clone(), bubble.tone.label_style())).alignment(alignment),
            );
        }

        let wrapped = wrap_text_to_width(&bubble.body, inner);
        let block_width = wrapped
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()))
            .max()
            .unwrap_or(0);
        let style = bubble.tone.body_style();

        for text in wrapped {
            let content = if bubble.tone.filled() {
                let pad = block_width - UnicodeWidthStr::width(text.as_str());
                format!(" {}{} ", text, " ".repeat(pad))
            } else {
                text
            };
            lines.push(Line::from(Span::styled(content, style)).alignment(alignment));
        }

        lines.push(Line::default());
    }
    lines
}

/// Keep only the newest lines when the log outgrows the `u16` scroll range
/// of `Paragraph`, so the latest turn can always be scrolled into view.
fn keep_scrollable_tail(mut lines: Vec<Line<'static>>) -> Vec<Line<'static>> {
    let excess = lines.len().saturating_sub(MAX_CHAT_LINES);
    if excess > 0 {
        lines.drain(..excess);
    }
    lines
}

/// Visible slice of the input line and the cursor column inside it.
/// Scrolls horizontally so the cursor always stays within `width` columns.
fn input_view(input: &str, cursor: usize, width: usize) -> (String, u16) {
    let chars: Vec<char> = input.chars().collect();
    let cursor = cursor.min(chars.len());
    let cols = |range: &[char]| range.iter().map(|c| char_width(*c)).sum::<usize>();

    let mut offset = 0;
    while width > 0 && offset < cursor && cols(&chars[offset..cursor]) >= width {
        offset += 1;
    }

    let mut visible = String::new();
    let mut used = 0;
    for c in &chars[offset..] {
        let w = char_width(*c);
        if used + w > width {
            break;
        }
        visible.push(*c);
        used += w;
    }

    let cursor_x = u16::try_from(cols(&chars[offset..cursor])).unwrap_or(u16::MAX);
    (visible, cursor_x)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(format!(" {} ", app.config.window_title), Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} · {} ", app.config.assistant_name, app.model()));

    let inner = block.inner(area);
    app.chat_height = inner.height;

    if app.conversation.is_empty() {
        app.chat_total_lines = 0;
        app.chat_scroll = 0;
        let hint = Paragraph::new(Text::from(Span::styled(
            "Type a message to start chatting...",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    // Full rebuild from the log on every draw
    let lines = keep_scrollable_tail(bubble_lines(
        &bubbles(&app.conversation, &app.config.assistant_name),
        inner.width,
    ));
    app.chat_total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    if app.follow_bottom {
        app.chat_scroll = app.max_scroll();
    } else {
        app.chat_scroll = app.chat_scroll.min(app.max_scroll());
    }

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);

    if app.max_scroll() > 0 {
        let mut scrollbar_state = ScrollbarState::new(app.max_scroll() as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let [text_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(10),
    ])
    .areas(area);
    app.send_area = Some(send_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Message ");

    // Visible portion of input with horizontal scrolling, measured in columns
    let inner_width = text_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_view(&app.input, app.cursor, inner_width);

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::White))
    };
    frame.render_widget(input.block(input_block), text_area);

    frame.set_cursor_position((text_area.x + cursor_x + 1, text_area.y + 1));

    // Send control is disabled while a request is outstanding
    let send_style = if app.is_pending() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White).bg(ACCENT).add_modifier(Modifier::BOLD)
    };
    let send = Paragraph::new(Span::styled(" Send ", send_style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if app.is_pending() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(ACCENT)
                }),
        );
    frame.render_widget(send, send_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Cyan);
    let text = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(" Enter", key),
        Span::styled(" send  ", text),
        Span::styled("PgUp/PgDn", key),
        Span::styled(" scroll  ", text),
        Span::styled("Esc", key),
        Span::styled(" quit", text),
    ];
    if app.is_pending() {
        spans.push(Span::styled("  waiting for reply", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
