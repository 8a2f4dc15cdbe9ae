//! Chat View
//!
//! Lays the conversation out as rows of bubbles and date separators, keeps
//! the scroll position and maps screen positions back to bubbles.
use std::collections::HashMap;

use bitflags::bitflags;
use cached::proc_macro::cached;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use textwrap::core::display_width;
use textwrap::wrap;

use crate::conversation::{Message, MessageKind, MessageStore};

const SENT_STYLE: Style = Style::new().fg(Color::White).bg(Color::Blue);

const RECEIVED_STYLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);

const DATE_STYLE: Style = Style::new()
    .fg(Color::Gray)
    .add_modifier(Modifier::BOLD);

const TIMESTAMP_STYLE: Style = Style::new()
    .fg(Color::Gray)
    .add_modifier(Modifier::DIM);

const CHAT_BORDER_STYLE: Style = Style::new().fg(Color::Gray);

/// Heart reaction marker.
const HEART: &str = "💙";

bitflags! {
    /// Presentation state of a single bubble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BubbleClass: u8
    {
        /// The timestamp is drawn next to the bubble
        const SHOW_TIMESTAMP = 1;
        /// The bubble moved left to make room for the timestamp
        const SHIFTED_LEFT = 1 << 1;
        /// The bubble moved right to make room for the timestamp
        const SHIFTED_RIGHT = 1 << 2;
    }
}

impl BubbleClass
{
    /// Classes of a revealed bubble, shifted away from its own side.
    #[must_use]
    pub const fn revealed(kind: MessageKind) -> Self
    {
        match kind
        {
            MessageKind::Sent => Self::SHOW_TIMESTAMP.union(Self::SHIFTED_LEFT),
            MessageKind::Received | MessageKind::Date =>
            {
                Self::SHOW_TIMESTAMP.union(Self::SHIFTED_RIGHT)
            }
        }
    }
}

/// One laid-out row of the conversation.
#[derive(Debug, Clone)]
pub struct ChatRow
{
    /// What to draw
    pub line: Line<'static>,
    /// Ordinal of the bubble the row belongs to
    pub bubble: Option<usize>,
    /// Columns covered by the bubble body, end exclusive
    pub body: Option<(usize, usize)>,
}

impl ChatRow
{
    /// Row not owned by any bubble.
    fn plain(line: Line<'static>) -> Self
    {
        Self {
            line,
            bubble: None,
            body: None,
        }
    }

    /// The row's text without styling.
    #[must_use]
    pub fn text(&self) -> String
    {
        self.line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }
}

/// Wraps bubble text, memoized since every frame lays out every bubble.
#[cached(size = 512)]
fn wrap_bubble(text: String, width: usize) -> Vec<String>
{
    wrap(&text, width)
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Lays out the whole conversation.
///
/// # Arguments
///
/// * `store` - The conversation
/// * `classes` - Presentation state per bubble ordinal
/// * `width` - Available width in columns
///
/// # Returns
///
/// The rows in display order.
#[must_use]
pub fn layout_rows(
    store: &MessageStore,
    classes: &HashMap<usize, BubbleClass>,
    width: u16,
) -> Vec<ChatRow>
{
    let width = usize::from(width);
    let mut rows = Vec::new();
    let mut bubble = 0;
    let mut previous: Option<MessageKind> = None;

    for message in store
    {
        if previous.is_some_and(|kind| kind != message.kind)
        {
            rows.push(ChatRow::plain(Line::from("")));
        }
        previous = Some(message.kind);

        if message.is_date()
        {
            rows.push(ChatRow::plain(
                Line::styled(message.text.clone(), DATE_STYLE).alignment(Alignment::Center),
            ));
            continue;
        }

        let class = classes.get(&bubble).copied().unwrap_or_default();
        rows.extend(layout_bubble(message, class, width, bubble));
        bubble += 1;
    }

    rows
}

/// Lays out one bubble, heart marker and timestamp included.
///
/// Every row is owned by `bubble`; only the text rows carry a body span.
fn layout_bubble(
    message: &Message,
    class: BubbleClass,
    width: usize,
    bubble: usize,
) -> Vec<ChatRow>
{
    let is_sent = message.kind == MessageKind::Sent;
    let style = if is_sent { SENT_STYLE } else { RECEIVED_STYLE };

    // one column of padding inside the bubble on each side
    let text_width = (width.saturating_mul(3) / 4).saturating_sub(2).max(1);
    let wrapped = wrap_bubble(message.text.clone(), text_width);
    let inner = wrapped
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0);
    let bubble_width = inner + 2;

    let time = message.time();
    let shows_time = class.contains(BubbleClass::SHOW_TIMESTAMP);
    let gutter = if shows_time { display_width(time) + 1 } else { 0 };

    let left_pad = if is_sent
    {
        let shift = if class.contains(BubbleClass::SHIFTED_LEFT) { gutter } else { 0 };
        width.saturating_sub(bubble_width + shift)
    }
    else if class.contains(BubbleClass::SHIFTED_RIGHT)
    {
        gutter
    }
    else
    {
        0
    };

    let mut rows = Vec::with_capacity(wrapped.len() + 1);

    if message.has_heart
    {
        // tapback sits on the corner facing the other side
        let heart_pad = if is_sent
        {
            left_pad
        }
        else
        {
            (left_pad + bubble_width).saturating_sub(display_width(HEART))
        };
        rows.push(ChatRow {
            line: Line::from(format!("{}{HEART}", " ".repeat(heart_pad))),
            bubble: Some(bubble),
            body: None,
        });
    }

    // the body starts at left_pad whether or not a timestamp precedes it
    let body_span = Some((left_pad, left_pad + bubble_width));

    let last = wrapped.len().saturating_sub(1);
    for (index, text) in wrapped.iter().enumerate()
    {
        let fill = inner.saturating_sub(display_width(text));
        let body = Span::styled(format!(" {text}{} ", " ".repeat(fill)), style);
        let stamp = shows_time && index == last;

        let spans = if is_sent
        {
            let mut spans = vec![Span::raw(" ".repeat(left_pad)), body];
            if stamp
            {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(time.to_owned(), TIMESTAMP_STYLE));
            }
            spans
        }
        else if stamp
        {
            let pad = left_pad.saturating_sub(gutter);
            vec![
                Span::raw(" ".repeat(pad)),
                Span::styled(time.to_owned(), TIMESTAMP_STYLE),
                Span::raw(" "),
                body,
            ]
        }
        else
        {
            vec![Span::raw(" ".repeat(left_pad)), body]
        };

        rows.push(ChatRow {
            line: Line::from(spans),
            bubble: Some(bubble),
            body: body_span,
        });
    }

    rows
}

/// Scrollable view of the conversation.
#[derive(Debug)]
pub struct ChatView
{
    /// Presentation state per bubble ordinal
    classes: HashMap<usize, BubbleClass>,
    /// First visible row
    scroll: usize,
    /// Keep the newest row in view
    follow_tail: bool,
    /// Bubble owning each row, from the last render
    row_owners: Vec<Option<usize>>,
    /// Body span of each row, from the last render
    row_bodies: Vec<Option<(usize, usize)>>,
    /// Inner area of the last render
    area: Rect,
}

impl ChatView
{
    /// Creates a view scrolled to the bottom.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            classes: HashMap::new(),
            scroll: 0,
            follow_tail: true,
            row_owners: Vec::new(),
            row_bodies: Vec::new(),
            area: Rect::default(),
        }
    }

    /// Resets the view after the conversation changed.
    ///
    /// Bubbles are rebuilt from scratch, so any revealed timestamp is gone,
    /// and the newest entry is scrolled into view.
    pub fn rebuild(&mut self)
    {
        self.classes.clear();
        self.scroll_to_bottom();
    }

    /// Reveals the timestamp of a bubble.
    pub fn reveal(&mut self, bubble: usize, kind: MessageKind)
    {
        self.classes
            .insert(bubble, BubbleClass::revealed(kind));
    }

    /// Hides the timestamp of a bubble.
    pub fn hide(&mut self, bubble: usize)
    {
        self.classes.remove(&bubble);
    }

    /// Presentation state of a bubble.
    #[must_use]
    pub fn class(&self, bubble: usize) -> BubbleClass
    {
        self.classes
            .get(&bubble)
            .copied()
            .unwrap_or_default()
    }

    /// Keeps the newest row in view from the next render on.
    pub const fn scroll_to_bottom(&mut self)
    {
        self.follow_tail = true;
    }

    /// Scrolls up by `amount` rows.
    pub fn scroll_up(&mut self, amount: usize)
    {
        self.detach();
        self.scroll = self.scroll.saturating_sub(amount);
    }

    /// Scrolls down by `amount` rows.
    ///
    /// The render clamps the position to the last page.
    pub fn scroll_down(&mut self, amount: usize)
    {
        self.detach();
        self.scroll = self.scroll.saturating_add(amount);
    }

    /// Scrolls to the first row.
    pub fn scroll_to_top(&mut self)
    {
        self.detach();
        self.scroll = 0;
    }

    /// First visible row.
    #[must_use]
    pub const fn scroll(&self) -> usize
    {
        self.scroll
    }

    /// Whether the view sticks to the newest row.
    #[must_use]
    pub const fn follows_tail(&self) -> bool
    {
        self.follow_tail
    }

    /// Renders the conversation into `area`.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render to
    /// * `area` - The area of the chat, borders included
    /// * `store` - The conversation
    pub fn render(&mut self, frame: &mut Frame, area: Rect, store: &MessageStore)
    {
        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(CHAT_BORDER_STYLE);
        let inner = block.inner(area);

        let rows = layout_rows(store, &self.classes, inner.width);
        let max_scroll = rows
            .len()
            .saturating_sub(usize::from(inner.height));

        self.scroll = if self.follow_tail
        {
            max_scroll
        }
        else
        {
            self.scroll.min(max_scroll)
        };

        self.row_owners = rows.iter().map(|row| row.bubble).collect();
        self.row_bodies = rows.iter().map(|row| row.body).collect();
        self.area = inner;

        let lines: Vec<Line> = rows.into_iter().map(|row| row.line).collect();
        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .scroll((u16::try_from(self.scroll).unwrap_or(u16::MAX), 0));

        frame.render_widget(paragraph, area);
    }

    /// Bubble drawn at a terminal cell, based on the last render.
    ///
    /// # Returns
    ///
    /// The bubble ordinal, or `None` outside of any bubble.
    #[must_use]
    pub fn bubble_at(&self, column: u16, row: u16) -> Option<usize>
    {
        let index = self.row_index(column, row)?;
        self.row_owners.get(index).copied().flatten()
    }

    /// Bubble whose body covers a terminal cell, based on the last render.
    ///
    /// Unlike [`Self::bubble_at`], the padding beside a bubble and its heart
    /// row do not count.
    #[must_use]
    pub fn bubble_body_at(&self, column: u16, row: u16) -> Option<usize>
    {
        let index = self.row_index(column, row)?;
        let (start, end) = self.row_bodies.get(index).copied().flatten()?;
        let offset = usize::from(column - self.area.x);

        if !(start..end).contains(&offset)
        {
            return None;
        }

        self.row_owners.get(index).copied().flatten()
    }

    /// Index into the laid-out rows of a terminal cell inside the chat.
    fn row_index(&self, column: u16, row: u16) -> Option<usize>
    {
        let inside = column >= self.area.x &&
            column < self.area.right() &&
            row >= self.area.y &&
            row < self.area.bottom();

        inside.then(|| usize::from(row - self.area.y) + self.scroll)
    }

    /// Pins the current position so new renders stop following the tail.
    fn detach(&mut self)
    {
        if self.follow_tail
        {
            self.follow_tail = false;
            self.scroll = self
                .row_owners
                .len()
                .saturating_sub(usize::from(self.area.height));
        }
    }
}

impl Default for ChatView
{
    fn default() -> Self
    {
        Self::new()
    }
}
