//! Application module for the mock chat.
//!
//! This module owns the whole application state: the conversation, the
//! contact settings, the edit panel and the gesture recognizers. Every
//! input ends up in one of its methods, and every mutation of the
//! conversation rebuilds the chat view.
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use log::{debug, error, info};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::chat_view::ChatView;
use super::form::{Control, FormView};
use super::gesture::{CellMetrics, GestureConfig, GestureHandler, GestureIntent, PressTarget};
use super::panel::{EditPanel, Element, PanelView as _, SaveOutcome};
use crate::conversation::{ContactConfig, MessageStore};
use crate::export::Exporter;

const BADGE_STYLE: Style = Style::new()
    .fg(Color::White)
    .bg(Color::Red)
    .add_modifier(Modifier::BOLD);

const CONTACT_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

const HINT_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Application mode that determines the current UI state.
///
/// Controls what is displayed and how user input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode
{
    /// The conversation has the input
    Chat,
    /// The edit panel is open
    Panel,
    /// Help overlay is displayed
    Help,
}

/// Main application state for the mock chat.
pub struct App
{
    /// The conversation
    store: MessageStore,
    /// Contact settings shown in the header
    config: ContactConfig,
    /// Edit panel state machine
    panel: EditPanel,
    /// Values and layout of the edit panel
    form: FormView,
    /// Conversation layout and scroll state
    chat: ChatView,
    /// Pointer gesture recognizers
    gestures: GestureHandler,
    /// Size of a terminal cell in gesture units
    metrics: CellMetrics,
    /// Writes the export file
    exporter: Exporter,
    /// Message shown in the footer
    pub status: Option<String>,
    /// Flag indicating if the application should exit
    pub should_quit: bool,
    /// Flag indicating if the help overlay is shown
    show_help: bool,
    /// Set while a horizontal swipe holds the page still
    scroll_locked: bool,
}

impl App
{
    /// Creates a new App instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The initial conversation
    /// * `config` - The initial contact settings
    /// * `exporter` - Where exports are written
    /// * `gestures` - Gesture thresholds and durations
    /// * `metrics` - Size of a terminal cell in gesture units
    #[must_use]
    pub fn new(
        store: MessageStore,
        config: ContactConfig,
        exporter: Exporter,
        gestures: GestureConfig,
        metrics: CellMetrics,
    ) -> Self
    {
        Self {
            store,
            config,
            panel: EditPanel::new(),
            form: FormView::new(),
            chat: ChatView::new(),
            gestures: GestureHandler::new(gestures),
            metrics,
            exporter,
            status: None,
            should_quit: false,
            show_help: false,
            scroll_locked: false,
        }
    }

    /// Current mode, derived from what is on screen.
    #[must_use]
    pub fn mode(&self) -> AppMode
    {
        if self.form.is_visible(Element::Panel)
        {
            AppMode::Panel
        }
        else if self.show_help
        {
            AppMode::Help
        }
        else
        {
            AppMode::Chat
        }
    }

    /// The conversation.
    #[must_use]
    pub const fn store(&self) -> &MessageStore
    {
        &self.store
    }

    /// The contact settings.
    #[must_use]
    pub const fn config(&self) -> &ContactConfig
    {
        &self.config
    }

    /// The edit panel state machine.
    #[must_use]
    pub const fn panel(&self) -> &EditPanel
    {
        &self.panel
    }

    /// The edit form.
    #[must_use]
    pub const fn form(&self) -> &FormView
    {
        &self.form
    }

    /// The edit form, for keyboard input.
    pub const fn form_mut(&mut self) -> &mut FormView
    {
        &mut self.form
    }

    /// The chat view.
    #[must_use]
    pub const fn chat(&self) -> &ChatView
    {
        &self.chat
    }

    /// Renders the application UI to the provided frame.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render the UI to
    pub fn render(&mut self, frame: &mut Frame)
    {
        let size = frame.area();

        // Header, conversation, status line from top to bottom
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // contact header
                Constraint::Min(1),    // conversation
                Constraint::Length(1), // status line
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        self.chat
            .render(frame, chunks[1], &self.store);
        self.render_footer(frame, chunks[2]);

        // Overlays go on top of everything else
        match self.mode()
        {
            AppMode::Panel => self.form.render(frame, size),
            AppMode::Help => Self::render_help(frame),
            AppMode::Chat =>
            {}
        }
    }

    /// Renders the contact name and notification badge.
    fn render_header(&self, frame: &mut Frame, area: Rect)
    {
        let mut back = vec![Span::raw("‹ ")];
        // No badge for a zero count
        if self.config.shows_badge()
        {
            back.push(Span::styled(
                format!(" {} ", self.config.notification_count),
                BADGE_STYLE,
            ));
        }

        let text = Text::from(vec![
            Line::from(back),
            Line::styled(self.config.contact_name().to_owned(), CONTACT_STYLE)
                .alignment(Alignment::Center),
        ]);

        frame.render_widget(Paragraph::new(text), area);
    }

    /// Renders the status line or the key hints.
    fn render_footer(&self, frame: &mut Frame, area: Rect)
    {
        let line = match (&self.status, self.mode())
        {
            (Some(status), _) => Line::from(status.clone()),
            (None, AppMode::Panel) => Line::styled(
                "Tab: next field  Space: toggle  Enter: save  Esc: close",
                HINT_STYLE,
            ),
            (None, _) => Line::styled(
                "Triple-click: new  Hold: edit  Swipe: time  Ctrl+E: export  ?: help",
                HINT_STYLE,
            ),
        };

        frame.render_widget(Paragraph::new(line), area);
    }

    /// Renders the help overlay with keyboard and mouse shortcuts.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render the help overlay to
    fn render_help(frame: &mut Frame)
    {
        let area = centered_rect(60, 70, frame.area());

        // Clear the area first to make it fully opaque
        frame.render_widget(Clear, area);

        let text = Text::from(vec![
            Line::from("Mock Chat Help:"),
            Line::from(""),
            Line::from("Triple-click: Add a message"),
            Line::from("Hold on a bubble: Edit it"),
            Line::from("Drag a bubble sideways: Show its time"),
            Line::from("a: Add a message"),
            Line::from("e: Edit the newest message"),
            Line::from("Ctrl+E or x: Export to JSON"),
            Line::from("j/k or ↓/↑: Scroll down/up"),
            Line::from("g/G: Go to start/end of conversation"),
            Line::from("q: Quit"),
            Line::from("?: Toggle help"),
        ]);

        let help_box = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .style(Style::default()),
            )
            .style(Style::default())
            .wrap(Wrap { trim: true });

        frame.render_widget(help_box, area);
    }

    /// Toggles the help overlay.
    pub const fn toggle_help(&mut self)
    {
        self.show_help = !self.show_help;
    }

    /// Opens the panel for a new message.
    pub fn compose(&mut self)
    {
        self.status = None;
        self.panel
            .open_compose(&mut self.form, &current_time());
    }

    /// Opens the panel on the n-th bubble on screen.
    ///
    /// # Returns
    ///
    /// Whether the panel was opened.
    pub fn edit_bubble(&mut self, bubble: usize) -> bool
    {
        let Some(index) = self.store.bubble_index(bubble)
        else
        {
            return false;
        };

        self.status = None;
        self.panel
            .open_edit(&mut self.form, &self.store, index)
    }

    /// Opens the panel on the newest message.
    pub fn edit_newest(&mut self) -> bool
    {
        let Some(index) = self.store.last_bubble_index()
        else
        {
            return false;
        };

        self.status = None;
        self.panel
            .open_edit(&mut self.form, &self.store, index)
    }

    /// Switches the open panel to the contact settings.
    pub fn show_settings(&mut self)
    {
        self.panel
            .show_settings_mode(&mut self.form, &self.config);
    }

    /// Saves the panel.
    pub fn submit(&mut self) -> SaveOutcome
    {
        let outcome = self
            .panel
            .save(&mut self.form, &mut self.store, &mut self.config);

        if outcome.changed_messages()
        {
            self.messages_changed();
        }

        debug!("Save: {outcome:?}");
        outcome
    }

    /// Deletes the message open in the panel.
    pub fn delete_current(&mut self)
    {
        if self
            .panel
            .delete(&mut self.form, &mut self.store)
            .is_some()
        {
            self.messages_changed();
        }
    }

    /// Presses the focused control of the panel.
    ///
    /// Buttons do what they say; everywhere else Enter submits the form.
    pub fn activate_focused(&mut self)
    {
        match self.form.focused()
        {
            Some(Control::Delete) => self.delete_current(),
            Some(Control::Settings) => self.show_settings(),
            _ =>
            {
                self.submit();
            }
        }
    }

    /// Closes the panel, dropping unsaved input.
    pub fn close_panel(&mut self)
    {
        self.panel.close(&mut self.form);
    }

    /// Exports the conversation.
    ///
    /// The outcome goes to the status line; errors do not stop the
    /// application.
    ///
    /// # Returns
    ///
    /// The path of the written file.
    pub fn export(&mut self) -> Option<PathBuf>
    {
        match self.exporter.export(&self.store)
        {
            Ok(path) =>
            {
                self.status = Some(format!("Exported to {}", path.display()));
                Some(path)
            }
            Err(err) =>
            {
                error!("Export failed: {err:#}");
                self.status = Some(format!("Export failed: {err}"));
                None
            }
        }
    }

    /// Scrolls the conversation up.
    pub fn scroll_up(&mut self, amount: usize)
    {
        if !self.scroll_locked
        {
            self.chat.scroll_up(amount);
        }
    }

    /// Scrolls the conversation down.
    pub fn scroll_down(&mut self, amount: usize)
    {
        if !self.scroll_locked
        {
            self.chat.scroll_down(amount);
        }
    }

    /// Jumps to the first entry.
    pub fn scroll_to_top(&mut self)
    {
        self.chat.scroll_to_top();
    }

    /// Jumps back to the newest entry.
    pub const fn scroll_to_bottom(&mut self)
    {
        self.chat.scroll_to_bottom();
    }

    /// Keeps the newest entry in view after the terminal changed size.
    pub const fn on_resize(&mut self)
    {
        self.chat.scroll_to_bottom();
    }

    /// Feeds a mouse event to the gesture recognizers.
    ///
    /// The left button plays the part of a finger. Mouse input is ignored
    /// while the panel or help is open.
    ///
    /// # Arguments
    ///
    /// * `now` - When the event happened
    /// * `mouse` - The event
    pub fn handle_mouse(&mut self, now: Instant, mouse: MouseEvent)
    {
        // The panel and help only take keys
        if self.mode() != AppMode::Chat
        {
            return;
        }

        let point = self
            .metrics
            .to_point(mouse.column, mouse.row);

        match mouse.kind
        {
            MouseEventKind::Down(MouseButton::Left) =>
            {
                // swipes start anywhere on a bubble's rows, holds only on the bubble
                let target = PressTarget {
                    row: self.chat.bubble_at(mouse.column, mouse.row),
                    body: self
                        .chat
                        .bubble_body_at(mouse.column, mouse.row),
                };
                self.gestures
                    .touch_start(now, point, target);
            }
            MouseEventKind::Drag(MouseButton::Left) =>
            {
                let outcome = self.gestures.touch_move(point);
                // A sideways swipe holds the page still
                self.scroll_locked = outcome.suppress_scroll;

                if let Some(bubble) = outcome.reveal &&
                    let Some(message) = self
                        .store
                        .bubble_index(bubble)
                        .and_then(|index| self.store.get(index))
                {
                    self.chat.reveal(bubble, message.kind);
                }
            }
            MouseEventKind::Up(MouseButton::Left) =>
            {
                self.scroll_locked = false;
                // The release may complete a triple tap
                if let Some(intent) = self.gestures.touch_end(now)
                {
                    self.apply(intent);
                }
            }
            // Wheel scrolls one row at a time
            MouseEventKind::ScrollUp => self.scroll_up(1),
            MouseEventKind::ScrollDown => self.scroll_down(1),
            _ =>
            {}
        }
    }

    /// Advances the gesture timers.
    pub fn tick(&mut self, now: Instant)
    {
        for intent in self.gestures.tick(now)
        {
            self.apply(intent);
        }
    }

    /// Carries out a recognized gesture.
    fn apply(&mut self, intent: GestureIntent)
    {
        match intent
        {
            // Timers may fire after the panel was opened another way
            GestureIntent::Compose =>
            {
                if self.mode() == AppMode::Chat
                {
                    self.compose();
                }
            }
            GestureIntent::Edit { bubble } =>
            {
                if self.mode() == AppMode::Chat
                {
                    self.edit_bubble(bubble);
                }
            }
            GestureIntent::HideTimestamp { bubble } => self.chat.hide(bubble),
        }
    }

    /// Rebuilds the chat view after the conversation changed.
    fn messages_changed(&mut self)
    {
        info!("Conversation now has {} records", self.store.len());
        self.chat.rebuild();
    }
}

/// Current local time the way the time field shows it, such as "3:05 PM".
fn current_time() -> String
{
    Local::now().format("%-I:%M %p").to_string()
}

/// Creates a centered rectangle inside the given area.
///
/// # Arguments
///
/// * `percent_x` - Width of the rectangle as a percentage of the parent area
/// * `percent_y` - Height of the rectangle as a percentage of the parent area
/// * `area` - Parent rectangle
///
/// # Returns
///
/// A new rectangle positioned in the center of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect
{
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn app() -> App
    {
        App::new(
            MessageStore::sample(),
            ContactConfig::default(),
            Exporter::new(std::env::temp_dir()),
            GestureConfig::default(),
            CellMetrics::default(),
        )
    }

    #[test]
    fn current_time_looks_like_a_clock()
    {
        let time = current_time();
        assert!(time.ends_with("AM") || time.ends_with("PM"));
        assert!(time.contains(':'));
    }

    #[test]
    fn compose_opens_panel_in_add_mode()
    {
        let mut app = app();
        app.compose();

        assert_eq!(app.mode(), AppMode::Panel);
        assert_eq!(app.panel().edit_index(), None);

        app.close_panel();
        assert_eq!(app.mode(), AppMode::Chat);
    }

    #[test]
    fn edit_newest_targets_last_bubble()
    {
        let mut app = app();

        assert!(app.edit_newest());
        assert_eq!(app.panel().edit_index(), Some(3));
    }

    #[test]
    fn enter_on_delete_button_removes_message()
    {
        let mut app = app();
        app.edit_bubble(2);

        while app.form().focused() != Some(Control::Delete)
        {
            app.form_mut().focus_next();
        }
        app.activate_focused();

        assert_eq!(app.store().len(), 3);
        assert_eq!(app.mode(), AppMode::Chat);
    }

    #[test]
    fn panel_takes_precedence_over_help()
    {
        let mut app = app();
        app.toggle_help();
        assert_eq!(app.mode(), AppMode::Help);

        app.compose();
        assert_eq!(app.mode(), AppMode::Panel);
    }
}
