//! Terminal edit form.
//!
//! Holds the values behind the edit panel and draws it as a popup. It is the
//! [`PanelView`] the application hands to the panel controller.
use std::collections::{HashMap, HashSet};

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::panel::{Element, Field, Label, PanelView, Toggle};
use crate::conversation::MessageKind;

const FOCUS_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

const LABEL_STYLE: Style = Style::new().fg(Color::Gray);

const BORDER_STYLE: Style = Style::new().fg(Color::LightBlue);

/// Something the user can focus in the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control
{
    /// Text input
    Input(Field),
    /// Checkbox
    Check(Toggle),
    /// Save button
    Save,
    /// Delete button
    Delete,
    /// Button switching to settings
    Settings,
}

/// Controls of the message section, in focus order.
const MESSAGE_CONTROLS: [Control; 5] = [
    Control::Input(Field::MessageText),
    Control::Input(Field::MessageTime),
    Control::Input(Field::Sender),
    Control::Check(Toggle::HeartReaction),
    Control::Check(Toggle::ShowDate),
];

/// Controls of the settings section, in focus order.
const SETTINGS_CONTROLS: [Control; 2] = [
    Control::Input(Field::ContactName),
    Control::Input(Field::NotificationCount),
];

/// In-memory form state.
#[derive(Debug, Default)]
pub struct FormView
{
    /// Text field values
    fields: HashMap<Field, String>,
    /// Checked checkboxes
    checked: HashSet<Toggle>,
    /// Visible elements
    visible: HashSet<Element>,
    /// Label texts
    labels: HashMap<Label, String>,
    /// Position of the focused control among the visible ones
    focus: usize,
}

impl FormView
{
    /// Creates an empty, hidden form.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Controls currently on screen, in focus order.
    #[must_use]
    pub fn controls(&self) -> Vec<Control>
    {
        let mut controls = Vec::new();

        if self.is_visible(Element::MessageSection)
        {
            controls.extend(MESSAGE_CONTROLS);
        }
        if self.is_visible(Element::SettingsSection)
        {
            controls.extend(SETTINGS_CONTROLS);
        }

        controls.push(Control::Save);

        if self.is_visible(Element::DeleteButton)
        {
            controls.push(Control::Delete);
        }
        if self.is_visible(Element::SettingsButton)
        {
            controls.push(Control::Settings);
        }

        controls
    }

    /// The focused control.
    #[must_use]
    pub fn focused(&self) -> Option<Control>
    {
        self.controls().get(self.focus).copied()
    }

    /// Moves focus to the next control, wrapping around.
    pub fn focus_next(&mut self)
    {
        let count = self.controls().len();
        self.focus = (self.focus.saturating_add(1)) % count.max(1);
    }

    /// Moves focus to the previous control, wrapping around.
    pub fn focus_prev(&mut self)
    {
        let count = self.controls().len().max(1);
        self.focus = self.focus.checked_sub(1).unwrap_or(count - 1) % count;
    }

    /// Moves focus to the first control.
    pub const fn focus_first(&mut self)
    {
        self.focus = 0;
    }

    /// Types a character into the focused text input.
    pub fn input_char(&mut self, ch: char)
    {
        if let Some(Control::Input(field)) = self.focused() &&
            field != Field::Sender
        {
            self.fields.entry(field).or_default().push(ch);
        }
    }

    /// Deletes the last character of the focused text input.
    pub fn delete_char(&mut self)
    {
        if let Some(Control::Input(field)) = self.focused() &&
            field != Field::Sender &&
            let Some(value) = self.fields.get_mut(&field)
        {
            value.pop();
        }
    }

    /// Handles the space key on the focused control.
    ///
    /// Flips checkboxes and the sender, types a space into text inputs.
    pub fn press_space(&mut self)
    {
        match self.focused()
        {
            Some(Control::Check(toggle)) => self.toggle(toggle),
            Some(Control::Input(Field::Sender)) => self.flip_sender(),
            Some(Control::Input(_)) => self.input_char(' '),
            _ =>
            {}
        }
    }

    /// Switches the sender between sent and received.
    pub fn flip_sender(&mut self)
    {
        let next = if self.field(Field::Sender) == MessageKind::Received.as_str()
        {
            MessageKind::Sent
        }
        else
        {
            MessageKind::Received
        };

        self.set_field(Field::Sender, next.as_str());
    }

    /// Label text, empty if never set.
    #[must_use]
    pub fn label(&self, label: Label) -> &str
    {
        self.labels
            .get(&label)
            .map_or("", String::as_str)
    }

    /// Draws the form as a popup over `area`.
    ///
    /// # Arguments
    ///
    /// * `frame` - The frame to render to
    /// * `area` - Area the popup is centered in
    pub fn render(&self, frame: &mut Frame, area: Rect)
    {
        let focused = self.focused();
        let mut lines = Vec::new();

        for control in self.controls()
        {
            let is_focused = focused == Some(control);
            match control
            {
                Control::Input(field) =>
                {
                    lines.push(self.input_line(field, is_focused));
                }
                Control::Check(toggle) =>
                {
                    lines.push(self.check_line(toggle, is_focused));
                }
                Control::Save | Control::Delete | Control::Settings =>
                {}
            }
        }

        lines.push(Line::from(""));
        lines.push(self.button_line(focused));

        // top and bottom border
        let height = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let popup = popup_rect(area, height);

        frame.render_widget(Clear, popup);

        let form = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(BORDER_STYLE)
                    .title(self.label(Label::Title).to_owned()),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(form, popup);
    }

    /// One text input row.
    fn input_line(&self, field: Field, is_focused: bool) -> Line<'static>
    {
        let caption = match field
        {
            Field::MessageText => "Message",
            Field::MessageTime => "Time",
            Field::Sender => "Sender",
            Field::ContactName => "Contact name",
            Field::NotificationCount => "Notifications",
        };

        let mut value = self.field(field);
        if is_focused && field != Field::Sender
        {
            value.push('▏');
        }

        Line::from(vec![
            Span::styled(format!("{caption:>13}: "), LABEL_STYLE),
            Span::styled(value, focus_style(is_focused)),
        ])
    }

    /// One checkbox row.
    fn check_line(&self, toggle: Toggle, is_focused: bool) -> Line<'static>
    {
        let caption = match toggle
        {
            Toggle::HeartReaction => "Heart reaction",
            Toggle::ShowDate => "Show date before message",
        };
        let mark = if self.is_checked(toggle) { "[x]" } else { "[ ]" };

        Line::from(vec![
            Span::raw(" ".repeat(15)),
            Span::styled(format!("{mark} {caption}"), focus_style(is_focused)),
        ])
    }

    /// The button row.
    fn button_line(&self, focused: Option<Control>) -> Line<'static>
    {
        let mut spans = vec![Span::raw(" ".repeat(15))];
        let mut button = |control: Control, caption: &str| {
            spans.push(Span::styled(
                format!("[ {caption} ]"),
                focus_style(focused == Some(control)),
            ));
            spans.push(Span::raw(" "));
        };

        button(Control::Save, self.label(Label::SaveButton));

        if self.is_visible(Element::DeleteButton)
        {
            button(Control::Delete, "Delete");
        }
        if self.is_visible(Element::SettingsButton)
        {
            button(Control::Settings, "Settings");
        }

        Line::from(spans)
    }
}

impl PanelView for FormView
{
    fn set_field(&mut self, field: Field, value: &str)
    {
        self.fields.insert(field, value.to_owned());
    }

    fn field(&self, field: Field) -> String
    {
        self.fields
            .get(&field)
            .cloned()
            .unwrap_or_default()
    }

    fn set_checked(&mut self, toggle: Toggle, checked: bool)
    {
        if checked
        {
            self.checked.insert(toggle);
        }
        else
        {
            self.checked.remove(&toggle);
        }
    }

    fn is_checked(&self, toggle: Toggle) -> bool
    {
        self.checked.contains(&toggle)
    }

    fn set_visible(&mut self, element: Element, visible: bool)
    {
        if visible
        {
            self.visible.insert(element);
        }
        else
        {
            self.visible.remove(&element);
        }

        // section changes move the controls around
        self.focus_first();
    }

    fn is_visible(&self, element: Element) -> bool
    {
        self.visible.contains(&element)
    }

    fn set_label(&mut self, label: Label, text: &str)
    {
        self.labels.insert(label, text.to_owned());
    }
}

/// Style of a control depending on focus.
const fn focus_style(is_focused: bool) -> Style
{
    if is_focused { FOCUS_STYLE } else { Style::new() }
}

/// Rectangle of the popup: 60% wide, `height` rows, centered in `area`.
fn popup_rect(area: Rect, height: u16) -> Rect
{
    let width = (area.width.saturating_mul(3) / 5).max(40).min(area.width);
    let height = height.min(area.height);

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn message_form() -> FormView
    {
        let mut form = FormView::new();
        form.set_visible(Element::MessageSection, true);
        form.set_visible(Element::SettingsButton, true);
        form.set_visible(Element::Panel, true);
        form
    }

    #[test]
    fn controls_follow_visible_sections()
    {
        let mut form = message_form();
        assert_eq!(form.controls().len(), 7);
        assert_eq!(form.focused(), Some(Control::Input(Field::MessageText)));

        form.set_visible(Element::MessageSection, false);
        form.set_visible(Element::SettingsSection, true);
        form.set_visible(Element::SettingsButton, false);
        assert_eq!(
            form.controls(),
            vec![
                Control::Input(Field::ContactName),
                Control::Input(Field::NotificationCount),
                Control::Save,
            ]
        );
    }

    #[test]
    fn typing_goes_to_focused_input()
    {
        let mut form = message_form();
        form.input_char('H');
        form.input_char('i');
        form.press_space();
        form.input_char('!');
        form.delete_char();

        assert_eq!(form.field(Field::MessageText), "Hi ");
    }

    #[test]
    fn space_flips_sender_and_checkboxes()
    {
        let mut form = message_form();
        form.set_field(Field::Sender, "sent");

        form.focus_next();
        form.focus_next();
        assert_eq!(form.focused(), Some(Control::Input(Field::Sender)));
        form.input_char('x');
        form.press_space();
        assert_eq!(form.field(Field::Sender), "received");

        form.focus_next();
        form.press_space();
        assert!(form.is_checked(Toggle::HeartReaction));
    }

    #[test]
    fn focus_wraps_both_ways()
    {
        let mut form = message_form();
        form.focus_prev();
        assert_eq!(form.focused(), Some(Control::Settings));

        form.focus_next();
        assert_eq!(form.focused(), Some(Control::Input(Field::MessageText)));
    }
}
