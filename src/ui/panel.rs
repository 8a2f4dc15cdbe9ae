//! Edit panel controller.
//!
//! The panel has two modes: editing a message and editing the contact
//! settings. The controller never touches widgets directly; it reads and
//! writes the form through [`PanelView`], so any implementation (the
//! terminal form, or a fake in tests) can stand behind it.
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;

use crate::conversation::{ContactConfig, Message, MessageKind, MessageStore};

/// Leading digits of a notification count, optionally signed.
static COUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?)(\d+)").expect("Invalid notification count regex")
});

/// Text inputs of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field
{
    /// Message body
    MessageText,
    /// Message time
    MessageTime,
    /// Sender, either "sent" or "received"
    Sender,
    /// Contact display name
    ContactName,
    /// Notification badge count
    NotificationCount,
}

/// Checkboxes of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle
{
    /// Heart reaction on the message
    HeartReaction,
    /// Insert a date separator before the message
    ShowDate,
}

/// Parts of the panel that can be shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element
{
    /// The panel itself
    Panel,
    /// Message fields and toggles
    MessageSection,
    /// Contact settings fields
    SettingsSection,
    /// The delete button
    DeleteButton,
    /// The button switching to settings mode
    SettingsButton,
}

/// Text labels of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label
{
    /// Panel title
    Title,
    /// Caption of the save button
    SaveButton,
}

/// Capabilities the controller needs from a form.
pub trait PanelView
{
    /// Writes a text field.
    fn set_field(&mut self, field: Field, value: &str);

    /// Reads a text field.
    fn field(&self, field: Field) -> String;

    /// Sets a checkbox.
    fn set_checked(&mut self, toggle: Toggle, checked: bool);

    /// Reads a checkbox.
    fn is_checked(&self, toggle: Toggle) -> bool;

    /// Shows or hides an element.
    fn set_visible(&mut self, element: Element, visible: bool);

    /// Whether an element is shown.
    fn is_visible(&self, element: Element) -> bool;

    /// Writes a label.
    fn set_label(&mut self, label: Label, text: &str);

    /// Flips a checkbox.
    fn toggle(&mut self, toggle: Toggle)
    {
        let checked = self.is_checked(toggle);
        self.set_checked(toggle, !checked);
    }
}

/// Which field group the panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelMode
{
    /// Adding or editing a message
    #[default]
    Message,
    /// Editing the contact settings
    Settings,
}

/// Result of pressing save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome
{
    /// Message text was blank; nothing changed and the panel stays open
    Ignored,
    /// A message was appended
    Created,
    /// The message at the edit index was replaced
    Updated,
    /// Contact settings were stored
    SettingsSaved,
}

impl SaveOutcome
{
    /// Whether the save touched the message store.
    #[must_use]
    pub const fn changed_messages(self) -> bool
    {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// State machine behind the edit panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditPanel
{
    /// Current mode
    mode: PanelMode,
    /// Record being edited; `None` means a new message
    edit_index: Option<usize>,
}

impl EditPanel
{
    /// Creates a closed panel in message mode.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> PanelMode
    {
        self.mode
    }

    /// Record targeted by the panel, `None` for a new message.
    #[must_use]
    pub const fn edit_index(&self) -> Option<usize>
    {
        self.edit_index
    }

    /// Opens the panel for a new message.
    ///
    /// # Arguments
    ///
    /// * `view` - Form to fill
    /// * `now` - Time shown in the time field, such as "3:00 PM"
    pub fn open_compose(&mut self, view: &mut impl PanelView, now: &str)
    {
        self.edit_index = None;
        self.show_message_mode(view);

        view.set_field(Field::MessageText, "");
        view.set_field(Field::MessageTime, now);
        view.set_field(Field::Sender, MessageKind::Sent.as_str());
        view.set_checked(Toggle::HeartReaction, false);
        view.set_checked(Toggle::ShowDate, false);
        view.set_visible(Element::DeleteButton, false);
        view.set_visible(Element::Panel, true);

        debug!("Compose panel opened");
    }

    /// Opens the panel on an existing record.
    ///
    /// Date separators cannot be edited; the call does nothing for them.
    ///
    /// # Returns
    ///
    /// Whether the panel was opened.
    pub fn open_edit(
        &mut self,
        view: &mut impl PanelView,
        store: &MessageStore,
        index: usize,
    ) -> bool
    {
        let Some(message) = store.get(index)
        else
        {
            warn!("No message at index {index} to edit");
            return false;
        };

        if message.is_date()
        {
            return false;
        }

        self.edit_index = Some(index);
        self.show_message_mode(view);

        view.set_field(Field::MessageText, &message.text);
        view.set_field(Field::MessageTime, message.time());
        view.set_field(Field::Sender, message.kind.as_str());
        view.set_checked(Toggle::HeartReaction, message.has_heart);
        view.set_checked(Toggle::ShowDate, false);
        view.set_visible(Element::DeleteButton, true);
        view.set_visible(Element::Panel, true);

        debug!("Editing message {index}");
        true
    }

    /// Switches the form to the message fields.
    pub fn show_message_mode(&mut self, view: &mut impl PanelView)
    {
        self.mode = PanelMode::Message;

        let title = if self.edit_index.is_some()
        {
            "Edit Message"
        }
        else
        {
            "Add Message"
        };

        view.set_label(Label::Title, title);
        view.set_visible(Element::SettingsSection, false);
        view.set_visible(Element::MessageSection, true);
        view.set_visible(Element::SettingsButton, true);
        view.set_label(Label::SaveButton, "Save");
    }

    /// Switches the form to the contact settings, pre-filled from `config`.
    pub fn show_settings_mode(&mut self, view: &mut impl PanelView, config: &ContactConfig)
    {
        self.mode = PanelMode::Settings;

        view.set_label(Label::Title, "Settings");
        view.set_field(Field::ContactName, config.contact_name());
        view.set_field(
            Field::NotificationCount,
            &config.notification_count.to_string(),
        );
        view.set_visible(Element::SettingsSection, true);
        view.set_visible(Element::MessageSection, false);
        view.set_visible(Element::SettingsButton, false);
        view.set_visible(Element::DeleteButton, false);
        view.set_label(Label::SaveButton, "Save Settings");
    }

    /// Applies the form.
    ///
    /// In message mode the trimmed text must not be empty. The message
    /// replaces the record at the edit index or is appended; with the date
    /// toggle set a date separator labelled with the time goes right before
    /// it. In settings mode the contact config is updated.
    ///
    /// Every outcome except [`SaveOutcome::Ignored`] closes the panel.
    pub fn save(
        &mut self,
        view: &mut impl PanelView,
        store: &mut MessageStore,
        config: &mut ContactConfig,
    ) -> SaveOutcome
    {
        let outcome = match self.mode
        {
            PanelMode::Settings =>
            {
                Self::save_settings(&*view, config);
                SaveOutcome::SettingsSaved
            }
            PanelMode::Message => self.save_message(&*view, store),
        };

        if outcome != SaveOutcome::Ignored
        {
            self.close(view);
        }

        outcome
    }

    /// Removes the record being edited and closes the panel.
    ///
    /// Does nothing when the panel is composing a new message.
    ///
    /// # Returns
    ///
    /// The removed record.
    pub fn delete(
        &mut self,
        view: &mut impl PanelView,
        store: &mut MessageStore,
    ) -> Option<Message>
    {
        let index = self.edit_index?;
        let removed = store.remove(index);

        if removed.is_some()
        {
            info!("Deleted message {index}");
        }

        self.close(view);
        removed
    }

    /// Hides the panel. Unsaved input is discarded with the next open.
    pub fn close(&mut self, view: &mut impl PanelView)
    {
        view.set_visible(Element::Panel, false);
    }

    /// Stores the contact settings from the form.
    fn save_settings(view: &impl PanelView, config: &mut ContactConfig)
    {
        config.set_contact_name(&view.field(Field::ContactName));
        config.notification_count = parse_count(&view.field(Field::NotificationCount));

        info!(
            "Contact set to {:?} with {} notifications",
            config.contact_name(),
            config.notification_count
        );
    }

    /// Stores the message from the form.
    fn save_message(&self, view: &impl PanelView, store: &mut MessageStore) -> SaveOutcome
    {
        let text = view.field(Field::MessageText).trim().to_owned();
        if text.is_empty()
        {
            return SaveOutcome::Ignored;
        }

        let time = view.field(Field::MessageTime).trim().to_owned();
        let sender = view.field(Field::Sender);
        let kind = match sender.parse::<MessageKind>()
        {
            Ok(kind @ (MessageKind::Sent | MessageKind::Received)) => kind,
            _ =>
            {
                warn!("Unexpected sender {sender:?}, using sent");
                MessageKind::Sent
            }
        };

        let message = Message::bubble(kind, text, time.clone())
            .with_heart(view.is_checked(Toggle::HeartReaction));
        let date = view
            .is_checked(Toggle::ShowDate)
            .then(|| Message::date(time));

        let target = self
            .edit_index
            .filter(|&index| index < store.len());

        if self.edit_index.is_some() && target.is_none()
        {
            warn!("Edit index {:?} is gone, appending instead", self.edit_index);
        }

        match (target, date)
        {
            (Some(index), Some(date)) =>
            {
                store.replace_with_date(index, date, message);
                SaveOutcome::Updated
            }
            (Some(index), None) =>
            {
                store.replace(index, message);
                SaveOutcome::Updated
            }
            (None, Some(date)) =>
            {
                store.push(date);
                store.push(message);
                SaveOutcome::Created
            }
            (None, None) =>
            {
                store.push(message);
                SaveOutcome::Created
            }
        }
    }
}

/// Parses a notification count the lenient way.
///
/// Leading digits are read and the rest is ignored. Anything without
/// leading digits, negative, or too large becomes 0.
#[must_use]
pub fn parse_count(input: &str) -> u32
{
    COUNT_REGEX
        .captures(input.trim())
        .filter(|caps| &caps[1] != "-")
        .and_then(|caps| caps[2].parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests
{
    use std::collections::{HashMap, HashSet};

    use super::*;

    /// Bare in-memory form.
    #[derive(Default)]
    struct FakeView
    {
        fields: HashMap<Field, String>,
        checked: HashSet<Toggle>,
        visible: HashSet<Element>,
        labels: HashMap<Label, String>,
    }

    impl PanelView for FakeView
    {
        fn set_field(&mut self, field: Field, value: &str)
        {
            self.fields.insert(field, value.to_owned());
        }

        fn field(&self, field: Field) -> String
        {
            self.fields.get(&field).cloned().unwrap_or_default()
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

    impl FakeView
    {
        fn label(&self, label: Label) -> &str
        {
            self.labels.get(&label).map_or("", String::as_str)
        }
    }

    fn fixtures() -> (EditPanel, FakeView, MessageStore, ContactConfig)
    {
        (
            EditPanel::new(),
            FakeView::default(),
            MessageStore::sample(),
            ContactConfig::default(),
        )
    }

    #[test]
    fn compose_resets_the_form()
    {
        let (mut panel, mut view, _, _) = fixtures();
        view.set_field(Field::MessageText, "left over");
        view.set_checked(Toggle::ShowDate, true);

        panel.open_compose(&mut view, "4:05 PM");

        assert_eq!(panel.edit_index(), None);
        assert_eq!(view.field(Field::MessageText), "");
        assert_eq!(view.field(Field::MessageTime), "4:05 PM");
        assert_eq!(view.field(Field::Sender), "sent");
        assert!(!view.is_checked(Toggle::ShowDate));
        assert!(!view.is_visible(Element::DeleteButton));
        assert!(view.is_visible(Element::Panel));
        assert_eq!(view.label(Label::Title), "Add Message");
    }

    #[test]
    fn blank_text_keeps_panel_open()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        panel.open_compose(&mut view, "4:05 PM");
        view.set_field(Field::MessageText, "   ");

        assert_eq!(panel.save(&mut view, &mut store, &mut config), SaveOutcome::Ignored);
        assert_eq!(store, MessageStore::sample());
        assert!(view.is_visible(Element::Panel));
    }

    #[test]
    fn compose_with_date_appends_two_records()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        panel.open_compose(&mut view, "1:00 PM");
        view.set_field(Field::MessageText, " Hi ");
        view.set_field(Field::MessageTime, "3:00 PM");
        view.toggle(Toggle::ShowDate);

        assert_eq!(panel.save(&mut view, &mut store, &mut config), SaveOutcome::Created);
        assert_eq!(store.len(), 6);
        assert_eq!(store.get(4), Some(&Message::date("3:00 PM")));
        assert_eq!(store.get(5), Some(&Message::sent("Hi", "3:00 PM")));
        assert!(!view.is_visible(Element::Panel));
    }

    #[test]
    fn unchanged_edit_is_idempotent()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        let before = store.get(2).cloned();

        assert!(panel.open_edit(&mut view, &store, 2));
        assert_eq!(view.label(Label::Title), "Edit Message");
        assert!(view.is_visible(Element::DeleteButton));

        assert_eq!(panel.save(&mut view, &mut store, &mut config), SaveOutcome::Updated);
        assert_eq!(store.get(2).cloned(), before);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn edit_with_date_splices_two_records()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        panel.open_edit(&mut view, &store, 1);
        view.set_checked(Toggle::ShowDate, true);
        view.set_checked(Toggle::HeartReaction, true);

        panel.save(&mut view, &mut store, &mut config);

        assert_eq!(store.len(), 5);
        assert_eq!(store.get(1), Some(&Message::date("2:31 PM")));
        assert_eq!(
            store.get(2),
            Some(&Message::sent("Pretty good, thanks for asking!", "2:31 PM").with_heart(true))
        );
    }

    #[test]
    fn date_separator_cannot_be_edited()
    {
        let (mut panel, mut view, _, _) = fixtures();
        let store = MessageStore::new(vec![Message::date("Today")]);

        assert!(!panel.open_edit(&mut view, &store, 0));
        assert!(!panel.open_edit(&mut view, &store, 5));
        assert!(!view.is_visible(Element::Panel));
    }

    #[test]
    fn delete_removes_only_the_edited_record()
    {
        let (mut panel, mut view, mut store, _) = fixtures();
        panel.open_edit(&mut view, &store, 2);

        let removed = panel.delete(&mut view, &mut store);

        assert_eq!(removed.map(|message| message.text), Some("What are you up to today?".to_owned()));
        assert_eq!(store.len(), 3);
        assert!(!view.is_visible(Element::Panel));
    }

    #[test]
    fn delete_without_edit_index_is_noop()
    {
        let (mut panel, mut view, mut store, _) = fixtures();
        panel.open_compose(&mut view, "1:00 PM");

        assert!(panel.delete(&mut view, &mut store).is_none());
        assert_eq!(store, MessageStore::sample());
    }

    #[test]
    fn settings_mode_swaps_sections_and_saves()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        panel.open_compose(&mut view, "1:00 PM");
        panel.show_settings_mode(&mut view, &config);

        assert_eq!(panel.mode(), PanelMode::Settings);
        assert!(view.is_visible(Element::SettingsSection));
        assert!(!view.is_visible(Element::MessageSection));
        assert!(!view.is_visible(Element::SettingsButton));
        assert_eq!(view.label(Label::SaveButton), "Save Settings");
        assert_eq!(view.field(Field::ContactName), "Contact");
        assert_eq!(view.field(Field::NotificationCount), "0");

        view.set_field(Field::ContactName, "   ");
        view.set_field(Field::NotificationCount, "lots");

        assert_eq!(panel.save(&mut view, &mut store, &mut config), SaveOutcome::SettingsSaved);
        assert_eq!(config, ContactConfig::default());
        assert_eq!(store, MessageStore::sample());

        panel.show_settings_mode(&mut view, &config);
        view.set_field(Field::ContactName, " Sam ");
        view.set_field(Field::NotificationCount, "12 new");
        panel.save(&mut view, &mut store, &mut config);

        assert_eq!(config.contact_name(), "Sam");
        assert_eq!(config.notification_count, 12);
    }

    #[test]
    fn unknown_sender_falls_back_to_sent()
    {
        let (mut panel, mut view, mut store, mut config) = fixtures();
        panel.open_compose(&mut view, "1:00 PM");
        view.set_field(Field::MessageText, "hello");
        view.set_field(Field::Sender, "date");

        panel.save(&mut view, &mut store, &mut config);

        assert_eq!(store.get(4).map(|message| message.kind), Some(MessageKind::Sent));
    }

    #[test]
    fn count_parsing_is_lenient()
    {
        assert_eq!(parse_count("7"), 7);
        assert_eq!(parse_count(" 42abc"), 42);
        assert_eq!(parse_count("+3"), 3);
        assert_eq!(parse_count("-3"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("x1"), 0);
        assert_eq!(parse_count("99999999999"), 0);
    }
}
