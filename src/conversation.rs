//! Conversation model for the mock chat.
//!
//! Holds the ordered list of message and date-separator records together with
//! the contact settings shown in the header. Both live only in memory.
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

/// Contact name used whenever the configured one is blank.
pub const DEFAULT_CONTACT_NAME: &str = "Contact";

/// Kind of a record in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind
{
    /// Outgoing bubble, drawn on the right
    Sent,
    /// Incoming bubble, drawn on the left
    Received,
    /// Date separator between bubbles
    Date,
}

impl MessageKind
{
    /// Name used in the export document and the sender field.
    #[must_use]
    pub const fn as_str(self) -> &'static str
    {
        match self
        {
            Self::Sent => "sent",
            Self::Received => "received",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for MessageKind
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for MessageKind
{
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self>
    {
        match value
        {
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            "date" => Ok(Self::Date),
            other => bail!("Unknown message kind: {other:?}"),
        }
    }
}

/// A single record of the conversation.
///
/// Date separators only carry `text`; `time` and `has_heart` are left out of
/// the export document for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message
{
    /// Body text, or the label of a date separator
    pub text: String,
    /// Display time such as "2:30 PM"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Record kind
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Heart reaction on the bubble
    #[serde(
        rename = "hasHeart",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub has_heart: bool,
}

impl Message
{
    /// Creates an outgoing message.
    #[must_use]
    pub fn sent(text: impl Into<String>, time: impl Into<String>) -> Self
    {
        Self::bubble(MessageKind::Sent, text, time)
    }

    /// Creates an incoming message.
    #[must_use]
    pub fn received(text: impl Into<String>, time: impl Into<String>) -> Self
    {
        Self::bubble(MessageKind::Received, text, time)
    }

    /// Creates a bubble of the given kind.
    ///
    /// # Arguments
    ///
    /// * `kind` - Either `Sent` or `Received`
    /// * `text` - Body text
    /// * `time` - Display time
    #[must_use]
    pub fn bubble(
        kind: MessageKind,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Self
    {
        Self {
            text: text.into(),
            time: Some(time.into()),
            kind,
            has_heart: false,
        }
    }

    /// Creates a date separator labelled with `text`.
    #[must_use]
    pub fn date(text: impl Into<String>) -> Self
    {
        Self {
            text: text.into(),
            time: None,
            kind: MessageKind::Date,
            has_heart: false,
        }
    }

    /// Sets the heart reaction.
    #[must_use]
    pub const fn with_heart(mut self, has_heart: bool) -> Self
    {
        self.has_heart = has_heart;
        self
    }

    /// Whether this record is a date separator.
    #[must_use]
    pub fn is_date(&self) -> bool
    {
        self.kind == MessageKind::Date
    }

    /// Display time, empty for date separators.
    #[must_use]
    pub fn time(&self) -> &str
    {
        self.time.as_deref().unwrap_or_default()
    }
}

/// Ordered list of conversation records.
///
/// Order is display order. Bubbles are addressed either by their position in
/// the store or by their ordinal among non-date records (what the screen
/// shows as the n-th bubble).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStore
{
    /// Records in display order
    messages: Vec<Message>,
}

impl MessageStore
{
    /// Creates a store from existing records.
    #[must_use]
    pub const fn new(messages: Vec<Message>) -> Self
    {
        Self { messages }
    }

    /// The conversation every session starts with.
    #[must_use]
    pub fn sample() -> Self
    {
        Self::new(vec![
            Message::received("Hey! How's it going?", "2:30 PM"),
            Message::sent("Pretty good, thanks for asking!", "2:31 PM"),
            Message::received("What are you up to today?", "2:32 PM"),
            Message::sent("Just working on some projects. You?", "2:33 PM"),
        ])
    }

    /// Number of records, date separators included.
    #[must_use]
    pub const fn len(&self) -> usize
    {
        self.messages.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool
    {
        self.messages.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message>
    {
        self.messages.get(index)
    }

    /// All records in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[Message]
    {
        &self.messages
    }

    /// Iterates over the records in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message>
    {
        self.messages.iter()
    }

    /// Appends a record.
    pub fn push(&mut self, message: Message)
    {
        self.messages.push(message);
    }

    /// Replaces the record at `index`.
    ///
    /// # Returns
    ///
    /// The previous record, or `None` when `index` is out of range (the store
    /// is left untouched then).
    pub fn replace(&mut self, index: usize, message: Message) -> Option<Message>
    {
        let slot = self.messages.get_mut(index)?;
        Some(std::mem::replace(slot, message))
    }

    /// Replaces the record at `index` with a date separator followed by
    /// `message`.
    ///
    /// # Returns
    ///
    /// The previous record, or `None` when `index` is out of range.
    pub fn replace_with_date(
        &mut self,
        index: usize,
        date: Message,
        message: Message,
    ) -> Option<Message>
    {
        if index >= self.messages.len()
        {
            return None;
        }

        self.messages
            .splice(index..=index, [date, message])
            .next()
    }

    /// Removes the record at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Message>
    {
        if index >= self.messages.len()
        {
            return None;
        }

        Some(self.messages.remove(index))
    }

    /// Number of bubbles, date separators excluded.
    #[must_use]
    pub fn bubble_count(&self) -> usize
    {
        self.messages
            .iter()
            .filter(|message| !message.is_date())
            .count()
    }

    /// Maps the n-th bubble on screen back to its position in the store.
    ///
    /// # Arguments
    ///
    /// * `bubble` - Ordinal of the bubble among non-date records
    ///
    /// # Returns
    ///
    /// The store index, or `None` if there are fewer bubbles.
    #[must_use]
    pub fn bubble_index(&self, bubble: usize) -> Option<usize>
    {
        let index = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, message)| !message.is_date())
            .nth(bubble)
            .map(|(index, _)| index);

        debug!("Bubble {bubble} maps to store index {index:?}");
        index
    }

    /// Store index of the newest bubble.
    #[must_use]
    pub fn last_bubble_index(&self) -> Option<usize>
    {
        self.messages
            .iter()
            .rposition(|message| !message.is_date())
    }
}

impl<'store> IntoIterator for &'store MessageStore
{
    type Item = &'store Message;
    type IntoIter = std::slice::Iter<'store, Message>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.iter()
    }
}

/// Contact settings shown in the conversation header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactConfig
{
    /// Display name, never blank
    contact_name: String,
    /// Unread badge count, hidden when zero
    pub notification_count: u32,
}

impl ContactConfig
{
    /// Creates contact settings, falling back to the default name when
    /// `contact_name` is blank.
    #[must_use]
    pub fn new(contact_name: &str, notification_count: u32) -> Self
    {
        let mut config = Self::default();
        config.set_contact_name(contact_name);
        config.notification_count = notification_count;
        config
    }

    /// Display name of the contact.
    #[must_use]
    pub fn contact_name(&self) -> &str
    {
        &self.contact_name
    }

    /// Sets the display name. Surrounding whitespace is trimmed and a blank
    /// name becomes [`DEFAULT_CONTACT_NAME`].
    pub fn set_contact_name(&mut self, name: &str)
    {
        let trimmed = name.trim();

        self.contact_name = if trimmed.is_empty()
        {
            DEFAULT_CONTACT_NAME.to_owned()
        }
        else
        {
            trimmed.to_owned()
        };
    }

    /// Whether the notification badge should be drawn.
    #[must_use]
    pub const fn shows_badge(&self) -> bool
    {
        self.notification_count > 0
    }
}

impl Default for ContactConfig
{
    fn default() -> Self
    {
        Self {
            contact_name: DEFAULT_CONTACT_NAME.to_owned(),
            notification_count: 0,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn sample_has_four_bubbles()
    {
        let store = MessageStore::sample();

        assert_eq!(store.len(), 4);
        assert_eq!(store.bubble_count(), 4);
        assert_eq!(store.get(0).map(|message| message.kind), Some(MessageKind::Received));
        assert_eq!(store.get(3).map(Message::time), Some("2:33 PM"));
    }

    #[test]
    fn bubble_index_skips_date_separators()
    {
        let store = MessageStore::new(vec![
            Message::date("Today"),
            Message::received("one", "1:00 PM"),
            Message::date("Later"),
            Message::sent("two", "2:00 PM"),
        ]);

        assert_eq!(store.bubble_index(0), Some(1));
        assert_eq!(store.bubble_index(1), Some(3));
        assert_eq!(store.bubble_index(2), None);
        assert_eq!(store.last_bubble_index(), Some(3));
    }

    #[test]
    fn replace_with_date_splits_one_record_into_two()
    {
        let mut store = MessageStore::sample();
        let previous = store.replace_with_date(
            1,
            Message::date("9:00 AM"),
            Message::sent("edited", "9:00 AM"),
        );

        assert_eq!(previous.map(|message| message.text), Some("Pretty good, thanks for asking!".to_owned()));
        assert_eq!(store.len(), 5);
        assert!(store.get(1).is_some_and(Message::is_date));
        assert_eq!(store.get(2).map(|message| message.text.as_str()), Some("edited"));
        assert_eq!(store.get(3).map(|message| message.text.as_str()), Some("What are you up to today?"));
    }

    #[test]
    fn out_of_range_mutations_leave_store_untouched()
    {
        let mut store = MessageStore::sample();

        assert!(store.replace(9, Message::sent("x", "1:00 PM")).is_none());
        assert!(store.replace_with_date(4, Message::date("d"), Message::sent("x", "t")).is_none());
        assert!(store.remove(4).is_none());
        assert_eq!(store, MessageStore::sample());
    }

    #[test]
    fn date_record_serializes_without_time_or_heart()
    {
        let json = serde_json::to_string(&Message::date("3:00 PM")).unwrap();
        assert_eq!(json, r#"{"text":"3:00 PM","type":"date"}"#);

        let json = serde_json::to_string(&Message::sent("Hi", "3:00 PM").with_heart(true)).unwrap();
        assert_eq!(json, r#"{"text":"Hi","time":"3:00 PM","type":"sent","hasHeart":true}"#);
    }

    #[test]
    fn blank_contact_name_falls_back()
    {
        let mut config = ContactConfig::new("   ", 0);
        assert_eq!(config.contact_name(), DEFAULT_CONTACT_NAME);
        assert!(!config.shows_badge());

        config.set_contact_name("  Alex ");
        config.notification_count = 3;
        assert_eq!(config.contact_name(), "Alex");
        assert!(config.shows_badge());
    }

    #[test]
    fn kind_parses_from_field_values()
    {
        assert_eq!("received".parse::<MessageKind>().unwrap(), MessageKind::Received);
        assert!("other".parse::<MessageKind>().is_err());
    }
}
