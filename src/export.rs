//! Export module for saving the conversation as JSON.
//!
//! Writes the message store to `imessage-conversation.json` so the mock-up
//! can be reused elsewhere.
use anyhow::{Context, Result};
use directories::UserDirs;
use log::info;
use std::env;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::conversation::{Message, MessageStore};

/// File name of the exported conversation.
pub const EXPORT_FILE_NAME: &str = "imessage-conversation.json";

/// Writes the conversation to disk.
///
/// The export directory is fixed at construction; every export overwrites
/// the previous file.
#[derive(Debug, Clone)]
pub struct Exporter
{
    /// Directory where the export file is written
    export_dir: PathBuf,
}

impl Exporter
{
    /// Creates an `Exporter` writing into `export_dir`.
    #[must_use]
    pub const fn new(export_dir: PathBuf) -> Self
    {
        Self { export_dir }
    }

    /// Creates an `Exporter` writing into the user's download directory.
    ///
    /// Falls back to the current working directory when no download
    /// directory is known.
    ///
    /// # Errors
    ///
    /// Returns an error if neither directory can be determined.
    pub fn with_default_dir() -> Result<Self>
    {
        let download_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf));

        let export_dir = match download_dir
        {
            Some(dir) => dir,
            None => env::current_dir().context("Failed to determine the working directory")?,
        };

        Ok(Self::new(export_dir))
    }

    /// Serializes the conversation and writes it to the export file.
    ///
    /// # Arguments
    ///
    /// * `store` - The conversation to export, date separators included
    ///
    /// # Returns
    ///
    /// The path of the written file.
    ///
    /// # Errors
    ///
    /// Returns an error if the export directory cannot be created or the
    /// file cannot be written.
    pub fn export(&self, store: &MessageStore) -> Result<PathBuf>
    {
        let document = to_document(store)?;

        fs::create_dir_all(&self.export_dir).context(format!(
            "Failed to create export directory {}",
            self.export_dir.display()
        ))?;

        let path = self.export_path();
        let mut file = File::create(&path)
            .context(format!("Failed to create {}", path.display()))?;

        file.write_all(document.as_bytes())
            .context(format!("Failed to write {}", path.display()))?;

        info!("Exported {} records to {}", store.len(), path.display());
        Ok(path)
    }

    /// Full path of the export file.
    #[must_use]
    pub fn export_path(&self) -> PathBuf
    {
        self.export_dir.join(EXPORT_FILE_NAME)
    }

    /// Get the export directory.
    #[must_use]
    pub fn export_dir(&self) -> &Path
    {
        &self.export_dir
    }
}

/// Serializes the store as a JSON array indented by two spaces.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_document(store: &MessageStore) -> Result<String>
{
    serde_json::to_string_pretty(store.as_slice())
        .context("Failed to serialize the conversation")
}

/// Parses an exported document back into a store.
///
/// # Errors
///
/// Returns an error if `document` is not a JSON array of records.
pub fn parse_document(document: &str) -> Result<MessageStore>
{
    let messages: Vec<Message> = serde_json::from_str(document)
        .context("Failed to parse the conversation document")?;

    Ok(MessageStore::new(messages))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn document_uses_two_space_indent()
    {
        let store = MessageStore::new(vec![Message::date("Today")]);
        let document = to_document(&store).unwrap();

        assert_eq!(
            document,
            "[\n  {\n    \"text\": \"Today\",\n    \"type\": \"date\"\n  }\n]"
        );
    }

    #[test]
    fn export_round_trips_through_disk()
    {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("nested"));

        let mut store = MessageStore::sample();
        store.push(Message::date("3:00 PM"));
        store.push(Message::sent("Hi", "3:00 PM").with_heart(true));

        let path = exporter.export(&store).unwrap();
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some(EXPORT_FILE_NAME));

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(parse_document(&written).unwrap(), store);
    }

    #[test]
    fn malformed_document_is_rejected()
    {
        assert!(parse_document("{\"text\": 1}").is_err());
    }
}
