//! The keyword knowledge store: a JSON file mapping keyword lists to answers.
//!
//! The file is re-read on every lookup so operators can edit answers while
//! the bot is running; there is no cache to invalidate. Load failures are
//! logged and yield an empty record list, never an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

/// How a record's answer is delivered.
///
/// Any `type` value other than `"photo"` is treated as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AnswerKind {
    /// Send the answer string as message text.
    #[default]
    Text,
    /// The answer string is a path to an image file.
    Photo,
}

impl From<String> for AnswerKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "photo" => AnswerKind::Photo,
            _ => AnswerKind::Text,
        }
    }
}

/// One entry in the knowledge file.
#[derive(Debug, Clone, Deserialize)]
pub struct QaRecord {
    /// Match strings, checked case-insensitively against the message.
    /// A record without keywords never matches.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Reply text, or an image path when `kind` is photo.
    pub answer: String,
    /// Caption for photo replies.
    #[serde(default)]
    pub caption: String,
    #[serde(rename = "type", default)]
    pub kind: AnswerKind,
}

/// On-disk shape of the knowledge file.
#[derive(Debug, Deserialize)]
struct QaFile {
    #[serde(default)]
    questions: Vec<QaRecord>,
}

/// A resolved reply, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Send this text verbatim.
    Text(String),
    /// Send the image at `path`, with `caption` attached when non-empty.
    Photo { path: PathBuf, caption: String },
}

/// Load all records from the knowledge file.
///
/// A missing or malformed file is logged and yields an empty list, so the
/// bot keeps running and simply stops matching until the file is fixed.
pub fn load(path: &Path) -> Vec<QaRecord> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to read knowledge file {}: {e}", path.display());
            return Vec::new();
        }
    };

    match serde_json::from_str::<QaFile>(&content) {
        Ok(file) => file.questions,
        Err(e) => {
            error!("failed to parse knowledge file {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Find the reply for a message, if any keyword matches.
///
/// The message is lowercased once; records are scanned in file order and
/// keywords in record order, first match wins. Matching is substring
/// containment, so the keyword "price" matches "What is the price?".
pub fn resolve(message: &str, records: &[QaRecord]) -> Option<Reply> {
    let msg_lower = message.to_lowercase();

    for record in records {
        let hit = record
            .keywords
            .iter()
            .any(|kw| msg_lower.contains(&kw.to_lowercase()));
        if !hit {
            continue;
        }

        return Some(match record.kind {
            AnswerKind::Text => Reply::Text(record.answer.clone()),
            AnswerKind::Photo => Reply::Photo {
                path: PathBuf::from(&record.answer),
                caption: record.caption.clone(),
            },
        });
    }

    None
}
