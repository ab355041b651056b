//! Journal Entry - The unit the relationship engine works on
//!
//! Memories are owned by the storage collaborator. The engine only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mood;

// ============================================================================
// MEMORY
// ============================================================================

/// A single user-authored journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    /// Unique, stable identifier (UUID v4)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Free text body
    pub text: String,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// Mood label, if the author picked one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Memory {
    /// Create a memory with a fresh id, created now
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            text: text.into(),
            created_at: Utc::now(),
            mood: None,
            tags: vec![],
        }
    }

    /// Whether the text is blank
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Text shortened to `max_chars` characters for display
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() > max_chars {
            let cut: String = self.text.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", cut)
        } else {
            self.text.clone()
        }
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for writing a new memory
///
/// Uses `deny_unknown_fields` to prevent field injection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMemory {
    /// Owning user (filled from the route in the HTTP layer)
    #[serde(default)]
    pub user_id: String,
    /// Free text body
    pub text: String,
    /// Creation time, defaults to now
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Mood label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewMemory {
    /// Minimal input: user and text
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            created_at: None,
            mood: None,
            tags: vec![],
        }
    }

    /// Set the creation time
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the mood
    pub fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = Some(mood);
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
