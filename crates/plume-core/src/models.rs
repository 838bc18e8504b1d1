//! Data models for Plume
//!
//! Defines the `Draft` document model and its mapping onto repository
//! files (front matter + publish path).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::slugify;
use crate::store::FileWrite;

/// Filename suffix identifying documents eligible for rendering/listing
pub const MARKUP_EXTENSION: &str = ".md";

/// An unpublished document held in the local draft store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    /// Unique identifier
    pub id: Uuid,
    /// Document title
    pub title: String,
    /// Raw markdown body
    pub body: String,
    /// When this draft was created
    pub created_at: DateTime<Utc>,
    /// When this draft was last updated
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    /// Create a new draft
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Utc::now();
    }

    /// Update the body
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.updated_at = Utc::now();
    }

    /// Repository filename for this draft: creation date + slugified title
    /// + markup extension, e.g. `2024-05-01-hello-world.md`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}{}",
            self.created_at.format("%Y-%m-%d"),
            slugify(&self.title),
            MARKUP_EXTENSION
        )
    }

    /// Repository-relative path under the configured content directory
    pub fn publish_path(&self, content_dir: &str) -> String {
        let dir = content_dir.trim_matches('/');
        if dir.is_empty() {
            self.file_name()
        } else {
            format!("{}/{}", dir, self.file_name())
        }
    }

    /// Render this draft as a markdown document with front matter
    ///
    /// The front matter block carries `title`, `date`, and `lastModified`,
    /// followed by the raw body. The title is emitted as a quoted YAML
    /// scalar so punctuation or line breaks in it cannot break the block.
    pub fn to_markdown(&self) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\nlastModified: {}\n---\n\n{}\n",
            yaml_quote(&self.title),
            self.created_at.to_rfc3339(),
            self.updated_at.to_rfc3339(),
            self.body.trim_end()
        )
    }

    /// Build the file write for publishing this draft
    pub fn to_file_write(&self, content_dir: &str) -> FileWrite {
        FileWrite {
            path: self.publish_path(content_dir),
            content: self.to_markdown().into_bytes(),
            expected_sha: None,
        }
    }
}

/// Double-quoted YAML scalar: escapes backslashes and quotes, collapses
/// line breaks to spaces
fn yaml_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_draft() -> Draft {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        Draft {
            id: Uuid::new_v4(),
            title: "Hello, World! 2024".to_string(),
            body: "First post.".to_string(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_file_name_from_date_and_slug() {
        let draft = fixed_draft();
        assert_eq!(draft.file_name(), "2024-05-01-hello-world-2024.md");
    }

    #[test]
    fn test_publish_path() {
        let draft = fixed_draft();
        assert_eq!(
            draft.publish_path("posts"),
            "posts/2024-05-01-hello-world-2024.md"
        );
        // Leading/trailing slashes in the dir are tolerated
        assert_eq!(
            draft.publish_path("/posts/"),
            "posts/2024-05-01-hello-world-2024.md"
        );
        assert_eq!(draft.publish_path(""), "2024-05-01-hello-world-2024.md");
    }

    #[test]
    fn test_front_matter_fields() {
        let draft = fixed_draft();
        let markdown = draft.to_markdown();

        assert!(markdown.starts_with("---\n"));
        assert!(markdown.contains("title: \"Hello, World! 2024\"\n"));
        assert!(markdown.contains("date: 2024-05-01T09:30:00+00:00\n"));
        assert!(markdown.contains("lastModified: 2024-05-01T09:30:00+00:00\n"));
        assert!(markdown.ends_with("---\n\nFirst post.\n"));
    }

    #[test]
    fn test_front_matter_survives_hostile_titles() {
        let mut draft = fixed_draft();
        draft.title = "line one\nline two".to_string();
        let markdown = draft.to_markdown();
        // The title stays on one line; the fence count is unchanged
        assert!(markdown.contains("title: \"line one line two\"\n"));
        assert_eq!(markdown.matches("---\n").count(), 2);

        draft.title = "--- not a fence \"quoted\"".to_string();
        let markdown = draft.to_markdown();
        assert!(markdown.contains("title: \"--- not a fence \\\"quoted\\\"\"\n"));
        assert_eq!(markdown.matches("---\n").count(), 2);
    }

    #[test]
    fn test_to_file_write() {
        let draft = fixed_draft();
        let write = draft.to_file_write("posts");

        assert_eq!(write.path, "posts/2024-05-01-hello-world-2024.md");
        assert!(write.expected_sha.is_none());
        let content = String::from_utf8(write.content).unwrap();
        assert!(content.contains("First post."));
    }

    #[test]
    fn test_set_body_bumps_updated_at() {
        let mut draft = fixed_draft();
        let before = draft.updated_at;
        draft.set_body("Edited.");
        assert!(draft.updated_at > before);
        assert_eq!(draft.body, "Edited.");
    }
}
