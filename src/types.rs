//! Descriptor types returned by the bucket client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bucket owned by the configured credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

/// One object as reported by a bucket listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub storage_class: Option<String>,
}

impl RemoteObject {
    /// Get the display name (last component of the key)
    pub fn display_name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }

    /// True for directory placeholder keys (`prefix/`), which carry no
    /// file content of their own.
    pub fn is_placeholder(&self) -> bool {
        self.key.ends_with('/')
    }

    /// Get a human-readable size string
    pub fn size_string(&self) -> String {
        if self.is_placeholder() {
            return String::from("-");
        }

        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;
        const TB: u64 = GB * 1024;

        if self.size >= TB {
            format!("{:.2} TB", self.size as f64 / TB as f64)
        } else if self.size >= GB {
            format!("{:.2} GB", self.size as f64 / GB as f64)
        } else if self.size >= MB {
            format!("{:.2} MB", self.size as f64 / MB as f64)
        } else if self.size >= KB {
            format!("{:.2} KB", self.size as f64 / KB as f64)
        } else {
            format!("{} B", self.size)
        }
    }
}
