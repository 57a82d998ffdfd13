use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Navigation state of one tab. This is the payload moved between windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabData {
    pub id: String,
    /// Location the tab is displaying
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub history_index: usize,
}

impl TabData {
    /// A fresh tab showing `path` with a single history entry.
    pub fn open(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title_for(&path),
            history: vec![path.clone()],
            history_index: 0,
            path,
        }
    }

    /// `0 <= history_index < history.len()` whenever history is non-empty.
    pub fn is_consistent(&self) -> bool {
        self.history.is_empty() || self.history_index < self.history.len()
    }

    /// Copy with the history index clamped into range.
    pub fn normalized(mut self) -> Self {
        if self.history.is_empty() {
            self.history_index = 0;
        } else if !self.is_consistent() {
            self.history_index = self.history.len() - 1;
        }
        self
    }
}

/// Last path component, or the path itself for roots.
fn title_for(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(path)
        .to_string()
}
