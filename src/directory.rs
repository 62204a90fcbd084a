//! A static user directory loaded from JSON.
//!
//! The file holds an array of users:
//!
//! ```json
//! [{ "uid": "100001", "name": "Bob Smith" }]
//! ```

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::error::Result;
use crate::types::User;

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Parses a directory from a JSON array of users.
    ///
    /// # Errors
    ///
    /// Returns `Json` if the input is not a valid user array.
    pub fn from_json(json: &str) -> Result<Self> {
        let users: Vec<User> = serde_json::from_str(json)?;
        Ok(Self::new(users))
    }

    /// Reads and parses a directory file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file can't be read or `Json` if it can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading user directory from {}", path.display());
        let directory = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded {} user(s) from directory", directory.len());
        Ok(directory)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Finds users whose name matches `query`, case-insensitively.
    ///
    /// Exact name matches come first, then names starting with the query, each
    /// group in directory order. A name also matches on any of its words, so
    /// `bob` finds "Bob Smith" and `smith` finds it too.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<User> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let (mut exact, mut prefix) = (Vec::new(), Vec::new());
        for user in &self.users {
            let name = user.name.to_lowercase();
            if name == query {
                exact.push(user.clone());
            } else if name.starts_with(&query)
                || name.split_whitespace().any(|word| word.starts_with(&query))
            {
                prefix.push(user.clone());
            }
        }

        exact.extend(prefix);
        exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = r#"[
        {"uid": "1", "name": "Bobby Tables"},
        {"uid": "2", "name": "Bob"},
        {"uid": "3", "name": "Alice Bobson"},
        {"uid": "4", "name": "Carol"}
    ]"#;

    #[test]
    fn parses_json_array() -> Result<()> {
        let directory = UserDirectory::from_json(USERS)?;
        assert_eq!(directory.len(), 4);
        Ok(())
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(UserDirectory::from_json(r#"{"uid": "1"}"#).is_err());
    }

    #[test]
    fn exact_match_comes_first() -> Result<()> {
        let directory = UserDirectory::from_json(USERS)?;
        let ids: Vec<_> = directory
            .search("bob")
            .into_iter()
            .map(|user| user.uid)
            .collect();
        assert_eq!(ids, ["2", "1", "3"]);
        Ok(())
    }

    #[test]
    fn unknown_name_returns_empty() -> Result<()> {
        let directory = UserDirectory::from_json(USERS)?;
        assert!(directory.search("dave").is_empty());
        assert!(directory.search("  ").is_empty());
        Ok(())
    }
}
