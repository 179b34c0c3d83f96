//! Strongly-typed change-script identifier.
//!
//! A [`ScriptId`] is the script's path relative to the migrations root, with
//! components joined by `/` regardless of platform. Ordering is plain byte-wise
//! `String` ordering, which is the only execution-order guarantee the engine
//! makes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// A non-empty, root-relative script identifier such as `0001_init.sql`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScriptId(String);

impl<'de> Deserialize<'de> for ScriptId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ScriptId::try_new(s).ok_or_else(|| serde::de::Error::custom("ScriptId must not be empty"))
    }
}

impl ScriptId {
    /// Create a new identifier, panicking if it is empty.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        let s = id.into();
        assert!(!s.is_empty(), "ScriptId must not be empty");
        Self(s)
    }

    /// Try to create a new identifier, returning `None` if it is empty.
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let s = id.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Build an identifier from a path relative to the migrations root.
    ///
    /// Returns `None` for empty paths, paths that escape the root (`..`),
    /// absolute paths, and components that are not valid UTF-8.
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Self::try_new(parts.join("/"))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScriptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for ScriptId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ScriptId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScriptId {
    type Error = &'static str;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s).ok_or("ScriptId must not be empty")
    }
}

impl PartialEq<str> for ScriptId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ScriptId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "script_id_test.rs"]
mod tests;
