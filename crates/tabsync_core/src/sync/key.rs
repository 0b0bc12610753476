use std::fmt::{Display, Formatter};

/// Version-scoped key under which a workspace snapshot is stored in both tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key from the application data version.
    pub fn for_version(version: &str) -> Self {
        let key = match version.trim() {
            "1.0" => "production1",
            "1.0-ficsmas" => "production-ficsmas",
            _ => "tmpProduction",
        };
        Self::new(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
