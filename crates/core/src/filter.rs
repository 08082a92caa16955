use crate::Call;

/// Predicate deriving the displayed calls from the authoritative page.
///
/// Parsing is permissive: any key that is not one of the archive keywords
/// becomes a call-type match, so an unknown key yields an empty view rather
/// than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallFilter {
    #[default]
    All,
    Archived,
    Unarchived,
    CallType(String),
}

impl CallFilter {
    pub fn parse(key: &str) -> Self {
        let key = key.trim().to_lowercase();
        match key.as_str() {
            "all" => Self::All,
            "archived" => Self::Archived,
            "unarchived" | "active" => Self::Unarchived,
            _ => Self::CallType(key),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Archived => "archived",
            Self::Unarchived => "unarchived",
            Self::CallType(key) => key,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches(&self, call: &Call) -> bool {
        match self {
            Self::All => true,
            Self::Archived => call.is_archived,
            Self::Unarchived => !call.is_archived,
            Self::CallType(key) => call.call_type.as_str().to_lowercase() == *key,
        }
    }

    /// Recompute the displayed subset, preserving source order.
    pub fn apply(&self, source: &[Call]) -> Vec<Call> {
        source.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}

impl From<&str> for CallFilter {
    fn from(key: &str) -> Self {
        Self::parse(key)
    }
}

impl std::fmt::Display for CallFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
