use serde::{Deserialize, Serialize};

/// Media category a competition accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Photo,
    Video,
    Audio,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Photo => "photo",
            Category::Video => "video",
            Category::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a competition.
///
/// Records missing a status (older local snapshots, sparse backend rows)
/// deserialize as [`CompetitionStatus::Active`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    Active,
    Ended,
}

impl Default for CompetitionStatus {
    fn default() -> Self {
        CompetitionStatus::Active
    }
}

/// Build the composite key that makes a vote unique per
/// (competition, entry, user) triple.
///
/// Keys are only ever compared for equality, never parsed back into their
/// components, so ids containing `-` are fine.
pub fn vote_key(competition_id: &str, entry_id: &str, user_id: &str) -> String {
    format!("{competition_id}-{entry_id}-{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_key_concatenates_triple() {
        assert_eq!(vote_key("c1", "e2", "u3"), "c1-e2-u3");
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Photo).unwrap();
        assert_eq!(json, "\"photo\"");

        let back: Category = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(back, Category::Audio);
    }

    #[test]
    fn status_defaults_to_active() {
        assert_eq!(CompetitionStatus::default(), CompetitionStatus::Active);
    }
}
