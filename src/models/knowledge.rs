use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(rename = "isAIVerified")]
    pub is_ai_verified: bool,
    pub views: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Case-insensitive substring match used by search. Title matches rank
    /// ahead of content/tag/keyword matches.
    pub fn match_rank(&self, needle_lower: &str) -> Option<u8> {
        if self.title.to_lowercase().contains(needle_lower) {
            return Some(1);
        }
        let in_content = self.content.to_lowercase().contains(needle_lower);
        let in_lists = self
            .tags
            .iter()
            .chain(self.keywords.iter())
            .any(|t| t.to_lowercase().contains(needle_lower));
        (in_content || in_lists).then_some(2)
    }
}

#[derive(Debug, Clone)]
pub struct NewKnowledgeEntry {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub is_ai_verified: bool,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
    pub is_ai_verified: Option<bool>,
}

/// Accepts either a JSON array of strings or a single comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<String>),
            Joined(String),
        }

        let items = match Raw::deserialize(deserializer)? {
            Raw::List(items) => items,
            Raw::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };

        Ok(StringList(
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, content: &str, tags: &[&str]) -> KnowledgeEntry {
        KnowledgeEntry {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            keywords: vec![],
            is_ai_verified: false,
            views: 0,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_string_list_accepts_array_and_csv() {
        let list: StringList = serde_json::from_str(r#"["feed", " water "]"#).unwrap();
        assert_eq!(list.0, vec!["feed", "water"]);

        let list: StringList = serde_json::from_str(r#""vaccines, newcastle,, ""#).unwrap();
        assert_eq!(list.0, vec!["vaccines", "newcastle"]);
    }

    #[test]
    fn test_match_rank() {
        let e = entry("Newcastle disease", "Vaccinate early", &["Health"]);
        assert_eq!(e.match_rank("newcastle"), Some(1));
        assert_eq!(e.match_rank("vaccinate"), Some(2));
        assert_eq!(e.match_rank("health"), Some(2));
        assert_eq!(e.match_rank("broiler"), None);
    }
}
