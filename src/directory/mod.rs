use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// An immutable persona record. The collection is read-only for the
/// lifetime of the process; nothing in the app mutates a `Character`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub conversations: u64,
    pub is_online: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("duplicate character id: {id}")]
    DuplicateId { id: String },
}

#[derive(Debug)]
pub struct CharacterDirectory {
    characters: Vec<Character>,
}

impl CharacterDirectory {
    /// Selection relies on id uniqueness, so it is enforced at load time.
    pub fn new(characters: Vec<Character>) -> Result<Self, DirectoryError> {
        let mut seen = BTreeSet::new();
        for character in &characters {
            if !seen.insert(character.id.as_str()) {
                return Err(DirectoryError::DuplicateId {
                    id: character.id.clone(),
                });
            }
        }
        Ok(Self { characters })
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|character| character.id == id)
    }

    /// Case-insensitive substring search over name, description, and tags.
    /// The empty query matches everything; the query is not trimmed, so a
    /// whitespace query only matches text that actually contains whitespace.
    /// Matches keep the order of the seed collection.
    pub fn filter(&self, query: &str) -> Vec<&Character> {
        let needle = query.to_lowercase();
        self.characters
            .iter()
            .filter(|character| matches_query(character, &needle))
            .collect()
    }
}

fn matches_query(character: &Character, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    character.name.to_lowercase().contains(needle)
        || character.description.to_lowercase().contains(needle)
        || character
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{Character, CharacterDirectory, DirectoryError};

    fn character(id: &str, name: &str, description: &str, tags: &[&str]) -> Character {
        Character {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: "Тест".to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            conversations: 0,
            is_online: true,
        }
    }

    fn seed_directory() -> CharacterDirectory {
        CharacterDirectory::new(vec![
            character("1", "Нейрон", "Футуристический ИИ-помощник", &["ИИ", "Наука"]),
            character("2", "Астра", "Мудрая космическая сущность", &["Космос"]),
        ])
        .expect("seed directory should build")
    }

    #[test]
    fn rejects_duplicate_ids() {
        let error = CharacterDirectory::new(vec![
            character("1", "A", "a", &[]),
            character("1", "B", "b", &[]),
        ])
        .expect_err("duplicate ids should be rejected");
        assert_eq!(error, DirectoryError::DuplicateId { id: "1".to_string() });
    }

    #[test]
    fn get_returns_character_by_id() {
        let directory = seed_directory();
        assert_eq!(
            directory.get("2").map(|c| c.name.as_str()),
            Some("Астра")
        );
        assert!(directory.get("99").is_none());
    }

    #[test]
    fn empty_query_returns_all_in_seed_order() {
        let directory = seed_directory();
        let names: Vec<&str> = directory
            .filter("")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Нейрон", "Астра"]);
    }

    #[test]
    fn matches_tag_case_insensitively() {
        let directory = seed_directory();
        let names: Vec<&str> = directory
            .filter("ии")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Нейрон"]);
    }

    #[test]
    fn matches_name_and_description() {
        let directory = seed_directory();
        assert_eq!(directory.filter("астра").len(), 1);
        assert_eq!(directory.filter("космическая").len(), 1);
    }

    #[test]
    fn non_matching_query_returns_empty() {
        let directory = seed_directory();
        assert!(directory.filter("дракон").is_empty());
    }

    #[test]
    fn whitespace_query_is_not_trimmed() {
        let directory = seed_directory();
        // No seed text contains a double space, so this matches nothing.
        assert!(directory.filter("  ").is_empty());
    }
}
