//! Collection reconciliation for push events
//!
//! Pure functions over a collection snapshot. Every function keeps the
//! invariant that an identifier appears at most once.

use crate::types::Entity;

/// Apply a `{kind}_created` push.
///
/// A create for an identifier that is already present replaces it, so a
/// replayed or duplicated create never produces two copies.
pub fn created<T: Entity>(items: &[T], entity: T) -> Vec<T> {
    upsert(items, entity)
}

/// Apply a `{kind}_updated` push: drop the old copy, append the new one.
///
/// Unknown identifiers are appended.
pub fn updated<T: Entity>(items: &[T], entity: T) -> Vec<T> {
    upsert(items, entity)
}

/// Apply a `{kind}_deleted` push
pub fn deleted<T: Entity>(items: &[T], id: &str) -> Vec<T> {
    items.iter().filter(|item| item.id() != id).cloned().collect()
}

fn upsert<T: Entity>(items: &[T], entity: T) -> Vec<T> {
    let mut next: Vec<T> = items
        .iter()
        .filter(|item| item.id() != entity.id())
        .cloned()
        .collect();
    next.push(entity);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Story;
    use std::collections::HashSet;

    fn story(id: &str, name: &str) -> Story {
        Story::new(id, "p1", name)
    }

    fn ids(items: &[Story]) -> Vec<&str> {
        items.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_created_appends() {
        let items = vec![story("a", "A")];
        let next = created(&items, story("b", "B"));
        assert_eq!(ids(&next), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_create_keeps_one_copy() {
        let items = vec![story("a", "A"), story("b", "B")];
        let next = created(&items, story("a", "A2"));
        assert_eq!(ids(&next), vec!["b", "a"]);
        assert_eq!(next[1].name, "A2");
    }

    #[test]
    fn test_updated_moves_entity_to_end() {
        let items = vec![story("a", "A"), story("b", "B"), story("c", "C")];
        let next = updated(&items, story("a", "renamed"));
        assert_eq!(ids(&next), vec!["b", "c", "a"]);
        assert_eq!(next[2].name, "renamed");
    }

    #[test]
    fn test_updated_unknown_id_appends() {
        let items = vec![story("a", "A")];
        let next = updated(&items, story("z", "Z"));
        assert_eq!(ids(&next), vec!["a", "z"]);
    }

    #[test]
    fn test_deleted_removes_by_id() {
        let items = vec![story("a", "A"), story("b", "B")];
        assert_eq!(ids(&deleted(&items, "a")), vec!["b"]);
        assert_eq!(ids(&deleted(&items, "missing")), vec!["a", "b"]);
    }

    #[test]
    fn test_ids_stay_unique_over_mixed_sequences() {
        let mut items: Vec<Story> = Vec::new();
        let script = [
            ("c", "a"), ("c", "b"), ("u", "a"), ("c", "a"), ("d", "b"),
            ("u", "b"), ("u", "c"), ("c", "c"), ("d", "a"), ("c", "a"),
        ];
        for (op, id) in script {
            items = match op {
                "c" => created(&items, story(id, op)),
                "u" => updated(&items, story(id, op)),
                _ => deleted(&items, id),
            };
            let unique: HashSet<&str> = items.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(unique.len(), items.len());
        }
        assert_eq!(ids(&items), vec!["b", "c", "a"]);
    }
}
