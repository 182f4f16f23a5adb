//! Write-time acyclicity check for the category hierarchy.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

/// Errors from category tree validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryTreeError {
    /// A category cannot be its own parent.
    #[error("Category cannot be its own parent")]
    SelfParent,

    /// The proposed parent is a descendant of the category.
    #[error("Category cannot be moved under its own descendant {descendant}")]
    Cycle {
        /// The descendant that was proposed as parent.
        descendant: Uuid,
    },

    /// The proposed parent does not exist in this hub's scope.
    #[error("Parent category {0} not found")]
    ParentNotFound(Uuid),
}

/// Validates that setting `parent_id` on `category_id` keeps the
/// hierarchy acyclic.
///
/// `parents` maps every live category of the hub to its current parent
/// edge. The check walks up from the proposed parent; reaching the
/// category itself means the parent is one of its descendants. A
/// visited set guards the walk against pre-existing cycles in stored
/// data.
///
/// # Errors
///
/// Returns `SelfParent`, `Cycle`, or `ParentNotFound` when the edge
/// would be invalid.
pub fn validate_parent(
    category_id: Uuid,
    parent_id: Uuid,
    parents: &HashMap<Uuid, Option<Uuid>>,
) -> Result<(), CategoryTreeError> {
    if category_id == parent_id {
        return Err(CategoryTreeError::SelfParent);
    }
    if !parents.contains_key(&parent_id) {
        return Err(CategoryTreeError::ParentNotFound(parent_id));
    }

    let mut visited = HashSet::new();
    let mut current = parent_id;
    loop {
        if current == category_id {
            return Err(CategoryTreeError::Cycle {
                descendant: parent_id,
            });
        }
        if !visited.insert(current) {
            // Pre-existing cycle in stored data; the new edge does not
            // reach category_id, so it is acceptable.
            return Ok(());
        }
        match parents.get(&current).copied().flatten() {
            Some(next) => current = next,
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    /// root(1) → child(2) → grandchild(3), sibling(4) under root.
    fn sample_tree() -> HashMap<Uuid, Option<Uuid>> {
        let mut parents = HashMap::new();
        parents.insert(id(1), None);
        parents.insert(id(2), Some(id(1)));
        parents.insert(id(3), Some(id(2)));
        parents.insert(id(4), Some(id(1)));
        parents
    }

    #[test]
    fn test_reparent_to_sibling_allowed() {
        let parents = sample_tree();
        assert_eq!(validate_parent(id(2), id(4), &parents), Ok(()));
    }

    #[test]
    fn test_self_parent_rejected() {
        let parents = sample_tree();
        assert_eq!(
            validate_parent(id(2), id(2), &parents),
            Err(CategoryTreeError::SelfParent)
        );
    }

    #[test]
    fn test_direct_child_rejected() {
        let parents = sample_tree();
        assert_eq!(
            validate_parent(id(1), id(2), &parents),
            Err(CategoryTreeError::Cycle { descendant: id(2) })
        );
    }

    #[test]
    fn test_deep_descendant_rejected() {
        let parents = sample_tree();
        assert_eq!(
            validate_parent(id(1), id(3), &parents),
            Err(CategoryTreeError::Cycle { descendant: id(3) })
        );
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let parents = sample_tree();
        assert_eq!(
            validate_parent(id(2), id(99), &parents),
            Err(CategoryTreeError::ParentNotFound(id(99)))
        );
    }

    #[test]
    fn test_walk_terminates_on_stored_cycle() {
        // 5 ⇄ 6 form a pre-existing cycle not involving 7.
        let mut parents = HashMap::new();
        parents.insert(id(5), Some(id(6)));
        parents.insert(id(6), Some(id(5)));
        parents.insert(id(7), None);
        assert_eq!(validate_parent(id(7), id(5), &parents), Ok(()));
    }
}
