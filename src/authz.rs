//! Access rules for mutating profiles and the relationship graph.
//!
//! These are pure checks over already-fetched records so the storage layer
//! can run them inside its own lock.

use crate::error::DomainError;
use crate::models::{Individual, RelationshipEdge, Role, User};

/// The authenticated user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, individual: &Individual) -> bool {
        individual.owning_user_id == Some(self.user_id)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

pub fn can_edit_individual(actor: &Actor, individual: &Individual) -> bool {
    actor.is_admin() || actor.owns(individual)
}

/// Administrators may touch any edge; everyone else must own one endpoint.
pub fn can_link(actor: &Actor, individual: &Individual, related: &Individual) -> bool {
    actor.is_admin() || actor.owns(individual) || actor.owns(related)
}

pub fn require_admin(actor: &Actor) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::forbidden("Administrator access required"))
    }
}

/// Validate a new edge between `individual` and `related`.
///
/// Checks run in order: both endpoints exist, the actor may link them, no
/// edge exists between the pair in either direction. The requested type
/// plays no part in the duplicate check.
pub fn validate_new_relationship(
    actor: &Actor,
    individual: Option<&Individual>,
    related: Option<&Individual>,
    existing: &[RelationshipEdge],
) -> Result<(), DomainError> {
    let (Some(individual), Some(related)) = (individual, related) else {
        return Err(DomainError::not_found("Individual"));
    };

    if individual.id == related.id {
        return Err(DomainError::invalid(
            "An individual cannot be related to themselves",
        ));
    }

    if !can_link(actor, individual, related) {
        return Err(DomainError::forbidden(
            "Not authorized to create this relationship",
        ));
    }

    if existing
        .iter()
        .any(|edge| edge.connects(individual.id, related.id))
    {
        return Err(DomainError::conflict("Relationship already exists"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationshipType;
    use chrono::Utc;

    fn person(id: i64, owner: Option<i64>) -> Individual {
        Individual {
            id,
            first_name: format!("First{id}"),
            last_name: "Test".to_string(),
            birth_date: None,
            death_date: None,
            birth_place: None,
            death_place: None,
            is_alive: true,
            bio: None,
            photo_url: None,
            owning_user_id: owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const MEMBER: Actor = Actor {
        user_id: 7,
        role: Role::Member,
    };
    const ADMIN: Actor = Actor {
        user_id: 1,
        role: Role::Admin,
    };

    #[test]
    fn missing_endpoint_is_not_found() {
        let a = person(1, Some(7));
        let result = validate_new_relationship(&MEMBER, Some(&a), None, &[]);
        assert_eq!(result, Err(DomainError::not_found("Individual")));
    }

    #[test]
    fn owner_of_either_endpoint_may_link() {
        let mine = person(1, Some(7));
        let theirs = person(2, Some(8));
        assert!(validate_new_relationship(&MEMBER, Some(&theirs), Some(&mine), &[]).is_ok());
        assert!(validate_new_relationship(&MEMBER, Some(&mine), Some(&theirs), &[]).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let a = person(1, Some(8));
        let b = person(2, None);
        let result = validate_new_relationship(&MEMBER, Some(&a), Some(&b), &[]);
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[test]
    fn admin_may_link_anyone() {
        let a = person(1, Some(8));
        let b = person(2, None);
        assert!(validate_new_relationship(&ADMIN, Some(&a), Some(&b), &[]).is_ok());
    }

    #[test]
    fn existing_edge_in_either_direction_conflicts_regardless_of_type() {
        let a = person(1, Some(7));
        let b = person(2, Some(7));
        let existing = [RelationshipEdge::new(10, 1, 2, RelationshipType::Spouse)];

        let forward = validate_new_relationship(&MEMBER, Some(&a), Some(&b), &existing);
        let backward = validate_new_relationship(&MEMBER, Some(&b), Some(&a), &existing);

        assert!(matches!(forward, Err(DomainError::Conflict(_))));
        assert!(matches!(backward, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn self_relationship_is_invalid() {
        let a = person(1, Some(7));
        let result = validate_new_relationship(&MEMBER, Some(&a), Some(&a), &[]);
        assert!(matches!(result, Err(DomainError::Invalid(_))));
    }

    #[test]
    fn member_cannot_pass_admin_gate() {
        assert!(require_admin(&MEMBER).is_err());
        assert!(require_admin(&ADMIN).is_ok());
    }
}
