//! Domain models for the family tree.
//!
//! # Core Concepts
//!
//! - [`Individual`]: A person record. Individuals are created through profile
//!   creation, edited by their owner or an administrator, and never deleted.
//! - [`Relationship`]: A directed, typed connection between two individuals as
//!   stored. At most one relationship exists between any unordered pair.
//! - [`RelationshipEdge`]: The `{source, target, type}` projection of a
//!   relationship consumed by tree construction.
//! - [`User`]: An account that owns individuals. Users register, get invited
//!   and approved by an administrator, then log in with a bearer token.
//! - [`Invitation`]: An administrator's invitation for an email address,
//!   resolved by approval or rejection.
//!
//! Relationships are not symmetric: a `child` edge from A to B does not imply
//! a `parent` edge from B to A.

mod individual;
mod invitation;
mod relationship;
mod user;

pub use individual::*;
pub use invitation::*;
pub use relationship::*;
pub use user::*;
