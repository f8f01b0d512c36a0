use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a relationship edge.
///
/// - `Parent`: the source is a parent of the target
/// - `Child`: the target is a child of the source (tree edges)
/// - `Spouse`: partners
/// - `Sibling`: brothers and sisters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Parent,
    Child,
    Spouse,
    Sibling,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Spouse => "spouse",
            Self::Sibling => "sibling",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(Self::Parent),
            "child" => Some(Self::Child),
            "spouse" => Some(Self::Spouse),
            "sibling" => Some(Self::Sibling),
            _ => None,
        }
    }
}

/// A stored relationship between two individuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: i64,
    pub individual_id: i64,
    pub related_individual_id: i64,
    pub relationship_type: RelationshipType,
    pub created_at: DateTime<Utc>,
}

/// A relationship joined with both endpoints' names, as listed for a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDetails {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub individual_first_name: String,
    pub individual_last_name: String,
    pub related_first_name: String,
    pub related_last_name: String,
}

/// Input for creating a relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRelationshipInput {
    pub individual_id: i64,
    pub related_individual_id: i64,
    pub relationship_type: RelationshipType,
}

/// The directed edge shape used for tree construction.
///
/// Serialized as `{id, source, target, type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub id: i64,
    pub source: i64,
    pub target: i64,
    #[serde(rename = "type")]
    pub kind: RelationshipType,
}

impl RelationshipEdge {
    pub fn new(id: i64, source: i64, target: i64, kind: RelationshipType) -> Self {
        Self {
            id,
            source,
            target,
            kind,
        }
    }

    /// True when this edge connects `a` and `b` in either direction.
    pub fn connects(&self, a: i64, b: i64) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

impl From<&Relationship> for RelationshipEdge {
    fn from(r: &Relationship) -> Self {
        Self {
            id: r.id,
            source: r.individual_id,
            target: r.related_individual_id,
            kind: r.relationship_type,
        }
    }
}
