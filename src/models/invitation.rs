use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// An administrator's invitation for an email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    pub invited_by_user_id: i64,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// - `Pending`: awaiting an administrator's decision
/// - `Accepted`: approved, the matching user is now approved
/// - `Rejected`: declined
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitationInput {
    pub email: String,
}

/// A pending invitation with the inviting administrator's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInvitation {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub invited_by_name: String,
}

/// Result of approving an invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub user: User,
    pub invitation: Invitation,
}
