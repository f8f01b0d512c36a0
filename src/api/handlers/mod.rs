use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::middleware::AuthUser;
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{domain_error, DomainError};
use crate::models::*;
use crate::tree::{
    render_view, ExpansionState, SkippedEdge, TracingLogger, TreeNode, TreeSource, TreeView,
};

// ============================================================
// Error Handling
// ============================================================

/// Map an error to a response.
///
/// [`DomainError`]s are user-visible and keep their message. Anything else is
/// logged server-side and the client only sees a generic message.
fn api_error(e: anyhow::Error) -> (StatusCode, String) {
    if let Some(err) = domain_error(&e) {
        let status = match err {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        tracing::warn!("Request rejected ({}): {}", status, err);
        return (status, err.to_string());
    }

    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found(what: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Auth
// ============================================================

pub async fn register(
    State(db): State<Database>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    db.register_user(input)
        .map(|u| (StatusCode::CREATED, Json(u)))
        .map_err(api_error)
}

pub async fn login(
    State(db): State<Database>,
    State(config): State<Arc<AppConfig>>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    db.login(input, config.token_ttl())
        .map(Json)
        .map_err(api_error)
}

pub async fn me(Extension(auth): Extension<AuthUser>) -> Json<User> {
    Json(auth.user)
}

pub async fn logout(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, (StatusCode, String)> {
    db.revoke_token(&auth.token).map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Invitations (admin only)
// ============================================================

pub async fn create_invitation(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateInvitationInput>,
) -> Result<(StatusCode, Json<Invitation>), (StatusCode, String)> {
    db.create_invitation(&auth.actor(), input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(api_error)
}

pub async fn list_pending_invitations(
    State(db): State<Database>,
) -> Result<Json<Vec<PendingInvitation>>, (StatusCode, String)> {
    db.get_pending_invitations()
        .map(Json)
        .map_err(api_error)
}

pub async fn approve_invitation(
    State(db): State<Database>,
    Path(email): Path<String>,
) -> Result<Json<ApprovalResult>, (StatusCode, String)> {
    db.approve_invitation(&email)
        .map(Json)
        .map_err(api_error)
}

pub async fn reject_invitation(
    State(db): State<Database>,
    Path(email): Path<String>,
) -> Result<Json<Invitation>, (StatusCode, String)> {
    db.reject_invitation(&email)
        .map(Json)
        .map_err(api_error)
}

// ============================================================
// Individuals
// ============================================================

pub async fn create_individual(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateIndividualInput>,
) -> Result<(StatusCode, Json<Individual>), (StatusCode, String)> {
    db.create_individual(&auth.actor(), input)
        .map(|i| (StatusCode::CREATED, Json(i)))
        .map_err(api_error)
}

pub async fn get_individual(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Individual>, (StatusCode, String)> {
    db.get_individual(id)
        .map_err(api_error)?
        .map(Json)
        .ok_or_else(|| not_found("Individual"))
}

pub async fn update_individual(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateIndividualInput>,
) -> Result<Json<Individual>, (StatusCode, String)> {
    db.update_individual(&auth.actor(), id, input)
        .map(Json)
        .map_err(api_error)
}

/// Create a new individual as a child of `id`.
pub async fn add_child(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Path(parent_id): Path<i64>,
    Json(input): Json<CreateIndividualInput>,
) -> Result<(StatusCode, Json<ChildCreated>), (StatusCode, String)> {
    db.add_child(&auth.actor(), parent_id, input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(api_error)
}

// ============================================================
// Relationships
// ============================================================

pub async fn list_individual_relationships(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RelationshipDetails>>, (StatusCode, String)> {
    db.get_relationships_for(id)
        .map(Json)
        .map_err(api_error)
}

pub async fn create_relationship(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<CreateRelationshipInput>,
) -> Result<(StatusCode, Json<Relationship>), (StatusCode, String)> {
    db.create_relationship(&auth.actor(), input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(api_error)
}

pub async fn delete_relationship(
    State(db): State<Database>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    db.delete_relationship(&auth.actor(), id)
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Tree
// ============================================================

pub async fn tree_individuals(
    State(db): State<Database>,
) -> Result<Json<Vec<Individual>>, (StatusCode, String)> {
    db.get_all_individuals().map(Json).map_err(api_error)
}

pub async fn tree_relationships(
    State(db): State<Database>,
) -> Result<Json<Vec<RelationshipEdge>>, (StatusCode, String)> {
    db.get_all_edges().map(Json).map_err(api_error)
}

/// The built tree. `tree` is null when there are no individuals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    pub root_id: Option<i64>,
    pub tree: Option<TreeNode>,
    pub cycles: Vec<SkippedEdge>,
    pub truncated: Vec<SkippedEdge>,
}

pub async fn get_tree(
    State(db): State<Database>,
) -> Result<Json<TreeResponse>, (StatusCode, String)> {
    let built = db.get_tree().map_err(api_error)?;
    let response = match built {
        Some(built) => TreeResponse {
            root_id: Some(built.root.id()),
            tree: Some(built.root),
            cycles: built.cycles,
            truncated: built.truncated,
        },
        None => TreeResponse {
            root_id: None,
            tree: None,
            cycles: Vec::new(),
            truncated: Vec::new(),
        },
    };
    Ok(Json(response))
}

/// Query parameters for rendering the tree as text.
#[derive(Debug, Deserialize)]
pub struct RenderTreeQuery {
    /// Comma-separated individual ids to show collapsed.
    pub collapsed: Option<String>,
}

pub async fn render_tree(
    State(db): State<Database>,
    Query(query): Query<RenderTreeQuery>,
) -> Result<String, (StatusCode, String)> {
    let mut expansion = ExpansionState::new();
    for id in query
        .collapsed
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let id: i64 = id.parse().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid individual id: {}", id),
            )
        })?;
        expansion.collapse(id);
    }

    let snapshot = db.fetch_snapshot().map_err(api_error)?;
    let mut view = TreeView::new(Arc::new(TracingLogger)).with_expansion(expansion);
    view.rebuild(&snapshot);
    Ok(render_view(&view))
}
