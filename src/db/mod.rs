mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::authz::{self, Actor};
use crate::credentials;
use crate::error::DomainError;
use crate::models::*;
use crate::tree::{BuiltTree, TreeSnapshot, TreeSource, TracingLogger};

const INDIVIDUAL_COLUMNS: &str = "id, first_name, last_name, birth_date, death_date, birth_place, \
     death_place, is_alive, bio, photo_url, user_id, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, name, role, is_approved, created_at";

const INVITATION_COLUMNS: &str = "id, email, invited_by_user_id, status, created_at";

const RELATIONSHIP_COLUMNS: &str =
    "id, individual_id, related_individual_id, relationship_type, created_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "family-tree")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("family-tree.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // User operations
    // ============================================================

    /// Register a new, unapproved member account.
    pub fn register_user(&self, input: RegisterInput) -> Result<User> {
        self.insert_user(input, Role::Member, false)
    }

    /// Create an approved administrator. Used to bootstrap a fresh install.
    pub fn create_admin(&self, input: RegisterInput) -> Result<User> {
        self.insert_user(input, Role::Admin, true)
    }

    fn insert_user(&self, input: RegisterInput, role: Role, approved: bool) -> Result<User> {
        let email = normalize_email(&input.email);
        let name = input.name.trim().to_string();
        if email.is_empty() || name.is_empty() {
            return Err(DomainError::invalid("Email and name are required").into());
        }
        if input.password.chars().count() < credentials::MIN_PASSWORD_LEN {
            return Err(DomainError::invalid(format!(
                "Password must be at least {} characters",
                credentials::MIN_PASSWORD_LEN
            ))
            .into());
        }
        let password_hash = credentials::hash_password(&input.password)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        if query_user_by_email(&conn, &email)?.is_some() {
            return Err(DomainError::conflict("User already exists").into());
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (email, name, password_hash, role, is_approved, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                &email,
                &name,
                &password_hash,
                role.as_str(),
                approved,
                now.to_rfc3339(),
            ),
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            email,
            name,
            role,
            is_approved: approved,
            created_at: now,
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_user_by_email(&conn, &normalize_email(email))
    }

    /// Check credentials and issue a bearer token valid for `ttl`.
    pub fn login(&self, input: LoginInput, ttl: chrono::Duration) -> Result<LoginResponse> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let email = normalize_email(&input.email);

        let found = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"),
                [&email],
                |row| Ok((user_from_row(row)?, row.get::<_, String>(6)?)),
            )
            .optional()?;

        let invalid = || DomainError::unauthorized("Invalid credentials");
        let Some((user, password_hash)) = found else {
            return Err(invalid().into());
        };
        if !credentials::verify_password(&input.password, &password_hash) {
            return Err(invalid().into());
        }
        if !user.is_approved {
            return Err(DomainError::forbidden("Account not approved yet").into());
        }

        let now = Utc::now();
        let purged = purge_expired_tokens(&conn, now)?;
        if purged > 0 {
            tracing::debug!("Purged {} expired tokens", purged);
        }

        let token = credentials::new_token();
        let expires_at = now + ttl;
        conn.execute(
            "INSERT INTO auth_tokens (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
            (&token, user.id, now.to_rfc3339(), expires_at.to_rfc3339()),
        )?;

        tracing::info!("User {} logged in", user.id);

        Ok(LoginResponse {
            token,
            expires_at,
            user,
        })
    }

    /// Resolve a bearer token to its approved, unexpired user.
    pub fn user_for_token(&self, token: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let found = conn
            .query_row(
                "SELECT u.id, u.email, u.name, u.role, u.is_approved, u.created_at, t.expires_at
                 FROM auth_tokens t JOIN users u ON u.id = t.user_id
                 WHERE t.token = ?",
                [token],
                |row| Ok((user_from_row(row)?, parse_datetime(row.get::<_, String>(6)?))),
            )
            .optional()?;

        Ok(match found {
            Some((user, expires_at)) if expires_at > Utc::now() && user.is_approved => Some(user),
            Some(_) => {
                conn.execute("DELETE FROM auth_tokens WHERE token = ?", [token])?;
                None
            }
            None => None,
        })
    }

    /// Delete every expired token. Returns how many were removed.
    pub fn purge_expired_tokens(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        purge_expired_tokens(&conn, Utc::now())
    }

    pub fn revoke_token(&self, token: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM auth_tokens WHERE token = ?", [token])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Invitation operations
    // ============================================================

    pub fn create_invitation(
        &self,
        actor: &Actor,
        input: CreateInvitationInput,
    ) -> Result<Invitation> {
        authz::require_admin(actor)?;
        let email = normalize_email(&input.email);
        if email.is_empty() {
            return Err(DomainError::invalid("Email is required").into());
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        if query_user_by_email(&conn, &email)?.is_some() {
            return Err(DomainError::conflict("User with this email already exists").into());
        }
        if query_invitation_by_email(&conn, &email)?.is_some() {
            return Err(DomainError::conflict("User already invited").into());
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO invitations (email, invited_by_user_id, status, created_at)
             VALUES (?, ?, ?, ?)",
            (
                &email,
                actor.user_id,
                InvitationStatus::Pending.as_str(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Invitation {
            id: conn.last_insert_rowid(),
            email,
            invited_by_user_id: actor.user_id,
            status: InvitationStatus::Pending,
            created_at: now,
        })
    }

    /// Pending invitations, newest first.
    pub fn get_pending_invitations(&self) -> Result<Vec<PendingInvitation>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT i.id, i.email, i.invited_by_user_id, i.status, i.created_at, u.name
             FROM invitations i JOIN users u ON u.id = i.invited_by_user_id
             WHERE i.status = 'pending'
             ORDER BY i.created_at DESC, i.id DESC",
        )?;

        let invitations = stmt
            .query_map([], |row| {
                Ok(PendingInvitation {
                    invitation: invitation_from_row(row)?,
                    invited_by_name: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(invitations)
    }

    /// Accept the pending invitation for `email` and approve its user.
    pub fn approve_invitation(&self, email: &str) -> Result<ApprovalResult> {
        let email = normalize_email(email);
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE invitations SET status = 'accepted' WHERE email = ? AND status = 'pending'",
            [&email],
        )?;
        if updated == 0 {
            return Err(DomainError::not_found("Pending invitation").into());
        }

        let approved = tx.execute("UPDATE users SET is_approved = 1 WHERE email = ?", [&email])?;
        if approved == 0 {
            // Dropping the transaction rolls the invitation back to pending.
            return Err(DomainError::not_found("User").into());
        }

        let invitation = query_invitation_by_email(&tx, &email)?
            .ok_or_else(|| anyhow::anyhow!("Invitation vanished during approval"))?;
        let user = query_user_by_email(&tx, &email)?
            .ok_or_else(|| anyhow::anyhow!("User vanished during approval"))?;
        tx.commit()?;

        tracing::info!("Approved user {} via invitation {}", user.id, invitation.id);
        Ok(ApprovalResult { user, invitation })
    }

    pub fn reject_invitation(&self, email: &str) -> Result<Invitation> {
        let email = normalize_email(email);
        let conn = self.conn.lock().expect("database lock poisoned");
        let updated = conn.execute(
            "UPDATE invitations SET status = 'rejected' WHERE email = ? AND status = 'pending'",
            [&email],
        )?;
        if updated == 0 {
            return Err(DomainError::not_found("Pending invitation").into());
        }

        query_invitation_by_email(&conn, &email)?
            .ok_or_else(|| anyhow::anyhow!("Invitation vanished during rejection"))
    }

    // ============================================================
    // Individual operations
    // ============================================================

    /// All individuals ordered by last name, first name, then id.
    pub fn get_all_individuals(&self) -> Result<Vec<Individual>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_all_individuals(&conn)
    }

    pub fn get_individual(&self, id: i64) -> Result<Option<Individual>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_individual(&conn, id)
    }

    pub fn create_individual(
        &self,
        actor: &Actor,
        input: CreateIndividualInput,
    ) -> Result<Individual> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_individual(&conn, actor, input)
    }

    pub fn update_individual(
        &self,
        actor: &Actor,
        id: i64,
        input: UpdateIndividualInput,
    ) -> Result<Individual> {
        validate_names(&input.first_name, &input.last_name)?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let existing =
            query_individual(&conn, id)?.ok_or_else(|| DomainError::not_found("Individual"))?;
        if !authz::can_edit_individual(actor, &existing) {
            return Err(DomainError::forbidden("Not authorized to edit this profile").into());
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE individuals SET first_name = ?, last_name = ?, birth_date = ?, birth_place = ?,
                 death_date = ?, death_place = ?, is_alive = ?, bio = ?, photo_url = ?, updated_at = ?
             WHERE id = ?",
            (
                input.first_name.trim(),
                input.last_name.trim(),
                input.birth_date.map(|d| d.to_string()),
                &input.birth_place,
                input.death_date.map(|d| d.to_string()),
                &input.death_place,
                input.is_alive,
                &input.bio,
                &input.photo_url,
                now.to_rfc3339(),
                id,
            ),
        )?;

        Ok(Individual {
            id,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            birth_date: input.birth_date,
            death_date: input.death_date,
            birth_place: input.birth_place,
            death_place: input.death_place,
            is_alive: input.is_alive,
            bio: input.bio,
            photo_url: input.photo_url,
            owning_user_id: existing.owning_user_id,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Create a new individual and a `child` edge from `parent_id` to it in a
    /// single transaction.
    pub fn add_child(
        &self,
        actor: &Actor,
        parent_id: i64,
        input: CreateIndividualInput,
    ) -> Result<ChildCreated> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let parent = query_individual(&tx, parent_id)?
            .ok_or_else(|| DomainError::not_found("Individual"))?;
        if !authz::can_edit_individual(actor, &parent) {
            return Err(DomainError::forbidden("Not authorized to add children here").into());
        }

        let individual = insert_individual(&tx, actor, input)?;
        let relationship = insert_relationship(
            &tx,
            parent.id,
            individual.id,
            RelationshipType::Child,
        )?;
        tx.commit()?;

        tracing::info!("Added child {} under {}", individual.id, parent.id);
        Ok(ChildCreated {
            individual,
            relationship,
        })
    }

    // ============================================================
    // Relationship operations
    // ============================================================

    /// Relationships where the individual is either endpoint.
    pub fn get_relationships_for(&self, individual_id: i64) -> Result<Vec<RelationshipDetails>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT r.id, r.individual_id, r.related_individual_id, r.relationship_type, r.created_at,
                    i1.first_name, i1.last_name, i2.first_name, i2.last_name
             FROM relationships r
             JOIN individuals i1 ON r.individual_id = i1.id
             JOIN individuals i2 ON r.related_individual_id = i2.id
             WHERE r.individual_id = ?1 OR r.related_individual_id = ?1
             ORDER BY r.id",
        )?;

        let relationships = stmt
            .query_map([individual_id], |row| {
                Ok(RelationshipDetails {
                    relationship: relationship_from_row(row)?,
                    individual_first_name: row.get(5)?,
                    individual_last_name: row.get(6)?,
                    related_first_name: row.get(7)?,
                    related_last_name: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(relationships)
    }

    pub fn get_relationship(&self, id: i64) -> Result<Option<Relationship>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let relationship = conn
            .query_row(
                &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = ?"),
                [id],
                relationship_from_row,
            )
            .optional()?;
        Ok(relationship)
    }

    /// Create a directed edge. No inverse edge is created.
    pub fn create_relationship(
        &self,
        actor: &Actor,
        input: CreateRelationshipInput,
    ) -> Result<Relationship> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let individual = query_individual(&conn, input.individual_id)?;
        let related = query_individual(&conn, input.related_individual_id)?;
        let existing = query_edges_between(
            &conn,
            input.individual_id,
            input.related_individual_id,
        )?;

        authz::validate_new_relationship(actor, individual.as_ref(), related.as_ref(), &existing)?;

        let relationship = insert_relationship(
            &conn,
            input.individual_id,
            input.related_individual_id,
            input.relationship_type,
        )?;
        tracing::info!(
            "Created {} relationship {} -> {}",
            relationship.relationship_type.as_str(),
            relationship.individual_id,
            relationship.related_individual_id
        );
        Ok(relationship)
    }

    pub fn delete_relationship(&self, actor: &Actor, id: i64) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let relationship = conn
            .query_row(
                &format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = ?"),
                [id],
                relationship_from_row,
            )
            .optional()?
            .ok_or_else(|| DomainError::not_found("Relationship"))?;

        let individual = query_individual(&conn, relationship.individual_id)?;
        let related = query_individual(&conn, relationship.related_individual_id)?;
        let allowed = match (&individual, &related) {
            (Some(a), Some(b)) => authz::can_link(actor, a, b),
            _ => actor.is_admin(),
        };
        if !allowed {
            return Err(
                DomainError::forbidden("Not authorized to delete this relationship").into(),
            );
        }

        conn.execute("DELETE FROM relationships WHERE id = ?", [id])?;
        Ok(())
    }

    /// Every edge, in insertion order.
    pub fn get_all_edges(&self) -> Result<Vec<RelationshipEdge>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        query_all_edges(&conn)
    }

    // ============================================================
    // Tree operations
    // ============================================================

    /// Build the tree from the current data. `None` when there are no
    /// individuals.
    pub fn get_tree(&self) -> Result<Option<BuiltTree>> {
        let snapshot = self.fetch_snapshot()?;
        Ok(snapshot.build(&TracingLogger))
    }
}

impl TreeSource for Database {
    fn fetch_all_individuals(&self) -> Result<Vec<Individual>> {
        self.get_all_individuals()
    }

    fn fetch_all_edges(&self) -> Result<Vec<RelationshipEdge>> {
        self.get_all_edges()
    }

    /// Reads both tables under one lock so the snapshot is consistent.
    fn fetch_snapshot(&self) -> Result<TreeSnapshot> {
        let conn = self.conn.lock().expect("database lock poisoned");
        Ok(TreeSnapshot::new(
            query_all_individuals(&conn)?,
            query_all_edges(&conn)?,
        ))
    }
}

// ============================================================
// Shared queries
// ============================================================

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
            [email],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

fn purge_expired_tokens(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM auth_tokens WHERE expires_at < ?",
        [now.to_rfc3339()],
    )?;
    Ok(purged)
}

fn query_invitation_by_email(conn: &Connection, email: &str) -> Result<Option<Invitation>> {
    let invitation = conn
        .query_row(
            &format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE email = ?"),
            [email],
            invitation_from_row,
        )
        .optional()?;
    Ok(invitation)
}

fn query_individual(conn: &Connection, id: i64) -> Result<Option<Individual>> {
    let individual = conn
        .query_row(
            &format!("SELECT {INDIVIDUAL_COLUMNS} FROM individuals WHERE id = ?"),
            [id],
            individual_from_row,
        )
        .optional()?;
    Ok(individual)
}

fn query_all_individuals(conn: &Connection) -> Result<Vec<Individual>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INDIVIDUAL_COLUMNS} FROM individuals ORDER BY last_name, first_name, id"
    ))?;
    let individuals = stmt
        .query_map([], individual_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(individuals)
}

fn query_all_edges(conn: &Connection) -> Result<Vec<RelationshipEdge>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RELATIONSHIP_COLUMNS} FROM relationships ORDER BY id"
    ))?;
    let edges = stmt
        .query_map([], |row| {
            relationship_from_row(row).map(|r| RelationshipEdge::from(&r))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn query_edges_between(conn: &Connection, a: i64, b: i64) -> Result<Vec<RelationshipEdge>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
         WHERE (individual_id = ?1 AND related_individual_id = ?2)
            OR (individual_id = ?2 AND related_individual_id = ?1)"
    ))?;
    let edges = stmt
        .query_map([a, b], |row| {
            relationship_from_row(row).map(|r| RelationshipEdge::from(&r))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

fn insert_individual(
    conn: &Connection,
    actor: &Actor,
    input: CreateIndividualInput,
) -> Result<Individual> {
    validate_names(&input.first_name, &input.last_name)?;

    let now = Utc::now();
    let is_alive = input.is_alive.unwrap_or(true);
    let first_name = input.first_name.trim().to_string();
    let last_name = input.last_name.trim().to_string();

    conn.execute(
        "INSERT INTO individuals (user_id, first_name, last_name, birth_date, birth_place,
             death_date, death_place, is_alive, bio, photo_url, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            actor.user_id,
            &first_name,
            &last_name,
            input.birth_date.map(|d| d.to_string()),
            &input.birth_place,
            input.death_date.map(|d| d.to_string()),
            &input.death_place,
            is_alive,
            &input.bio,
            &input.photo_url,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Individual {
        id: conn.last_insert_rowid(),
        first_name,
        last_name,
        birth_date: input.birth_date,
        death_date: input.death_date,
        birth_place: input.birth_place,
        death_place: input.death_place,
        is_alive,
        bio: input.bio,
        photo_url: input.photo_url,
        owning_user_id: Some(actor.user_id),
        created_at: now,
        updated_at: now,
    })
}

fn insert_relationship(
    conn: &Connection,
    individual_id: i64,
    related_individual_id: i64,
    relationship_type: RelationshipType,
) -> Result<Relationship> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO relationships (individual_id, related_individual_id, relationship_type, created_at)
         VALUES (?, ?, ?, ?)",
        (
            individual_id,
            related_individual_id,
            relationship_type.as_str(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Relationship {
        id: conn.last_insert_rowid(),
        individual_id,
        related_individual_id,
        relationship_type,
        created_at: now,
    })
}

fn validate_names(first_name: &str, last_name: &str) -> Result<(), DomainError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(DomainError::invalid("First and last name are required"));
    }
    Ok(())
}

// ============================================================
// Row mapping
// ============================================================

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role: Role::from_str(&row.get::<_, String>(3)?).unwrap_or(Role::Member),
        is_approved: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn invitation_from_row(row: &Row<'_>) -> rusqlite::Result<Invitation> {
    Ok(Invitation {
        id: row.get(0)?,
        email: row.get(1)?,
        invited_by_user_id: row.get(2)?,
        status: InvitationStatus::from_str(&row.get::<_, String>(3)?)
            .unwrap_or(InvitationStatus::Pending),
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn individual_from_row(row: &Row<'_>) -> rusqlite::Result<Individual> {
    Ok(Individual {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date: parse_date(row.get(3)?),
        death_date: parse_date(row.get(4)?),
        birth_place: row.get(5)?,
        death_place: row.get(6)?,
        is_alive: row.get(7)?,
        bio: row.get(8)?,
        photo_url: row.get(9)?,
        owning_user_id: row.get(10)?,
        created_at: parse_datetime(row.get::<_, String>(11)?),
        updated_at: parse_datetime(row.get::<_, String>(12)?),
    })
}

fn relationship_from_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let kind: String = row.get(3)?;
    let relationship_type = RelationshipType::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown relationship type: {}", kind).into(),
        )
    })?;

    Ok(Relationship {
        id: row.get(0)?,
        individual_id: row.get(1)?,
        related_individual_id: row.get(2)?,
        relationship_type,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_date(s: Option<String>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
