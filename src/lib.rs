//! Family tree service: profiles, relationships, an invite-and-approve
//! account workflow, and tree views built from the relationship graph.

pub mod api;
pub mod authz;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod models;
pub mod tree;
