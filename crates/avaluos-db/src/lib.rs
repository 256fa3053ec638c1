//! Database repositories for the avalúos tracker
//!
//! Two tables are touched: `avaluos` (records, queried with the compiled filter
//! and updated one document column at a time) and `user_roles` (user id to
//! appraiser mapping, read only). Both repositories implement the collaborator
//! traits in [`db::traits`] so the service layer can run against other backends.

pub mod db;

pub use db::{
    connect, run_migrations, AppraiserDirectory, AvaluoRepository, AvaluoStore, UserRoleRepository,
};
