//! Repository implementations and their traits.

pub mod avaluo;
pub mod pool;
pub mod traits;
pub mod user_roles;

pub use avaluo::AvaluoRepository;
pub use pool::{connect, run_migrations};
pub use traits::{AppraiserDirectory, AvaluoStore};
pub use user_roles::UserRoleRepository;
