use async_trait::async_trait;
use avaluos_core::{constants::USER_ROLES_TABLE, AppError, AppraiserId, UserId};
use sqlx::{PgPool, Postgres};

use super::traits::AppraiserDirectory;

/// Read-only access to `user_roles`
#[derive(Clone)]
pub struct UserRoleRepository {
    pool: PgPool,
}

impl UserRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppraiserDirectory for UserRoleRepository {
    #[tracing::instrument(skip(self), fields(db.table = "user_roles", db.operation = "select"))]
    async fn appraiser_id(&self, user_id: UserId) -> Result<Option<AppraiserId>, AppError> {
        let sql = format!("SELECT perito FROM {} WHERE user_id = $1", USER_ROLES_TABLE);
        let perito = sqlx::query_scalar::<Postgres, Option<String>>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .flatten()
            .filter(|p| !p.is_empty());

        Ok(perito.map(AppraiserId))
    }
}
