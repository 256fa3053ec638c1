use async_trait::async_trait;
use avaluos_core::{
    constants::AVALUOS_TABLE, AppError, Avaluo, AvaluoId, AvaluoQuery, DocumentSlot,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::traits::AvaluoStore;

const AVALUO_COLUMNS: &str = "id, direccion, folio_shit, folio, escritura, rpp, num_oficial, \
     predial, agua, luz, prueba_edad, ine_comp, rfc_comp, ine_vend, rfc_vend, solicitud, plano, \
     nss, cerrado, cancelado, enviado";

/// Repository for the `avaluos` table
#[derive(Clone)]
pub struct AvaluoRepository {
    pool: PgPool,
}

impl AvaluoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Render a compiled filter as a parameterized SELECT.
///
/// `cancelado` is always constrained. The `cerrado` alternatives are
/// OR-combined in one parenthesized group and omitted when empty.
pub fn build_query(query: &AvaluoQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE cancelado = ",
        AVALUO_COLUMNS, AVALUOS_TABLE
    ));
    builder.push_bind(query.cancelled);

    if let Some(ref needle) = query.direccion_contains {
        builder.push(" AND direccion ILIKE ");
        builder.push_bind(contains_pattern(needle));
    }

    if let Some(ref needle) = query.folio_shit_contains {
        builder.push(" AND folio_shit ILIKE ");
        builder.push_bind(contains_pattern(needle));
    }

    if !query.closed_any_of.is_empty() {
        builder.push(" AND (");
        {
            let mut alternatives = builder.separated(" OR ");
            for closed in &query.closed_any_of {
                alternatives.push("cerrado = ");
                alternatives.push_bind_unseparated(*closed);
            }
        }
        builder.push(")");
    }

    if query.require_sent {
        builder.push(" AND enviado IS NOT NULL");
    }

    builder.push(" ORDER BY folio_shit ASC");
    builder
}

/// `%needle%` with LIKE metacharacters escaped (backslash is the default escape)
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl AvaluoStore for AvaluoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "avaluos", db.operation = "select"))]
    async fn query(&self, query: &AvaluoQuery) -> Result<Vec<Avaluo>, AppError> {
        let mut builder = build_query(query);
        let rows = builder
            .build_query_as::<Avaluo>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Avalúos query failed");
                AppError::Query(e.to_string())
            })?;

        tracing::debug!(count = rows.len(), "Avalúos fetched");
        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "avaluos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: AvaluoId) -> Result<Option<Avaluo>, AppError> {
        let avaluo = sqlx::query_as::<Postgres, Avaluo>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            AVALUO_COLUMNS, AVALUOS_TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(avaluo)
    }

    #[tracing::instrument(skip(self), fields(db.table = "avaluos", db.operation = "update", db.record_id = %id))]
    async fn update_document(
        &self,
        id: AvaluoId,
        slot: DocumentSlot,
        reference: &str,
    ) -> Result<(), AppError> {
        // Column name comes from the closed DocumentSlot set, never from input.
        let sql = format!(
            "UPDATE {} SET {} = $1 WHERE id = $2",
            AVALUOS_TABLE,
            slot.column()
        );
        let result = sqlx::query(&sql)
            .bind(reference)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, slot = %slot, "Document column update failed");
                AppError::Update(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Update(format!("Avalúo {} no encontrado", id)));
        }

        Ok(())
    }
}
