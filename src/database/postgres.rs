use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::manager::DatabaseError;
use super::models::{LookupItem, Page, Patient, PatientInput, PatientQuery, PatientSummary, UserProfile, UserRecord};
use super::store::{LookupStore, PatientStore, RegistryStore, UserStore};

const SUMMARY_COLUMNS: &str = "p.id, p.numero_documento, p.nombre1, p.nombre2, p.apellido1, p.apellido2, \
     p.correo, p.telefono, p.estado, p.created_at, \
     td.nombre AS tipo_documento, g.nombre AS genero, d.nombre AS departamento, m.nombre AS municipio";

const REFERENCE_JOINS: &str = "FROM paciente p \
     LEFT JOIN tipos_documento td ON p.tipo_documento_id = td.id \
     LEFT JOIN genero g ON p.genero_id = g.id \
     LEFT JOIN departamentos d ON p.departamento_id = d.id \
     LEFT JOIN municipios m ON p.municipio_id = m.id";

// $1 is NULL when no search term was given.
const SEARCH_FILTER: &str = "WHERE ($1::text IS NULL \
     OR p.nombre1 ILIKE $1 OR p.nombre2 ILIKE $1 OR p.apellido1 ILIKE $1 \
     OR p.apellido2 ILIKE $1 OR p.correo ILIKE $1 OR p.numero_documento ILIKE $1)";

/// PostgreSQL-backed registry store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `%term%` with LIKE wildcards in `term` matched literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl PatientStore for PgStore {
    async fn list_patients(&self, query: &PatientQuery) -> Result<Page<PatientSummary>, DatabaseError> {
        let pattern = query.search.as_deref().map(like_pattern);

        let list_sql = format!(
            "SELECT {} {} {} ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3",
            SUMMARY_COLUMNS, REFERENCE_JOINS, SEARCH_FILTER
        );
        let items = sqlx::query_as::<_, PatientSummary>(&list_sql)
            .bind(&pattern)
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM paciente p {}", SEARCH_FILTER);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        debug!("Listed {} of {} patients (page {})", items.len(), total, query.page);
        Ok(Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn find_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        let sql = format!(
            "SELECT p.*, td.nombre AS tipo_documento, g.nombre AS genero, \
             d.nombre AS departamento, m.nombre AS municipio {} WHERE p.id = $1",
            REFERENCE_JOINS
        );
        let patient = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(patient)
    }

    async fn document_exists(&self, numero_documento: &str, exclude_id: Option<i64>) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM paciente WHERE numero_documento = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(numero_documento)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_patient(&self, input: &PatientInput) -> Result<i64, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO paciente (\
                tipo_documento_id, numero_documento, nombre1, nombre2, apellido1, apellido2, \
                genero_id, departamento_id, municipio_id, correo, telefono, fecha_nacimiento, \
                direccion, estado\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id",
        )
        .bind(input.tipo_documento_id)
        .bind(&input.numero_documento)
        .bind(&input.nombre1)
        .bind(&input.nombre2)
        .bind(&input.apellido1)
        .bind(&input.apellido2)
        .bind(input.genero_id)
        .bind(input.departamento_id)
        .bind(input.municipio_id)
        .bind(&input.correo)
        .bind(&input.telefono)
        .bind(input.fecha_nacimiento)
        .bind(&input.direccion)
        .bind(&input.estado)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_patient(&self, id: i64, input: &PatientInput) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE paciente SET \
                tipo_documento_id = $1, numero_documento = $2, nombre1 = $3, nombre2 = $4, \
                apellido1 = $5, apellido2 = $6, genero_id = $7, departamento_id = $8, \
                municipio_id = $9, correo = $10, telefono = $11, fecha_nacimiento = $12, \
                direccion = $13, estado = $14, updated_at = NOW() \
             WHERE id = $15",
        )
        .bind(input.tipo_documento_id)
        .bind(&input.numero_documento)
        .bind(&input.nombre1)
        .bind(&input.nombre2)
        .bind(&input.apellido1)
        .bind(&input.apellido2)
        .bind(input.genero_id)
        .bind(input.departamento_id)
        .bind(input.municipio_id)
        .bind(&input.correo)
        .bind(&input.telefono)
        .bind(input.fecha_nacimiento)
        .bind(&input.direccion)
        .bind(&input.estado)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_patient(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM paciente WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LookupStore for PgStore {
    async fn document_types(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        let items = sqlx::query_as("SELECT id, nombre FROM tipos_documento ORDER BY nombre")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn genders(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        let items = sqlx::query_as("SELECT id, nombre FROM genero ORDER BY nombre")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn departments(&self) -> Result<Vec<LookupItem>, DatabaseError> {
        let items = sqlx::query_as("SELECT id, nombre FROM departamentos ORDER BY nombre")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn municipalities(&self, departamento_id: i64) -> Result<Vec<LookupItem>, DatabaseError> {
        let items = sqlx::query_as("SELECT id, nombre FROM municipios WHERE departamento_id = $1 ORDER BY nombre")
            .bind(departamento_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let user = sqlx::query_as("SELECT id, username, email, password, role, is_active FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_profile(&self, id: i64) -> Result<Option<UserProfile>, DatabaseError> {
        let user = sqlx::query_as("SELECT id, username, email, role, is_active FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl RegistryStore for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
