use axum::response::{IntoResponse, Response};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::app::AppState;
use crate::config::PaginationConfig;
use crate::database::models::{PatientInput, PatientQuery};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, MessageResponse, Pagination, RequestContext};
use crate::validation::{sanitize_record, sanitize_string, Rule, RuleSet, Validator};

static PATIENT_RULES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new()
        .field("tipo_documento_id", [Rule::Required, Rule::Numeric])
        .field("numero_documento", [Rule::Required, Rule::Documento])
        .field("nombre1", [Rule::Required, Rule::Min(2), Rule::Max(100)])
        .field("nombre2", [Rule::Max(100)])
        .field("apellido1", [Rule::Required, Rule::Min(2), Rule::Max(100)])
        .field("apellido2", [Rule::Max(100)])
        .field("genero_id", [Rule::Required, Rule::Numeric])
        .field("departamento_id", [Rule::Required, Rule::Numeric])
        .field("municipio_id", [Rule::Required, Rule::Numeric])
        .field("correo", [Rule::Email, Rule::Max(100)])
        .field("telefono", [Rule::Phone])
        .field("fecha_nacimiento", [Rule::Date])
        .field("direccion", [Rule::Max(255)])
        .field("estado", [Rule::Max(20)])
});

const NOT_FOUND: &str = "Patient not found";

/// GET /patients?page=&limit=&search=
pub async fn list(state: AppState, ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    state.guard.require_claims(&ctx)?;

    let query = list_query(&ctx, &state.config.pagination);
    let page = state.store.list_patients(&query).await?;

    Ok(ApiResponse::success(&page.items)
        .with_pagination(Pagination::from(&page))
        .into_response())
}

/// GET /patients/{id}
pub async fn show(state: AppState, ctx: RequestContext, params: Vec<String>) -> Result<Response, ApiError> {
    state.guard.require_claims(&ctx)?;

    let id = patient_id(&params)?;
    let patient = state
        .store
        .find_patient(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(patient).into_response())
}

/// POST /patients
pub async fn create(state: AppState, ctx: RequestContext, _params: Vec<String>) -> Result<Response, ApiError> {
    let identity = state.guard.require(&ctx)?;

    let input = validated_input(ctx.json_body()?)?;
    ensure_unique_document(&state, &input.numero_documento, None).await?;

    let id = state.store.create_patient(&input).await?;
    info!("Patient {} created by '{}'", id, identity.username);

    Ok(ApiResponse::created(json!({ "id": id }))
        .with_message("Patient created successfully")
        .into_response())
}

/// PUT /patients/{id}
pub async fn update(state: AppState, ctx: RequestContext, params: Vec<String>) -> Result<Response, ApiError> {
    let identity = state.guard.require(&ctx)?;

    let id = patient_id(&params)?;
    if state.store.find_patient(id).await?.is_none() {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let input = validated_input(ctx.json_body()?)?;
    ensure_unique_document(&state, &input.numero_documento, Some(id)).await?;

    if !state.store.update_patient(id, &input).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!("Patient {} updated by '{}'", id, identity.username);

    Ok(MessageResponse::message("Patient updated successfully").into_response())
}

/// DELETE /patients/{id}, admin only.
pub async fn delete(state: AppState, ctx: RequestContext, params: Vec<String>) -> Result<Response, ApiError> {
    let identity = state.guard.require(&ctx)?;
    if !identity.is_admin() {
        warn!("User '{}' ({}) attempted to delete a patient", identity.username, identity.role);
        return Err(ApiError::forbidden("Forbidden: admin role required"));
    }

    let id = patient_id(&params)?;
    if !state.store.delete_patient(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!("Patient {} deleted by '{}'", id, identity.username);

    Ok(MessageResponse::message("Patient deleted successfully").into_response())
}

/// Validates against the patient rules, then sanitizes and converts.
fn validated_input(body: Map<String, Value>) -> Result<PatientInput, ApiError> {
    let mut validator = Validator::new();
    if !validator.validate(&body, &PATIENT_RULES) {
        return Err(ApiError::validation_failed(validator.into_errors()));
    }

    PatientInput::from_record(&sanitize_record(body)).map_err(ApiError::bad_request)
}

async fn ensure_unique_document(state: &AppState, numero_documento: &str, exclude_id: Option<i64>) -> Result<(), ApiError> {
    if state.store.document_exists(numero_documento, exclude_id).await? {
        return Err(ApiError::bad_request("Document number already exists"));
    }
    Ok(())
}

/// Unparsable ids cannot name a patient, so they are reported as not found.
fn patient_id(params: &[String]) -> Result<i64, ApiError> {
    params
        .first()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

fn list_query(ctx: &RequestContext, pagination: &PaginationConfig) -> PatientQuery {
    let page = ctx
        .query_param("page")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(1)
        .max(1);

    let limit = ctx
        .query_param("limit")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(pagination.default_limit)
        .clamp(1, pagination.max_limit.max(1));

    let search = ctx
        .query_param("search")
        .map(sanitize_string)
        .filter(|s| !s.is_empty());

    PatientQuery { page, limit, search }
}
