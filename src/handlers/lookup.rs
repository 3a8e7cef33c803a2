use axum::response::{IntoResponse, Response};

use crate::app::AppState;
use crate::database::models::LookupKind;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, RequestContext};

/// GET /lookup/{type}; `municipalities` also needs `?departamento_id=`.
pub async fn lookup(state: AppState, ctx: RequestContext, params: Vec<String>) -> Result<Response, ApiError> {
    state.guard.require_claims(&ctx)?;

    let kind = params
        .first()
        .and_then(|raw| raw.parse::<LookupKind>().ok())
        .ok_or_else(|| ApiError::bad_request("Invalid lookup type"))?;

    let items = match kind {
        LookupKind::DocumentTypes => state.store.document_types().await?,
        LookupKind::Genders => state.store.genders().await?,
        LookupKind::Departments => state.store.departments().await?,
        LookupKind::Municipalities => {
            let departamento_id = department_param(&ctx)?;
            state.store.municipalities(departamento_id).await?
        }
    };

    Ok(ApiResponse::success(items).into_response())
}

fn department_param(ctx: &RequestContext) -> Result<i64, ApiError> {
    ctx.query_param("departamento_id")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("departamento_id is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn department_must_be_positive_integer() {
        let ctx = |qs: &str| RequestContext::new(Method::GET, "/lookup/municipalities").with_query(qs);
        assert_eq!(department_param(&ctx("departamento_id=3")).unwrap(), 3);
        assert!(department_param(&ctx("")).is_err());
        assert!(department_param(&ctx("departamento_id=0")).is_err());
        assert!(department_param(&ctx("departamento_id=x")).is_err());
    }
}
