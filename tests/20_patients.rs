mod common;

use anyhow::Result;
use common::{patient_body, ADMIN, NURSE};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn patient_routes_require_credential() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;

    let res = server.client.get(server.url("/patients")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.client.get(server.url("/patients/1")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.client.post(server.url("/patients")).json(&patient_body("55555555")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.client.delete(server.url("/patients/1")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.store.patient_count(), 3);
    Ok(())
}

#[tokio::test]
async fn list_paginates_newest_first() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .get(server.url("/patients"))
        .query(&[("page", "1"), ("limit", "2")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 }));

    let items = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["numero_documento"], "10000003");

    let res = server
        .client
        .get(server.url("/patients"))
        .query(&[("page", "2"), ("limit", "2")])
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn list_clamps_out_of_range_paging() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .get(server.url("/patients"))
        .query(&[("page", "0"), ("limit", "5000")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 100);
    Ok(())
}

#[tokio::test]
async fn list_search_matches_names_case_insensitively() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .get(server.url("/patients"))
        .query(&[("search", "GOMEZ")])
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 2);

    let res = server
        .client
        .get(server.url("/patients"))
        .query(&[("search", "nobody-here")])
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 0);
    assert_eq!(body["pagination"]["pages"], 0);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn show_returns_joined_names() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    let res = server.client.get(server.url("/patients/1")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["nombre1"], "Ana");
    assert_eq!(body["data"]["genero"], "Femenino");
    assert_eq!(body["data"]["municipio"], "Medellín");

    // Trailing slash resolves to the same route
    let res = server.client.get(server.url("/patients/1/")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn show_unknown_or_malformed_id_is_404() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    for id in ["999", "abc", "0"] {
        let res = server
            .client
            .get(server.url(&format!("/patients/{}", id)))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "id {}", id);

        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Patient not found");
    }
    Ok(())
}

#[tokio::test]
async fn create_persists_sanitized_record() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let mut payload = patient_body("55555555");
    payload["direccion"] = json!("<script>alert(1)</script> Calle 10");
    payload["nombre2"] = json!("");

    let res = server
        .client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Patient created successfully");
    let id = body["data"]["id"].as_i64().unwrap_or_default();
    assert!(id > 0);

    let res = server
        .client
        .get(server.url(&format!("/patients/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let direccion = body["data"]["direccion"].as_str().unwrap_or_default();
    assert!(!direccion.contains("<script>"));
    assert!(direccion.contains("&lt;script&gt;"));
    assert_eq!(body["data"]["nombre2"], Value::Null);
    assert_eq!(body["data"]["estado"], "activo");
    assert_eq!(body["data"]["fecha_nacimiento"], "1988-02-29");
    Ok(())
}

#[tokio::test]
async fn create_accepts_text_that_grows_when_escaped() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let mut payload = patient_body("66666666");
    payload["nombre1"] = json!("O'".repeat(50));
    payload["direccion"] = json!("Edificio AT&amp;T, piso 3");

    let res = server
        .client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let id = body["data"]["id"].as_i64().unwrap_or_default();

    let res = server
        .client
        .get(server.url(&format!("/patients/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    let body: Value = res.json().await?;
    let nombre1 = body["data"]["nombre1"].as_str().unwrap_or_default();
    assert_eq!(nombre1, "O&#039;".repeat(50));
    assert!(nombre1.chars().count() > 100);
    assert_eq!(body["data"]["direccion"], "Edificio AT&amp;amp;T, piso 3");
    Ok(())
}

#[tokio::test]
async fn create_reports_every_failing_field() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&json!({
            "tipo_documento_id": "x",
            "numero_documento": "123",
            "nombre1": "A",
            "correo": "not-an-email",
            "telefono": "12"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    for field in [
        "tipo_documento_id",
        "numero_documento",
        "nombre1",
        "apellido1",
        "genero_id",
        "departamento_id",
        "municipio_id",
        "correo",
        "telefono",
    ] {
        assert!(body["errors"][field].is_array(), "missing error for {}", field);
    }
    assert!(body["errors"].get("fecha_nacimiento").is_none());
    assert_eq!(server.store.patient_count(), 0);
    Ok(())
}

#[tokio::test]
async fn create_rejects_duplicate_document() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .post(server.url("/patients"))
        .bearer_auth(&token)
        .json(&patient_body("10000001"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Document number already exists");
    assert_eq!(server.store.patient_count(), 3);
    Ok(())
}

#[tokio::test]
async fn update_keeps_own_document_and_rejects_anothers() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;
    let token = server.login(NURSE).await?;

    // Re-saving with its own document number is not a duplicate
    let mut payload = patient_body("10000002");
    payload["nombre1"] = json!("Bruna");
    let res = server
        .client
        .put(server.url("/patients/2"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Patient updated successfully");

    let res = server.client.get(server.url("/patients/2")).bearer_auth(&token).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["nombre1"], "Bruna");

    let res = server
        .client
        .put(server.url("/patients/2"))
        .bearer_auth(&token)
        .json(&patient_body("10000001"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_missing_patient_is_404() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .put(server.url("/patients/42"))
        .bearer_auth(&token)
        .json(&patient_body("55555555"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_requires_admin_role() -> Result<()> {
    let server = common::start_server_with(common::store_with_patients()?).await?;

    let nurse = server.login(NURSE).await?;
    let res = server.client.delete(server.url("/patients/1")).bearer_auth(&nurse).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.store.patient_count(), 3);

    let admin = server.login(ADMIN).await?;
    let res = server.client.delete(server.url("/patients/1")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Patient deleted successfully");
    assert_eq!(server.store.patient_count(), 2);

    let res = server.client.delete(server.url("/patients/1")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
