mod common;

use anyhow::Result;
use common::NURSE;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn lookup_requires_credential() -> Result<()> {
    let server = common::start_server().await?;

    let res = server.client.get(server.url("/lookup/genders")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn genders_are_ordered_by_name() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let res = server.client.get(server.url("/lookup/genders")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(
        body["data"],
        json!([
            { "id": 2, "nombre": "Femenino" },
            { "id": 1, "nombre": "Masculino" },
            { "id": 3, "nombre": "Otro" }
        ])
    );
    Ok(())
}

#[tokio::test]
async fn document_types_and_departments_are_listed() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    for (kind, count) in [("document-types", 4), ("departments", 3)] {
        let res = server
            .client
            .get(server.url(&format!("/lookup/{}", kind)))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK, "{}", kind);

        let body: Value = res.json().await?;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(count), "{}", kind);
    }
    Ok(())
}

#[tokio::test]
async fn municipalities_filter_by_department() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let res = server
        .client
        .get(server.url("/lookup/municipalities"))
        .query(&[("departamento_id", "3")])
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(
        body["data"],
        json!([{ "id": 5, "nombre": "Cali" }, { "id": 6, "nombre": "Palmira" }])
    );
    Ok(())
}

#[tokio::test]
async fn municipalities_without_department_is_400() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    for query in [vec![], vec![("departamento_id", "0")], vec![("departamento_id", "abc")]] {
        let res = server
            .client
            .get(server.url("/lookup/municipalities"))
            .query(&query)
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body: Value = res.json().await?;
        assert_eq!(body["message"], "departamento_id is required");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_lookup_type_is_400() -> Result<()> {
    let server = common::start_server().await?;
    let token = server.login(NURSE).await?;

    let res = server.client.get(server.url("/lookup/planets")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "success": false, "message": "Invalid lookup type" }));
    Ok(())
}
