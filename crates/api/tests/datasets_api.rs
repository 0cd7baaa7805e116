//! Integration tests for the `/datasets` CRUD endpoints.

mod common;

use common::{
    body_json, build_test_app, create_dataset, delete, get, post_json, put_json, upload_images,
    ALICE, BOB, NO_SIDECAR,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn create_defaults_and_get(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);

    let id = create_dataset(&app, ALICE, json!({"name": "Street"})).await;

    let response = get(&app, &format!("/api/v1/datasets/{id}"), ALICE).await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["name"], "Street");
    assert_eq!(data["owner_id"], ALICE);
    assert_eq!(data["annotation_type"], "detection");
    assert_eq!(data["classes_to_annotate"], json!([]));
    assert_eq!(data["images"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_bad_configuration(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);

    let cases = [
        json!({"name": "  "}),
        json!({"name": "a", "annotation_type": "keypoints"}),
        json!({"name": "a", "model_id": "resnet"}),
    ];
    for body in cases {
        let response = post_json(&app, "/api/v1/datasets", ALICE, body.clone()).await;
        assert_eq!(response.status(), 400, "{body}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }

    // A custom model id that does not belong to the caller.
    let response = post_json(&app, "/api/v1/datasets", ALICE, json!({"name": "a", "model_id": "999"})).await;
    assert_eq!(response.status(), 404);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_only_shows_own_datasets(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);

    create_dataset(&app, ALICE, json!({"name": "one"})).await;
    create_dataset(&app, ALICE, json!({"name": "two"})).await;
    create_dataset(&app, BOB, json!({"name": "bob's"})).await;

    let json = body_json(get(&app, "/api/v1/datasets", ALICE).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(get(&app, "/api/v1/datasets?limit=1", ALICE).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let json = body_json(get(&app, "/api/v1/datasets", BOB).await).await;
    assert_eq!(json["data"][0]["name"], "bob's");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn update_changes_configuration(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);
    let id = create_dataset(&app, ALICE, json!({"name": "Street"})).await;

    let response = put_json(
        &app,
        &format!("/api/v1/datasets/{id}"),
        ALICE,
        json!({"annotation_type": "segmentation", "model_id": "sam", "classes_to_annotate": ["dog"]}),
    )
    .await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Street");
    assert_eq!(json["data"]["annotation_type"], "segmentation");
    assert_eq!(json["data"]["model_id"], "sam");
    assert_eq!(json["data"]["classes_to_annotate"], json!(["dog"]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn foreign_dataset_is_forbidden(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);
    let id = create_dataset(&app, ALICE, json!({"name": "private"})).await;
    let uri = format!("/api/v1/datasets/{id}");

    let response = get(&app, &uri, BOB).await;
    assert_eq!(response.status(), 403);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");

    assert_eq!(put_json(&app, &uri, BOB, json!({"name": "mine"})).await.status(), 403);
    assert_eq!(delete(&app, &uri, BOB).await.status(), 403);
    assert_eq!(get(&app, &uri, ALICE).await.status(), 200);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_dataset_is_not_found(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);

    let response = get(&app, "/api/v1/datasets/424242", ALICE).await;
    assert_eq!(response.status(), 404);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_cascades_to_images_and_files(pool: PgPool) {
    let app = build_test_app(pool, NO_SIDECAR);
    let id = create_dataset(&app, ALICE, json!({"name": "doomed"})).await;
    upload_images(&app, ALICE, id, &["a.png"], (8, 8)).await;

    let detail = body_json(get(&app, &format!("/api/v1/datasets/{id}"), ALICE).await).await;
    let image_id = detail["data"]["images"][0]["id"].as_i64().unwrap();
    let dataset_dir = app.upload_root().join(id.to_string());
    assert!(dataset_dir.exists());

    assert_eq!(delete(&app, &format!("/api/v1/datasets/{id}"), ALICE).await.status(), 204);

    assert_eq!(get(&app, &format!("/api/v1/datasets/{id}"), ALICE).await.status(), 404);
    assert_eq!(get(&app, &format!("/api/v1/images/{image_id}"), ALICE).await.status(), 404);
    assert!(!dataset_dir.exists());
}
