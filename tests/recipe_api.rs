mod common;

use common::{spawn_app, TestApp};
use nutritrack::user::repo::User;
use serde_json::{json, Value};

fn sample_recipe() -> Value {
    json!({
        "title": "Hamburger",
        "category": "Fast-food",
        "time_minutes": 15,
        "calories": "277.0",
        "protein": "12.8",
        "carbs": "0.4",
        "fibers": "0.0",
        "fat": "24.9",
        "description": "Hamburger Black Angus",
        "ingredients": "1 Hamburger",
    })
}

async fn staff_with_token(app: &TestApp) -> (User, String) {
    let user = app.create_user("staff@example.com", "testpass123", true).await;
    let token = app.token_for(&user).await;
    (user, token)
}

fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(1, 1));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn anonymous_requests_are_rejected() {
    let app = spawn_app().await;

    let res = app.client.get(app.url("/recipe/recipes")).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = app
        .client
        .delete(app.url("/recipe/recipes/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn non_staff_users_can_read_but_not_write() {
    let app = spawn_app().await;
    let (_, staff_token) = staff_with_token(&app).await;
    let plain = app.create_user("plain@example.com", "testpass123", false).await;
    let plain_token = app.token_for(&plain).await;

    // seed one recipe as staff
    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {staff_token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let auth = format!("Bearer {plain_token}");
    let res = app
        .client
        .get(app.url("/recipe/recipes"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", &auth)
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .patch(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", &auth)
        .json(&json!({"title": "NEW"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .delete(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn create_round_trips_every_writable_field() {
    let app = spawn_app().await;
    let (staff, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .get(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let detail: Value = res.json().await.unwrap();
    for (field, expected) in sample_recipe().as_object().unwrap() {
        assert_eq!(&detail[field], expected, "{field}");
    }

    // the owner is the caller, and it is not part of the projection
    assert!(detail.get("user_id").is_none());
    let stored = app.state.recipes.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, staff.id);
}

#[tokio::test]
async fn create_forces_the_owner_to_the_caller() {
    let app = spawn_app().await;
    let (staff, token) = staff_with_token(&app).await;
    let other = app.create_user("other@example.com", "testpass123", true).await;

    let mut payload = sample_recipe();
    payload["user"] = json!(other.id);
    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();

    let stored = app
        .state
        .recipes
        .find_by_id(created["id"].as_i64().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.user_id, staff.id);
}

#[tokio::test]
async fn create_reports_missing_fields_per_field() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"title": "Toast"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["calories"], json!(["This field is required."]));
    assert_eq!(body["category"], json!(["This field is required."]));
    assert!(body.get("title").is_none());
}

#[tokio::test]
async fn list_is_newest_first_in_the_summary_projection() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    for title in ["First", "Second"] {
        let mut payload = sample_recipe();
        payload["title"] = json!(title);
        let res = app
            .client
            .post(app.url("/recipe/recipes"))
            .header("Authorization", format!("Bearer {token}"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    let res = app
        .client
        .get(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let list: Value = res.json().await.unwrap();
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0]["id"].as_i64() > items[1]["id"].as_i64());
    assert_eq!(items[0]["title"], "Second");

    let mut keys: Vec<&String> = items[0].as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, ["calories", "id", "image", "title"]);
}

#[tokio::test]
async fn partial_update_changes_only_the_supplied_field() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .patch(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"title": "NEW"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "NEW");
    assert_eq!(updated["time_minutes"], 15);
    assert_eq!(updated["calories"], "277.0");
    assert_eq!(updated["description"], "Hamburger Black Angus");
}

#[tokio::test]
async fn full_update_requires_the_whole_writable_set() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .put(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"title": "Only title"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let full = json!({
        "title": "New Sample Recipe",
        "category": "New Sample Category",
        "time_minutes": 24,
        "calories": "780.4",
        "protein": "28.3",
        "carbs": "45.3",
        "fibers": "5.3",
        "fat": "61.3",
        "description": "New Description",
        "ingredients": "New Ingredients",
    });
    let res = app
        .client
        .put(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", format!("Bearer {token}"))
        .json(&full)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let updated: Value = res.json().await.unwrap();
    for (field, expected) in full.as_object().unwrap() {
        assert_eq!(&updated[field], expected, "{field}");
    }
}

#[tokio::test]
async fn updates_silently_ignore_the_owner_field() {
    let app = spawn_app().await;
    let (staff, token) = staff_with_token(&app).await;
    let other = app.create_user("other@example.com", "testpass123", true).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .patch(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"user": other.id}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let stored = app.state.recipes.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, staff.id);
}

#[tokio::test]
async fn delete_is_not_idempotent() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let auth = format!("Bearer {token}");
    let res = app
        .client
        .delete(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let res = app
        .client
        .get(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = app
        .client
        .delete(app.url(&format!("/recipe/recipes/{id}")))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    // unknown id from the start is 404 as well
    let res = app
        .client
        .delete(app.url("/recipe/recipes/4242"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn upload_image_replaces_the_reference() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let part = reqwest::multipart::Part::bytes(png_bytes())
        .file_name("test.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);

    let res = app
        .client
        .post(app.url(&format!("/recipe/recipes/{id}/upload-image")))
        .header("Authorization", format!("Bearer {token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let detail: Value = res.json().await.unwrap();
    let image = detail["image"].as_str().expect("image set");
    assert!(image.starts_with("uploads/recipe/"));
    assert!(image.ends_with(".png"));
    assert_eq!(detail["title"], "Hamburger");
}

#[tokio::test]
async fn upload_image_rejects_non_image_payloads() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let part = reqwest::multipart::Part::bytes(b"notanimage".to_vec()).file_name("x.png");
    let form = reqwest::multipart::Form::new().part("image", part);

    let res = app
        .client
        .post(app.url(&format!("/recipe/recipes/{id}/upload-image")))
        .header("Authorization", format!("Bearer {token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("image").is_some());
}

#[tokio::test]
async fn upload_image_checks_staff_after_validation() {
    let app = spawn_app().await;
    let (_, staff_token) = staff_with_token(&app).await;
    let plain = app.create_user("plain@example.com", "testpass123", false).await;
    let plain_token = app.token_for(&plain).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {staff_token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    // a valid image from a non-staff caller is forbidden, not invalid
    let part = reqwest::multipart::Part::bytes(png_bytes())
        .file_name("test.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);
    let res = app
        .client
        .post(app.url(&format!("/recipe/recipes/{id}/upload-image")))
        .header("Authorization", format!("Bearer {plain_token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // and nothing was persisted
    let stored = app.state.recipes.find_by_id(id).await.unwrap().unwrap();
    assert!(stored.image.is_none());

    // a broken payload from the same caller is a validation error instead
    let part = reqwest::multipart::Part::bytes(b"junk".to_vec()).file_name("x.png");
    let form = reqwest::multipart::Form::new().part("image", part);
    let res = app
        .client
        .post(app.url(&format!("/recipe/recipes/{id}/upload-image")))
        .header("Authorization", format!("Bearer {plain_token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn upload_image_requires_the_image_part() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/recipe/recipes"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&sample_recipe())
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let form = reqwest::multipart::Form::new().text("file", "nope");
    let res = app
        .client
        .post(app.url(&format!("/recipe/recipes/{id}/upload-image")))
        .header("Authorization", format!("Bearer {token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["image"], json!(["No file was submitted."]));
}

#[tokio::test]
async fn upload_image_for_missing_recipe_is_404() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    let part = reqwest::multipart::Part::bytes(png_bytes())
        .file_name("test.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);
    let res = app
        .client
        .post(app.url("/recipe/recipes/4242/upload-image"))
        .header("Authorization", format!("Bearer {token}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
