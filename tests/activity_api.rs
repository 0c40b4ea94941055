mod common;

use common::{spawn_app, TestApp};
use nutritrack::user::repo::User;
use serde_json::{json, Value};

async fn staff_with_token(app: &TestApp) -> (User, String) {
    let user = app.create_user("staff@example.com", "testpass123", true).await;
    let token = app.token_for(&user).await;
    (user, token)
}

#[tokio::test]
async fn anonymous_requests_are_rejected() {
    let app = spawn_app().await;
    let res = app
        .client
        .get(app.url("/activity/activities"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn non_staff_mutations_are_forbidden() {
    let app = spawn_app().await;
    let plain = app.create_user("plain@example.com", "testpass123", false).await;
    let token = app.token_for(&plain).await;

    let res = app
        .client
        .post(app.url("/activity/activities"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"title": "Alergare", "met": "2.4"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn create_and_list_share_the_single_shape() {
    let app = spawn_app().await;
    let (staff, token) = staff_with_token(&app).await;

    let res = app
        .client
        .post(app.url("/activity/activities"))
        .header("Authorization", format!("Bearer {token}"))
        .json(&json!({"title": "Alergare", "met": "2.4"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Alergare");
    assert_eq!(created["met"], "2.4");

    let res = app
        .client
        .get(app.url("/activity/activities"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    let list: Value = res.json().await.unwrap();
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let mut keys: Vec<&String> = items[0].as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, ["id", "met", "title"]);

    let stored = app.state.activities.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, staff.id);
}

#[tokio::test]
async fn listing_is_newest_first() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;

    for (title, met) in [("Alergare", "2.4"), ("Inot", "7.0")] {
        let res = app
            .client
            .post(app.url("/activity/activities"))
            .header("Authorization", format!("Bearer {token}"))
            .json(&json!({"title": title, "met": met}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    let res = app
        .client
        .get(app.url("/activity/activities"))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    let list: Value = res.json().await.unwrap();
    let items = list.as_array().unwrap();
    assert_eq!(items[0]["title"], "Inot");
    assert_eq!(items[1]["title"], "Alergare");
}

#[tokio::test]
async fn full_update_requires_both_fields_and_partial_does_not() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;
    let auth = format!("Bearer {token}");

    let res = app
        .client
        .post(app.url("/activity/activities"))
        .header("Authorization", &auth)
        .json(&json!({"title": "Alergare", "met": "2.4"}))
        .send()
        .await
        .unwrap();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = app
        .client
        .put(app.url(&format!("/activity/activities/{id}")))
        .header("Authorization", &auth)
        .json(&json!({"title": "Inot"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = app
        .client
        .patch(app.url(&format!("/activity/activities/{id}")))
        .header("Authorization", &auth)
        .json(&json!({"title": "Inot"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Inot");
    assert_eq!(updated["met"], "2.4");
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let app = spawn_app().await;
    let (_, token) = staff_with_token(&app).await;
    let auth = format!("Bearer {token}");

    let res = app
        .client
        .get(app.url("/activity/activities/4242"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = app
        .client
        .delete(app.url("/activity/activities/4242"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
