// tests/post_tests.rs

mod common;

use common::{ALICE, BORA, ids, spawn_app, staff_token, token};
use serde_json::{Value, json};

#[tokio::test]
async fn create_and_fetch_post_counts_views() {
    let app = spawn_app().await;
    let alice = token(ALICE);

    let resp = app
        .post("/posts", Some(&alice))
        .json(&json!({
            "title": "Comeback stage",
            "content": "Friday 8pm",
            "image_url": "https://cdn.example.com/stage.png"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["author"], json!({ "id": ALICE.0, "username": "alice" }));
    assert_eq!(created["views"], 0);
    assert_eq!(created["image_url"], "https://cdn.example.com/stage.png");
    let id = created["id"].as_i64().unwrap();

    let first = app.json(app.get(&format!("/posts/{}", id), None)).await;
    let second = app.json(app.get(&format!("/posts/{}", id), None)).await;
    assert_eq!(first["views"], 1);
    assert_eq!(second["views"], 2);
}

#[tokio::test]
async fn invalid_post_uses_error_envelope() {
    let app = spawn_app().await;

    let resp = app
        .post("/posts", Some(&token(ALICE)))
        .json(&json!({ "title": "", "content": "x", "image_url": "ftp://nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["message"].is_string());
    assert!(body["data"]["title"].is_array());
    assert!(body["data"]["image_url"].is_array());
}

#[tokio::test]
async fn soft_delete_hides_post_until_restored() {
    let app = spawn_app().await;
    let alice = token(ALICE);
    let kept = app.create_post(&alice, "kept").await;
    let dropped = app.create_post(&alice, "dropped").await;

    let resp = app
        .delete(&format!("/posts/{}", dropped), Some(&alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let feed = app.json(app.get("/posts", None)).await;
    assert_eq!(ids(&feed), vec![kept]);

    let lookup = app
        .get(&format!("/posts/{}", dropped), None)
        .send()
        .await
        .unwrap();
    assert_eq!(lookup.status().as_u16(), 404);

    let restored = app
        .post(&format!("/posts/{}/restore", dropped), Some(&alice))
        .send()
        .await
        .unwrap();
    assert_eq!(restored.status().as_u16(), 200);

    let feed = app.json(app.get("/posts", None)).await;
    assert_eq!(ids(&feed), vec![dropped, kept]);
}

#[tokio::test]
async fn ownership_gate_on_posts() {
    let app = spawn_app().await;
    let alice = token(ALICE);
    let bora = token(BORA);
    let post = app.create_post(&alice, "mine").await;

    let edit = app
        .patch(&format!("/posts/{}", post), Some(&bora))
        .json(&json!({ "title": "theirs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 403);
    let body: Value = edit.json().await.unwrap();
    assert_eq!(body["code"], 403);

    for path in [format!("/posts/{}", post), format!("/posts/{}/purge", post)] {
        let resp = app.delete(&path, Some(&bora)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 403);
    }

    let stored = app.json(app.get(&format!("/posts/{}", post), None)).await;
    assert_eq!(stored["title"], "mine");

    let own_edit = app
        .patch(&format!("/posts/{}", post), Some(&alice))
        .json(&json!({ "content": "updated body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(own_edit.status().as_u16(), 200);
    let edited: Value = own_edit.json().await.unwrap();
    assert_eq!(edited["title"], "mine");
    assert_eq!(edited["content"], "updated body");

    let staff_delete = app
        .delete(&format!("/posts/{}", post), Some(&staff_token()))
        .send()
        .await
        .unwrap();
    assert_eq!(staff_delete.status().as_u16(), 204);
}

#[tokio::test]
async fn purge_removes_comments_and_likes() {
    let app = spawn_app().await;
    let alice = token(ALICE);
    let bora = token(BORA);
    let post = app.create_post(&alice, "P").await;
    let c1 = app.create_comment(&bora, post, "C1", None).await;
    let c2 = app.create_comment(&alice, post, "C2", Some(c1)).await;
    app.delete(&format!("/comments/{}", c2), Some(&alice))
        .send()
        .await
        .unwrap();
    app.post(&format!("/posts/{}/likes", post), Some(&bora))
        .send()
        .await
        .unwrap();
    app.post(&format!("/comments/{}/likes", c1), Some(&alice))
        .send()
        .await
        .unwrap();

    let resp = app
        .delete(&format!("/posts/{}/purge", post), Some(&alice))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(comments, 0);
    assert_eq!(likes, 0);

    let lookup = app
        .post(&format!("/posts/{}/restore", post), Some(&alice))
        .send()
        .await
        .unwrap();
    assert_eq!(lookup.status().as_u16(), 404);
}

#[tokio::test]
async fn feed_pages_by_cursor() {
    let app = spawn_app().await;
    let alice = token(ALICE);
    let mut created = Vec::new();
    for i in 0..3 {
        created.push(app.create_post(&alice, &format!("post {}", i)).await);
    }

    let page = app.json(app.get("/posts?limit=2", None)).await;
    assert_eq!(ids(&page), vec![created[2], created[1]]);

    let next = app
        .json(app.get(&format!("/posts?limit=2&cursor={}", created[1]), None))
        .await;
    assert_eq!(ids(&next), vec![created[0]]);
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let app = spawn_app().await;

    let resp = app.get("/random_path_that_does_not_exist", None).send().await.unwrap();

    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn markup_only_title_is_rejected() {
    let app = spawn_app().await;
    let alice = token(ALICE);

    let resp = app
        .post("/posts", Some(&alice))
        .json(&json!({ "title": "<script>x</script>", "content": "body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"][0], "Title length must be between 1 and 200 chars");

    let post = app.create_post(&alice, "kept").await;
    let edit = app
        .patch(&format!("/posts/{}", post), Some(&alice))
        .json(&json!({ "content": "<style>p {}</style>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status().as_u16(), 400);
    let body: Value = edit.json().await.unwrap();
    assert!(body["data"]["content"].is_array());
}

#[tokio::test]
async fn unparseable_input_uses_error_envelope() {
    let app = spawn_app().await;
    let alice = token(ALICE);

    let bad_json = app
        .post("/posts", Some(&alice))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_json.status().as_u16(), 400);
    let body: Value = bad_json.json().await.unwrap();
    assert_eq!(body["code"], 400);

    let missing_title = app
        .post("/posts", Some(&alice))
        .json(&json!({ "content": "body" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_title.status().as_u16(), 400);
    let body: Value = missing_title.json().await.unwrap();
    assert!(body["data"]["title"].is_array());

    let bad_query = app.get("/posts?limit=many", None).send().await.unwrap();
    assert_eq!(bad_query.status().as_u16(), 400);
    let body: Value = bad_query.json().await.unwrap();
    assert_eq!(body["code"], 400);

    let bad_id = app.get("/posts/abc", None).send().await.unwrap();
    assert_eq!(bad_id.status().as_u16(), 400);
    let body: Value = bad_id.json().await.unwrap();
    assert_eq!(body["code"], 400);
}
