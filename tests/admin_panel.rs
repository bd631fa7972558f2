mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_reject_farmers() {
    let app = TestApp::new();
    let (farmer, _) = app.register("Farmer", "farmer@farm.io").await;

    for uri in ["/api/admin/users", "/api/admin/posts", "/api/admin/knowledge", "/api/admin/stats"] {
        let (status, body) = app.get(uri, Some(&farmer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["message"], "Admin access required");
    }

    let (status, _) = app.get("/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_admin_loses_access() {
    let app = TestApp::new();
    let (token, id) = app.admin().await;
    let (status, _) = app.get("/api/admin/stats", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.deactivate(id).await;
    let (status, _) = app.get("/api/admin/stats", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new();
    let (admin, admin_id) = app.admin().await;

    let (status, created) = app
        .post(
            "/api/admin/users",
            Some(&admin),
            json!({ "name": "Helper", "email": "helper@farm.io", "password": "helper123", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "admin");
    let helper = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put("/api/admin/users", Some(&admin), json!({ "userId": helper }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");

    let (status, body) = app.put("/api/admin/users", Some(&admin), json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User ID is required");

    let (status, updated) = app
        .put(
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": helper, "role": "farmer", "isActive": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "farmer");
    assert_eq!(updated["isActive"], false);

    let (status, _) = app
        .put(&format!("/api/admin/users/{}", admin_id), Some(&admin), json!({ "role": "farmer" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/admin/users/{}", admin_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(Method::DELETE, "/api/admin/users", Some(&admin), Some(json!({ "userId": helper })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/admin/users/{}", helper), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_moderates_posts() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (farmer, _) = app.register("Poster", "poster@farm.io").await;

    let (_, post) = app
        .post("/api/posts", Some(&farmer), json!({ "title": "Selling eggs", "content": "DM me" }))
        .await;
    let id = post["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put("/api/admin/posts/approve", Some(&admin), json!({ "postId": id, "isApproved": false }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isApproved"], false);
    assert_eq!(body["author"]["email"], "poster@farm.io");

    let (_, feed) = app.get("/api/posts", None).await;
    assert_eq!(feed, json!([]));
    let (status, _) = app.get(&format!("/api/posts?id={}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = app.get("/api/admin/posts", Some(&admin)).await;
    assert_eq!(all[0]["author"]["email"], "poster@farm.io");
    assert_eq!(all[0]["isApproved"], false);

    let (status, body) = app
        .put(&format!("/api/admin/posts/{}/approve", id), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isApproved"], true);

    let (status, created) = app
        .post("/api/admin/posts/create", Some(&admin), json!({ "title": "Official tip", "content": "Vaccinate" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "tip");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/admin/posts/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .put("/api/admin/posts/approve", Some(&admin), json!({ "postId": id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unapproved_post_is_hidden_from_members() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    let (author, _) = app.register("Poster", "poster@farm.io").await;
    let (other, _) = app.register("Neighbour", "neighbour@farm.io").await;

    let (_, post) = app
        .post("/api/posts", Some(&author), json!({ "title": "Miracle cure", "content": "Buy now" }))
        .await;
    let id = post["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .put("/api/admin/posts/approve", Some(&admin), json!({ "postId": id, "isApproved": false }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/posts/{}", id);
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
    let (status, _) = app.get(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post(&format!("{}/like", uri), Some(&other), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(&format!("{}/comment", uri), Some(&other), json!({ "content": "Scam" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&uri, Some(&author)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isApproved"], false);
    assert_eq!(body["likes"], json!([]));
    assert_eq!(body["comments"], json!([]));

    let (status, _) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_curates_knowledge_and_reads_stats() {
    let app = TestApp::new();
    let (admin, _) = app.admin().await;
    app.register("Farmer", "farmer@farm.io").await;

    let (status, entry) = app
        .post(
            "/api/admin/knowledge",
            Some(&admin),
            json!({ "title": "Heat stress", "content": "Provide shade", "keywords": ["heat", "summer"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["category"], "general");
    let id = entry["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put("/api/admin/knowledge/update", Some(&admin), json!({ "id": id, "title": "Heat stress" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ID, title, and content are required");

    let (status, updated) = app
        .put(
            "/api/admin/knowledge/update",
            Some(&admin),
            json!({ "id": id, "title": "Heat stress in layers", "content": "Shade and water", "tags": "climate", "isAIVerified": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["tags"], json!(["climate"]));
    assert_eq!(updated["keywords"], json!(["heat", "summer"]));
    assert_eq!(updated["isAIVerified"], true);

    let (status, stats) = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["overview"]["totalUsers"], 2);
    assert_eq!(stats["overview"]["activeUsers"], 2);
    assert_eq!(stats["overview"]["totalKnowledge"], 1);
    assert_eq!(stats["overview"]["newUsersLast7Days"], 2);
    assert_eq!(stats["breakdown"]["knowledgeByCategory"][0]["category"], "general");

    let (status, body) = app
        .request(Method::DELETE, "/api/admin/knowledge/update", Some(&admin), Some(json!({ "id": id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Entry deleted successfully");

    let (_, listed) = app.get("/api/admin/knowledge", Some(&admin)).await;
    assert_eq!(listed, json!([]));
}
