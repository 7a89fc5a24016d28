//! Pull API and order trigger endpoints over HTTP.
//!
//! Each test starts the full router on an ephemeral port with in-memory
//! collaborators, so no database or SMTP server is needed.

mod common;

use common::TestServer;
use dadaba_core::{NewNotification, NotificationRepository, NotificationType, Role};
use serde_json::Value;
use uuid::Uuid;

async fn seed(server: &TestServer, recipient: Uuid, title: &str) -> Uuid {
    // distinct created_at per row
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    server
        .notifications
        .create(NewNotification {
            recipient_id: recipient,
            kind: NotificationType::OrderCreated,
            title: title.to_string(),
            message: format!("{} message", title),
            related_order_id: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_health_reports_live_connections() {
    let server = TestServer::spawn().await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["live_connections"], 0);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = TestServer::spawn().await;
    let body: Value = server
        .client
        .get(server.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["paths"]["/api/notifications"].is_object());
}

#[tokio::test]
async fn test_list_requires_credential() {
    let server = TestServer::spawn().await;
    let response = server
        .client
        .get(server.url("/api/notifications"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let response = server
        .client
        .get(server.url("/api/notifications"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_list_is_newest_first_and_scoped_to_caller() {
    let server = TestServer::spawn().await;
    let (admin, token) = server.user("Admin", Role::Admin).await;
    let (other, _) = server.user("Other", Role::Admin).await;
    let older = seed(&server, admin, "first").await;
    let newer = seed(&server, admin, "second").await;
    seed(&server, other, "not mine").await;

    let rows: Vec<Value> = server
        .client
        .get(server.url("/api/notifications"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], newer.to_string());
    assert_eq!(rows[1]["id"], older.to_string());
    assert_eq!(rows[0]["type"], "ORDER_CREATED");
    assert_eq!(rows[0]["read"], false);
    assert_eq!(rows[0]["userId"], admin.to_string());

    let limited: Vec<Value> = server
        .client
        .get(server.url("/api/notifications?limit=1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0]["id"], newer.to_string());
}

#[tokio::test]
async fn test_list_rejects_out_of_range_limit() {
    let server = TestServer::spawn().await;
    let (_, token) = server.user("Admin", Role::Admin).await;
    for limit in ["0", "501"] {
        let response = server
            .client
            .get(server.url(&format!("/api/notifications?limit={}", limit)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}

#[tokio::test]
async fn test_mark_read_ownership_and_idempotence() {
    let server = TestServer::spawn().await;
    let (admin, token) = server.user("Admin", Role::Admin).await;
    let (_, intruder_token) = server.user("Intruder", Role::Admin).await;
    let id = seed(&server, admin, "hello").await;
    let path = format!("/api/notifications/{}/read", id);

    let forbidden = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);
    assert!(!server.notifications.get(id).await.unwrap().unwrap().read);

    let first: Value = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["read"], true);

    // PUT alias, second call leaves the row unchanged
    let second = server
        .client
        .put(server.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 200);
    let second: Value = second.json().await.unwrap();
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_mark_read_unknown_id_is_not_found() {
    let server = TestServer::spawn().await;
    let (_, token) = server.user("Admin", Role::Admin).await;
    let response = server
        .client
        .patch(server.url(&format!("/api/notifications/{}/read", Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unread_count_and_read_all() {
    let server = TestServer::spawn().await;
    let (admin, token) = server.user("Admin", Role::Admin).await;
    let first = seed(&server, admin, "a").await;
    seed(&server, admin, "b").await;
    seed(&server, admin, "c").await;
    server.notifications.mark_read(first, admin).await.unwrap();

    let count: Value = server
        .client
        .get(server.url("/api/notifications/unread-count"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["unread"], 2);

    let updated: Value = server
        .client
        .patch(server.url("/api/notifications/read-all"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["updated"], 2);
    assert_eq!(server.notifications.unread_count(admin).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_order_notifies_every_admin() {
    let server = TestServer::spawn().await;
    let (admin, admin_token) = server.user("Admin", Role::Admin).await;
    let (root, _) = server.user("Root", Role::SuperAdmin).await;
    server.user("Staff", Role::Staff).await;
    let (_, customer_token) = server.user("Customer", Role::User).await;
    let dish = server.dish("Thieboudienne", 2500.0).await;

    let response = server.place_order(&customer_token, &dish, 2).await;
    assert_eq!(response.status(), 201);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total"], 5000.0);
    assert!(order["secretCode"].as_str().unwrap().starts_with("FF-"));

    assert_eq!(server.wait_for_rows(2).await, 2);
    let rows = server.notifications.all().await;
    let recipients: Vec<Uuid> = rows.iter().map(|n| n.user_id).collect();
    assert!(recipients.contains(&admin));
    assert!(recipients.contains(&root));
    assert!(rows
        .iter()
        .all(|n| n.related_order_id.map(|id| id.to_string()) == order["id"].as_str().map(String::from)));

    let pulled: Vec<Value> = server
        .client
        .get(server.url("/api/notifications"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pulled.len(), 1);
    assert_eq!(pulled[0]["title"], "Nouvelle commande");
    assert_eq!(
        pulled[0]["message"],
        format!("Nouvelle commande {} par Customer", order["secretCode"].as_str().unwrap())
    );
}

#[tokio::test]
async fn test_create_order_validation() {
    let server = TestServer::spawn().await;
    let (_, token) = server.user("Customer", Role::User).await;

    let response = server
        .client
        .post(server.url("/api/orders"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "items": [],
            "deliveryName": "Awa",
            "deliveryPhone": "1",
            "deliveryLocation": "x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .post(server.url("/api/orders"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "items": [{ "dishId": Uuid::new_v4(), "quantity": 1 }],
            "deliveryName": "Awa",
            "deliveryPhone": "1",
            "deliveryLocation": "x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(server.notifications.all().await.is_empty());
}

#[tokio::test]
async fn test_order_without_admins_still_succeeds() {
    let server = TestServer::spawn().await;
    let (_, token) = server.user("Customer", Role::User).await;
    let dish = server.dish("Yassa", 3000.0).await;

    let response = server.place_order(&token, &dish, 1).await;
    assert_eq!(response.status(), 201);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(server.notifications.all().await.is_empty());
}

#[tokio::test]
async fn test_confirm_order_rules() {
    let server = TestServer::spawn().await;
    server.user("Admin", Role::Admin).await;
    let (_, owner_token) = server.user("Owner", Role::User).await;
    let (_, stranger_token) = server.user("Stranger", Role::User).await;
    let dish = server.dish("Mafe", 2000.0).await;

    let order: Value = server
        .place_order(&owner_token, &dish, 1)
        .await
        .json()
        .await
        .unwrap();
    let confirm_path = format!("/api/orders/{}/confirm", order["id"].as_str().unwrap());

    let stranger = server
        .client
        .post(server.url(&confirm_path))
        .bearer_auth(&stranger_token)
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), 403);

    let confirmed = server
        .client
        .post(server.url(&confirm_path))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), 200);
    let confirmed: Value = confirmed.json().await.unwrap();
    assert_eq!(confirmed["status"], "CONFIRMED");

    let again = server
        .client
        .post(server.url(&confirm_path))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), 409);

    let missing = server
        .client
        .post(server.url(&format!("/api/orders/{}/confirm", Uuid::new_v4())))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    // one row for the creation, one for the confirmation
    assert_eq!(server.wait_for_rows(2).await, 2);
    let kinds: Vec<NotificationType> = server
        .notifications
        .all()
        .await
        .iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationType::OrderConfirmed));
}

#[tokio::test]
async fn test_get_order_visibility() {
    let server = TestServer::spawn().await;
    let (_, owner_token) = server.user("Owner", Role::User).await;
    let (_, stranger_token) = server.user("Stranger", Role::User).await;
    let (_, staff_token) = server.user("Staff", Role::Staff).await;
    let dish = server.dish("Pastels", 500.0).await;

    let order: Value = server
        .place_order(&owner_token, &dish, 3)
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/api/orders/{}", order["id"].as_str().unwrap());

    for (token, expected) in [(&owner_token, 200), (&staff_token, 200), (&stranger_token, 403)] {
        let response = server
            .client
            .get(server.url(&path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}
