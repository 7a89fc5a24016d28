//! Order placement, confirmation and administrator lookup against Postgres.

use dadaba_db::test_fixtures::{TestDataBuilder, TestDatabase};
use dadaba_db::{
    Error, NewOrder, OrderItemInput, OrderRepository, OrderStatus, Role, UserDirectory,
};
use uuid::Uuid;

fn order_for(user_id: Uuid, items: Vec<OrderItemInput>) -> NewOrder {
    NewOrder {
        user_id,
        items,
        seats: 2,
        payment_method: Some("CASH".to_string()),
        delivery_name: "Awa".to_string(),
        delivery_phone: "+22500000000".to_string(),
        delivery_location: "Cocody".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with a reachable Postgres"]
async fn test_create_prices_items_and_generates_code() {
    let test_db = TestDatabase::new().await;
    let data = TestDataBuilder::new(&test_db.db)
        .with_customer("Awa")
        .await
        .with_dish("Attiéké", 1500.0)
        .await
        .with_dish("Alloco", 500.0)
        .await
        .build();

    let order = test_db
        .db
        .orders
        .create(order_for(
            data.users[0],
            vec![
                OrderItemInput {
                    dish_id: data.dishes[0].id,
                    quantity: 2,
                },
                OrderItemInput {
                    dish_id: data.dishes[1].id,
                    quantity: 1,
                },
            ],
        ))
        .await
        .expect("create order");

    assert_eq!(order.total, 3500.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_name, "Awa");
    assert_eq!(order.items.len(), 2);
    assert!(order.secret_code.starts_with("FF-"));

    test_db.cleanup_data(&data).await;
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with a reachable Postgres"]
async fn test_create_rejects_unknown_dish() {
    let test_db = TestDatabase::new().await;
    let data = TestDataBuilder::new(&test_db.db)
        .with_customer("Awa")
        .await
        .build();

    let err = test_db
        .db
        .orders
        .create(order_for(
            data.users[0],
            vec![OrderItemInput {
                dish_id: Uuid::new_v4(),
                quantity: 1,
            }],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    test_db.cleanup_data(&data).await;
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with a reachable Postgres"]
async fn test_confirm_only_from_pending() {
    let test_db = TestDatabase::new().await;
    let data = TestDataBuilder::new(&test_db.db)
        .with_customer("Awa")
        .await
        .with_dish("Garba", 1000.0)
        .await
        .build();
    let orders = &test_db.db.orders;

    let order = orders
        .create(order_for(
            data.users[0],
            vec![OrderItemInput {
                dish_id: data.dishes[0].id,
                quantity: 1,
            }],
        ))
        .await
        .unwrap();

    let confirmed = orders.confirm(order.id).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let again = orders.confirm(order.id).await.unwrap_err();
    assert!(matches!(again, Error::Conflict(_)));

    let missing = orders.confirm(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(missing, Error::OrderNotFound(_)));

    test_db.cleanup_data(&data).await;
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL with a reachable Postgres"]
async fn test_administrators_and_identity() {
    let test_db = TestDatabase::new().await;
    let data = TestDataBuilder::new(&test_db.db)
        .with_admin("Admin")
        .await
        .with_user("Boss", Role::SuperAdmin)
        .await
        .with_user("Staff", Role::Staff)
        .await
        .build();
    let users = &test_db.db.users;

    let admins = users.list_administrators().await.unwrap();
    assert!(admins.iter().any(|r| r.id == data.users[0]));
    assert!(admins.iter().any(|r| r.id == data.users[1]));
    assert!(!admins.iter().any(|r| r.id == data.users[2]));

    let staff = users.get_identity(data.users[2]).await.unwrap().unwrap();
    assert_eq!(staff.role, Role::Staff);
    assert!(users.get_identity(Uuid::new_v4()).await.unwrap().is_none());

    test_db.cleanup_data(&data).await;
    test_db.cleanup().await;
}
