mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, QueryFilter,
    Set, Statement,
};
use serde_json::json;

use packtrack_api::entities::{
    order::{self, Entity as OrderEntity},
    order_product::{Column as OrderProductColumn, Entity as OrderProductEntity},
};

use common::TestApp;

fn acme_payload() -> serde_json::Value {
    json!({
        "customerName": "Acme",
        "contactNumber": "555-0100",
        "district": "",
        "transport": "",
        "products": [
            {"micron": 40, "meter": 100, "size": "M", "color": "red", "quantity": 10}
        ]
    })
}

#[tokio::test]
async fn place_order_then_list_returns_the_order_with_defaults_applied() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order placed successfully");
    let order_id = body["orderId"].as_i64().expect("orderId in response");

    let (status, body) = app.request_json(Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    let listed = &orders[0];
    assert_eq!(listed["orderId"].as_i64(), Some(order_id));
    assert_eq!(listed["customerName"], "Acme");
    assert_eq!(listed["contactNumber"], "555-0100");
    assert_eq!(listed["status"], "Pending");

    let products = listed["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product["micron"], 40);
    assert_eq!(product["meter"], 100);
    assert_eq!(product["size"], "M");
    assert_eq!(product["color"], "red");
    assert_eq!(product["nos"], "");
    assert_eq!(product["unit"], "Pcs");
    assert_eq!(product["quantity"], 10);
}

#[tokio::test]
async fn place_order_persists_every_submitted_product() {
    let app = TestApp::new().await;

    let payload = json!({
        "customerName": "Bulk Films",
        "contactNumber": "555-0101",
        "district": "North",
        "transport": "Road",
        "products": [
            {"micron": 30, "meter": 50, "size": "S", "color": "blue", "quantity": 4},
            {"micron": 40, "meter": 100, "size": "M", "color": "red", "nos": "3", "quantity": 10},
            {"micron": 50, "meter": 200, "size": "L", "color": "clear", "unit": "Rolls", "quantity": 2}
        ]
    });

    let (status, body) = app
        .request_json(Method::POST, "/place-order", Some(payload))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["orderId"].as_i64().unwrap();

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["district"], "North");
    assert_eq!(orders[0]["transport"], "Road");

    let products = orders[0]["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[1]["nos"], "3");
    assert_eq!(products[2]["unit"], "Rolls");

    let stored = OrderProductEntity::find()
        .filter(OrderProductColumn::OrderId.eq(order_id))
        .all(&*app.state.db)
        .await
        .expect("query order products");
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn place_order_without_products_is_rejected_without_a_write() {
    let app = TestApp::new().await;

    let payload = json!({
        "customerName": "Acme",
        "contactNumber": "555-0100",
        "products": []
    });

    let (status, body) = app
        .request_json(Method::POST, "/place-order", Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let orders = OrderEntity::find().all(&*app.state.db).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn place_order_with_missing_customer_name_is_a_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(
            Method::POST,
            "/place-order",
            Some(json!({
                "contactNumber": "555-0100",
                "products": [
                    {"micron": 40, "meter": 100, "size": "M", "color": "red", "quantity": 10}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn failed_product_insert_rolls_back_the_order_row() {
    let app = TestApp::new().await;

    // Make the second half of the transactional write impossible.
    app.state
        .db
        .execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            "DROP TABLE order_products;".to_string(),
        ))
        .await
        .expect("drop order_products");

    let (status, _) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let orders = OrderEntity::find().all(&*app.state.db).await.unwrap();
    assert!(
        orders.is_empty(),
        "no order row may survive a failed line-item insert"
    );
}

#[tokio::test]
async fn update_status_is_visible_in_the_list_and_leaves_items_alone() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let order_id = body["orderId"].as_i64().unwrap();

    let (status, body) = app
        .request_json(
            Method::PATCH,
            &format!("/orders/{order_id}"),
            Some(json!({"status": "shipped"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order status updated successfully");

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let listed = &body["orders"][0];
    assert_eq!(listed["status"], "shipped");
    assert_eq!(listed["products"].as_array().unwrap().len(), 1);
    assert_eq!(listed["products"][0]["color"], "red");
}

#[tokio::test]
async fn update_status_on_missing_order_is_not_found_and_changes_nothing() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let order_id = body["orderId"].as_i64().unwrap();

    let (status, body) = app
        .request_json(
            Method::PATCH,
            "/orders/999999",
            Some(json!({"status": "shipped"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let stored = OrderEntity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "Pending");
}

#[tokio::test]
async fn update_status_requires_a_status_value() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let order_id = body["orderId"].as_i64().unwrap();

    let (status, _) = app
        .request_json(
            Method::PATCH,
            &format!("/orders/{order_id}"),
            Some(json!({"status": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_order_removes_the_order_and_all_of_its_line_items() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let doomed = body["orderId"].as_i64().unwrap();
    let (_, body) = app
        .request_json(
            Method::POST,
            "/place-order",
            Some(json!({
                "customerName": "Keeper",
                "contactNumber": "555-0102",
                "products": [
                    {"micron": 25, "meter": 75, "size": "S", "color": "green", "quantity": 1}
                ]
            })),
        )
        .await;
    let keeper = body["orderId"].as_i64().unwrap();

    let (status, body) = app
        .request_json(Method::DELETE, &format!("/orders/{doomed}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order deleted successfully");

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let ids: Vec<i64> = body["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["orderId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![keeper]);

    let orphans = OrderProductEntity::find()
        .filter(OrderProductColumn::OrderId.eq(doomed))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(orphans.is_empty(), "no line item may outlive its order");
}

#[tokio::test]
async fn deleting_a_nonexistent_order_still_succeeds() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request_json(Method::DELETE, "/orders/424242", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn orders_without_line_items_still_appear_in_the_list() {
    let app = TestApp::new().await;

    let bare = order::ActiveModel {
        customer_name: Set("No Items Yet".to_string()),
        contact_number: Set("555-0103".to_string()),
        district: Set(String::new()),
        transport: Set(String::new()),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert bare order");

    let (status, body) = app.request_json(Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["orderId"].as_i64(), Some(bare.id));
    assert_eq!(orders[0]["products"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn line_items_are_updated_by_durable_identity() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(
            Method::POST,
            "/place-order",
            Some(json!({
                "customerName": "Two Items",
                "contactNumber": "555-0104",
                "products": [
                    {"micron": 30, "meter": 50, "size": "S", "color": "blue", "quantity": 4},
                    {"micron": 40, "meter": 100, "size": "M", "color": "red", "quantity": 10}
                ]
            })),
        )
        .await;
    let order_id = body["orderId"].as_i64().unwrap();

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let products = body["orders"][0]["products"].as_array().unwrap().clone();
    let second_id = products[1]["productId"].as_i64().unwrap();

    let (status, body) = app
        .request_json(
            Method::PUT,
            &format!("/orders/{order_id}/products/{second_id}"),
            Some(json!({
                "micron": 45, "meter": 120, "size": "XL", "color": "black",
                "nos": "7", "unit": "Rolls", "quantity": 12
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["productId"].as_i64(), Some(second_id));
    assert_eq!(body["color"], "black");

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let products = body["orders"][0]["products"].as_array().unwrap();
    assert_eq!(products[0]["color"], "blue", "sibling item untouched");
    assert_eq!(products[1]["color"], "black");
    assert_eq!(products[1]["unit"], "Rolls");
    assert_eq!(products[1]["quantity"], 12);
}

#[tokio::test]
async fn line_item_updates_are_scoped_to_the_owning_order() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let first_order = body["orderId"].as_i64().unwrap();
    app.request_json(
        Method::POST,
        "/place-order",
        Some(json!({
            "customerName": "Other",
            "contactNumber": "555-0105",
            "products": [
                {"micron": 20, "meter": 60, "size": "S", "color": "white", "quantity": 3}
            ]
        })),
    )
    .await;

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    let orders = body["orders"].as_array().unwrap();
    let foreign_product = orders
        .iter()
        .find(|o| o["orderId"].as_i64() != Some(first_order))
        .map(|o| o["products"][0]["productId"].as_i64().unwrap())
        .unwrap();

    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/orders/{first_order}/products/{foreign_product}"),
            Some(json!({
                "micron": 1, "meter": 1, "size": "S", "color": "grey", "quantity": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_orders_leave_the_active_list_but_stay_queryable() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request_json(Method::POST, "/place-order", Some(acme_payload()))
        .await;
    let order_id = body["orderId"].as_i64().unwrap();

    let (status, _) = app
        .request_json(Method::POST, &format!("/orders/{order_id}/complete"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.request_json(Method::GET, "/orders", None).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 0);

    let (_, body) = app
        .request_json(Method::GET, "/orders?include_completed=true", None)
        .await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "Completed");
}

#[tokio::test]
async fn completing_a_missing_order_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request_json(Method::POST, "/orders/999999/complete", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_get_the_structured_404_body() {
    let app = TestApp::new().await;

    let (status, body) = app.request_json(Method::GET, "/no-such-route", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["message"], "Route GET /no-such-route does not exist");
}
