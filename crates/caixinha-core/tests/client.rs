mod common;

use caixinha_core::api::{ApiClient, ApiError};
use caixinha_core::models::{NewTransaction, Totals, TransactionFilter, TxType};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::setup;

fn transaction_json(id: i64, tx_type: &str, amount: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": tx_type,
        "amount": amount,
        "date": "2024-05-03",
        "description": "",
        "category": null,
        "created_at": "2024-05-03T09:00:00Z"
    })
}

#[tokio::test]
async fn test_summary_sends_month() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("GET"))
        .and(path("/summary/"))
        .and(query_param("month", "2024-05"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "month": "2024-05",
            "income": "5000.00",
            "expense": "830.40",
            "balance_month": "4169.60",
            "balance_total": "9000.00",
            "by_category": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = ApiClient::new(gateway).summary("2024-05").await.unwrap();
    assert_eq!(summary.balance_month, "4169.60");
}

#[tokio::test]
async fn test_recent_transactions_query() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("GET"))
        .and(path("/transactions/recent/"))
        .and(query_param("limit", "10"))
        .and(query_param("month", "2024-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            transaction_json(1, "IN", "100.00"),
            transaction_json(2, "OUT", "30.25")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let recent = ApiClient::new(gateway)
        .recent_transactions("2024-05", 10)
        .await
        .unwrap();
    let totals = Totals::from_transactions(&recent);
    assert_eq!(totals.balance(), 6975);
}

#[tokio::test]
async fn test_categories_accepts_paginated_response() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("GET"))
        .and(path("/categories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [
                { "id": 1, "name": "Mercado", "created_at": "2024-01-01T00:00:00Z" },
                { "id": 2, "name": "Lazer", "created_at": "2024-01-02T00:00:00Z" }
            ]
        })))
        .mount(&server)
        .await;

    let categories = ApiClient::new(gateway).categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Lazer");
}

#[tokio::test]
async fn test_create_category_trims_name() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("POST"))
        .and(path("/categories/"))
        .and(body_json(json!({ "name": "Mercado" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "name": "Mercado", "created_at": "2024-05-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let category = ApiClient::new(gateway).create_category("  Mercado  ").await.unwrap();
    assert_eq!(category.id, 9);
}

#[tokio::test]
async fn test_short_category_name_rejected_locally() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("POST"))
        .and(path("/categories/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = ApiClient::new(gateway).create_category(" x ").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn test_transactions_filter_and_ordering() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("GET"))
        .and(path("/transactions/"))
        .and(query_param("month", "2024-05"))
        .and(query_param("type", "OUT"))
        .and(query_param("category", "3"))
        .and(query_param("ordering", "-date,-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [transaction_json(5, "OUT", "12.00")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filter = TransactionFilter::month("2024-05")
        .with_type(TxType::Expense)
        .with_category(3);
    let txs = ApiClient::new(gateway).transactions(&filter).await.unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount_cents(), Some(1200));
}

#[tokio::test]
async fn test_create_and_delete_transaction() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("POST"))
        .and(path("/transactions/"))
        .and(body_json(json!({
            "type": "OUT",
            "amount": "1234.56",
            "date": "2024-05-03",
            "description": "Aluguel",
            "category": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(transaction_json(11, "OUT", "1234.56")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/transactions/11/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/categories/4/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(gateway);
    let created = client
        .create_transaction(&NewTransaction {
            tx_type: TxType::Expense,
            amount: caixinha_core::utils::normalize_amount("1.234,56"),
            date: "2024-05-03".into(),
            description: "Aluguel".into(),
            category: None,
        })
        .await
        .unwrap();
    client.delete_transaction(created.id).await.unwrap();
    client.delete_category(4).await.unwrap();
}

#[tokio::test]
async fn test_not_found_is_reported() {
    let (server, gateway) = setup(Some("a1"), Some("r1")).await;
    Mock::given(method("DELETE"))
        .and(path("/categories/99/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let err = ApiClient::new(gateway).delete_category(99).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.detail().as_deref(), Some("Not found."));
}
