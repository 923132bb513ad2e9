use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Json, Router,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
  routing::{get, post},
};
use chrono::Utc;
use depot_core::{
  DomainError, Error as CoreError,
  market::{Bid, BidStatus, Order, OrderStatus},
  store::{KnowledgeStore, MarketStore},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, SupabaseConfig, SupabaseStore};

// ─── Fixtures ────────────────────────────────────────────────────────────────

type Params = Query<HashMap<String, String>>;

/// Serve `router` under `/rest/v1` on an ephemeral port and return a store
/// pointed at it.
async fn store_for(router: Router) -> SupabaseStore {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let app = Router::new().nest("/rest/v1", router);
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  SupabaseStore::new(SupabaseConfig {
    url:          format!("http://{addr}"),
    anon_key:     "anon-key".into(),
    timeout_secs: Some(5),
  })
  .unwrap()
}

fn order(id: Uuid, status: OrderStatus) -> Order {
  let now = Utc::now();
  Order {
    order_id: id,
    client_id: Uuid::new_v4(),
    title: "Упаковка 200 коробок".into(),
    description: String::new(),
    status,
    accepted_packer_id: None,
    is_disputed: false,
    created_at: now,
    updated_at: now,
  }
}

fn bid(id: Uuid, order_id: Uuid, status: BidStatus) -> Bid {
  Bid {
    bid_id: id,
    order_id,
    packer_id: Uuid::new_v4(),
    price: 1500,
    days: 3,
    comment: None,
    status,
    created_at: Utc::now(),
  }
}

fn rows<T: serde::Serialize>(items: &[T]) -> Json<Value> {
  Json(serde_json::to_value(items).unwrap())
}

// ─── Knowledge ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn match_documents_calls_rpc_with_credentials() {
  let seen: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::default();
  let router = Router::new()
    .route(
      "/rpc/match_documents",
      post(
        |State(seen): State<Arc<Mutex<Option<(HeaderMap, Value)>>>>,
         headers: HeaderMap,
         Json(body): Json<Value>| async move {
          *seen.lock().unwrap() = Some((headers, body));
          Json(json!([
            {
              "id": Uuid::nil(),
              "content": "Упаковка одной единицы стоит 15 рублей.",
              "metadata": { "title": "Тарифы" },
              "content_hash": "abc",
              "created_at": "2026-01-05T10:00:00.000000+00:00",
              "similarity": 0.91
            }
          ]))
        },
      ),
    )
    .with_state(seen.clone());
  let store = store_for(router).await;

  let matches = store.match_documents(vec![0.1, 0.2], 0.25, 5).await.unwrap();
  assert_eq!(matches.len(), 1);
  assert_eq!(matches[0].passage.metadata.title, "Тарифы");
  assert!((matches[0].similarity - 0.91).abs() < 1e-6);

  let (headers, body) = seen.lock().unwrap().take().unwrap();
  assert_eq!(headers["apikey"], "anon-key");
  assert_eq!(headers["authorization"], "Bearer anon-key");
  assert_eq!(body["match_count"], 5);
  assert_eq!(body["query_embedding"].as_array().unwrap().len(), 2);
  assert!((body["match_threshold"].as_f64().unwrap() - 0.25).abs() < 1e-6);
}

#[tokio::test]
async fn match_documents_accepts_rows_without_hash_or_timestamp() {
  let router = Router::new().route(
    "/rpc/match_documents",
    post(|| async {
      Json(json!([
        {
          "id": Uuid::nil(),
          "content": "Стоимость приемки 15 рублей",
          "metadata": { "title": "Тарифы" },
          "similarity": 0.8
        }
      ]))
    }),
  );
  let store = store_for(router).await;

  let matches = store.match_documents(vec![1.0], 0.25, 5).await.unwrap();
  assert_eq!(matches.len(), 1);
  assert_eq!(matches[0].passage.content, "Стоимость приемки 15 рублей");
  assert_eq!(matches[0].passage.metadata.title, "Тарифы");
  assert!(matches[0].passage.content_hash.is_empty());
  assert!((matches[0].similarity - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn delete_by_title_filters_on_metadata() {
  let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
  let router = Router::new()
    .route(
      "/documents",
      axum::routing::delete(
        |State(seen): State<Arc<Mutex<HashMap<String, String>>>>, Query(params): Params| async move {
          *seen.lock().unwrap() = params;
          Json(json!([{ "id": Uuid::new_v4() }, { "id": Uuid::new_v4() }]))
        },
      ),
    )
    .with_state(seen.clone());
  let store = store_for(router).await;

  let removed = store.delete_passages_by_title("Возвраты").await.unwrap();
  assert_eq!(removed, 2);
  let params = seen.lock().unwrap().clone();
  assert_eq!(params.get("metadata->>title").map(String::as_str), Some("eq.Возвраты"));
}

#[tokio::test]
async fn caption_lookup_returns_none_for_empty_result() {
  let router = Router::new().route("/image_captions", get(|| async { Json(json!([])) }));
  let store = store_for(router).await;
  assert!(store.get_caption("https://cdn.example/a.png").await.unwrap().is_none());
}

// ─── Marketplace ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn accept_bid_returns_function_result() {
  let order_id = Uuid::new_v4();
  let bid_id = Uuid::new_v4();
  let pending = bid(bid_id, order_id, BidStatus::Pending);
  let mut booked = order(order_id, OrderStatus::Booked);
  booked.accepted_packer_id = Some(pending.packer_id);
  let mut accepted = pending.clone();
  accepted.status = BidStatus::Accepted;

  let result = json!({ "order": booked, "bid": accepted });
  let searching = order(order_id, OrderStatus::Searching);
  let router = Router::new()
    .route("/bids", get(move || async move { rows(&[pending]) }))
    .route("/orders", get(move || async move { rows(&[searching]) }))
    .route(
      "/rpc/accept_bid",
      post(move |Json(args): Json<Value>| async move {
        assert_eq!(args["p_bid_id"], json!(bid_id));
        Json(result)
      }),
    );
  let store = store_for(router).await;

  let out = store.accept_bid(bid_id).await.unwrap();
  assert_eq!(out.order.status, OrderStatus::Booked);
  assert_eq!(out.order.accepted_packer_id, Some(out.bid.packer_id));
  assert_eq!(out.bid.status, BidStatus::Accepted);
}

#[tokio::test]
async fn accept_bid_on_booked_order_never_calls_function() {
  let order_id = Uuid::new_v4();
  let bid_id = Uuid::new_v4();
  let pending = bid(bid_id, order_id, BidStatus::Pending);
  let booked = order(order_id, OrderStatus::Booked);
  let calls = Arc::new(AtomicUsize::new(0));

  let counter = calls.clone();
  let router = Router::new()
    .route("/bids", get(move || async move { rows(&[pending]) }))
    .route("/orders", get(move || async move { rows(&[booked]) }))
    .route(
      "/rpc/accept_bid",
      post(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Json(Value::Null) }
      }),
    );
  let store = store_for(router).await;

  let err = store.accept_bid(bid_id).await.unwrap_err();
  assert!(matches!(
    err.domain(),
    Some(CoreError::OrderNotOpen { status: OrderStatus::Booked, .. })
  ));
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accept_bid_refused_by_guard_reports_current_state() {
  let order_id = Uuid::new_v4();
  let bid_id = Uuid::new_v4();
  let pending = bid(bid_id, order_id, BidStatus::Pending);
  let reads = Arc::new(AtomicUsize::new(0));

  // First read sees `searching`; by the time the function runs another
  // client has booked the order.
  let router = Router::new()
    .route("/bids", get(move || async move { rows(&[pending]) }))
    .route(
      "/orders",
      get(move || {
        let n = reads.fetch_add(1, Ordering::SeqCst);
        let status = if n == 0 { OrderStatus::Searching } else { OrderStatus::Booked };
        async move { rows(&[order(order_id, status)]) }
      }),
    )
    .route("/rpc/accept_bid", post(|| async { Json(Value::Null) }));
  let store = store_for(router).await;

  let err = store.accept_bid(bid_id).await.unwrap_err();
  assert!(matches!(
    err.domain(),
    Some(CoreError::OrderNotOpen { status: OrderStatus::Booked, .. })
  ));
}

#[tokio::test]
async fn guarded_transition_rechecks_after_lost_race() {
  let order_id = Uuid::new_v4();
  let reads = Arc::new(AtomicUsize::new(0));
  let patches: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();

  let seen = patches.clone();
  let router = Router::new().route(
    "/orders",
    get(move || {
      let n = reads.fetch_add(1, Ordering::SeqCst);
      let status = if n == 0 { OrderStatus::Booked } else { OrderStatus::Cancelled };
      async move { rows(&[order(order_id, status)]) }
    })
    .patch(move |Query(params): Params| {
      seen.lock().unwrap().push(params);
      async { Json(json!([])) }
    }),
  );
  let store = store_for(router).await;

  let err = store
    .transition_order(order_id, OrderStatus::Completed)
    .await
    .unwrap_err();
  assert!(matches!(
    err.domain(),
    Some(CoreError::InvalidTransition { from: OrderStatus::Cancelled, to: OrderStatus::Completed })
  ));

  let patches = patches.lock().unwrap();
  assert_eq!(patches.len(), 1);
  assert_eq!(patches[0].get("status").map(String::as_str), Some("eq.booked"));
  assert_eq!(patches[0].get("is_disputed").map(String::as_str), Some("is.false"));
}

#[tokio::test]
async fn reject_missing_bid_is_not_found() {
  let router = Router::new().route("/bids", get(|| async { Json(json!([])) }));
  let store = store_for(router).await;
  let id = Uuid::new_v4();
  let err = store.reject_bid(id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::BidNotFound(got)) if *got == id));
}

#[tokio::test]
async fn packer_thread_includes_system_notices() {
  let seen: Arc<Mutex<HashMap<String, String>>> = Arc::default();
  let router = Router::new()
    .route(
      "/messages",
      get(
        |State(seen): State<Arc<Mutex<HashMap<String, String>>>>, Query(params): Params| async move {
          *seen.lock().unwrap() = params;
          Json(json!([]))
        },
      ),
    )
    .with_state(seen.clone());
  let store = store_for(router).await;
  let (order_id, packer_id) = (Uuid::new_v4(), Uuid::new_v4());

  store.list_messages(order_id, Some(packer_id), None).await.unwrap();

  let params = seen.lock().unwrap().clone();
  assert_eq!(params["order_id"], format!("eq.{order_id}"));
  assert_eq!(params["or"], format!("(packer_id.eq.{packer_id},is_system.is.true)"));
  assert!(!params.contains_key("packer_id"));
}

#[tokio::test]
async fn postgrest_failure_is_not_a_domain_error() {
  let router = Router::new().route(
    "/profiles",
    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
  );
  let store = store_for(router).await;

  let err = store.list_profiles(None).await.unwrap_err();
  assert!(err.domain().is_none());
  match err {
    Error::Status { endpoint, status, body } => {
      assert_eq!(endpoint, "profiles");
      assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(body, "boom");
    }
    other => panic!("expected status error, got {other:?}"),
  }
}

#[test]
fn missing_config_is_rejected() {
  let err = SupabaseStore::new(SupabaseConfig {
    url:          String::new(),
    anon_key:     "k".into(),
    timeout_secs: None,
  })
  .err()
  .unwrap();
  assert!(matches!(err, Error::Config("supabase_url")));
}
