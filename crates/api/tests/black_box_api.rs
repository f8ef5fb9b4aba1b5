use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use agro_api::app::{AppServices, build_app};
use agro_auth::{Hs256Jwt, InMemoryUserDirectory, TokenTtl, UserRecord, UserStatus};
use agro_core::ProductId;
use agro_infra::{
    CacheError, CachedResponse, InMemoryProductStore, InMemoryResponseCache, ProductStore,
    ResponseCache, StoreError,
};
use agro_products::{Product, ProductDraft, ProductPayload, validate_product};

const USERNAME: &str = "admin";
const PASSWORD: &str = "admin123";

struct TestServer {
    base_url: String,
    store: Arc<dyn ProductStore>,
    users: Arc<InMemoryUserDirectory>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, seeded with two products and one user, bound to an
    /// ephemeral port.
    async fn spawn() -> Self {
        Self::spawn_with(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryResponseCache::new()),
        )
        .await
    }

    async fn spawn_with(store: Arc<dyn ProductStore>, cache: Arc<dyn ResponseCache>) -> Self {
        seed(&store, "Produto 1", "100.00").await;
        seed(&store, "Produto 2", "200.00").await;

        let users = Arc::new(InMemoryUserDirectory::new());
        users
            .insert(UserRecord::with_password(USERNAME, PASSWORD).unwrap())
            .unwrap();

        let services = AppServices::new(
            store.clone(),
            cache,
            users.clone(),
            Hs256Jwt::new("test-secret", TokenTtl::default()),
        );
        let app = build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            users,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url("/login/"))
            .json(&json!({ "username": USERNAME, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        body["access"].as_str().unwrap().to_string()
    }

    async fn list(&self, token: &str) -> Vec<serde_json::Value> {
        let res = self
            .client
            .get(self.url("/products/"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn count(&self) -> u64 {
        self.store.count().await.unwrap()
    }

    async fn first_id(&self) -> i64 {
        let first = self.store.list().await.unwrap().into_iter().next().unwrap();
        serde_json::to_value(&first).unwrap()["id"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn seed(store: &impl ProductStore, name: &str, price: &str) {
    let draft = validate_product(&ProductPayload {
        name: Some(name.to_string()),
        price: Some(Decimal::from_str(price).unwrap()),
    })
    .unwrap();
    store.insert(draft).await.unwrap();
}

/// Store wrapper that counts `list` calls and can be told to fail them.
#[derive(Default)]
struct FaultyStore {
    inner: InMemoryProductStore,
    fail_list: bool,
    list_calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ProductStore for FaultyStore {
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(StoreError::Backend("connection refused".to_string()));
        }
        self.inner.list().await
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.inner.get(id).await
    }

    async fn insert(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        self.inner.insert(draft).await
    }

    async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Option<Product>, StoreError> {
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }
}

/// Cache wrapper whose reads or flushes can be told to fail.
#[derive(Default)]
struct FaultyCache {
    inner: InMemoryResponseCache,
    fail_get: bool,
    fail_clear: bool,
}

#[async_trait::async_trait]
impl ResponseCache for FaultyCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        if self.fail_get {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: CachedResponse, ttl: Duration) -> Result<(), CacheError> {
        self.inner.set(key, value, ttl).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        if self.fail_clear {
            return Err(CacheError::Backend("connection refused".to_string()));
        }
        self.inner.clear().await
    }
}

fn header<'a>(res: &'a reqwest::Response, name: &str) -> &'a str {
    res.headers().get(name).unwrap().to_str().unwrap()
}

fn names(items: &[serde_json::Value]) -> Vec<&str> {
    items.iter().map(|p| p["name"].as_str().unwrap()).collect()
}

#[tokio::test]
async fn health_needs_no_token() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_access_and_refresh() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login/"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn login_failures_return_exact_error_body() {
    let srv = TestServer::spawn().await;

    let bodies = [
        json!({ "username": USERNAME, "password": "wrong" }),
        json!({ "username": "ghost", "password": PASSWORD }),
        json!({ "username": USERNAME }),
        json!({}),
    ];
    for body in bodies {
        let res = srv.client.post(srv.url("/login/")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }

    // Not JSON at all.
    let res = srv
        .client
        .post(srv.url("/login/"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid credentials" }));
}

#[tokio::test]
async fn crud_endpoints_require_a_bearer_token() {
    let srv = TestServer::spawn().await;
    let id = srv.first_id().await;
    let item = srv.url(&format!("/products/{id}/"));
    let payload = json!({ "name": "Produto X", "price": 1 });

    let requests = [
        srv.client.get(srv.url("/products/")),
        srv.client.post(srv.url("/products/")).json(&payload),
        srv.client.get(&item),
        srv.client.put(&item).json(&payload),
        srv.client.patch(&item).json(&payload),
        srv.client.delete(&item),
    ];
    for req in requests {
        let res = req.send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    // Garbage and non-bearer credentials fare no better.
    let res = srv
        .client
        .delete(&item)
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .delete(&item)
        .basic_auth(USERNAME, Some(PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(srv.count().await, 2);
    let stored = srv.store.list().await.unwrap();
    assert_eq!(stored[0].name(), "Produto 1");
}

#[tokio::test]
async fn refresh_token_is_not_accepted_as_bearer() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login/"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let tokens: serde_json::Value = res.json().await.unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    let res = srv
        .client
        .get(srv.url("/products/"))
        .bearer_auth(refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_endpoint_mints_usable_access_token() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login/"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let tokens: serde_json::Value = res.json().await.unwrap();

    let res = srv
        .client
        .post(srv.url("/login/refresh/"))
        .json(&json!({ "refresh": tokens["refresh"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let access = body["access"].as_str().unwrap();
    assert_eq!(srv.list(access).await.len(), 2);

    // An access token cannot be used to refresh.
    let res = srv
        .client
        .post(srv.url("/login/refresh/"))
        .json(&json!({ "refresh": tokens["access"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/login/refresh/"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn catalog_scenario_list_create_list_delete() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    let items = srv.list(&token).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["price"], "100.00");

    let res = srv
        .client
        .post(srv.url("/products/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Produto 3", "price": 300.00 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["name"], "Produto 3");
    assert_eq!(created["price"], "300.00");
    assert!(created["id"].as_i64().is_some());
    assert_eq!(srv.count().await, 3);

    let items = srv.list(&token).await;
    assert_eq!(names(&items), vec!["Produto 1", "Produto 2", "Produto 3"]);

    let id = items[0]["id"].as_i64().unwrap();
    let res = srv
        .client
        .delete(srv.url(&format!("/products/{id}/")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await.unwrap().is_empty());
    assert_eq!(srv.count().await, 2);

    let items = srv.list(&token).await;
    assert_eq!(names(&items), vec!["Produto 2", "Produto 3"]);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_without_side_effects() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    // Prime the list cache, then change the store behind the API's back.
    let before = srv.list(&token).await;
    seed(&srv.store, "Direct", "1.00").await;

    let bad = [
        json!({ "name": "", "price": -10.00 }),
        json!({ "name": "Produto", "price": -0.01 }),
        json!({ "price": 10 }),
        json!({ "name": "Produto" }),
        json!({ "name": "Produto", "price": "abc" }),
    ];
    for body in bad {
        let res = srv
            .client
            .post(srv.url("/products/"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {body}");
    }

    let id = srv.first_id().await;
    let res = srv
        .client
        .put(srv.url(&format!("/products/{id}/")))
        .bearer_auth(&token)
        .json(&json!({ "name": "", "price": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Store: only the direct insert. Cache: never flushed, still the old list.
    assert_eq!(srv.count().await, 3);
    assert_eq!(srv.list(&token).await, before);
}

#[tokio::test]
async fn zero_price_is_accepted() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    let res = srv
        .client
        .post(srv.url("/products/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Brinde", "price": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["price"], "0.00");
}

#[tokio::test]
async fn list_is_served_from_cache_until_a_write() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    let first = srv
        .client
        .get(srv.url("/products/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(header(&first, "cache-control"), "max-age=600");
    let first = first.bytes().await.unwrap();

    // A store change that bypasses the API is invisible while the entry lives.
    seed(&srv.store, "Direct", "1.00").await;

    let second = srv
        .client
        .get(srv.url("/products/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header(&second, "content-type"), "application/json");
    assert_eq!(second.bytes().await.unwrap(), first);

    // Any successful write flushes everything.
    let res = srv
        .client
        .post(srv.url("/products/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Produto 3", "price": "300" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let items = srv.list(&token).await;
    assert_eq!(
        names(&items),
        vec!["Produto 1", "Produto 2", "Direct", "Produto 3"]
    );
}

#[tokio::test]
async fn retrieve_returns_record_or_not_found() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    let id = srv.first_id().await;

    let res = srv
        .client
        .get(srv.url(&format!("/products/{id}/")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": id, "name": "Produto 1", "price": "100.00" }));

    for path in ["/products/9999/", "/products/abc/"] {
        let res = srv
            .client
            .get(srv.url(path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {path}");
    }
}

#[tokio::test]
async fn update_and_partial_update() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;
    let id = srv.first_id().await;
    let item = srv.url(&format!("/products/{id}/"));

    // Prime the cache so the flush is observable.
    assert_eq!(srv.list(&token).await[0]["name"], "Produto 1");

    let res = srv
        .client
        .put(&item)
        .bearer_auth(&token)
        .json(&json!({ "name": "Produto 1b", "price": 150 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": id, "name": "Produto 1b", "price": "150.00" }));
    assert_eq!(srv.list(&token).await[0]["name"], "Produto 1b");

    // PUT is a full replacement: omitting a field fails.
    let res = srv
        .client
        .put(&item)
        .bearer_auth(&token)
        .json(&json!({ "name": "Produto 1c" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // PATCH keeps what is omitted.
    let res = srv
        .client
        .patch(&item)
        .bearer_auth(&token)
        .json(&json!({ "price": "175.50" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": id, "name": "Produto 1b", "price": "175.50" }));
    assert_eq!(srv.list(&token).await[0]["price"], "175.50");

    let res = srv
        .client
        .patch(&item)
        .bearer_auth(&token)
        .json(&json!({ "price": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .put(srv.url("/products/9999/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ghost", "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.count().await, 2);
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let token = srv.login().await;

    let res = srv
        .client
        .delete(srv.url("/products/9999/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.count().await, 2);
}

#[tokio::test]
async fn cache_read_failure_is_a_500_and_skips_the_store() {
    let store = Arc::new(FaultyStore::default());
    let cache = Arc::new(FaultyCache {
        fail_get: true,
        ..FaultyCache::default()
    });
    let srv = TestServer::spawn_with(store.clone(), cache).await;
    let token = srv.login().await;

    let res = srv
        .client
        .get(srv.url("/products/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "cache_error");
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cache_flush_failure_after_write_is_a_500() {
    let cache = Arc::new(FaultyCache {
        fail_clear: true,
        ..FaultyCache::default()
    });
    let srv = TestServer::spawn_with(Arc::new(InMemoryProductStore::new()), cache).await;
    let token = srv.login().await;

    let res = srv
        .client
        .post(srv.url("/products/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Produto 3", "price": 300 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "cache_error");
    // The row was written before the flush was attempted.
    assert_eq!(srv.count().await, 3);

    // A rejected write never reaches the flush.
    let res = srv
        .client
        .post(srv.url("/products/"))
        .bearer_auth(&token)
        .json(&json!({ "name": "", "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_on_list_is_a_500_and_not_cached() {
    let store = Arc::new(FaultyStore {
        fail_list: true,
        ..FaultyStore::default()
    });
    let srv = TestServer::spawn_with(store.clone(), Arc::new(InMemoryResponseCache::new())).await;
    let token = srv.login().await;

    for _ in 0..2 {
        let res = srv
            .client
            .get(srv.url("/products/"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "store_error");
    }
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn deactivated_user_loses_access_and_refresh() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/login/"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    let tokens: serde_json::Value = res.json().await.unwrap();
    let access = tokens["access"].as_str().unwrap();
    assert_eq!(srv.list(access).await.len(), 2);

    assert!(srv.users.set_status(USERNAME, UserStatus::Inactive).unwrap());

    let res = srv
        .client
        .get(srv.url("/products/"))
        .bearer_auth(access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/login/refresh/"))
        .json(&json!({ "refresh": tokens["refresh"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/login/"))
        .json(&json!({ "username": USERNAME, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
