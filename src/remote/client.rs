use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use moodmeal_core::{DailyLog, DailyLogStore, DateKey, StoreError};

use crate::config::RemoteConfig;

const TABLE_PATH: &str = "/rest/v1/daily_logs";
const CONFLICT_KEY: &str = "user_id,date";
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=representation";

/// Row shape sent on upsert.
#[derive(Serialize)]
struct DailyLogRow<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    log: &'a DailyLog,
}

/// Store backed by the hosted `daily_logs` table.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl RemoteStore {
    /// Creates a client from config.
    ///
    /// Returns an error if the url or api key is missing.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, StoreError> {
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| StoreError::NotConfigured("remote.url is not set".into()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StoreError::NotConfigured("remote.api_key is not set".into()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::NotConfigured(e.to_string()))?;

        Ok(Self {
            base_url,
            api_key,
            access_token: config.access_token.clone(),
            http,
        })
    }

    /// Creates a client with explicit parameters and default HTTP settings.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), TABLE_PATH)
    }

    /// Attaches the project key and the caller's bearer token.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn read_rows(&self, response: reqwest::Response) -> Result<Vec<DailyLog>, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(http_error)
    }
}

fn http_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_decode() {
        StoreError::Decode(e.to_string())
    } else if let Some(status) = e.status() {
        StoreError::Http {
            status: status.as_u16(),
            message: e.to_string(),
        }
    } else {
        StoreError::Connection(e.to_string())
    }
}

#[async_trait]
impl DailyLogStore for RemoteStore {
    async fn fetch_range(
        &self,
        user_id: &str,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<DailyLog>, StoreError> {
        let request = self.http.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("date", format!("gte.{}", start)),
            ("date", format!("lte.{}", end)),
            ("order", "date.asc".to_string()),
        ]);

        let response = self.authorize(request).send().await.map_err(http_error)?;
        let logs = self.read_rows(response).await?;

        tracing::debug!(user_id, %start, %end, count = logs.len(), "Fetched daily logs");
        Ok(logs)
    }

    async fn upsert(&self, user_id: &str, log: &DailyLog) -> Result<DailyLog, StoreError> {
        let mut log = log.clone();
        log.recompute_totals();

        let request = self
            .http
            .post(self.table_url())
            .query(&[("on_conflict", CONFLICT_KEY)])
            .header("Prefer", UPSERT_PREFER)
            .json(&[DailyLogRow {
                user_id,
                log: &log,
            }]);

        let response = self.authorize(request).send().await.map_err(http_error)?;
        let stored = self
            .read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::MissingRow(log.date.to_string()))?;

        tracing::debug!(user_id, date = %stored.date, "Upserted daily log");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use moodmeal_core::{MealEntry, MealType};
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Rows = Arc<Mutex<HashMap<(String, String), Value>>>;

    /// Minimal stand-in for the `daily_logs` endpoint.
    fn fake_table(rows: Rows) -> Router {
        Router::new()
            .route("/rest/v1/daily_logs", get(list_rows).post(upsert_rows))
            .with_state(rows)
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").is_some_and(|v| v == "anon-key")
            && headers
                .get("authorization")
                .is_some_and(|v| v == "Bearer user-jwt")
    }

    async fn list_rows(
        State(rows): State<Rows>,
        headers: HeaderMap,
        Query(params): Query<Vec<(String, String)>>,
    ) -> Result<Json<Vec<Value>>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let filter = |key: &str, op: &str| {
            params
                .iter()
                .find(|(k, v)| k == key && v.starts_with(op))
                .map(|(_, v)| v[op.len()..].to_string())
        };
        let user = filter("user_id", "eq.").ok_or(StatusCode::BAD_REQUEST)?;
        let start = filter("date", "gte.").ok_or(StatusCode::BAD_REQUEST)?;
        let end = filter("date", "lte.").ok_or(StatusCode::BAD_REQUEST)?;

        let rows = rows.lock().unwrap();
        let mut matching: Vec<Value> = rows
            .iter()
            .filter(|((u, d), _)| *u == user && *d >= start && *d <= end)
            .map(|(_, v)| v.clone())
            .collect();
        matching.sort_by_key(|v| v["date"].as_str().unwrap_or_default().to_string());
        Ok(Json(matching))
    }

    async fn upsert_rows(
        State(rows): State<Rows>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Vec<Value>>,
    ) -> Result<(StatusCode, Json<Vec<Value>>), StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if params.get("on_conflict").map(String::as_str) != Some("user_id,date") {
            return Err(StatusCode::CONFLICT);
        }
        let prefer = headers
            .get("prefer")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !prefer.contains("resolution=merge-duplicates") {
            return Err(StatusCode::CONFLICT);
        }

        let mut rows = rows.lock().unwrap();
        let mut stored = Vec::new();
        for mut row in body {
            let key = (
                row["user_id"].as_str().unwrap_or_default().to_string(),
                row["date"].as_str().unwrap_or_default().to_string(),
            );
            let id = rows
                .get(&key)
                .map(|existing| existing["id"].clone())
                .unwrap_or_else(|| Value::String(uuid::Uuid::new_v4().to_string()));
            row["id"] = id;
            rows.insert(key, row.clone());
            stored.push(row);
        }
        Ok((StatusCode::CREATED, Json(stored)))
    }

    async fn spawn(rows: Rows) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, fake_table(rows)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> RemoteStore {
        RemoteStore::new(base_url, "anon-key").with_access_token("user-jwt")
    }

    fn key(day: u32) -> DateKey {
        DateKey::from_ymd(2024, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_then_fetch_range() {
        let rows = Rows::default();
        let url = spawn(rows.clone()).await;
        let store = client(&url);

        let log = DailyLog::new(key(5))
            .with_meals(vec![
                MealEntry::new("Pasta", MealType::Dinner).with_macros(300.0, 40.0, 10.0, 8.0)
            ])
            .with_water(2);
        let stored = store.upsert("user1", &log).await.unwrap();
        assert!(stored.id.is_some());
        assert_eq!(stored.total_calories, 300.0);

        store
            .upsert("user1", &DailyLog::new(DateKey::from_ymd(2024, 4, 1).unwrap()))
            .await
            .unwrap();

        let logs = store.fetch_range("user1", key(1), key(31)).await.unwrap();
        assert_eq!(logs, vec![stored]);

        let row = rows.lock().unwrap()[&("user1".to_string(), "2024-03-05".to_string())].clone();
        assert_eq!(row["water_intake"], 2);
        assert_eq!(row["meals"][0]["meal_type"], "dinner");
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row() {
        let rows = Rows::default();
        let url = spawn(rows.clone()).await;
        let store = client(&url);
        let log = DailyLog::new(key(9)).with_water(4);

        let first = store.upsert("user1", &log).await.unwrap();
        let second = store.upsert("user1", &first).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_range_is_not_an_error() {
        let url = spawn(Rows::default()).await;
        let logs = client(&url)
            .fetch_range("user1", key(1), key(31))
            .await
            .unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_http_error() {
        let url = spawn(Rows::default()).await;
        let store = RemoteStore::new(&url, "wrong-key");

        let err = store.fetch_range("user1", key(1), key(31)).await.unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = client(&format!("http://{}", addr));
        let err = store.fetch_range("user1", key(1), key(31)).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let missing = RemoteConfig::default();
        assert!(matches!(
            RemoteStore::from_config(&missing),
            Err(StoreError::NotConfigured(_))
        ));

        let config = RemoteConfig {
            url: Some("https://example.supabase.co/".into()),
            api_key: Some("anon".into()),
            ..RemoteConfig::default()
        };
        let store = RemoteStore::from_config(&config).unwrap();
        assert_eq!(
            store.table_url(),
            "https://example.supabase.co/rest/v1/daily_logs"
        );
    }
}
