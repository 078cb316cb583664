//! Supabase PostgREST client

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::MatchRecord;
use super::MatchRequest;
use super::QueryLog;
use super::VectorStoreBackend;
use crate::config::AppConfig;
use crate::errors::RagError;
use crate::errors::Result;

/// Client for the Supabase REST API of one project
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    key: String,
    match_function: String,
    client: Client,
}

impl SupabaseClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// - Missing or invalid Supabase URL, missing key (`RagError::Config`)
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = config.supabase_url()?;
        let key = config.supabase_key()?.to_string();
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        info!("Supabase client configured for {}", base_url);

        Ok(Self {
            base_url,
            key,
            match_function: config.vector_store.match_function.clone(),
            client,
        })
    }

    /// Persist answered queries into `table`
    pub fn query_log(&self, table: impl Into<String>) -> SupabaseQueryLog {
        SupabaseQueryLog {
            client: self.clone(),
            table: table.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        debug!("POST {}", url);
        self.client
            .post(url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(RagError::Provider {
        provider: "Supabase",
        status,
        body,
    })
}

#[async_trait]
impl VectorStoreBackend for SupabaseClient {
    async fn match_documents(&self, request: &MatchRequest<'_>) -> Result<Vec<MatchRecord>> {
        let response = self
            .post(&format!("rpc/{}", self.match_function))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        // PostgREST answers `null` for functions returning no rows
        let records: Option<Vec<MatchRecord>> = response
            .json()
            .await
            .map_err(|e| RagError::MalformedResponse(format!("match results: {e}")))?;

        Ok(records.unwrap_or_default())
    }
}

/// Query log stored in a Supabase table with `query`, `answer` and `created_at` columns
pub struct SupabaseQueryLog {
    client: SupabaseClient,
    table: String,
}

#[async_trait]
impl QueryLog for SupabaseQueryLog {
    async fn save_query(&self, query: &str, answer: &str) -> Result<()> {
        #[derive(Serialize)]
        struct QueryRow<'a> {
            query: &'a str,
            answer: &'a str,
            created_at: chrono::DateTime<Utc>,
        }

        let response = self
            .client
            .post(&self.table)
            .header("Prefer", "return=minimal")
            .json(&QueryRow {
                query,
                answer,
                created_at: Utc::now(),
            })
            .send()
            .await?;
        ensure_success(response).await?;

        debug!("Saved query to table {}", self.table);
        Ok(())
    }
}
