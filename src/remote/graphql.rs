//! GraphQL executor over HTTP
//!
//! Posts `{ query, variables }` to the CMS GraphQL endpoint with the
//! injected bearer credential and turns the `data` object into a `Page`.

use super::credentials::CredentialProvider;
use super::executor::{FetchError, Page, QueryExecutor};
use crate::paging::QueryVariables;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a QueryVariables,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

#[derive(Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl GraphqlClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryExecutor for GraphqlClient {
    async fn execute(&self, query: &str, variables: &QueryVariables) -> Result<Page, FetchError> {
        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables });
        if let Some(token) = self.credentials.bearer() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            endpoint = %self.endpoint,
            page = variables.pagination.page,
            status = status.as_u16(),
            bytes = body.len(),
            "graphql response"
        );

        match serde_json::from_str::<GraphqlResponse>(&body) {
            Ok(parsed) if status.is_success() || !parsed.errors.is_empty() => into_page(parsed),
            Ok(_) => Err(FetchError::Status(status.as_u16())),
            Err(_) if !status.is_success() => Err(FetchError::Status(status.as_u16())),
            Err(e) => Err(FetchError::InvalidResponse(e.to_string())),
        }
    }
}

fn into_page(response: GraphqlResponse) -> Result<Page, FetchError> {
    if !response.errors.is_empty() {
        return Err(FetchError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    match response.data {
        Some(Value::Object(page)) => Ok(page),
        Some(other) => Err(FetchError::InvalidResponse(format!(
            "expected an object under `data`, got {}",
            kind_of(&other)
        ))),
        None => Err(FetchError::InvalidResponse("response has no `data`".to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
