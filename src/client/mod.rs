//! Typed client for the finance API, routed through the proxy.
//!
//! All calls go to `<proxy>/api/proxy/<path>`; authenticated calls carry
//! `Authorization: Bearer <token>`.

pub mod summary;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use summary::{format_amount, summarize, ExpenseFilter, Summary};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    pub category: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

/// Body for creating or updating an expense.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub description: String,
    pub category: String,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ClientError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ClientError::InvalidInput("amount must be a positive number".into()));
        }
        if self.description.trim().is_empty() {
            return Err(ClientError::InvalidInput("description must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

pub struct FinanceClient {
    client: Client,
    proxy_url: String,
    token: Option<String>,
}

impl FinanceClient {
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: Client::new(),
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Full URL for an upstream path, e.g. `expenses/3`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/proxy/{}", self.proxy_url, path.trim_start_matches('/'))
    }

    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<AuthSession, ClientError> {
        let body = Credentials { email, password, name };
        self.send(self.request(Method::POST, "auth/register").json(&body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = Credentials { email, password, name: None };
        self.send(self.request(Method::POST, "auth/login").json(&body)).await
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.send(self.request(Method::GET, "expenses")).await
    }

    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ClientError> {
        expense.validate()?;
        self.send(self.request(Method::POST, "expenses").json(expense)).await
    }

    pub async fn update_expense(&self, id: i64, expense: &NewExpense) -> Result<Expense, ClientError> {
        expense.validate()?;
        let path = format!("expenses/{}", id);
        self.send(self.request(Method::PUT, &path).json(expense)).await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<(), ClientError> {
        let path = format!("expenses/{}", id);
        let _: serde_json::Value = self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(response.json().await?)
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    ClientError::Api {
        status,
        message: error_message(status, &text),
    }
}

/// The `error` field of a JSON body, or a generic message.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}
