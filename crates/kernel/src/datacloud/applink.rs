//! Heroku AppLink authorization and Data Cloud HTTP access.
//!
//! Authorization is a two-step exchange:
//! 1. `GET {api_url}/authorizations/{connection}` returns the org's core
//!    access token and instance URL.
//! 2. The core token is exchanged at `{instance_url}/services/a360/token` for
//!    a Data Cloud tenant token.
//!
//! The resulting [`DataCloudSession`] runs SQL at `{tenant}/api/v2/query` and
//! forwards read requests to the core REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Authorizer, DataCloudContext, QueryResponse};
use crate::config::Config;
use crate::error::{AuthorizationError, QueryError, QueryResult};

const CDP_GRANT_TYPE: &str = "urn:salesforce:grant-type:external:cdp";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";

#[derive(Debug, Deserialize)]
struct AuthorizationBody {
    org: OrgBody,
}

#[derive(Debug, Deserialize)]
struct OrgBody {
    instance_url: String,
    api_version: String,
    user_auth: UserAuthBody,
}

#[derive(Debug, Deserialize)]
struct UserAuthBody {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TenantTokenBody {
    access_token: String,
    instance_url: String,
}

/// AppLink-backed [`Authorizer`].
#[derive(Clone)]
pub struct AppLinkClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl AppLinkClient {
    /// Create a client for the given AppLink API.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let api_url: String = api_url.into();

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.applink_api_url.clone(),
            config.applink_token.clone(),
            config.http_timeout(),
        )
    }

    async fn fetch_org(&self, connection: &str) -> Result<OrgBody, AuthorizationError> {
        let url = format!(
            "{}/authorizations/{}",
            self.api_url,
            urlencoding::encode(connection)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| AuthorizationError::Request {
                connection: connection.to_string(),
                source,
            })?;

        let body: AuthorizationBody = authorization_json(connection, response).await?;
        Ok(body.org)
    }

    async fn exchange_tenant_token(
        &self,
        connection: &str,
        org: &OrgBody,
    ) -> Result<TenantTokenBody, AuthorizationError> {
        let url = format!(
            "{}/services/a360/token",
            org.instance_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", CDP_GRANT_TYPE),
                ("subject_token", org.user_auth.access_token.as_str()),
                ("subject_token_type", ACCESS_TOKEN_TYPE),
            ])
            .send()
            .await
            .map_err(|source| AuthorizationError::Request {
                connection: connection.to_string(),
                source,
            })?;

        authorization_json(connection, response).await
    }
}

#[async_trait]
impl Authorizer for AppLinkClient {
    async fn authorize(
        &self,
        connection_name: &str,
    ) -> Result<Arc<dyn DataCloudContext>, AuthorizationError> {
        debug!(connection = %connection_name, "fetching AppLink authorization");
        let org = self.fetch_org(connection_name).await?;

        debug!(connection = %connection_name, "exchanging core token for Data Cloud token");
        let tenant = self.exchange_tenant_token(connection_name, &org).await?;

        Ok(Arc::new(DataCloudSession {
            http: self.http.clone(),
            core_url: org.instance_url.trim_end_matches('/').to_string(),
            core_token: org.user_auth.access_token,
            api_version: normalize_api_version(&org.api_version),
            tenant_url: normalize_tenant_url(&tenant.instance_url),
            tenant_token: tenant.access_token,
        }))
    }
}

/// Authenticated Data Cloud session for one connection.
pub struct DataCloudSession {
    http: reqwest::Client,
    core_url: String,
    core_token: String,
    api_version: String,
    tenant_url: String,
    tenant_token: String,
}

#[async_trait]
impl DataCloudContext for DataCloudSession {
    async fn query(&self, sql: &str) -> QueryResult<QueryResponse> {
        let response = self
            .http
            .post(format!("{}/api/v2/query", self.tenant_url))
            .bearer_auth(&self.tenant_token)
            .json(&serde_json::json!({ "sql": sql }))
            .send()
            .await?;

        query_json(response).await
    }

    async fn core_get(&self, resource: &str) -> QueryResult<serde_json::Value> {
        let response = self
            .http
            .get(format!(
                "{}/services/data/v{}/{}",
                self.core_url,
                self.api_version,
                resource.trim_start_matches('/')
            ))
            .bearer_auth(&self.core_token)
            .send()
            .await?;

        query_json(response).await
    }
}

async fn authorization_json<T: DeserializeOwned>(
    connection: &str,
    response: reqwest::Response,
) -> Result<T, AuthorizationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthorizationError::Rejected {
            connection: connection.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AuthorizationError::InvalidResponse {
            connection: connection.to_string(),
            reason: e.to_string(),
        })
}

async fn query_json<T: DeserializeOwned>(response: reqwest::Response) -> QueryResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(QueryError::Execution(format!(
            "Data Cloud request failed ({}): {body}",
            status.as_u16()
        )));
    }

    Ok(response.json::<T>().await?)
}

/// Tenant URLs come back as bare hosts.
fn normalize_tenant_url(instance_url: &str) -> String {
    let trimmed = instance_url.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// "62.0" and "v62.0" both become "62.0".
fn normalize_api_version(version: &str) -> String {
    version.trim().trim_start_matches('v').to_string()
}
