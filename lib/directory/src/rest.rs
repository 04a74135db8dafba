//! Directory backed by the hosted PostgREST row API.
//!
//! Every request carries the project API key both as `apikey` and as a
//! bearer token. Rows are fetched with `select=*,roles(*)` so a user
//! arrives with its role embedded.

use async_trait::async_trait;
use campus_login_access::{NewUser, Role, User};
use campus_login_core::{Result, RoleId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::UserDirectory;
use crate::error::DirectoryError;
use crate::record::{RoleRecord, UserRecord};

/// Embed selecting a user together with its role.
const USER_SELECT: &str = "*,roles(*)";

/// PostgREST client for the `users` and `roles` tables.
#[derive(Clone)]
pub struct RestDirectory {
    http: Client,
    rest_url: String,
}

impl RestDirectory {
    /// Creates a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).map_err(|e| DirectoryError::Configuration {
            details: format!("invalid API key: {}", e),
        })?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            DirectoryError::Configuration {
                details: format!("invalid API key: {}", e),
            }
        })?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| DirectoryError::Configuration {
                details: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{}", self.rest_url, name)
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, DirectoryError> {
        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Request {
                status: status.as_u16(),
                details,
            }
            .into());
        }

        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| DirectoryError::Decode {
                details: e.to_string(),
            })?;

        Ok(rows)
    }
}

#[async_trait]
impl UserDirectory for RestDirectory {
    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let filter = format!("eq.{}", email);
        let request = self.http.get(self.table("users")).query(&[
            ("select", USER_SELECT),
            ("email", filter.as_str()),
            ("limit", "1"),
        ]);

        let rows: Vec<UserRecord> = self
            .fetch_rows(request)
            .await
            .inspect_err(|e| error!(error = %e, "failed to fetch user"))?;

        let user = rows.into_iter().next().map(UserRecord::into_user);
        debug!(found = user.is_some(), "user lookup");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DirectoryError> {
        let filter = format!("eq.{}", name);
        let request = self.http.get(self.table("roles")).query(&[
            ("select", "*"),
            ("role_name", filter.as_str()),
            ("limit", "1"),
        ]);

        let rows: Vec<RoleRecord> = self
            .fetch_rows(request)
            .await
            .inspect_err(|e| error!(error = %e, "failed to fetch role"))?;

        Ok(rows.into_iter().next().map(RoleRecord::into_role))
    }

    #[instrument(skip(self, full_name))]
    async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role_id: &RoleId,
    ) -> Result<User, DirectoryError> {
        let new_user = NewUser::new(email, full_name, role_id);
        let request = self
            .http
            .post(self.table("users"))
            .query(&[("select", USER_SELECT)])
            .header("Prefer", "return=representation")
            .json(&new_user);

        let rows: Vec<UserRecord> = self
            .fetch_rows(request)
            .await
            .inspect_err(|e| error!(error = %e, "failed to create user"))?;

        let user = rows
            .into_iter()
            .next()
            .map(UserRecord::into_user)
            .ok_or(DirectoryError::EmptyInsert)?;

        Ok(user)
    }
}
