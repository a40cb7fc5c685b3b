use reqwest::Method;
use serde_json::Value;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::client::Client;
use crate::client::RequestOptions;
use crate::error::ApiError;
use crate::error::Result;
use crate::events::AuthEvent;
use crate::types::LoginRequest;
use crate::types::LoginResponse;
use crate::types::RegisterRequest;

impl Client {
    /// Exchange email and password for a session and store it.
    ///
    /// A 401 here means bad credentials, so it is returned as-is rather than
    /// triggering a renewal.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = serde_json::to_value(LoginRequest { email, password })
            .map_err(ApiError::Encode)?;
        let login: LoginResponse = self
            .request(
                Method::POST,
                "/auth/login",
                Some(body),
                RequestOptions::new().without_renewal(),
            )
            .await?
            .json()?;
        self.session()
            .set_session(login.access_token.clone(), login.role)?;
        match login.role {
            Some(role) => info!("logged in as {role}"),
            None => info!("logged in"),
        }
        self.emit(AuthEvent::LoggedIn { role: login.role });
        Ok(login)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        let body = serde_json::to_value(request).map_err(ApiError::Encode)?;
        self.request(
            Method::POST,
            "/auth/register",
            Some(body),
            RequestOptions::new().without_renewal(),
        )
        .await?
        .json_value()
    }

    /// Renew the session now instead of waiting for a 401. Clears the
    /// session and returns [`ApiError::Unauthenticated`] when the refresh
    /// cookie is no longer accepted.
    pub async fn refresh(&self) -> Result<String> {
        self.renew_session().await
    }

    /// Tell the server to end the session, then clear local state no matter
    /// what the server said.
    pub async fn logout(&self) -> Result<()> {
        let res = self
            .request(
                Method::POST,
                "/auth/logout",
                Some(json!({})),
                RequestOptions::new().without_renewal(),
            )
            .await;
        if let Err(err) = res {
            warn!("logout request failed: {err}");
        }
        self.expire_refresh_cookie();
        self.session().clear_session()?;
        info!("logged out");
        self.emit(AuthEvent::LoggedOut);
        Ok(())
    }
}
