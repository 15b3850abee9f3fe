use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api::ClockApi;
use crate::api::error::ClientError;
use crate::api::tokens::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenPair, TokenStore};
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::notify::{Notification, Notifier};

pub const EXCHANGE_PATH: &str = "/discord/access_token";
pub const CLOCKS_PATH: &str = "/clocks";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExchangeMode {
    /// Authorization code from the OAuth redirect.
    Code,
    /// Previously issued refresh token.
    Refresh,
}

impl ExchangeMode {
    fn query_key(self) -> &'static str {
        match self {
            ExchangeMode::Code => "code",
            ExchangeMode::Refresh => "refresh_token",
        }
    }
}

impl fmt::Display for ExchangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeMode::Code => f.write_str("CODE"),
            ExchangeMode::Refresh => f.write_str("REFRESH"),
        }
    }
}

#[derive(Deserialize)]
struct AccessAndRefreshTokens {
    access_token: String,
    refresh_token: String,
}

/// Client for the Dentifrice clock service.
///
/// Holds the bearer/refresh token pair loaded from `store` at construction.
/// A request rejected with 401 is retried once after exchanging the refresh
/// token; every failure that reaches the user goes through `notifier`.
pub struct Dentifrice {
    config: ClientConfig,
    http: Client,
    token: Mutex<TokenPair>,
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
}

impl Dentifrice {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Setup)?;
        let token = TokenPair::load(store.as_ref())?;
        debug!(
            base_url = %config.base_url,
            has_access = token.access().is_some(),
            has_refresh = token.refresh().is_some(),
            "client ready"
        );
        Ok(Self {
            config,
            http,
            token: Mutex::new(token),
            store,
            notifier,
        })
    }

    pub fn tokens(&self) -> TokenPair {
        self.token().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().access().is_some()
    }

    /// `bearer <access>` while an access token is held.
    pub fn auth_header(&self) -> Option<String> {
        self.token()
            .access()
            .map(|access| format!("bearer {access}"))
    }

    /// Trades an authorization code or refresh token for a fresh token pair.
    ///
    /// Storage and the in-memory pair are only touched on success. Any
    /// failure is reported to the user and comes back as `E_CRED_EXCHANGE`.
    pub fn exchange_code(&self, code: &str, mode: ExchangeMode) -> Result<(), ClientError> {
        match self.try_exchange(code, mode) {
            Ok(()) => {
                info!(%mode, "credentials exchanged");
                Ok(())
            }
            Err(err) => {
                warn!(%mode, error = %err, "credential exchange failed");
                self.notifier
                    .show(Notification::credential_exchange_failed());
                Err(ClientError::CredExchange(Box::new(err)))
            }
        }
    }

    fn try_exchange(&self, code: &str, mode: ExchangeMode) -> Result<(), ClientError> {
        let request = self
            .http
            .get(self.config.endpoint(EXCHANGE_PATH))
            .query(&[(mode.query_key(), code)]);
        let response = self.send(request, "GET", EXCHANGE_PATH, 200)?;
        let tokens: AccessAndRefreshTokens = read_json(response, EXCHANGE_PATH)?;

        self.store.set_item(ACCESS_TOKEN_KEY, &tokens.access_token)?;
        self.store.set_item(REFRESH_TOKEN_KEY, &tokens.refresh_token)?;
        *self.token() = TokenPair {
            access: Some(tokens.access_token),
            refresh: Some(tokens.refresh_token),
        };
        Ok(())
    }

    /// Runs `operation`, and runs it a second time after one refresh-token
    /// exchange if the first attempt was rejected with 401.
    ///
    /// Without a refresh token the 401 is returned as is. A second 401 is
    /// not retried again.
    pub fn with_auth_retry<T, F>(&self, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Result<T, ClientError>,
    {
        let err = match operation() {
            Err(err) if err.is_unauthorized() => err,
            other => return other,
        };
        let Some(refresh) = self.token().refresh().map(str::to_owned) else {
            return Err(err);
        };

        debug!("access token rejected, exchanging refresh token");
        self.token().access = None;
        self.exchange_code(&refresh, ExchangeMode::Refresh)?;
        operation()
    }

    /// Fetches every clock, without reporting failures to the user.
    ///
    /// Clocks that break the direction rule (up without a start, down
    /// without an end) are logged and left out.
    pub fn try_list_clocks(&self) -> Result<Vec<Clock>, ClientError> {
        let clocks: Vec<Clock> = self.with_auth_retry(|| {
            let request = self.http.get(self.config.endpoint(CLOCKS_PATH));
            let response = self.send(request, "GET", CLOCKS_PATH, 200)?;
            read_json(response, CLOCKS_PATH)
        })?;
        Ok(clocks
            .into_iter()
            .filter(|clock| match clock.check() {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        id = ?clock.id,
                        name = %clock.name,
                        error = %err,
                        "skipping invalid clock"
                    );
                    false
                }
            })
            .collect())
    }

    fn post_clock(&self, clock: &Clock) -> Result<(), ClientError> {
        let request = self.http.post(self.config.endpoint(CLOCKS_PATH)).json(clock);
        self.send(request, "POST", CLOCKS_PATH, 201)?;
        Ok(())
    }

    fn send(
        &self,
        request: RequestBuilder,
        method: &'static str,
        path: &str,
        expected_status: u16,
    ) -> Result<Response, ClientError> {
        let request = match self.auth_header() {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };
        debug!(method, path, "sending request");
        let response = request.send().map_err(|source| ClientError::Transport {
            method,
            path: path.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        if status != expected_status {
            return Err(ClientError::Status {
                method,
                path: path.to_string(),
                status,
            });
        }
        Ok(response)
    }

    /// Tells the user about a failed background request.
    fn report(&self, err: &ClientError) {
        match err.status() {
            Some(401) => {
                self.token().access = None;
                warn!(error = %err, "request rejected as unauthorized");
                self.notifier.show(Notification::login_required());
            }
            Some(_) => {
                warn!(error = %err, "request failed");
                self.notifier
                    .show(Notification::background_request_failed(err.kind()));
            }
            // Exchange failures were reported when they happened; transport
            // and decode failures only reach the log.
            None => warn!(error = %err, kind = %err.kind(), "request failed"),
        }
    }

    fn token(&self) -> MutexGuard<'_, TokenPair> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClockApi for Dentifrice {
    fn list_clocks(&self) -> Option<Vec<Clock>> {
        match self.try_list_clocks() {
            Ok(clocks) => {
                debug!(count = clocks.len(), "clocks listed");
                Some(clocks)
            }
            Err(err) => {
                self.report(&err);
                None
            }
        }
    }

    fn create_clock(&self, clock: &Clock) -> Result<(), ClientError> {
        self.with_auth_retry(|| self.post_clock(clock))
            .inspect(|_| info!(name = %clock.name, "clock created"))
            .inspect_err(|err| self.report(err))
    }
}

fn read_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ClientError> {
    let body = response.text().map_err(|source| ClientError::Transport {
        method: "GET",
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}
