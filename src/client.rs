//! Scoring service client
//!
//! [`ScoringService`] is the seam between the session core and the remote
//! scorer. [`HttpScoringClient`] speaks the JSON-over-HTTP contract:
//!
//! | Call | Endpoint |
//! |---|---|
//! | Synthetic features | `POST /demo/inject` |
//! | Enroll | `POST /auth/register` |
//! | Verify | `POST /auth/verify` |
//! | Status | `GET /auth/status?uid=` |
//! | Logout | `POST /auth/logout` |

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::types::{
    ErrorBody, FeatureVector, InjectMode, InjectRequest, InjectResponse, LogoutRequest, Profile,
    RegisterRequest, RegisterResponse, VerifyRequest, VerifyResponse,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Remote scorer operations used by sessions and the dashboard
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Fetch a feature vector for the captured sample
    async fn fetch_features(&self, mode: InjectMode) -> Result<FeatureVector, SessionError>;

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SessionError>;

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, SessionError>;

    async fn status(&self, uid: &str) -> Result<Profile, SessionError>;

    async fn logout(&self, uid: &str) -> Result<(), SessionError>;
}

/// reqwest-backed client for the scoring service
#[derive(Clone)]
pub struct HttpScoringClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, call: &'static str, request: RequestBuilder) -> Result<Response, SessionError> {
        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout {
                    call,
                    after_ms: self.timeout.as_millis() as u64,
                }
            } else {
                SessionError::Transport(format!("{call}: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.err)
            .unwrap_or_else(|_| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    text
                }
            });

        Err(SessionError::Status {
            call,
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(call: &'static str, response: Response) -> Result<T, SessionError> {
        response
            .json::<T>()
            .await
            .map_err(|e| SessionError::Decode(format!("{call}: {e}")))
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn fetch_features(&self, mode: InjectMode) -> Result<FeatureVector, SessionError> {
        let request = self
            .client
            .post(self.url("/demo/inject"))
            .json(&InjectRequest { mode });
        let response = self.send("inject", request).await?;
        let body: InjectResponse = Self::decode("inject", response).await?;
        Ok(body.feats)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SessionError> {
        let response = self
            .send("register", self.client.post(self.url("/auth/register")).json(request))
            .await?;
        // Success is any 2xx; the body is informational
        Ok(response.json::<RegisterResponse>().await.unwrap_or_default())
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, SessionError> {
        let response = self
            .send("verify", self.client.post(self.url("/auth/verify")).json(request))
            .await?;
        Self::decode("verify", response).await
    }

    async fn status(&self, uid: &str) -> Result<Profile, SessionError> {
        let request = self
            .client
            .get(self.url("/auth/status"))
            .query(&[("uid", uid)]);
        let response = self.send("status", request).await?;
        Self::decode("status", response).await
    }

    async fn logout(&self, uid: &str) -> Result<(), SessionError> {
        let request = self.client.post(self.url("/auth/logout")).json(&LogoutRequest {
            uid: uid.to_string(),
        });
        self.send("logout", request).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory scorer double shared by the crate's tests

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// How a scripted call should behave
    #[derive(Debug, Clone)]
    pub enum Script<T> {
        Ok(T),
        Fail(String),
        /// Never resolves; exercises the caller's timeout
        Hang,
    }

    pub struct MockScorer {
        pub features: Script<FeatureVector>,
        pub register: Script<RegisterResponse>,
        pub verify: Script<VerifyResponse>,
        pub status: Script<Profile>,
        pub logout: Script<()>,
        pub fetch_calls: AtomicUsize,
        pub register_calls: AtomicUsize,
        pub verify_calls: AtomicUsize,
        pub last_register: Mutex<Option<RegisterRequest>>,
        pub last_verify: Mutex<Option<VerifyRequest>>,
    }

    impl Default for MockScorer {
        fn default() -> Self {
            Self {
                features: Script::Ok(vec![150.0, 30.0, 170.0, 900.0]),
                register: Script::Ok(RegisterResponse {
                    baseline_dim: Some(4),
                }),
                verify: Script::Ok(VerifyResponse {
                    authenticated: true,
                    anomaly_score: 0.1,
                    threshold: Some(0.5),
                    attempt: Some(1),
                }),
                status: Script::Ok(Profile {
                    user_id: "alice".to_string(),
                    auth_attempts: 2,
                    baseline_feature_dimension: 14,
                    created_ts: None,
                }),
                logout: Script::Ok(()),
                fetch_calls: AtomicUsize::new(0),
                register_calls: AtomicUsize::new(0),
                verify_calls: AtomicUsize::new(0),
                last_register: Mutex::new(None),
                last_verify: Mutex::new(None),
            }
        }
    }

    impl MockScorer {
        pub fn verdict(authenticated: bool, anomaly_score: f64) -> Self {
            Self {
                verify: Script::Ok(VerifyResponse {
                    authenticated,
                    anomaly_score,
                    threshold: Some(0.5),
                    attempt: Some(1),
                }),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> (usize, usize, usize) {
            (
                self.fetch_calls.load(Ordering::SeqCst),
                self.register_calls.load(Ordering::SeqCst),
                self.verify_calls.load(Ordering::SeqCst),
            )
        }
    }

    async fn play<T: Clone>(script: &Script<T>, call: &'static str) -> Result<T, SessionError> {
        match script {
            Script::Ok(value) => Ok(value.clone()),
            Script::Fail(msg) => Err(SessionError::Transport(format!("{call}: {msg}"))),
            Script::Hang => std::future::pending().await,
        }
    }

    #[async_trait]
    impl ScoringService for MockScorer {
        async fn fetch_features(&self, _mode: InjectMode) -> Result<FeatureVector, SessionError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            play(&self.features, "inject").await
        }

        async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, SessionError> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_register.lock().unwrap() = Some(request.clone());
            play(&self.register, "register").await
        }

        async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, SessionError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_verify.lock().unwrap() = Some(request.clone());
            play(&self.verify, "verify").await
        }

        async fn status(&self, _uid: &str) -> Result<Profile, SessionError> {
            play(&self.status, "status").await
        }

        async fn logout(&self, _uid: &str) -> Result<(), SessionError> {
            play(&self.logout, "logout").await
        }
    }
}
