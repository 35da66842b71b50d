//! HTTP client for the e-commerce order service.
//!
//! Every request is signed as the learner it is made for: an HS256 JWT
//! carrying the learner's identity, sent as `Authorization: JWT <token>`.

use std::time::Duration;

use chrono::Utc;
use courseware_common::identity::User;
use courseware_common::order::{parse_date_placed, OrderError, OrderLookup, OrderNumber, PlacedOrder};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Where the order service lives and how to sign requests to it.
#[derive(Debug, Clone)]
pub struct EcommerceConfig {
    /// API root, e.g. `https://ecommerce.example.com/api/v2`.
    pub api_url: String,
    pub signing_key: String,
    pub timeout: Duration,
    pub token_ttl: Duration,
}

impl EcommerceConfig {
    pub fn new(api_url: &str, signing_key: &str) -> Self {
        Self {
            api_url: api_url.to_string(),
            signing_key: signing_key.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// Claims identifying the learner a request is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerClaims {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct OrderResponse {
    date_placed: String,
}

/// Order lookups against the remote service on behalf of one learner.
pub struct EcommerceClient {
    http: reqwest::Client,
    api_url: Url,
    encoding_key: EncodingKey,
    user: User,
    token_ttl: Duration,
}

impl EcommerceClient {
    pub fn for_user(config: &EcommerceConfig, user: &User) -> Result<Self, OrderError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| OrderError::Config(format!("bad API url '{}': {e}", config.api_url)))?;
        if api_url.cannot_be_a_base() {
            return Err(OrderError::Config(format!(
                "API url '{}' cannot carry a path",
                config.api_url
            )));
        }
        if config.signing_key.is_empty() {
            return Err(OrderError::Config("signing key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OrderError::Config(e.to_string()))?;

        Ok(Self {
            http,
            api_url,
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            user: user.clone(),
            token_ttl: config.token_ttl,
        })
    }

    /// `{api_url}/orders/{number}/`, with the number percent-encoded.
    pub fn order_url(&self, number: &OrderNumber) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["orders", number.as_str(), ""]);
        }
        url
    }

    fn token(&self) -> Result<String, OrderError> {
        let iat = Utc::now().timestamp();
        let claims = LearnerClaims {
            username: self.user.username.clone(),
            email: self.user.email.clone(),
            full_name: self.user.full_name.clone(),
            iat,
            exp: iat + self.token_ttl.as_secs() as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| OrderError::Auth(e.to_string()))
    }
}

impl OrderLookup for EcommerceClient {
    async fn placed_order(&self, number: &OrderNumber) -> Result<PlacedOrder, OrderError> {
        let url = self.order_url(number);
        let token = self.token()?;
        tracing::debug!(order = %number, %url, "fetching order");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("JWT {token}"))
            .send()
            .await
            .map_err(|e| OrderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OrderError::UnexpectedStatus {
                order: number.clone(),
                status: status.as_u16(),
            });
        }

        let body: OrderResponse = resp.json().await.map_err(|e| OrderError::Malformed {
            order: number.clone(),
            reason: e.to_string(),
        })?;
        let date_placed =
            parse_date_placed(&body.date_placed).ok_or_else(|| OrderError::Malformed {
                order: number.clone(),
                reason: format!("unreadable date_placed '{}'", body.date_placed),
            })?;

        Ok(PlacedOrder {
            number: number.clone(),
            date_placed,
        })
    }
}
