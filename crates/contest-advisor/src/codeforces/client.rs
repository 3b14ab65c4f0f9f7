//! Codeforces HTTP client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha512};

use super::{ContestApi, RateGate, StandingsQuery};
use crate::error::{AdvisorError, Result};
use crate::model::{Contest, ProblemSet, RatingChange, Standings, Submission, User};

/// Codeforces client configuration
#[derive(Clone, Debug)]
pub struct CodeforcesConfig {
    /// API root, e.g. `https://codeforces.com/api`
    pub base_url: String,

    /// Key/secret pair used to sign authenticated methods
    pub api_key: Option<String>,
    pub api_secret: Option<String>,

    /// Minimum spacing between calls (the API allows one call per 2 s)
    pub min_interval: Duration,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CodeforcesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://codeforces.com/api".into(),
            api_key: None,
            api_secret: None,
            min_interval: Duration::from_millis(2000),
            timeout_secs: 30,
        }
    }
}

impl CodeforcesConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let min_interval_ms = parse_number(
            "CODEFORCES_MIN_INTERVAL_MS",
            std::env::var("CODEFORCES_MIN_INTERVAL_MS").ok(),
            2000,
        )?;

        Ok(Self {
            base_url: std::env::var("CODEFORCES_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("CODEFORCES_API_KEY").ok().filter(|k| !k.is_empty()),
            api_secret: std::env::var("CODEFORCES_API_SECRET").ok().filter(|s| !s.is_empty()),
            min_interval: Duration::from_millis(min_interval_ms),
            timeout_secs: parse_number(
                "CODEFORCES_TIMEOUT_SECS",
                std::env::var("CODEFORCES_TIMEOUT_SECS").ok(),
                defaults.timeout_secs,
            )?,
        })
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        self.api_key.as_deref().zip(self.api_secret.as_deref())
    }
}

fn parse_number(name: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AdvisorError::Config(format!("{name} is not a number: {raw}"))),
        None => Ok(default),
    }
}

/// Response envelope shared by every API method
#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    comment: Option<String>,
    result: Option<T>,
}

/// Real Codeforces API client. Every call passes through the shared `RateGate`.
pub struct CodeforcesClient {
    http: reqwest::Client,
    config: CodeforcesConfig,
    gate: Arc<RateGate>,
}

impl CodeforcesClient {
    pub fn new(config: CodeforcesConfig) -> Result<Self> {
        let gate = Arc::new(RateGate::new(config.min_interval));
        Self::with_gate(config, gate)
    }

    /// Create a client sharing an existing gate
    pub fn with_gate(config: CodeforcesConfig, gate: Arc<RateGate>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AdvisorError::Config(e.to_string()))?;

        Ok(Self { http, config, gate })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CodeforcesConfig::from_env()?)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<(&str, String)>,
        signed: bool,
    ) -> Result<T> {
        let mut params: Vec<(String, String)> =
            params.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

        if signed {
            if let Some((key, secret)) = self.config.credentials() {
                let nonce = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
                sign(method, &mut params, key, secret, chrono::Utc::now().timestamp(), &nonce);
            }
        }

        self.gate.acquire().await;
        tracing::debug!(method, params = params.len(), "Codeforces API call");

        let url = format!("{}/{method}", self.config.base_url.trim_end_matches('/'));
        let response = self.http.get(url).query(&params).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_envelope(method, status, &body)
    }
}

fn parse_envelope<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) if envelope.status == "OK" => envelope.result.ok_or_else(|| AdvisorError::Api {
            method: method.into(),
            comment: "response carried no result".into(),
        }),
        Ok(envelope) => Err(AdvisorError::Api {
            method: method.into(),
            comment: envelope.comment.unwrap_or_else(|| envelope.status.clone()),
        }),
        Err(_) if !(200..300).contains(&status) => Err(AdvisorError::Http {
            method: method.into(),
            status,
        }),
        Err(e) => Err(e.into()),
    }
}

/// `apiSig` for a call: the nonce followed by the hex SHA-512 of
/// `{nonce}/{method}?{sorted params}#{secret}`.
pub fn api_signature(nonce: &str, method: &str, params: &[(String, String)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort();
    let query = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha512::digest(format!("{nonce}/{method}?{query}#{secret}").as_bytes());
    format!("{nonce}{}", hex::encode(digest))
}

fn sign(method: &str, params: &mut Vec<(String, String)>, key: &str, secret: &str, time: i64, nonce: &str) {
    params.push(("apiKey".into(), key.into()));
    params.push(("time".into(), time.to_string()));
    let signature = api_signature(nonce, method, params, secret);
    params.push(("apiSig".into(), signature));
}

#[async_trait]
impl ContestApi for CodeforcesClient {
    async fn user_info(&self, handles: &[String]) -> Result<Vec<User>> {
        if handles.is_empty() {
            return Err(AdvisorError::InvalidArgument("at least one handle is required".into()));
        }
        self.call("user.info", vec![("handles", handles.join(";"))], false).await
    }

    async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>> {
        self.call("user.rating", vec![("handle", handle.to_string())], false).await
    }

    async fn user_status(&self, handle: &str, from: u32, count: u32) -> Result<Vec<Submission>> {
        let params = vec![
            ("handle", handle.to_string()),
            ("from", from.to_string()),
            ("count", count.to_string()),
        ];
        self.call("user.status", params, true).await
    }

    async fn contest_list(&self, gym: bool) -> Result<Vec<Contest>> {
        self.call("contest.list", vec![("gym", gym.to_string())], false).await
    }

    async fn contest_standings(&self, query: &StandingsQuery) -> Result<Standings> {
        let mut params = vec![
            ("contestId", query.contest_id.to_string()),
            ("from", query.from.to_string()),
            ("count", query.count.to_string()),
            ("showUnofficial", query.show_unofficial.to_string()),
        ];
        if !query.handles.is_empty() {
            params.push(("handles", query.handles.join(";")));
        }
        self.call("contest.standings", params, true).await
    }

    async fn rated_list(&self, active_only: bool) -> Result<Vec<User>> {
        self.call("user.ratedList", vec![("activeOnly", active_only.to_string())], false)
            .await
    }

    async fn problemset(&self, tags: &[String]) -> Result<ProblemSet> {
        let params = if tags.is_empty() {
            Vec::new()
        } else {
            vec![("tags", tags.join(";"))]
        };
        self.call("problemset.problems", params, false).await
    }

    fn name(&self) -> &str {
        "Codeforces"
    }
}
