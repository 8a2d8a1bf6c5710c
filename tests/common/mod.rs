//! Shared test utilities: a scripted XP service and an in-process HTTP mock

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;

use ancient_monad::api::{ApiError, ReferralRecord, TwitterConnection, XpRecord, XpService};
use ancient_monad::ledger::MemoryStore;
use ancient_monad::retry::RetryPolicy;
use ancient_monad::tracker::XpTracker;

pub const WALLET: &str = "0x1111111111111111111111111111111111111111";
pub const OTHER_WALLET: &str = "0x2222222222222222222222222222222222222222";

/// Retries without waiting
pub const INSTANT_RETRY: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

type Script<T> = Mutex<VecDeque<Result<T, ApiError>>>;

/// [`XpService`] that replays scripted results per endpoint.
///
/// An endpoint with nothing scripted succeeds with an empty payload.
#[derive(Default)]
pub struct MockService {
    xp: Script<XpRecord>,
    claims: Script<XpRecord>,
    referrals: Script<ReferralRecord>,
    created: Script<String>,
    twitter: Script<TwitterConnection>,
    calls: Mutex<Vec<&'static str>>,
}

fn pop<T>(script: &Script<T>, empty: impl FnOnce() -> T) -> Result<T, ApiError> {
    script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Ok(empty()))
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_xp(&self, result: Result<XpRecord, ApiError>) {
        self.xp.lock().unwrap().push_back(result);
    }

    pub fn push_claim(&self, result: Result<XpRecord, ApiError>) {
        self.claims.lock().unwrap().push_back(result);
    }

    pub fn push_referral(&self, result: Result<ReferralRecord, ApiError>) {
        self.referrals.lock().unwrap().push_back(result);
    }

    pub fn push_created(&self, result: Result<String, ApiError>) {
        self.created.lock().unwrap().push_back(result);
    }

    pub fn push_twitter(&self, result: Result<TwitterConnection, ApiError>) {
        self.twitter.lock().unwrap().push_back(result);
    }

    /// Script `count` network failures for the daily claim
    pub fn fail_claims(&self, count: usize) {
        for _ in 0..count {
            self.push_claim(Err(transport_error()));
        }
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == endpoint)
            .count()
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }
}

#[async_trait]
impl XpService for MockService {
    async fn fetch_xp(&self, _wallet: &str) -> Result<XpRecord, ApiError> {
        self.record("fetch_xp");
        pop(&self.xp, XpRecord::default)
    }

    async fn claim_daily(&self, _wallet: &str) -> Result<XpRecord, ApiError> {
        self.record("claim_daily");
        pop(&self.claims, XpRecord::default)
    }

    async fn fetch_referral(&self, _wallet: &str) -> Result<ReferralRecord, ApiError> {
        self.record("fetch_referral");
        pop(&self.referrals, ReferralRecord::default)
    }

    async fn create_referral(
        &self,
        _wallet: &str,
        _referrer_code: Option<&str>,
    ) -> Result<String, ApiError> {
        self.record("create_referral");
        pop(&self.created, || "MOCK1".to_string())
    }

    async fn connect_twitter(
        &self,
        _wallet: &str,
        _twitter_token: &str,
    ) -> Result<TwitterConnection, ApiError> {
        self.record("connect_twitter");
        pop(&self.twitter, || TwitterConnection {
            twitter_connected: true,
            ..Default::default()
        })
    }
}

pub fn transport_error() -> ApiError {
    ApiError::Transport("Connection refused".to_string())
}

pub fn server_error() -> ApiError {
    ApiError::Server {
        status: 500,
        message: "Failed to fetch XP data".to_string(),
    }
}

/// Tracker over `service` and `store` that retries without waiting
pub fn tracker(service: &Arc<MockService>, store: &MemoryStore) -> XpTracker {
    XpTracker::new(service.clone(), Arc::new(store.clone())).with_retry_policy(INSTANT_RETRY)
}

/// A request seen by [`MockServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Minimal HTTP server answering each request with the next scripted
/// `(status, body)` pair
pub struct MockServer {
    pub base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockServer {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let mut request = match server.recv_timeout(Duration::from_secs(5)) {
                    Ok(Some(request)) => request,
                    _ => break,
                };

                let mut content = String::new();
                let _ = request.as_reader().read_to_string(&mut content);
                seen.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: content,
                });

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap();
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
            seen
        });

        Self {
            base_url: format!("http://{}/api", addr),
            handle,
        }
    }

    /// Wait for the scripted responses to be served and return the requests
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().unwrap()
    }
}
