//! Shared utilities for integration testing.

#![allow(dead_code)]

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use custody_signer::config::{prepare, CustodyConfig, CustodyUserConfig, NetworkUserConfig, UserConfig};
use custody_signer::custody::{CustodyApi, CustodyApiError, SigningIntent, StatusReport, SubmissionAck};
use custody_signer::observability::{StatusEvent, StatusListener};
use custody_signer::rpc::{JsonRpcError, ProviderError, ProviderRequest, ProviderResult, Transport};

pub const NODE_URL: &str = "https://node.example.org";
pub const SENDER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

/// Custody settings for a test network with fast polling.
pub fn custody_config(poll_ms: u64, timeout_ms: u64, chain_id: Option<u64>) -> Arc<CustodyConfig> {
    let mut user = UserConfig::default();
    user.networks.insert(
        "testnet".into(),
        NetworkUserConfig {
            url: Some(NODE_URL.into()),
            custody: Some(CustodyUserConfig {
                api_key: Some("test-key".into()),
                api_base_url: Some("https://custody.example.org".into()),
                poll_interval_ms: Some(poll_ms),
                max_poll_interval_ms: Some(poll_ms),
                timeout_ms: Some(timeout_ms),
                chain_id,
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    let prepared = prepare(&user).unwrap();
    prepared.get("testnet").unwrap().custody.clone()
}

/// In-memory node. Answers a fixed table of methods and records every call.
#[derive(Default)]
pub struct FakeNode {
    pub calls: Mutex<Vec<ProviderRequest>>,
    results: HashMap<String, Value>,
}

impl FakeNode {
    pub fn new() -> Self {
        let mut results = HashMap::new();
        results.insert("eth_chainId".to_string(), json!("0x1"));
        results.insert("eth_blockNumber".to_string(), json!("0x10d4f"));
        results.insert("eth_getBalance".to_string(), json!("0xde0b6b3a7640000"));
        Self {
            calls: Mutex::new(Vec::new()),
            results,
        }
    }

    /// What the node answers for `method`, without recording a call.
    pub fn results_for(&self, method: &str) -> Value {
        self.results.get(method).cloned().unwrap_or(Value::Null)
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|r| r.method.clone()).collect()
    }
}

#[async_trait]
impl Transport for FakeNode {
    async fn send(&self, request: &ProviderRequest) -> ProviderResult<Value> {
        self.calls.lock().unwrap().push(request.clone());
        match self.results.get(&request.method) {
            Some(result) => Ok(result.clone()),
            None => Err(ProviderError::Rpc(JsonRpcError::new(
                -32601,
                format!("the method {} does not exist/is not available", request.method),
            ))),
        }
    }
}

/// Custody service that replays a script of status responses.
///
/// The last scripted status repeats once the script is exhausted.
pub struct ScriptedCustody {
    pub submits: AtomicU32,
    pub polls: AtomicU32,
    pub intents: Mutex<Vec<SigningIntent>>,
    ack: Result<SubmissionAck, u16>,
    script: Mutex<VecDeque<Result<StatusReport, u16>>>,
    last: Mutex<Option<Result<StatusReport, u16>>>,
    accounts: Vec<Address>,
}

impl ScriptedCustody {
    pub fn new(ack: SubmissionAck, script: Vec<Result<StatusReport, u16>>) -> Self {
        Self {
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            intents: Mutex::new(Vec::new()),
            ack: Ok(ack),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            accounts: vec![SENDER.parse().unwrap()],
        }
    }

    /// A service whose submit endpoint answers with `status`.
    pub fn failing_submit(status: u16) -> Self {
        Self {
            ack: Err(status),
            ..Self::new(ack("unused"), vec![])
        }
    }

    pub fn submits(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

fn http_error(status: u16) -> CustodyApiError {
    CustodyApiError::Status {
        status,
        body: "scripted failure".into(),
    }
}

#[async_trait]
impl CustodyApi for ScriptedCustody {
    async fn submit(&self, intent: &SigningIntent) -> Result<SubmissionAck, CustodyApiError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.intents.lock().unwrap().push(intent.clone());
        self.ack.clone().map_err(http_error)
    }

    async fn status(&self, _id: &str) -> Result<StatusReport, CustodyApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let step = match next {
            Some(step) => {
                *self.last.lock().unwrap() = Some(step.clone());
                step
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Err(404)),
        };
        step.map_err(http_error)
    }

    async fn accounts(&self) -> Result<Vec<Address>, CustodyApiError> {
        Ok(self.accounts.clone())
    }
}

pub fn ack(id: &str) -> SubmissionAck {
    ack_with(id, "SUBMITTED", None)
}

pub fn ack_with(id: &str, status: &str, reason: Option<&str>) -> SubmissionAck {
    serde_json::from_value(json!({ "id": id, "status": status, "reason": reason })).unwrap()
}

/// Custody service that hands out `tx-1`, `tx-2`, ... and keeps a separate
/// status script per remote id. The last status of a script repeats.
pub struct KeyedCustody {
    submits: AtomicU32,
    pub polls: Mutex<Vec<String>>,
    scripts: Mutex<HashMap<String, VecDeque<StatusReport>>>,
}

impl KeyedCustody {
    pub fn new(scripts: Vec<(&str, Vec<StatusReport>)>) -> Self {
        Self {
            submits: AtomicU32::new(0),
            polls: Mutex::new(Vec::new()),
            scripts: Mutex::new(
                scripts
                    .into_iter()
                    .map(|(id, steps)| (id.to_string(), steps.into()))
                    .collect(),
            ),
        }
    }

    pub fn submits(&self) -> u32 {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls_for(&self, id: &str) -> usize {
        self.polls.lock().unwrap().iter().filter(|p| *p == id).count()
    }
}

#[async_trait]
impl CustodyApi for KeyedCustody {
    async fn submit(&self, _intent: &SigningIntent) -> Result<SubmissionAck, CustodyApiError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ack(&format!("tx-{}", n)))
    }

    async fn status(&self, id: &str) -> Result<StatusReport, CustodyApiError> {
        self.polls.lock().unwrap().push(id.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(id) else {
            return Err(http_error(404));
        };
        let step = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        step.ok_or_else(|| http_error(404))
    }

    async fn accounts(&self) -> Result<Vec<Address>, CustodyApiError> {
        Ok(vec![])
    }
}

pub fn report(id: &str, status: &str, extra: Value) -> StatusReport {
    let mut body = json!({ "id": id, "status": status });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    serde_json::from_value(body).unwrap()
}

/// Collects status events in emission order.
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<StatusEvent>>,
}

impl StatusListener for RecordingListener {
    fn on_transition(&self, event: &StatusEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A request seen by [`MockHttp`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Minimal HTTP/1.1 server answering every request through a handler.
pub struct MockHttp {
    pub url: Url,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttp {
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn start_mock_backend<F>(handler: F) -> MockHttp
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = requests.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                serve_connection(socket, handler.as_ref(), &recorded).await;
            });
        }
    });

    MockHttp {
        url: format!("http://{}/", addr).parse().unwrap(),
        requests,
    }
}

async fn serve_connection<F>(mut socket: TcpStream, handler: &F, recorded: &Mutex<Vec<RecordedRequest>>)
where
    F: Fn(&RecordedRequest) -> (u16, String),
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    recorded.lock().unwrap().push(request.clone());

    let (status, body) = handler(&request);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(header_end + length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
