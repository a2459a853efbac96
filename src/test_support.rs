//! In-memory collaborators for unit tests: a scripted wallet and a stub
//! HTTP server.

use crate::wallet::{EvmWallet, PreparedTransaction, ReceiptSummary};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Answers `eth_call`s from a (contract, selector) table and records every
/// transaction it is asked to send.
pub(crate) struct MockWallet {
    address: Address,
    chain_id: u64,
    native_balance: U256,
    calls: HashMap<(Address, [u8; 4]), Bytes>,
    exact_calls: HashMap<(Address, Bytes), Bytes>,
    sent: Mutex<Vec<PreparedTransaction>>,
    receipts: AtomicUsize,
    revert: bool,
}

impl MockWallet {
    pub(crate) fn new() -> Self {
        Self {
            address: Address::repeat_byte(0xaa),
            chain_id: 56,
            native_balance: U256::ZERO,
            calls: HashMap::new(),
            exact_calls: HashMap::new(),
            sent: Mutex::new(Vec::new()),
            receipts: AtomicUsize::new(0),
            revert: false,
        }
    }

    pub(crate) fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub(crate) fn with_native_balance(mut self, balance: U256) -> Self {
        self.native_balance = balance;
        self
    }

    pub(crate) fn with_call(mut self, to: Address, selector: [u8; 4], ret: impl Into<Bytes>) -> Self {
        self.calls.insert((to, selector), ret.into());
        self
    }

    /// Answer one exact calldata; takes precedence over a selector-wide reply.
    pub(crate) fn with_exact_call(
        mut self,
        to: Address,
        calldata: impl Into<Bytes>,
        ret: impl Into<Bytes>,
    ) -> Self {
        self.exact_calls.insert((to, calldata.into()), ret.into());
        self
    }

    pub(crate) fn reverting(mut self) -> Self {
        self.revert = true;
        self
    }

    pub(crate) fn sent(&self) -> Vec<PreparedTransaction> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn receipts_awaited(&self) -> usize {
        self.receipts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvmWallet for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256> {
        Ok(self.native_balance)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        if let Some(ret) = self.exact_calls.get(&(to, data.clone())) {
            return Ok(ret.clone());
        }
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::Rpc("calldata shorter than a selector".into()))?;
        self.calls.get(&(to, selector)).cloned().ok_or_else(|| {
            Error::Rpc(format!(
                "no mocked response for {} 0x{}",
                to,
                alloy::primitives::hex::encode(selector)
            ))
        })
    }

    async fn send_transaction(&self, tx: PreparedTransaction) -> Result<B256> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<ReceiptSummary> {
        self.receipts.fetch_add(1, Ordering::SeqCst);
        if self.revert {
            return Err(Error::Contract(format!("Transaction {} reverted", tx_hash)));
        }
        Ok(ReceiptSummary {
            tx_hash,
            block_number: Some(1),
            gas_used: 21_000,
        })
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        Ok(format!("0xsigned({})", message))
    }
}

/// Canned response for one method and path (query string ignored).
pub(crate) struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
}

pub(crate) fn route(method: &'static str, path: &str, status: u16, body: serde_json::Value) -> Route {
    Route {
        method,
        path: path.to_string(),
        status,
        body: body.to_string(),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: String,
    /// Path including the query string.
    pub(crate) target: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Minimal HTTP/1.1 server on localhost answering from a fixed route table.
/// Unmatched requests get a 404 with an empty JSON object.
pub(crate) struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub(crate) async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let recorded = Arc::clone(&recorded);
                tokio::spawn(async move {
                    let _ = serve_connection(stream, &routes, &recorded).await;
                });
            }
        });

        Self { base, requests }
    }

    pub(crate) fn base(&self) -> String {
        self.base.clone()
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    routes: &[Route],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok());
    let chunked = headers
        .iter()
        .any(|(k, v)| k == "transfer-encoding" && v.contains("chunked"));

    loop {
        let body_len = buf.len() - header_end;
        let complete = match content_length {
            Some(len) => body_len >= len,
            None if chunked => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = target.split('?').next().unwrap_or_default().to_string();
    let (status, body) = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, "{}".to_string()));

    recorded.lock().unwrap().push(RecordedRequest {
        method,
        target,
        headers,
        body: buf[header_end..].to_vec(),
    });

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
