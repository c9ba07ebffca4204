use crate::config::toml_config::BridgeConfig;
use crate::domain::model::{PoolConfig, Record};
use crate::domain::ports::{ConnectionPool, Driver};
use crate::utils::error::{IbmiError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum BridgeRequest<'a> {
    Connect { id: u64, config: &'a PoolConfig },
    Query { id: u64, sql: &'a str },
    Close { id: u64 },
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    rows: Vec<Record>,
    error: Option<String>,
}

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

struct BridgeIo {
    writer: BoxedWriter,
    lines: Lines<BufReader<BoxedReader>>,
}

/// 透過外部 JDBC bridge 子行程連線
///
/// 每個連線池啟動一個 bridge，以 stdio 收發逐行 JSON，回覆會帶回請求的 `id`：
///
/// ```text
/// > {"op":"connect","id":1,"config":{"host":"pub400.com","user":"LOWCODE","password":"..","prompt":"false"}}
/// < {"id":1,"ok":true}
/// > {"op":"query","id":2,"sql":"SELECT FNAME FROM LOWCODE1.PTBL LIMIT 2"}
/// < {"id":2,"ok":true,"rows":[{"FNAME":"GEORGE"}]}
/// > {"op":"close","id":3}
/// < {"id":3,"ok":true}
/// ```
///
/// `"ok":false` 時 `error` 內為驅動程式訊息，原封不動轉為 [`IbmiError::Execution`]
pub struct BridgePool {
    io: Mutex<BridgeIo>,
    child: Mutex<Option<Child>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl BridgePool {
    /// 以任意雙向串流建立 (子行程的 stdio 或測試用的 duplex)
    pub fn from_io(reader: BoxedReader, writer: BoxedWriter, child: Option<Child>) -> Self {
        Self {
            io: Mutex::new(BridgeIo {
                writer,
                lines: BufReader::new(reader).lines(),
            }),
            child: Mutex::new(child),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub async fn connect(&self, config: &PoolConfig) -> Result<()> {
        let id = self.next_id();
        self.round_trip(id, &BridgeRequest::Connect { id, config })
            .await
            .map(|_| ())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn round_trip(&self, id: u64, request: &BridgeRequest<'_>) -> Result<Vec<Record>> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');

        // 一來一回需在同一把鎖內完成，回覆才不會錯置
        let mut io = self.io.lock().await;
        io.writer.write_all(line.as_bytes()).await.map_err(bridge_io_error)?;
        io.writer.flush().await.map_err(bridge_io_error)?;

        // 被中斷的請求會留下舊回覆，id 較小者直接略過
        let response = loop {
            let reply = io
                .lines
                .next_line()
                .await
                .map_err(bridge_io_error)?
                .ok_or_else(|| IbmiError::Bridge {
                    message: "bridge closed its output".to_string(),
                })?;

            let response: BridgeResponse =
                serde_json::from_str(&reply).map_err(|e| IbmiError::Bridge {
                    message: format!("unreadable reply '{}': {}", reply, e),
                })?;

            if response.id < id {
                tracing::debug!("Discarding stale bridge reply {} (waiting for {})", response.id, id);
                continue;
            }
            if response.id > id {
                return Err(IbmiError::Bridge {
                    message: format!("reply id {} does not match request id {}", response.id, id),
                });
            }
            break response;
        };
        drop(io);

        if !response.ok {
            return Err(IbmiError::execution(
                response.error.unwrap_or_else(|| "unknown driver error".to_string()),
            ));
        }
        Ok(response.rows)
    }
}

fn bridge_io_error(e: std::io::Error) -> IbmiError {
    IbmiError::Bridge {
        message: e.to_string(),
    }
}

#[async_trait]
impl ConnectionPool for BridgePool {
    async fn query(&self, sql: &str) -> Result<Vec<Record>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(IbmiError::Bridge {
                message: "pool is already closed".to_string(),
            });
        }
        let id = self.next_id();
        self.round_trip(id, &BridgeRequest::Query { id, sql }).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let id = self.next_id();
        let result = self.round_trip(id, &BridgeRequest::Close { id }).await.map(|_| ());

        if let Some(mut child) = self.child.lock().await.take() {
            match child.wait().await {
                Ok(status) => tracing::debug!("JDBC bridge exited with {}", status),
                Err(e) => tracing::warn!("Failed to wait for JDBC bridge: {}", e),
            }
        }
        result
    }
}

/// 每個連線池啟動一個 bridge 子行程
#[derive(Debug, Clone)]
pub struct BridgeDriver {
    command: String,
    args: Vec<String>,
}

impl BridgeDriver {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl Driver for BridgeDriver {
    type Pool = BridgePool;

    async fn pool(&self, config: &PoolConfig) -> Result<BridgePool> {
        tracing::debug!("Starting JDBC bridge: {} {:?}", self.command, self.args);

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| IbmiError::Bridge {
                message: format!("failed to start '{}': {}", self.command, e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| IbmiError::Bridge {
            message: "bridge stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| IbmiError::Bridge {
            message: "bridge stdout unavailable".to_string(),
        })?;

        let pool = BridgePool::from_io(Box::new(stdout), Box::new(stdin), Some(child));
        pool.connect(config).await?;
        Ok(pool)
    }
}
