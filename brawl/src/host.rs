//! Line-oriented RPC host.
//!
//! Each input line is one request:
//! `{"rpc": "attack", "user_id": "u-1", "payload": {"target_id": "..", "attack": "jab"}}`.
//! The payload may be a JSON value or a string holding JSON, and may be
//! omitted for RPCs that take none. Each request gets exactly one output
//! line, either `{"ok": <response>}` or `{"error": {"code": .., "message": ..}}`.

use brawl_core::rpc::{codes, RpcError, RpcRouter};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Deserialize)]
struct RequestLine {
    rpc: String,
    user_id: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseLine {
    Ok(serde_json::Value),
    Error(RpcError),
}

/// Serve requests from `input` until it ends, writing replies to `output`.
pub async fn serve<R, W>(router: &RpcRouter, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0u64;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let reply = match handle_line(router, line).await {
            Ok(value) => ResponseLine::Ok(value),
            Err(e) => ResponseLine::Error(e),
        };
        let mut encoded = serde_json::to_vec(&reply)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
        handled += 1;
    }

    tracing::info!(handled, "input closed");
    Ok(())
}

async fn handle_line(router: &RpcRouter, line: &str) -> Result<serde_json::Value, RpcError> {
    let request: RequestLine = serde_json::from_str(line)
        .map_err(|e| RpcError::new(codes::INVALID_ARGUMENT, format!("malformed request line: {e}")))?;

    let payload = match request.payload {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };

    router.handle(&request.rpc, &request.user_id, &payload).await
}
