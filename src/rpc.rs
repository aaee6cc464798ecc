// src/rpc.rs
use chrono::{DateTime, Utc};
use eyre::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::error::TrackerError;
use crate::models::{BalanceSnapshot, SwapMetadata, TokenBalance};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct RpcReply<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// `result` of a getTransaction call, cut down to what the classifier
/// needs.
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    meta: Option<TransactionMeta>,

    #[serde(rename = "blockTime")]
    block_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    #[serde(rename = "preTokenBalances", default)]
    pre_token_balances: Vec<TokenBalance>,

    #[serde(rename = "postTokenBalances", default)]
    post_token_balances: Vec<TokenBalance>,

    #[serde(rename = "preBalances")]
    pre_balances: Vec<u64>,

    #[serde(rename = "postBalances")]
    post_balances: Vec<u64>,

    // null on some older ledger entries, same meaning as absent
    #[serde(rename = "innerInstructions", default)]
    inner_instructions: Option<Vec<serde_json::Value>>,
}

/// One-shot transaction lookup over HTTP JSON-RPC.
///
/// No retry in here: a failed lookup is logged by the pipeline and the
/// signature is skipped.
pub struct TransactionFetcher {
    client: Client,
    endpoint: String,
}

impl TransactionFetcher {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, endpoint })
    }

    /// Fetch one transaction and reduce it to swap metadata.
    ///
    /// `Ok(None)` means the transaction carries no inner instructions and
    /// cannot be a swap.
    pub async fn fetch(&self, signature: &str) -> Result<Option<SwapMetadata>, TrackerError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [
                signature,
                { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
            ]
        });

        debug!("📡 Sending getTransaction → {}", signature);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(TrackerError::HttpStatus(resp.status()));
        }

        let text = resp.text().await?;
        parse_transaction_reply(&text)
    }
}

/// Decode a getTransaction response body into swap metadata.
fn parse_transaction_reply(text: &str) -> Result<Option<SwapMetadata>, TrackerError> {
    let reply: RpcReply<TransactionRecord> = serde_json::from_str(text)
        .map_err(|e| TrackerError::Protocol(format!("getTransaction reply: {e}")))?;

    if let Some(err) = reply.error {
        return Err(TrackerError::Protocol(format!(
            "getTransaction failed: {} (code {})",
            err.message, err.code
        )));
    }

    let record = reply
        .result
        .ok_or_else(|| TrackerError::Protocol("getTransaction returned no result".to_string()))?;
    let meta = record
        .meta
        .ok_or_else(|| TrackerError::Protocol("transaction has no meta".to_string()))?;

    if meta.inner_instructions.as_deref().unwrap_or_default().is_empty() {
        return Ok(None);
    }

    let pre_native = first_native(&meta.pre_balances, "preBalances")?;
    let post_native = first_native(&meta.post_balances, "postBalances")?;

    let block_time = record
        .block_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Ok(Some(SwapMetadata {
        pre: BalanceSnapshot {
            token_balances: meta.pre_token_balances,
            native_lamports: pre_native,
        },
        post: BalanceSnapshot {
            token_balances: meta.post_token_balances,
            native_lamports: post_native,
        },
        block_time,
    }))
}

// The tracked wallet pays the fee, so its native balance sits at index 0.
fn first_native(balances: &[u64], field: &'static str) -> Result<u64, TrackerError> {
    balances
        .first()
        .copied()
        .ok_or_else(|| TrackerError::Protocol(format!("{field} is empty")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn token_balance(mint: &str, ui_amount: Option<f64>) -> Value {
        json!({
            "accountIndex": 1,
            "mint": mint,
            "owner": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            "uiTokenAmount": {
                "uiAmount": ui_amount,
                "decimals": 6,
                "amount": "0",
                "uiAmountString": "0"
            }
        })
    }

    fn reply_with_meta(meta: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "slot": 271_467_115u64,
                "blockTime": 1_713_544_772i64,
                "transaction": { "signatures": ["sig"] },
                "meta": meta
            }
        })
        .to_string()
    }

    #[test]
    fn swap_transaction_reduces_to_metadata() {
        let body = reply_with_meta(json!({
            "preBalances": [5_000_000_000u64, 2_039_280u64],
            "postBalances": [4_500_000_000u64, 2_039_280u64],
            "preTokenBalances": [token_balance(MINT, Some(100.0))],
            "postTokenBalances": [token_balance(MINT, Some(250.0))],
            "innerInstructions": [{ "index": 2, "instructions": [] }]
        }));

        let meta = parse_transaction_reply(&body).unwrap().unwrap();
        assert_eq!(meta.pre.native_lamports, 5_000_000_000);
        assert_eq!(meta.post.native_lamports, 4_500_000_000);
        assert_eq!(meta.pre.token_balances.len(), 1);
        assert_eq!(meta.pre.token_balances[0].mint, MINT);
        assert_eq!(
            meta.post.token_balances[0].ui_token_amount.ui_amount,
            Some("250".parse().unwrap())
        );
        assert_eq!(
            meta.block_time,
            DateTime::<Utc>::from_timestamp(1_713_544_772, 0)
        );
    }

    #[test]
    fn empty_inner_instructions_is_not_a_swap() {
        let body = reply_with_meta(json!({
            "preBalances": [1u64],
            "postBalances": [1u64],
            "preTokenBalances": [],
            "postTokenBalances": [],
            "innerInstructions": []
        }));
        assert!(parse_transaction_reply(&body).unwrap().is_none());
    }

    #[test]
    fn absent_inner_instructions_is_not_a_swap() {
        let body = reply_with_meta(json!({
            "preBalances": [1u64],
            "postBalances": [1u64],
            "preTokenBalances": [],
            "postTokenBalances": []
        }));
        assert!(parse_transaction_reply(&body).unwrap().is_none());
    }

    #[test]
    fn null_inner_instructions_is_not_a_swap() {
        let body = reply_with_meta(json!({
            "preBalances": [1u64],
            "postBalances": [1u64],
            "preTokenBalances": [],
            "postTokenBalances": [],
            "innerInstructions": null
        }));
        assert!(parse_transaction_reply(&body).unwrap().is_none());
    }

    #[test]
    fn null_result_is_a_protocol_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
        let err = parse_transaction_reply(body).unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(_)));
    }

    #[test]
    fn rpc_error_body_is_a_protocol_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32004,"message":"Block not available"}}"#;
        let err = parse_transaction_reply(body).unwrap_err();
        match err {
            TrackerError::Protocol(msg) => assert!(msg.contains("Block not available")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_native_balances_is_a_protocol_error() {
        let body = reply_with_meta(json!({
            "preBalances": [],
            "postBalances": [1u64],
            "preTokenBalances": [],
            "postTokenBalances": [],
            "innerInstructions": [{ "index": 0, "instructions": [] }]
        }));
        let err = parse_transaction_reply(&body).unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(_)));
    }

    #[test]
    fn unparseable_body_is_a_protocol_error() {
        let err = parse_transaction_reply("<html>502</html>").unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(_)));
    }
}
