use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcResponse<T> {
    Success { result: T },
    Error { error: RpcError },
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[allow(dead_code)]
    code: i64,
    #[allow(dead_code)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TxRecord {
    #[serde(rename = "blockTime")]
    block_time: Option<i64>,
    meta: Option<Value>,
}

const RPC_URL: &str = "https://mainnet.helius-rpc.com";

fn print_balances(label: &str, balances: &Value) {
    println!("{label}:");
    for entry in balances.as_array().into_iter().flatten() {
        println!(
            "  {} uiAmount={}",
            entry["mint"].as_str().unwrap_or("?"),
            entry["uiTokenAmount"]["uiAmount"]
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let signature = match env::args().nth(1) {
        Some(s) => s,
        None => {
            eprintln!("usage: fetch_tx <signature>");
            return Ok(());
        }
    };
    let api_key = env::var("HELIUS_API_KEY")?;
    let url = format!("{RPC_URL}/?api-key={api_key}");

    let client = Client::new();
    println!("Fetching transaction {signature}...");

    let res: RpcResponse<Option<TxRecord>> = client
        .post(&url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getTransaction",
            "params": [signature, { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }]
        }))
        .send()
        .await?
        .json()
        .await?;

    let record = match res {
        RpcResponse::Success {
            result: Some(record),
        } => record,
        RpcResponse::Success { result: None } => {
            eprintln!("No record for this signature (wrong cluster or not confirmed yet?)");
            return Ok(());
        }
        RpcResponse::Error { error } => {
            eprintln!("RPC error: {:?}", error);
            return Ok(());
        }
    };

    let Some(meta) = record.meta else {
        eprintln!("Transaction has no meta");
        return Ok(());
    };

    if let Some(t) = record.block_time {
        println!("Block time: {t}");
    }
    println!(
        "Inner instructions: {}",
        meta["innerInstructions"].as_array().map(|a| a.len()).unwrap_or(0)
    );
    println!(
        "Native lamports: {} → {}",
        meta["preBalances"][0], meta["postBalances"][0]
    );
    print_balances("Pre token balances", &meta["preTokenBalances"]);
    print_balances("Post token balances", &meta["postTokenBalances"]);

    Ok(())
}
