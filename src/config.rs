use dotenvy::dotenv;
use eyre::{eyre, Result};
use std::env;
use tracing::info;

use crate::models::AccountId;

#[derive(Debug, Clone)]
pub struct Config {
    pub account: AccountId,  // ✅ tracked wallet public key
    pub api_key: String,
    pub ws_url: String,      // endpoint base, api key appended on connect
    pub rpc_http_url: String,
}

impl Config {
    /// Full WebSocket endpoint with the api-key query parameter.
    pub fn ws_endpoint(&self) -> String {
        format!("{}/?api-key={}", self.ws_url.trim_end_matches('/'), self.api_key)
    }

    /// Full HTTP JSON-RPC endpoint with the api-key query parameter.
    pub fn rpc_endpoint(&self) -> String {
        format!(
            "{}/?api-key={}",
            self.rpc_http_url.trim_end_matches('/'),
            self.api_key
        )
    }
}

pub fn load() -> Result<Config> {
    dotenv().ok(); // ✅ Load from .env file

    // ✅ Tracked account (required, must be a 32-byte base58 key)
    let account: AccountId = env::var("ACCOUNT_PUBLIC_KEY")
        .map_err(|_| eyre!("ACCOUNT_PUBLIC_KEY not found. Ensure it is set in your .env file."))?
        .trim()
        .parse()?;

    // ✅ Helius API key (required)
    let api_key = env::var("HELIUS_API_KEY")
        .map_err(|_| eyre!("HELIUS_API_KEY not found. Ensure it is set in your .env file."))?;
    if api_key.trim().is_empty() {
        return Err(eyre!("HELIUS_API_KEY is empty"));
    }

    // ✅ Endpoint bases (default: Helius mainnet)
    let ws_url =
        env::var("RPC_WS_URL").unwrap_or_else(|_| "wss://mainnet.helius-rpc.com".to_string());
    let rpc_http_url =
        env::var("RPC_HTTP_URL").unwrap_or_else(|_| "https://mainnet.helius-rpc.com".to_string());

    let cfg = Config {
        account,
        api_key,
        ws_url,
        rpc_http_url,
    };

    // the api key stays out of the logs
    info!(
        "Loaded config: account {}, ws {}, rpc {}",
        cfg.account, cfg.ws_url, cfg.rpc_http_url
    );

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            account: "So11111111111111111111111111111111111111112".parse().unwrap(),
            api_key: "secret".to_string(),
            ws_url: "wss://mainnet.helius-rpc.com".to_string(),
            rpc_http_url: "https://mainnet.helius-rpc.com/".to_string(),
        }
    }

    #[test]
    fn endpoints_carry_the_api_key_query() {
        let cfg = sample();
        assert_eq!(
            cfg.ws_endpoint(),
            "wss://mainnet.helius-rpc.com/?api-key=secret"
        );
        // a trailing slash on the base must not double up
        assert_eq!(
            cfg.rpc_endpoint(),
            "https://mainnet.helius-rpc.com/?api-key=secret"
        );
    }
}
