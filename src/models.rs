// src/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

/// Public key of the tracked account, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = TrackerError;

    /// A Solana account id is a base58 string decoding to exactly 32 bytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| TrackerError::InvalidAccount(s.to_string()))?;
        if bytes.len() != 32 {
            return Err(TrackerError::InvalidAccount(s.to_string()));
        }
        Ok(AccountId(s.to_string()))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trading action derived from the pre/post balance snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapAction {
    NewBuy,
    Buy,
    PartialSell,
    SellAll,
    ReBuy,
}

impl fmt::Display for SwapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapAction::NewBuy => "New Buy",
            SwapAction::Buy => "Buy",
            SwapAction::PartialSell => "Partial-Sell",
            SwapAction::SellAll => "Sell all",
            SwapAction::ReBuy => "Re-buy",
        };
        f.write_str(label)
    }
}

/// One classified swap, ready for the output sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapEvent {
    pub signature: String,
    pub action: SwapAction,
    pub token_ca: String,      // mint of the swapped token
    pub token_amount: Decimal, // always non-negative
    pub sol_amount: Decimal,   // absolute native delta, 2 decimal places
    pub block_time: Option<DateTime<Utc>>,
}

impl fmt::Display for SwapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} for {} SOL ({})",
            self.action, self.token_amount, self.token_ca, self.sol_amount, self.signature
        )
    }
}

/// One entry of preTokenBalances / postTokenBalances.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    #[serde(rename = "accountIndex")]
    #[allow(dead_code)]
    pub account_index: u32,

    pub mint: String,

    #[serde(rename = "uiTokenAmount")]
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiTokenAmount {
    /// Human-scaled amount; null when the token account no longer exists.
    #[serde(rename = "uiAmount")]
    pub ui_amount: Option<Decimal>,
}

/// Token balances plus the wallet's native balance on one side of a
/// transaction.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    pub token_balances: Vec<TokenBalance>,
    pub native_lamports: u64,
}

/// Pre/post snapshots of one fetched transaction, the classifier's whole
/// input.
#[derive(Debug, Clone)]
pub struct SwapMetadata {
    pub pre: BalanceSnapshot,
    pub post: BalanceSnapshot,
    pub block_time: Option<DateTime<Utc>>,
}
