// src/classifier.rs
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::TrackerError;
use crate::models::{SwapAction, SwapEvent, SwapMetadata};

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert a raw lamport amount to SOL, rounded to 2 decimal places
/// (half-up, deterministic).
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    (Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Derive the trading action from the pre/post balance snapshots.
///
/// `Ok(None)` means the transaction touched no token balances and is not a
/// swap. `MalformedMetadata` means a required amount was missing; the
/// caller drops the event and keeps the stream alive.
///
/// The token is always the mint of the first pre-snapshot entry, and a
/// single pre-snapshot entry always reads as the token's first appearance
/// in the wallet.
pub fn classify(signature: &str, meta: &SwapMetadata) -> Result<Option<SwapEvent>, TrackerError> {
    let pre = &meta.pre.token_balances;
    let post = &meta.post.token_balances;

    // absolute native delta; the direction is carried by the action
    let sol_amount =
        lamports_to_sol(meta.pre.native_lamports.abs_diff(meta.post.native_lamports));

    let Some(first_pre) = pre.first() else {
        return Ok(None);
    };
    let token_ca = first_pre.mint.clone();

    // a missing post entry counts the same as a null amount
    let post_amt = post.first().and_then(|b| b.ui_token_amount.ui_amount);

    let (action, token_amount) = if pre.len() == 1 {
        let amount = post_amt.ok_or(TrackerError::MalformedMetadata(
            "post-swap token amount missing for new buy",
        ))?;
        (SwapAction::NewBuy, amount)
    } else {
        let pre_amt = first_pre.ui_token_amount.ui_amount;
        match (pre_amt, post_amt) {
            (Some(pre_amt), None) => (SwapAction::SellAll, pre_amt),
            (None, Some(post_amt)) => (SwapAction::ReBuy, post_amt),
            (Some(pre_amt), Some(post_amt)) if post_amt < pre_amt => {
                (SwapAction::PartialSell, pre_amt - post_amt)
            }
            (Some(pre_amt), Some(post_amt)) => (SwapAction::Buy, post_amt - pre_amt),
            (None, None) => {
                return Err(TrackerError::MalformedMetadata(
                    "pre- and post-swap token amounts missing",
                ))
            }
        }
    };

    Ok(Some(SwapEvent {
        signature: signature.to_string(),
        action,
        token_ca,
        token_amount,
        sol_amount,
        block_time: meta.block_time,
    }))
}
