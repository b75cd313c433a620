use std::time::Duration;

use ethers::{
    abi::{decode, Detokenize, ParamType, Token},
    contract::{ContractCall, ContractError, EthEvent},
    providers::Middleware,
    types::{Address, TransactionReceipt, U64},
};
use eyre::{eyre, Result};
use tokio::time::timeout;
use tracing::{debug, error, info};

/// The selector of `Error(string)`.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Decodes the reason of a `require`/`revert` with a message. Returns `None`
/// for custom errors and panics.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_SELECTOR {
        return None;
    }
    match decode(&[ParamType::String], &data[4..]).ok()?.pop()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}

/// A human readable description of a failed contract call.
pub fn revert_reason<M: Middleware>(error: &ContractError<M>) -> String {
    error
        .as_revert()
        .and_then(|data| decode_revert_reason(data.as_ref()))
        .unwrap_or_else(|| error.to_string())
}

/// Sends a transaction and waits at most `wait` for a successful receipt.
pub async fn send_and_confirm<M, D>(
    label: &str,
    call: ContractCall<M, D>,
    wait: Duration,
) -> Result<TransactionReceipt>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call.send().await.map_err(|e| {
        let reason = revert_reason(&e);
        error!(step = label, %reason, "transaction reverted");
        eyre!("{} reverted: {}", label, reason)
    })?;
    let tx_hash = pending.tx_hash();
    debug!(step = label, ?tx_hash, "sent transaction");

    let receipt = timeout(wait, pending)
        .await
        .map_err(|_| eyre!("{} timed out after {:?} waiting for {:?}", label, wait, tx_hash))??
        .ok_or_else(|| eyre!("{} was dropped from the mempool", label))?;
    ensure_success(label, &receipt)?;
    info!(step = label, ?tx_hash, gas_used = ?receipt.gas_used, "transaction mined");

    Ok(receipt)
}

/// Fails if the receipt says the transaction reverted. Mined reverts still
/// produce receipts, and deployment receipts still carry a contract address.
pub fn ensure_success(label: &str, receipt: &TransactionReceipt) -> Result<()> {
    if receipt.status == Some(U64::zero()) {
        error!(
            step = label,
            tx_hash = ?receipt.transaction_hash,
            "transaction failed on chain"
        );
        return Err(eyre!(
            "{} reverted in block {:?}",
            label,
            receipt.block_number
        ));
    }
    Ok(())
}

/// Finds the first `E` event that `emitter` logged in `receipt`. Logs are
/// matched by event signature, never by position.
pub fn find_event<E: EthEvent>(receipt: &TransactionReceipt, emitter: Address) -> Result<E> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter)
        .find_map(|log| E::decode_log(&log.clone().into()).ok())
        .ok_or_else(|| {
            eyre!(
                "no {} event from {:?} in {:?}",
                E::name(),
                emitter,
                receipt.transaction_hash
            )
        })
}
