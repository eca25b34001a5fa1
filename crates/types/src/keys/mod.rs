// Path: crates/types/src/keys/mod.rs
//! Defines constants and builders for well-known state keys.
//!
//! Every service owns a distinct prefix. Composite keys join their parts with
//! `::`; numeric parts are big-endian so prefix scans return them in order.

use sha3::{Digest, Keccak256};

// --- Token ledger ---
/// Prefix for balances, keyed by `denom::account`.
pub const BANK_BALANCE_PREFIX: &[u8] = b"bank::balance::";

/// The key holding `account`'s balance of `denom`.
pub fn balance_key(denom: &str, account: &str) -> Vec<u8> {
    [BANK_BALANCE_PREFIX, denom.as_bytes(), b"::", account.as_bytes()].concat()
}

// --- Call router ---
/// The router's `XCallConfig` singleton.
pub const XCALL_CONFIG_KEY: &[u8] = b"xcall::config";
/// Prefix for default connections, keyed by destination network id.
pub const XCALL_DEFAULT_CONNECTION_PREFIX: &[u8] = b"xcall::default_connection::";
/// Prefix for `RollbackRecord`s, keyed by outbound sequence number.
pub const XCALL_ROLLBACK_PREFIX: &[u8] = b"xcall::rollback::";
/// Prefix for `ProxyRequest`s, keyed by request id.
pub const XCALL_PROXY_REQUEST_PREFIX: &[u8] = b"xcall::proxy::";
/// Prefix for inbound request quorums, keyed by `from_nid::sn`.
pub const XCALL_PENDING_REQUEST_PREFIX: &[u8] = b"xcall::pending::request::";
/// Prefix for result quorums, keyed by outbound sequence number.
pub const XCALL_PENDING_RESPONSE_PREFIX: &[u8] = b"xcall::pending::response::";
/// Prefix for successful-response markers, keyed by outbound sequence number.
pub const XCALL_SUCCESSFUL_RESPONSE_PREFIX: &[u8] = b"xcall::success::";
/// The `ReplyState` of the rollback-enabled request currently executing.
pub const XCALL_REPLY_STATE_KEY: &[u8] = b"xcall::reply_state";
/// The reply captured while a rollback-enabled request executes.
pub const XCALL_CALL_REPLY_KEY: &[u8] = b"xcall::call_reply";

/// The default connection for `network_id`.
pub fn default_connection_key(network_id: &str) -> Vec<u8> {
    [XCALL_DEFAULT_CONNECTION_PREFIX, network_id.as_bytes()].concat()
}

/// The rollback record of outbound call `sn`.
pub fn rollback_key(sn: u128) -> Vec<u8> {
    [XCALL_ROLLBACK_PREFIX, &sn.to_be_bytes()[..]].concat()
}

/// The proxy request `request_id`.
pub fn proxy_request_key(request_id: u128) -> Vec<u8> {
    [XCALL_PROXY_REQUEST_PREFIX, &request_id.to_be_bytes()[..]].concat()
}

/// The quorum of inbound request `sn` from `from_nid`.
pub fn pending_request_key(from_nid: &str, sn: u128) -> Vec<u8> {
    [
        XCALL_PENDING_REQUEST_PREFIX,
        from_nid.as_bytes(),
        b"::",
        &sn.to_be_bytes()[..],
    ]
    .concat()
}

/// The quorum of the result for outbound call `sn`.
pub fn pending_response_key(sn: u128) -> Vec<u8> {
    [XCALL_PENDING_RESPONSE_PREFIX, &sn.to_be_bytes()[..]].concat()
}

/// The successful-response marker of outbound call `sn`.
pub fn successful_response_key(sn: u128) -> Vec<u8> {
    [XCALL_SUCCESSFUL_RESPONSE_PREFIX, &sn.to_be_bytes()[..]].concat()
}

// --- Connections ---
/// Prefix shared by every connection instance.
pub const CONNECTION_PREFIX: &[u8] = b"conn::";

fn connection_key(connection: &str, suffix: &[u8]) -> Vec<u8> {
    [CONNECTION_PREFIX, connection.as_bytes(), b"::", suffix].concat()
}

/// The `ConnectionConfig` of a connection instance.
pub fn connection_config_key(connection: &str) -> Vec<u8> {
    connection_key(connection, b"config")
}

/// The outbound message counter of a connection instance.
pub fn connection_sn_key(connection: &str) -> Vec<u8> {
    connection_key(connection, b"sn")
}

/// The `NetworkFee` a connection instance charges for `network_id`.
pub fn connection_fee_key(connection: &str, network_id: &str) -> Vec<u8> {
    [connection_key(connection, b"fee::").as_slice(), network_id.as_bytes()].concat()
}

/// The delivery receipt of `conn_sn` from `network_id` on a connection instance.
pub fn connection_receipt_key(connection: &str, network_id: &str, conn_sn: u128) -> Vec<u8> {
    [
        connection_key(connection, b"receipt::").as_slice(),
        network_id.as_bytes(),
        b"::",
        &conn_sn.to_be_bytes()[..],
    ]
    .concat()
}

// --- Protocol registry ---
/// The registry's `ProtocolSet` singleton.
pub const REGISTRY_PROTOCOL_SET_KEY: &[u8] = b"xcall_manager::protocols";
/// Prefix for whitelisted governance actions, keyed by their Keccak-256 hash.
pub const REGISTRY_WHITELIST_PREFIX: &[u8] = b"xcall_manager::whitelist::";

/// The whitelist entry for `action`.
pub fn whitelist_key(action: &[u8]) -> Vec<u8> {
    [REGISTRY_WHITELIST_PREFIX, &keccak256(action)[..]].concat()
}

// --- Asset vault ---
/// The vault's `VaultConfig` singleton.
pub const VAULT_CONFIG_KEY: &[u8] = b"asset_manager::config";
/// Prefix for per-token `TokenState`, keyed by denomination.
pub const VAULT_TOKEN_STATE_PREFIX: &[u8] = b"asset_manager::token::";

/// The rate-limit state of `token`.
pub fn token_state_key(token: &str) -> Vec<u8> {
    [VAULT_TOKEN_STATE_PREFIX, token.as_bytes()].concat()
}

// --- Balanced dollar ---
/// The stablecoin's `BalancedDollarConfig` singleton.
pub const BALANCED_DOLLAR_CONFIG_KEY: &[u8] = b"balanced_dollar::config";

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}
