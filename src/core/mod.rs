/*!
 * Core engines: rename masks, wildcard selection, part sizing and the
 * transfer orchestrator
 */

pub mod chunking;
pub mod template;
pub mod transfer;
pub mod wildcard;

pub use transfer::{
    connect, enumerate_keys, normalize_prefix, receive_files, resolve_credential, send_files,
    Enumeration, TransferOptions,
};
