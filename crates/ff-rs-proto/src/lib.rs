//! Shard wire protocol: fixed-layout packet records and size validation.

pub mod codec;
pub mod error;
pub mod packets;
pub mod types;
