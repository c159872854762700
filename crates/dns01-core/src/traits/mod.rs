//! Core traits for DNS-01 provisioning
//!
//! - [`RpcTransport`]: Deliver JSON-RPC calls to the provider API

pub mod rpc_transport;

pub use rpc_transport::{JSONRPC_VERSION, ResultCode, RpcRequest, RpcResponse, RpcTransport};
