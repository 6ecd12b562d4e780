//! # NHMS Proto
//!
//! Protobuf message types and gRPC bindings for the ledger gateway wire protocol, generated
//! from the `.proto` files under `proto/`.
//!
//! The modules are named after the protobuf packages:
//! - `common`: headers, payloads and envelopes shared by every transaction
//! - `msp`: serialized client identities
//! - `protos` (aliased as `peer`): proposals, chaincode invocation specs and proposal responses
//! - `gateway`: the `gateway.Gateway` service, its request/response messages, client and server

pub mod common {
    tonic::include_proto!("common");
}

pub mod msp {
    tonic::include_proto!("msp");
}

pub mod protos {
    tonic::include_proto!("protos");
}

pub mod gateway {
    tonic::include_proto!("gateway");
}

pub use protos as peer;

/// Gateway client over a tonic transport channel.
pub type GatewayClient = gateway::gateway_client::GatewayClient<tonic::transport::Channel>;
