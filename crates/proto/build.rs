//! Build script for the `nhms-proto` crate.
//!
//! ## Purpose
//! Generates Rust protobuf types and the `gateway.Gateway` gRPC bindings from the vendored
//! ledger `.proto` files under `proto/`.
//!
//! ## Intended use
//! The client is used by `nhms-core` to talk to a gateway peer. The server trait is generated as
//! well so tests can stand up an in-process gateway.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let proto_include_root = std::path::Path::new(manifest_dir).join("proto");
    let proto_files = [
        proto_include_root.join("gateway/gateway.proto"),
        proto_include_root.join("msp/identities.proto"),
    ];

    println!("cargo:rerun-if-changed={}", proto_include_root.display());
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&proto_files, &[proto_include_root.as_path()])?;

    Ok(())
}
