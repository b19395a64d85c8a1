//! Generated protobuf and gRPC bindings for `grpcbeacon.v1`.
//!
//! Regenerate with `BEACON_REGENERATE_PROTO=1 cargo build -p beacon` (needs
//! `protoc`). [`descriptor`] is maintained by hand alongside.

pub mod descriptor;

#[allow(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
pub mod grpcbeacon {
    /// Version 1 of the beacon API.
    pub mod v1 {
        include!("grpcbeacon.v1.rs");
    }
}
