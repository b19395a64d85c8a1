use anyhow::Result;

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=proto/grpcbeacon/v1/beacon.proto");
    println!("cargo:rerun-if-env-changed=BEACON_REGENERATE_PROTO");

    // Generated code is checked in; regenerating needs protoc.
    if std::env::var("BEACON_REGENERATE_PROTO").is_err() {
        return Ok(());
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir("./src/proto")
        .compile_protos(&["proto/grpcbeacon/v1/beacon.proto"], &["proto"])?;

    Ok(())
}
