fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generated code is committed under src/grpc/generated; regeneration is
    // opt-in because it needs protoc on PATH.
    if std::env::var("HELIX_REGENERATE_PROTOS").ok().as_deref() != Some("1") {
        return Ok(());
    }

    // Only compile proto if the proto directory exists
    let proto_dir = std::path::Path::new("proto");
    if !proto_dir.exists() {
        return Ok(());
    }

    // Create output directory if it doesn't exist
    std::fs::create_dir_all("src/grpc/generated")?;

    tonic_build::configure()
        .build_server(true) // Workers serve Health; tests serve CacheService
        .build_client(true)
        .out_dir("src/grpc/generated")
        .compile_protos(&["proto/helix/cache/v1/cache.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/");

    Ok(())
}
