use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let proto_dir = crate_dir.join("proto");
    let out_dir = crate_dir.join("src/proto/generated");

    println!("cargo:rerun-if-changed=proto/file_storage.proto");

    // Committed code is used unless it was removed on purpose.
    if out_dir.join("file_storage.v1.rs").exists() {
        return Ok(());
    }

    if env::var("PROTOC").is_err() {
        println!("cargo:warning=PROTOC not set, cannot regenerate src/proto/generated");
        return Ok(());
    }

    std::fs::create_dir_all(&out_dir)?;
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir(&out_dir)
        .compile_protos(&[proto_dir.join("file_storage.proto")], &[proto_dir])?;

    Ok(())
}
