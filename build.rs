fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the bundled protoc unless the environment already provides one
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    println!("cargo:rerun-if-changed=proto/peerkv.proto");
    tonic_build::compile_protos("proto/peerkv.proto")?;
    Ok(())
}
