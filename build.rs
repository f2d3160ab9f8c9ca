fn main() {
    // Release builds may stamp a version (e.g. from a git tag) over Cargo.toml's
    if let Ok(version) = std::env::var("GGWP_VERSION") {
        println!("cargo:rustc-env=CARGO_PKG_VERSION={version}");
    }
    println!("cargo:rerun-if-env-changed=GGWP_VERSION");
}
