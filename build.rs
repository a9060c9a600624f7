use std::fs;

fn main() {
    // The VERSION file is the single source of truth for releases; keep
    // Cargo.toml in lockstep with it.
    let version_file =
        fs::read_to_string("VERSION").expect("VERSION file missing from the repository root");

    let version = version_file.trim();
    let cargo_version = env!("CARGO_PKG_VERSION");

    if version != cargo_version {
        panic!(
            "version mismatch: VERSION file says {} but Cargo.toml says {}",
            version, cargo_version
        );
    }

    println!("cargo:rerun-if-changed=VERSION");
}
