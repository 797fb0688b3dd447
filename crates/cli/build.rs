//! Build metadata for `labelrecon --version`.

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-env-changed=LABELRECON_COMMIT");

    // Source tarballs have no .git; packagers can pass the commit instead.
    let commit = env::var("LABELRECON_COMMIT")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .or_else(short_commit)
        .unwrap_or_else(|| UNKNOWN.to_string());
    println!("cargo:rustc-env=LABELRECON_COMMIT={}", commit.trim());

    let target = env::var("TARGET").unwrap_or_else(|_| UNKNOWN.to_string());
    println!("cargo:rustc-env=LABELRECON_TARGET={target}");
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}
