use std::env;
use std::process::Command;

fn main() {
    let version = match Command::new("git").args(["describe", "--tags"]).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        }
        _ => env::var("BUILD_VERSION")
            .unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap_or_default()),
    };
    println!("cargo:rustc-env=BUILD_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=BUILD_VERSION");
}
