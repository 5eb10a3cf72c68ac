use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");

    let git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=ZPACK_GIT_COMMIT={}", git.trim());

    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=ZPACK_BUILD_DATE={build_date}");

    // Включённые фичи кодека для `zpack-cli --version`.
    let mut features = Vec::new();
    if std::env::var_os("CARGO_FEATURE_TRACKING").is_some() {
        features.push("tracking");
    }
    if std::env::var_os("CARGO_FEATURE_DEBUG_PANIC").is_some() {
        features.push("debug-panic");
    }
    println!("cargo:rustc-env=ZPACK_FEATURES={}", features.join(","));
}
