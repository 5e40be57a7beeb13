//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `tasklane_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("tasklane_core ping={}", tasklane_core::ping());
    println!("tasklane_core version={}", tasklane_core::core_version());
}
