//! Link directives for the native Livox SDK.
//!
//! Only active with the `livox-sdk` feature. `LIVOX_SDK_LIB_DIR` points at
//! the directory holding `liblivox_wrapper` and `liblivox_sdk_static`.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=LIVOX_SDK_LIB_DIR");

    if env::var_os("CARGO_FEATURE_LIVOX_SDK").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("LIVOX_SDK_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }
    println!("cargo:rustc-link-lib=static=livox_wrapper");
    println!("cargo:rustc-link-lib=static=livox_sdk_static");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match target_os.as_str() {
        "macos" => println!("cargo:rustc-link-lib=c++"),
        "windows" => {}
        _ => {
            println!("cargo:rustc-link-lib=stdc++");
            println!("cargo:rustc-link-lib=pthread");
        }
    }
}
