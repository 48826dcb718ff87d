fn main() {
    // Only generate C headers when ffi feature is enabled
    if std::env::var("CARGO_FEATURE_FFI").is_ok() {
        let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
            return;
        };
        let include_dir = std::path::PathBuf::from(&crate_dir).join("include");
        let output_file = include_dir.join("dakt_decrypt.h");

        std::fs::create_dir_all(&include_dir).ok();

        let mut config = match cbindgen::Config::from_file("cbindgen.toml") {
            Ok(config) => config,
            Err(e) => {
                println!("cargo:warning=cbindgen.toml unreadable: {e}");
                return;
            }
        };

        if config.sys_includes.is_empty() {
            config.sys_includes = vec![
                "stdint.h".to_string(),
                "stddef.h".to_string(),
                "stdbool.h".to_string(),
            ];
        }

        let result = cbindgen::Builder::new()
            .with_crate(&crate_dir)
            .with_config(config)
            .generate();

        match result {
            Ok(bindings) => {
                let _ = bindings.write_to_file(&output_file);
            }
            Err(e) => {
                // Header generation is best-effort; the library still builds
                println!("cargo:warning=cbindgen failed: {e}");
            }
        }
    }

    println!("cargo:rerun-if-changed=src/ffi/");
    println!("cargo:rerun-if-changed=cbindgen.toml");
}
