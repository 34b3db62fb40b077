use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    memory: Memory,
    decoder: Decoder,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Memory {
    fcram_base: u32,
    fcram_size: u32,
}

#[derive(Deserialize)]
struct Decoder {
    backend: String,
    max_input_retries: u32,
    max_reconfigure_attempts: u32,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 内存区域
    println!("cargo:rustc-env=FCRAM_BASE={}", config.memory.fcram_base);
    println!("cargo:rustc-env=FCRAM_SIZE={}", config.memory.fcram_size);

    // 解码器
    println!("cargo:rustc-env=DECODER_BACKEND={}", config.decoder.backend);
    println!("cargo:rustc-env=DECODER_MAX_INPUT_RETRIES={}", config.decoder.max_input_retries);
    println!(
        "cargo:rustc-env=DECODER_MAX_RECONFIGURE_ATTEMPTS={}",
        config.decoder.max_reconfigure_attempts
    );
}
