use std::env;

fn main() {
    // 環境変数をコンパイル時に埋め込み
    // ENVIRONMENT環境変数に基づいて適切な.envファイルを読み込み
    let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

    let env_file = match environment.as_str() {
        "production" => ".env.production",
        _ => ".env",
    };

    println!("cargo:rerun-if-env-changed=ENVIRONMENT");
    println!("cargo:rerun-if-changed={env_file}");

    // 環境変数ファイルを読み込み
    if dotenv::from_filename(env_file).is_ok() {
        println!("cargo:warning={env_file}ファイルを読み込みました");

        // サーバー設定をコンパイル時定数として埋め込み（実行時の環境変数が優先）
        for var_name in [
            "SERVER_HOST",
            "SERVER_PORT",
            "API_BASE_URL",
            "API_TIMEOUT_SECONDS",
            "API_MAX_RETRIES",
        ] {
            if let Ok(value) = env::var(var_name) {
                println!("cargo:rustc-env=EMBEDDED_{var_name}={value}");
            }
        }

        // 注意: EMBEDDED_ENVIRONMENTは設定しない
        // 実行時に.envファイルから環境変数を読み込むため
    } else {
        println!("cargo:warning={env_file}ファイルが見つかりません");
    }
}
