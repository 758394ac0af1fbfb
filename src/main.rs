#[tokio::main]
async fn main() {
    if let Err(e) = trip_claims_lib::run().await {
        log::error!("アプリケーションを起動できませんでした: {e}");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
