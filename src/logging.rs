use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RUST_LOG（未設定なら info）でフィルタする fmt サブスクライバを登録
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
