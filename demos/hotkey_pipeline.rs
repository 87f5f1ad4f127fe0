//! Hotkey Pipeline Example
//!
//! Drives one product key from cold to hot and prints how each request is served.
//!
//! Runs against in-memory stores by default. Set `REDIS_URL` to count and cache in Redis:
//!
//! ```bash
//! REDIS_URL=redis://127.0.0.1/ RUST_LOG=hotkey_scheduler=debug cargo run --example hotkey_pipeline
//! ```

use hotkey_scheduler::{store, RequestContext, SchedulerConfig, SchedulerFacade};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
scheduler:
  stat:
    shortWindowSeconds: 2
    longWindowSeconds: 120
    keyPrefix: stat_demo
  hotspot:
    warmShortThreshold: 3
    hotShortThreshold: 8
    extremelyHotShortThreshold: 15
  policy:
    minAccessThreshold: 3
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hotkey_scheduler=info")),
        )
        .init();

    let config = SchedulerConfig::from_yaml_str(CONFIG)?;
    let mut builder = SchedulerFacade::builder().config(config);
    if let Ok(url) = std::env::var("REDIS_URL") {
        builder = builder.redis(store::connect(&url).await?);
    }
    let facade = builder.build()?;

    let db_reads = &AtomicU64::new(0);
    for i in 1..=20 {
        let mut ctx = RequestContext::new("sku:1001").with_biz_type("product");
        let value = facade
            .process(&mut ctx, || async move {
                db_reads.fetch_add(1, Ordering::Relaxed);
                Some(format!("product 1001 (read #{})", i))
            })
            .await?
            .into_value();

        println!(
            "request {:>2}: level={:<13} cached={:<5} db_reads={:>2} value={:?}",
            i,
            ctx.hotspot_level
                .map(|l| format!("{:?}", l))
                .unwrap_or_default(),
            ctx.cache_allowed.unwrap_or(false),
            db_reads.load(Ordering::Relaxed),
            value,
        );
    }

    let stats = facade.cache_stats();
    println!(
        "\nlocal hits: {}, remote hits: {}, loads: {}, hit ratio: {:.2}",
        stats.local_hits,
        stats.remote_hits,
        stats.loads,
        stats.hit_ratio()
    );

    facade.invalidate_cache("sku:1001").await;
    println!("invalidated sku:1001");
    Ok(())
}
