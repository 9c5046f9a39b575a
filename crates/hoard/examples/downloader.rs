use curio_core::{ContentFetcher, CurioConfig};
use curio_hoard::ContentCache;
use futures::channel::oneshot;
use std::error::Error;
use std::time::Duration;

#[async_std::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.rust-lang.org/logos/rust-logo-512x512.png".to_string());

    let cache = ContentCache::new(&CurioConfig::load()?)?;
    let (tx, mut rx) = oneshot::channel();
    cache.async_get_content(
        &url,
        Box::new(move |record| {
            let _ = tx.send(record);
        }),
    );

    loop {
        if let Some(record) = rx.try_recv()? {
            println!("\n{:?}: {:?}", record.state, record.filepath);
            if let Some(error) = record.error {
                eprintln!("Error: {}", error);
            }
            break;
        }
        if let Some(task) = cache.try_get_task(&url) {
            let pct = task.progress().unwrap_or(0.0) * 100.0;
            print!("\r{:?} {:.1}% ({} bytes)", task.state, pct, task.fetched_size);
            let _ = std::io::Write::flush(&mut std::io::stdout());
        }
        async_std::task::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}
