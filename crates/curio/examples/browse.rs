use curio::Curio;
use curio_core::{AssetType, CurioConfig, CurioError, CurioEvent, Generation, SearchQuery};
use futures::StreamExt;
use std::time::Duration;

fn report(curio: &Curio, current: Generation, event: CurioEvent) -> Result<(), CurioError> {
    match event {
        CurioEvent::SearchStarted {
            generation,
            hit_count,
            display_count,
        } => println!("[{}] {} of {} results", generation, display_count, hit_count),
        CurioEvent::ResultAppended {
            generation,
            asset_id,
        } if generation == current => {
            let detail = curio.detail(&asset_id)?;
            println!(
                "  {} ({:?}) -> {}",
                detail.asset.name,
                detail.status.state,
                detail.action.label()
            );
        }
        _ => {}
    }
    Ok(())
}

#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Open the default catalog and cache
    let (curio, mut events) = Curio::open(&CurioConfig::load()?)?;

    // 2. Two searches in a row: only the second one's thumbnails are kept
    curio.search(&SearchQuery::new(AssetType::Motion));
    let generation = curio.search(&SearchQuery::new(AssetType::ModelMmd));
    println!("Searching ({})...", generation);

    // 3. Stream results until every thumbnail has arrived or we give up
    while curio.current_result().is_loading() {
        let next = async_std::future::timeout(Duration::from_secs(15), events.next()).await;
        match next {
            Ok(Some(event)) => report(&curio, generation, event)?,
            Ok(None) | Err(_) => break,
        }
    }

    // 4. Cached thumbnails complete during `search`; their events are still queued
    while let Ok(Some(event)) = events.try_next() {
        report(&curio, generation, event)?;
    }

    curio.shutdown();
    Ok(())
}
