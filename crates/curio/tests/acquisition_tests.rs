mod common;

use anyhow::Result;
use common::{asset, cached, drain, DeferredFetcher, FakeCatalog};
use curio::{AssetAction, Curio};
use curio_core::{
    AcquisitionState, AssetType, ContentRecord, ContentState, CurioError, CurioEvent, FetchTask,
    TaskState,
};
use std::path::PathBuf;
use std::sync::Arc;

struct Fixture {
    curio: Curio,
    catalog: Arc<FakeCatalog>,
    fetcher: Arc<DeferredFetcher>,
    events: futures::channel::mpsc::UnboundedReceiver<CurioEvent>,
    dir: tempfile::TempDir,
}

fn fixture() -> Result<Fixture> {
    let catalog = Arc::new(FakeCatalog::new(vec![
        asset("x", AssetType::ModelXps, &["armor"]),
        asset("y", AssetType::ModelXps, &[]),
    ]));
    let fetcher = Arc::new(DeferredFetcher::default());
    let (curio, events) = Curio::new(catalog.clone(), fetcher.clone());
    Ok(Fixture {
        curio,
        catalog,
        fetcher,
        events,
        dir: tempfile::tempdir()?,
    })
}

const X_ARCHIVE: &str = "https://example.com/archives/x.zip";

#[test]
fn test_never_attempted_is_initialized() -> Result<()> {
    let f = fixture()?;
    let status = f.curio.resolve_state("x")?;
    assert_eq!(status.state, AcquisitionState::Initialized);
    assert_eq!(status.action(), AssetAction::Download);
    assert!(status.content.is_none() && status.task.is_none());
    Ok(())
}

#[test]
fn test_active_task_is_downloading_with_progress() -> Result<()> {
    let f = fixture()?;
    for state in [TaskState::Queuing, TaskState::Running] {
        let task = FetchTask {
            url: X_ARCHIVE.to_string(),
            state,
            fetched_size: 512,
            content_length: Some(2048),
        };
        f.fetcher.set_task(task.clone());

        let status = f.curio.resolve_state("x")?;
        assert_eq!(status.state, AcquisitionState::Downloading);
        assert_eq!(status.task, Some(task));
        assert_eq!(status.action(), AssetAction::CancelDownload);
        assert!(!status.action().is_enabled());
    }
    Ok(())
}

#[test]
fn test_terminal_records_map_to_cached_and_failed() -> Result<()> {
    let f = fixture()?;
    let archive = f.dir.path().join("x.zip");

    let failed = ContentRecord::failed("x", X_ARCHIVE, "503");
    f.fetcher.set_content(failed.clone());
    let status = f.curio.resolve_state("x")?;
    assert_eq!(status.state, AcquisitionState::Failed);
    assert_eq!(status.content, Some(failed));
    assert_eq!(status.action(), AssetAction::Retry);

    let ok = cached(X_ARCHIVE, &archive);
    f.fetcher.set_content(ok.clone());
    let status = f.curio.resolve_state("x")?;
    assert_eq!(status.state, AcquisitionState::Cached);
    assert_eq!(status.content, Some(ok));
    assert_eq!(status.action(), AssetAction::Import);
    Ok(())
}

#[test]
fn test_extraction_outranks_cache_failure() -> Result<()> {
    let f = fixture()?;
    f.fetcher.set_content(ContentRecord::failed("x", X_ARCHIVE, "boom"));
    f.catalog.mark_extracted("x");

    let status = f.curio.resolve_state("x")?;
    assert_eq!(status.state, AcquisitionState::Extracted);
    assert!(status.content.is_none());
    Ok(())
}

#[test]
fn test_unrecognized_combinations_are_unknown() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let f = fixture()?;

    let mut running = ContentRecord::failed("x", X_ARCHIVE, "");
    running.state = ContentState::Running;
    f.fetcher.set_content(running);
    // A task alongside a live record does not make it a download
    f.fetcher.set_task(FetchTask::queuing(X_ARCHIVE));
    let status = f.curio.resolve_state("x")?;
    assert_eq!(status.state, AcquisitionState::Unknown);
    assert_eq!(status.action(), AssetAction::Retry);

    let y_archive = "https://example.com/archives/y.zip";
    let mut done = FetchTask::queuing(y_archive);
    done.state = TaskState::Done;
    f.fetcher.set_task(done);
    assert_eq!(f.curio.resolve_state("y")?.state, AcquisitionState::Unknown);
    Ok(())
}

#[test]
fn test_resolve_is_idempotent() -> Result<()> {
    let f = fixture()?;
    f.fetcher.set_task(FetchTask {
        url: X_ARCHIVE.to_string(),
        state: TaskState::Running,
        fetched_size: 1,
        content_length: None,
    });
    assert_eq!(f.curio.resolve_state("x")?, f.curio.resolve_state("x")?);
    assert_eq!(f.curio.resolve_state("y")?, f.curio.resolve_state("y")?);
    Ok(())
}

#[test]
fn test_resolve_reflects_each_new_snapshot() -> Result<()> {
    let f = fixture()?;
    assert_eq!(f.curio.resolve_state("x")?.state, AcquisitionState::Initialized);
    f.fetcher.set_task(FetchTask::queuing(X_ARCHIVE));
    assert_eq!(f.curio.resolve_state("x")?.state, AcquisitionState::Downloading);
    f.fetcher.set_content(cached(X_ARCHIVE, &f.dir.path().join("x.zip")));
    assert_eq!(f.curio.resolve_state("x")?.state, AcquisitionState::Cached);
    Ok(())
}

#[test]
fn test_download_forwards_archive_url_and_notifies() -> Result<()> {
    let mut f = fixture()?;
    f.curio.download("x")?;
    assert_eq!(f.fetcher.requested(), vec![X_ARCHIVE.to_string()]);

    f.fetcher.deliver_all(&f.dir.path().join("x.zip"));
    assert_eq!(
        drain(&mut f.events),
        vec![CurioEvent::DownloadFinished {
            asset_id: "x".to_string(),
            state: ContentState::Cached,
        }]
    );
    Ok(())
}

#[test]
fn test_commands_reject_unknown_assets() {
    let f = fixture().expect("fixture");
    assert!(matches!(
        f.curio.download("ghost"),
        Err(CurioError::MissingAsset(id)) if id == "ghost"
    ));
    assert!(matches!(f.curio.cancel_download("ghost"), Err(CurioError::MissingAsset(_))));
    assert!(matches!(f.curio.resolve_state("ghost"), Err(CurioError::MissingAsset(_))));
    assert!(matches!(f.curio.detail("ghost"), Err(CurioError::MissingAsset(_))));
    assert!(f.fetcher.requested().is_empty());
}

#[test]
fn test_cancel_is_accepted_but_inert() -> Result<()> {
    let f = fixture()?;
    f.curio.download("x")?;
    assert!(!f.curio.can_cancel_download("x"));
    f.curio.cancel_download("x")?;
    assert_eq!(f.fetcher.pending_count(), 1);
    Ok(())
}

#[async_std::test]
async fn test_import_passes_cached_archive() -> Result<()> {
    let f = fixture()?;
    let archive = f.dir.path().join("x.zip");
    f.fetcher.set_content(cached(X_ARCHIVE, &archive));

    let path = f.curio.import("x").await?;
    assert_eq!(path, PathBuf::from("/library/x"));
    assert_eq!(
        f.catalog.imports.lock().unwrap().clone(),
        vec![("x".to_string(), Some(archive))]
    );
    Ok(())
}

#[async_std::test]
async fn test_import_without_content_passes_absent_path() -> Result<()> {
    let f = fixture()?;
    f.fetcher.set_content(ContentRecord::failed("x", X_ARCHIVE, "404"));

    let err = f.curio.import("x").await.expect_err("catalog refuses");
    assert!(matches!(err, CurioError::NotCached(_)));
    assert_eq!(
        f.catalog.imports.lock().unwrap().clone(),
        vec![("x".to_string(), None)]
    );

    f.catalog.mark_extracted("y");
    assert_eq!(f.curio.import("y").await?, PathBuf::from("/library/y"));
    Ok(())
}

#[test]
fn test_detail_reports_location_per_state() -> Result<()> {
    let f = fixture()?;
    let archive = f.dir.path().join("x.zip");

    let detail = f.curio.detail("x")?;
    assert_eq!(detail.asset.id, "x");
    assert_eq!(detail.location, None);
    assert_eq!(detail.action, AssetAction::Download);

    f.fetcher.set_content(cached(X_ARCHIVE, &archive));
    assert_eq!(f.curio.detail("x")?.location, Some(archive));

    f.catalog.mark_extracted("x");
    let detail = f.curio.detail("x")?;
    assert_eq!(detail.status.state, AcquisitionState::Extracted);
    assert_eq!(detail.location, Some(PathBuf::from("/library/x")));
    Ok(())
}
