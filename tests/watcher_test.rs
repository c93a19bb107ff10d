//! Watcher tests driven by synthetic notify events

use iconscope::{IconEvent, IconIndex, IconWatcher, NotificationBroadcaster, Settings};
use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{RwLock, broadcast, mpsc, oneshot};

fn modified(path: &Path) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path.to_path_buf()))
}

fn created(path: &Path) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf()))
}

fn removed(path: &Path) -> notify::Result<Event> {
    Ok(Event::new(EventKind::Remove(RemoveKind::File)).add_path(path.to_path_buf()))
}

async fn setup(root: &Path) -> (Arc<RwLock<IconIndex>>, Arc<NotificationBroadcaster>) {
    fs::create_dir_all(root.join("icons-src")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("icons-src/home.svg"), r#"<svg><path/></svg>"#).unwrap();
    fs::write(root.join("src/App.vue"), "<Icon name=\"home\" />\n").unwrap();

    let settings = Arc::new(Settings {
        workspace_root: Some(root.to_path_buf()),
        ..Settings::default()
    });
    let broadcaster = Arc::new(NotificationBroadcaster::default());
    let mut index = IconIndex::new(settings)
        .unwrap()
        .with_broadcaster(broadcaster.clone());
    index.refresh().await;
    (Arc::new(RwLock::new(index)), broadcaster)
}

/// Wait for the first event matching `pick`, skipping others.
async fn next_matching<T>(
    rx: &mut broadcast::Receiver<IconEvent>,
    pick: impl Fn(IconEvent) -> Option<T>,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(found) = pick(rx.recv().await.unwrap()) {
                return found;
            }
        }
    })
    .await
    .expect("event within timeout")
}

#[tokio::test]
async fn test_rapid_changes_coalesce_into_one_batch() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let (index, broadcaster) = setup(root).await;
    let mut events = broadcaster.subscribe();

    let (tx, rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let watcher = IconWatcher::builder()
        .index(index.clone())
        .broadcaster(broadcaster.clone())
        .roots(vec![root.to_path_buf()])
        .debounce_ms(50)
        .build_with_events(rx)
        .unwrap();

    let star = root.join("icons-src/star.svg");
    let app = root.join("src/App.vue");
    let driver = async {
        fs::write(&star, r##"<svg><path fill="#fff"/></svg>"##).unwrap();
        fs::write(&app, "<Icon name=\"home\" />\n<Icon name=\"star\" />\n").unwrap();
        tx.send(created(&star)).await.unwrap();
        tx.send(modified(&star)).await.unwrap();
        tx.send(modified(&app)).await.unwrap();
        // not under any scan rule
        tx.send(modified(&root.join("README.txt"))).await.unwrap();

        let batch = next_matching(&mut events, |e| match e {
            IconEvent::BatchProcessed { paths } => Some(paths),
            _ => None,
        })
        .await;

        // nothing else arrives after the quiet period
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut later = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, IconEvent::BatchProcessed { .. }) {
                later += 1;
            }
        }
        let _ = stop_tx.send(());
        (batch, later)
    };

    let (result, (batch, later)) = tokio::join!(
        watcher.run_until(async {
            let _ = stop_rx.await;
        }),
        driver
    );
    result.unwrap();

    let mut expected: Vec<PathBuf> = vec![star.clone(), app.clone()];
    expected.sort();
    assert_eq!(batch, expected);
    assert_eq!(later, 0);

    let index = index.read().await;
    assert!(index.get_icon_by_name("star").is_some());
    assert_eq!(index.find_usages("star").total, 1);
}

#[tokio::test]
async fn test_deletion_bypasses_debounce() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let (index, broadcaster) = setup(root).await;
    let mut events = broadcaster.subscribe();

    let (tx, rx) = mpsc::channel(16);
    let watcher = IconWatcher::builder()
        .index(index.clone())
        .broadcaster(broadcaster.clone())
        .roots(vec![root.to_path_buf()])
        // long enough that a debounced removal would time out the test
        .debounce_ms(60_000)
        .build_with_events(rx)
        .unwrap();

    let home = root.join("icons-src/home.svg");
    let driver = async {
        fs::remove_file(&home).unwrap();
        tx.send(removed(&home)).await.unwrap();
        let path = next_matching(&mut events, |e| match e {
            IconEvent::FileDeleted { path } => Some(path),
            _ => None,
        })
        .await;
        drop(tx);
        path
    };

    // the channel closing ends a watcher without a native backend
    let (result, path) = tokio::join!(watcher.watch(), driver);
    result.unwrap();

    assert_eq!(path, home);
    let index = index.read().await;
    assert!(index.get_icon_by_name("home").is_none());
    assert_eq!(index.find_usages("home").total, 1);
}

#[tokio::test]
async fn test_folder_moved_in_is_indexed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let (index, broadcaster) = setup(root).await;
    let mut events = broadcaster.subscribe();

    let (tx, rx) = mpsc::channel(16);
    let watcher = IconWatcher::builder()
        .index(index.clone())
        .broadcaster(broadcaster.clone())
        .roots(vec![root.to_path_buf()])
        .debounce_ms(50)
        .build_with_events(rx)
        .unwrap();

    let set = root.join("icons-src/set");
    let driver = async {
        fs::create_dir_all(&set).unwrap();
        fs::write(set.join("bell.svg"), r#"<svg><path/></svg>"#).unwrap();
        fs::write(set.join("flag.svg"), r#"<svg><rect/></svg>"#).unwrap();
        // only the folder itself is reported, as after a move
        tx.send(Ok(Event::new(EventKind::Create(CreateKind::Folder)).add_path(set.clone())))
            .await
            .unwrap();
        let batch = next_matching(&mut events, |e| match e {
            IconEvent::BatchProcessed { paths } => Some(paths),
            _ => None,
        })
        .await;
        drop(tx);
        batch
    };

    let (result, batch) = tokio::join!(watcher.watch(), driver);
    result.unwrap();

    assert_eq!(batch, vec![set.clone()]);
    let index = index.read().await;
    assert_eq!(
        index.get_icon_by_name("bell").unwrap().path(),
        Some(set.join("bell.svg").as_path())
    );
    assert!(index.get_icon_by_name("flag").is_some());
}

#[tokio::test]
async fn test_builder_requires_index() {
    let (_tx, rx) = mpsc::channel(1);
    assert!(IconWatcher::builder().build_with_events(rx).is_err());
}
