//! Build state, variants and editor actions against a real workspace

use async_trait::async_trait;
use iconscope::host::HostResult;
use iconscope::{
    BuildStatus, EditorHost, FsHost, IconIndex, IconKind, LibrarySource, LibraryWriter, Settings,
    VariantColorEngine, VariantError,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const CHECK: &str = r##"<svg viewBox="0 0 24 24"><path fill="#00ff00" d="M1 1"/></svg>"##;

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/check.svg"), CHECK).unwrap();
    fs::write(
        root.join("assets/drift.svg"),
        r#"<svg><path d="M2 2"/></svg>"#,
    )
    .unwrap();
    fs::write(
        root.join("page.html"),
        "<img src=\"./assets/check.svg\">\n<p>done</p> <Icon name=\"check\" />\n",
    )
    .unwrap();
    temp
}

async fn index(root: &Path) -> IconIndex {
    let settings = Arc::new(Settings {
        workspace_root: Some(root.to_path_buf()),
        ..Settings::default()
    });
    let mut index = IconIndex::new(settings).unwrap();
    index.refresh().await;
    index
}

#[tokio::test]
async fn test_reconcile_against_library() {
    let temp = workspace();
    let root = temp.path();
    let mut index = index(root).await;

    let library = index.library();
    library.write_icon("check", CHECK).await.unwrap();
    library
        .write_icon("drift", r#"<svg><path d="M9 9"/></svg>"#)
        .await
        .unwrap();
    library
        .write_icon("legacy", r#"<svg><circle r="1"/></svg>"#)
        .await
        .unwrap();
    fs::write(root.join("assets/fresh.svg"), r#"<svg><g/></svg>"#).unwrap();

    // the writes are picked up like any other artifact change
    let changed = [index.library().icons_path(), root.join("assets/fresh.svg")];
    let summary = index.process_changes(&changed).await;
    assert!(summary.library);

    let result = index.reconcile().await.unwrap();
    assert_eq!(result.get("check"), Some(BuildStatus::Built { stale: false }));
    assert_eq!(result.get("drift"), Some(BuildStatus::Built { stale: true }));
    assert_eq!(result.get("legacy"), Some(BuildStatus::Orphaned));
    assert_eq!(result.get("fresh"), Some(BuildStatus::Draft));

    assert_eq!(index.get_all_icons(Some(IconKind::BuiltIcon)).len(), 3);
    assert_eq!(index.get_icon_by_name("check").unwrap().kind(), IconKind::SvgFile);
    assert_eq!(index.get_icon_by_name("legacy").unwrap().kind(), IconKind::BuiltIcon);
    // library artifacts are never draft sources
    assert!(index.get_icon_by_name("sprite").is_none());
}

#[tokio::test]
async fn test_variant_round_trip_through_variants_file() {
    let temp = workspace();
    let root = temp.path();
    let mut index = index(root).await;
    let path = root.join("assets/check.svg");

    let check = index.get_icon_by_name("check").unwrap().clone();
    let mut engine = VariantColorEngine::from_table(index.library().load_variants().await.unwrap());
    assert!(matches!(
        engine.apply_variant(&check, "inverse"),
        Err(VariantError::MissingOriginal { .. })
    ));
    engine
        .save_variant(&check, "inverse", vec!["#fff".to_string()])
        .unwrap();
    index.library().write_variants(engine.table()).await.unwrap();

    // a later session reads the table back and recolors the file
    let mut session = VariantColorEngine::from_table(index.library().load_variants().await.unwrap());
    let svg = session.apply_variant(&check, "inverse").unwrap();
    fs::write(&path, &svg).unwrap();
    index.process_changes(&[path.clone()]).await;
    let inverted = index.get_icon_by_name("check").unwrap().clone();
    assert_eq!(inverted.colors, vec!["#ffffff"]);

    let mut fresh = VariantColorEngine::from_table(index.library().load_variants().await.unwrap());
    let restored = fresh.reset(&inverted).unwrap();
    assert_eq!(restored, CHECK);
}

#[tokio::test]
async fn test_rename_references_rewrites_every_site() {
    let temp = workspace();
    let root = temp.path();
    let mut index = index(root).await;
    assert_eq!(index.find_usages("check").total, 2);

    let edits = index.rename_references("check", "tick", &FsHost).await.unwrap();
    assert_eq!(edits, 2);

    let page = fs::read_to_string(root.join("page.html")).unwrap();
    assert_eq!(
        page,
        "<img src=\"./assets/tick.svg\">\n<p>done</p> <Icon name=\"tick\" />\n"
    );
    assert_eq!(index.find_usages("check").total, 0);
    assert_eq!(index.find_usages("tick").total, 2);
}

#[derive(Default)]
struct RecordingHost {
    revealed: Mutex<Vec<(PathBuf, u32)>>,
}

#[async_trait]
impl EditorHost for RecordingHost {
    async fn open_document(&self, path: &Path) -> HostResult<String> {
        FsHost.open_document(path).await
    }

    async fn apply_edit(&self, path: &Path, range: (usize, usize), text: &str) -> HostResult<()> {
        FsHost.apply_edit(path, range, text).await
    }

    async fn reveal(&self, path: &Path, line: u32) -> HostResult<()> {
        self.revealed.lock().unwrap().push((path.to_path_buf(), line));
        Ok(())
    }
}

#[tokio::test]
async fn test_reveal_icon() {
    let temp = workspace();
    let root = temp.path();
    let index = index(root).await;
    let host = RecordingHost::default();

    let location = index.reveal_icon("check", &host).await.unwrap();
    assert_eq!(location.line, 1);
    assert_eq!(
        host.revealed.lock().unwrap().as_slice(),
        &[(root.join("assets/check.svg"), 1)]
    );
    assert!(index.reveal_icon("missing", &host).await.is_err());
}
