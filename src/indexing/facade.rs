//! IconIndex - the query and scan API over one workspace.
//!
//! Owns the [`IconRegistry`], the flat usage-site list and the collaborators
//! that feed them.
//!
//! ## Architecture
//!
//! ```text
//! IconIndex
//!   ├── FileScanner + IgnoreFilter - candidate discovery
//!   ├── UsageIndexer - inline SVG and usage-site passes
//!   ├── IconRegistry - icons by (kind, name) and by file
//!   ├── usages (BTreeMap<file, Vec<UsageSite>>)
//!   ├── FileLibrary - built artifacts, read back for reconciliation
//!   └── NotificationBroadcaster (optional) - change signals to consumers
//! ```
//!
//! Full scans run in three phases so the index is not held while files are
//! read: [`IconIndex::begin_scan`] issues staleness tokens, [`ScanJob::collect`]
//! does the I/O, and [`IconIndex::commit`] applies the results. Committing a
//! scan that a newer one has superseded changes nothing, and paths updated
//! incrementally while a scan was collecting keep their newer state.
//!
//! ## Usage
//!
//! ```ignore
//! let mut index = IconIndex::new(settings)?;
//! index.refresh().await;
//! let usages = index.find_usages("arrow");
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::registry::{GenerationEnd, IconRegistry, ScanScope, ScanToken, UpsertOutcome};
use super::{Candidate, CandidateKind, FileScanner, IgnoreFilter, UsageIndexer};
use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::host::EditorHost;
use crate::library::{BuildStateReconciler, FileLibrary, LibrarySource, Reconciliation};
use crate::types::{Icon, IconKey, IconKind, Location, UsageSearch, UsageSite, name_from_path};
use crate::watcher::{IconEvent, NotificationBroadcaster};

/// Files read between cooperative yields during a scan.
const YIELD_EVERY: usize = 64;

/// Statistics for one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    /// Candidate files read.
    pub files: usize,
    /// Icons observed.
    pub icons: usize,
    /// Icons observed with unchanged content.
    pub unchanged: usize,
    /// Files that could not be read.
    pub failed: usize,
    /// Stale entries removed after the scan.
    pub pruned: usize,
    pub collisions: usize,
    /// Usage sites found.
    pub usages: usize,
    /// A newer scan started first; these results were discarded.
    pub superseded: bool,
    pub elapsed: Duration,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.files += other.files;
        self.icons += other.icons;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
        self.pruned += other.pruned;
        self.collisions += other.collisions;
        self.usages += other.usages;
        self.superseded |= other.superseded;
        self.elapsed += other.elapsed;
    }
}

/// Result of an incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Files whose icons or usages changed.
    pub reindexed: Vec<PathBuf>,
    /// Paths whose entries were dropped.
    pub removed: Vec<PathBuf>,
    pub failed: usize,
    /// The ignore file changed and a full rescan ran.
    pub refreshed: bool,
    /// A library artifact changed and built icons were reloaded.
    pub library: bool,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        self.reindexed.is_empty() && self.removed.is_empty() && !self.refreshed && !self.library
    }
}

/// Which passes a full scan runs and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    pub files: bool,
    pub inline: bool,
    pub usages: bool,
    /// Limit to one folder instead of the configured roots.
    pub folder: Option<PathBuf>,
}

impl ScanRequest {
    /// Standalone SVG files under `folder`.
    pub fn folder(folder: impl Into<PathBuf>) -> Self {
        Self {
            files: true,
            folder: Some(folder.into()),
            ..Self::default()
        }
    }

    pub fn inline() -> Self {
        Self {
            inline: true,
            ..Self::default()
        }
    }

    pub fn usages() -> Self {
        Self {
            usages: true,
            ..Self::default()
        }
    }

    /// Every pass over every configured root, in one walk.
    pub fn all() -> Self {
        Self {
            files: true,
            inline: true,
            usages: true,
            folder: None,
        }
    }
}

#[derive(Debug, Clone)]
struct ScanPlan {
    files: Option<ScanToken>,
    inline: Option<ScanToken>,
    usages: Option<u64>,
    folder: Option<PathBuf>,
    /// Incremental change sequence when the scan began.
    since: u64,
}

/// The I/O half of a scan, detached from the index.
pub struct ScanJob {
    plan: ScanPlan,
    roots: Vec<PathBuf>,
    scanner: FileScanner,
    indexer: UsageIndexer,
    /// Library artifacts, never treated as draft sources.
    skip: Vec<PathBuf>,
}

/// Scan results waiting to be committed.
pub struct CollectedScan {
    plan: ScanPlan,
    files: Vec<Icon>,
    inline: Vec<Icon>,
    usages: BTreeMap<PathBuf, Vec<UsageSite>>,
    stats: ScanStats,
    started: Instant,
    /// The walk failed; nothing may be pruned on commit.
    incomplete: bool,
}

impl ScanJob {
    fn wants(&self, kind: CandidateKind) -> bool {
        match kind {
            CandidateKind::Svg => self.plan.files.is_some(),
            CandidateKind::Source => self.plan.inline.is_some() || self.plan.usages.is_some(),
        }
    }

    /// Walk and read every candidate. Unreadable files are logged and counted.
    pub async fn collect(self) -> CollectedScan {
        let mut out = CollectedScan {
            plan: self.plan.clone(),
            files: Vec::new(),
            inline: Vec::new(),
            usages: BTreeMap::new(),
            stats: ScanStats::default(),
            started: Instant::now(),
            incomplete: false,
        };

        let candidates: Vec<Candidate> = match self.scanner.discover(self.roots.clone()).await {
            Ok(found) => found
                .into_iter()
                .filter(|c| self.wants(c.kind) && !self.skip.contains(&c.path))
                .collect(),
            Err(e) => {
                crate::warn_event!("scan", "{e}");
                out.incomplete = true;
                return out;
            }
        };

        for (i, candidate) in candidates.iter().enumerate() {
            if i > 0 && i % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
            out.stats.files += 1;

            let text = match self.scanner.read(candidate).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    crate::warn_event!("scan", "skipping {}: {e}", candidate.path.display());
                    out.stats.failed += 1;
                    continue;
                }
            };

            match candidate.kind {
                CandidateKind::Svg => {
                    let Some(name) = name_from_path(&text.path) else {
                        crate::debug_event!("scan", "unnamed svg", "{}", text.path.display());
                        continue;
                    };
                    let icon = Icon::from_file(name, &text.path, text.content);
                    if !icon.editable {
                        crate::debug_event!("scan", "malformed svg", "{}", text.path.display());
                    }
                    out.files.push(icon);
                }
                CandidateKind::Source => {
                    if self.plan.inline.is_some() {
                        out.inline
                            .extend(self.indexer.inline_svgs(&text.path, &text.content));
                    }
                    if self.plan.usages.is_some() {
                        let sites = self.indexer.find_usages(&text.path, &text.content);
                        if !sites.is_empty() {
                            out.usages.insert(text.path.clone(), sites);
                        }
                    }
                }
            }
        }

        out
    }
}

/// Icon index for one workspace.
pub struct IconIndex {
    settings: Arc<Settings>,
    scanner: FileScanner,
    indexer: UsageIndexer,
    registry: IconRegistry,
    usages: BTreeMap<PathBuf, Vec<UsageSite>>,
    /// Latest usage scan issued; older ones are discarded at commit.
    usage_generation: u64,
    /// Full scans begun and not yet committed.
    scans_in_flight: usize,
    /// Incremental change counter.
    change_seq: u64,
    /// Paths changed incrementally while a scan was in flight, with their sequence.
    touched: BTreeMap<PathBuf, u64>,
    library: FileLibrary,
    broadcaster: Option<Arc<NotificationBroadcaster>>,
}

impl IconIndex {
    /// Create an empty index. Nothing is scanned until asked.
    pub fn new(settings: Arc<Settings>) -> IndexResult<Self> {
        let filter = Arc::new(Self::load_filter(&settings));
        let scanner = FileScanner::new(&settings.scan, filter);
        let indexer = UsageIndexer::new(&settings.usages)?;
        let library = FileLibrary::new(
            settings.library_dir(),
            &settings.library,
            &settings.usages.sprite_prefix,
        );

        Ok(Self {
            settings,
            scanner,
            indexer,
            registry: IconRegistry::new(),
            usages: BTreeMap::new(),
            usage_generation: 0,
            scans_in_flight: 0,
            change_seq: 0,
            touched: BTreeMap::new(),
            library,
            broadcaster: None,
        })
    }

    /// Publish change signals on `broadcaster`.
    pub fn with_broadcaster(mut self, broadcaster: Arc<NotificationBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    fn load_filter(settings: &Settings) -> IgnoreFilter {
        IgnoreFilter::load(
            &settings.root(),
            &settings.ignore_path(),
            &settings.scan.ignore_patterns,
        )
    }

    /// Re-read the ignore file.
    pub fn reload_ignore(&mut self) {
        let filter = Self::load_filter(&self.settings);
        crate::log_event!("scan", "ignore reloaded", "{} patterns", filter.len());
        self.scanner.set_filter(Arc::new(filter));
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn registry(&self) -> &IconRegistry {
        &self.registry
    }

    pub fn library(&self) -> &FileLibrary {
        &self.library
    }

    fn notify(&self, event: IconEvent) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(event);
        }
    }

    // ---- full scans ----

    /// Issue staleness tokens and detach the I/O half of a scan.
    pub fn begin_scan(&mut self, request: ScanRequest) -> ScanJob {
        let folder = request.folder.as_deref().map(|f| self.settings.resolve(f));
        let roots = match &folder {
            Some(folder) => vec![folder.clone()],
            None => self.settings.scan_roots(),
        };
        let scope = |kind| match &folder {
            Some(folder) => ScanScope::folder(kind, folder.clone()),
            None => ScanScope::kind(kind),
        };

        let files = request
            .files
            .then(|| self.registry.begin_generation(scope(IconKind::SvgFile)));
        let inline = request
            .inline
            .then(|| self.registry.begin_generation(scope(IconKind::InlineSvg)));
        let usages = request.usages.then(|| {
            self.usage_generation += 1;
            self.usage_generation
        });

        self.scans_in_flight += 1;
        ScanJob {
            plan: ScanPlan {
                files,
                inline,
                usages,
                folder,
                since: self.change_seq,
            },
            roots,
            scanner: self.scanner.clone(),
            indexer: self.indexer.clone(),
            skip: vec![
                self.library.icons_path(),
                self.library.sprite_path(),
                self.library.variants_path(),
            ],
        }
    }

    /// Apply collected results, pruning what each pass did not observe.
    pub fn commit(&mut self, scan: CollectedScan) -> ScanStats {
        let CollectedScan {
            plan,
            files,
            inline,
            usages,
            mut stats,
            started,
            incomplete,
        } = scan;

        let newer: BTreeSet<PathBuf> = self
            .touched
            .iter()
            .filter(|(_, seq)| **seq > plan.since)
            .map(|(path, _)| path.clone())
            .collect();
        self.scans_in_flight = self.scans_in_flight.saturating_sub(1);
        if self.scans_in_flight == 0 {
            self.touched.clear();
        }

        if incomplete {
            crate::warn_event!("scan", "walk did not complete; index left as it was");
            stats.failed += 1;
            stats.elapsed = started.elapsed();
            return stats;
        }

        let is_newer = |path: &Path| newer.iter().any(|changed| path.starts_with(changed));
        let keep_scanned = |icon: &Icon| icon.path().is_none_or(|path| !is_newer(path));

        if let Some(token) = &plan.files {
            let files = files.into_iter().filter(keep_scanned).collect();
            self.apply_generation(token, files, &mut stats);
        }
        if let Some(token) = &plan.inline {
            let inline = inline.into_iter().filter(keep_scanned).collect();
            self.apply_generation(token, inline, &mut stats);
        }
        if let Some(generation) = plan.usages {
            if generation == self.usage_generation {
                let in_scope =
                    |path: &Path| plan.folder.as_ref().is_none_or(|f| path.starts_with(f));
                self.usages
                    .retain(|path, _| !in_scope(path.as_path()) || is_newer(path.as_path()));
                let usages: Vec<_> = usages
                    .into_iter()
                    .filter(|(path, _)| !is_newer(path.as_path()))
                    .collect();
                stats.usages = usages.iter().map(|(_, sites)| sites.len()).sum();
                self.usages.extend(usages);
            } else {
                stats.superseded = true;
            }
        }

        stats.elapsed = started.elapsed();
        if stats.superseded {
            crate::debug_event!("scan", "superseded", "results discarded");
        } else {
            crate::log_event!(
                "scan",
                "completed",
                "{} files, {} icons ({} unchanged), {} usages, {} pruned in {:?}",
                stats.files,
                stats.icons,
                stats.unchanged,
                stats.usages,
                stats.pruned,
                stats.elapsed
            );
            self.notify(IconEvent::Refreshed);
        }
        stats
    }

    fn apply_generation(&mut self, token: &ScanToken, icons: Vec<Icon>, stats: &mut ScanStats) {
        for icon in icons {
            match self.registry.upsert_scanned(token, icon) {
                UpsertOutcome::Discarded => {
                    stats.superseded = true;
                    break;
                }
                UpsertOutcome::Unchanged => {
                    stats.icons += 1;
                    stats.unchanged += 1;
                }
                UpsertOutcome::Inserted | UpsertOutcome::Updated => stats.icons += 1,
            }
        }

        match self.registry.end_generation(token) {
            GenerationEnd::Pruned(keys) => stats.pruned += keys.len(),
            GenerationEnd::Superseded => stats.superseded = true,
        }

        stats.collisions += self
            .registry
            .collisions()
            .iter()
            .filter(|c| c.key.kind == token.scope().kind && c.generation == token.generation())
            .count();
    }

    /// Run a scan against a shared index without holding the lock during I/O.
    pub async fn rescan(index: &RwLock<IconIndex>, request: ScanRequest) -> ScanStats {
        let job = index.write().await.begin_scan(request);
        let collected = job.collect().await;
        index.write().await.commit(collected)
    }

    async fn run(&mut self, request: ScanRequest) -> ScanStats {
        let job = self.begin_scan(request);
        let collected = job.collect().await;
        self.commit(collected)
    }

    /// Full rescan of standalone SVG files under `path`.
    pub async fn scan_folder(&mut self, path: &Path) -> ScanStats {
        self.run(ScanRequest::folder(path)).await
    }

    /// Full rescan of inline SVG blocks across the configured roots.
    pub async fn scan_inline_svgs(&mut self) -> ScanStats {
        self.run(ScanRequest::inline()).await
    }

    /// Rebuild the usage-site list across the configured roots.
    pub async fn scan_icon_usages(&mut self) -> ScanStats {
        self.run(ScanRequest::usages()).await
    }

    /// Load built icons from the library as [`IconKind::BuiltIcon`] entries.
    pub async fn scan_library(&mut self) -> IndexResult<ScanStats> {
        let started = Instant::now();
        let built = self.library.load_built_icons().await?;
        let token = self
            .registry
            .begin_generation(ScanScope::kind(IconKind::BuiltIcon));

        let mut stats = ScanStats::default();
        let icons = built.values().map(|entry| entry.to_icon()).collect();
        self.apply_generation(&token, icons, &mut stats);
        stats.elapsed = started.elapsed();

        crate::log_event!("library", "loaded", "{} built icons", stats.icons);
        self.notify(IconEvent::LibraryChanged);
        Ok(stats)
    }

    /// Reload the ignore file and rescan everything, library included.
    ///
    /// A library that cannot be read is logged; the draft views still refresh.
    pub async fn refresh(&mut self) -> ScanStats {
        self.reload_ignore();
        let mut stats = self.run(ScanRequest::all()).await;
        match self.scan_library().await {
            Ok(library) => stats.merge(&library),
            Err(e) => crate::warn_event!("library", "could not load built icons: {e}"),
        }
        stats
    }

    // ---- queries ----

    /// All icons, optionally of one kind, sorted by kind then name.
    pub fn get_all_icons(&self, kind: Option<IconKind>) -> Vec<&Icon> {
        self.registry.all(kind)
    }

    /// Lookup by name; file icons win over inline, inline over built.
    pub fn get_icon_by_name(&self, name: &str) -> Option<&Icon> {
        self.registry.by_name(name)
    }

    pub fn get_icon(&self, key: &IconKey) -> Option<&Icon> {
        self.registry.get(key)
    }

    /// Lookup by backing file; relative paths resolve against the workspace root.
    pub fn get_icon_by_path(&self, path: &Path) -> Option<&Icon> {
        self.registry.by_path(&self.settings.resolve(path))
    }

    /// Usage sites referencing `name`, in file then document order.
    pub fn find_usages(&self, name: &str) -> UsageSearch {
        let usages: Vec<UsageSite> = self
            .usages
            .values()
            .flatten()
            .filter(|site| site.referenced_name == name)
            .cloned()
            .collect();
        UsageSearch {
            total: usages.len(),
            usages,
        }
    }

    /// Every known usage site.
    pub fn all_usages(&self) -> impl Iterator<Item = &UsageSite> {
        self.usages.values().flatten()
    }

    /// Build status of every draft and built icon.
    pub async fn reconcile(&self) -> IndexResult<Reconciliation> {
        let built = self.library.load_built_icons().await?;
        Ok(BuildStateReconciler::reconcile(&self.registry, &built))
    }

    // ---- incremental updates ----

    fn in_roots(&self, path: &Path) -> bool {
        self.settings
            .scan_roots()
            .iter()
            .any(|root| path.starts_with(root))
    }

    fn tracks(&self, path: &Path) -> bool {
        self.registry.paths().any(|p| p.starts_with(path))
            || self.usages.keys().any(|p| p.starts_with(path))
    }

    /// Whether a change at `path` can affect the index.
    ///
    /// Directories under a root count, so a folder moved in is walked.
    pub async fn is_relevant(&self, path: &Path) -> bool {
        if path == self.settings.ignore_path()
            || self.library.is_artifact(path)
            || (self.in_roots(path) && self.scanner.accepts(path))
            || self.tracks(path)
        {
            return true;
        }
        self.in_roots(path)
            && !self.scanner.filter().matches_dir(path)
            && is_dir(path).await
    }

    /// Note an incremental change so an in-flight scan does not overwrite it.
    fn touch(&mut self, path: &Path) {
        if self.scans_in_flight == 0 {
            return;
        }
        self.change_seq += 1;
        self.touched.insert(path.to_path_buf(), self.change_seq);
    }

    /// Re-index only `paths`.
    ///
    /// Missing paths are removed; an ignore-file change triggers a full
    /// [`refresh`](Self::refresh); library artifacts reload built icons.
    pub async fn process_changes(&mut self, paths: &[PathBuf]) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        let ignore_path = self.settings.ignore_path();

        for path in paths {
            if *path == ignore_path {
                summary.refreshed = true;
                continue;
            }
            if self.library.is_artifact(path) {
                summary.library = true;
                continue;
            }
            self.touch(path);
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                if self.remove_path(path) {
                    summary.removed.push(path.clone());
                }
                continue;
            }
            if is_dir(path).await {
                self.reindex_dir(path, &mut summary).await;
                continue;
            }
            match self.reindex_file(path).await {
                Ok(true) => summary.reindexed.push(path.clone()),
                Ok(false) => crate::debug_event!("watcher", "unchanged", "{}", path.display()),
                Err(e) => {
                    crate::warn_event!("watcher", "skipping {}: {e}", path.display());
                    summary.failed += 1;
                }
            }
        }

        if summary.refreshed {
            self.refresh().await;
        } else if summary.library {
            if let Err(e) = self.scan_library().await {
                crate::warn_event!("library", "could not load built icons: {e}");
            }
        }
        summary
    }

    /// Bring everything under a directory that appeared or moved in up to date.
    async fn reindex_dir(&mut self, dir: &Path, summary: &mut ChangeSummary) {
        if !self.in_roots(dir) || self.scanner.filter().matches_dir(dir) {
            if self.remove_path(dir) {
                summary.removed.push(dir.to_path_buf());
            }
            return;
        }

        let candidates = match self.scanner.discover(vec![dir.to_path_buf()]).await {
            Ok(found) => found,
            Err(e) => {
                crate::warn_event!("watcher", "skipping {}: {e}", dir.display());
                summary.failed += 1;
                return;
            }
        };
        crate::debug_event!(
            "watcher",
            "directory",
            "{} ({} candidates)",
            dir.display(),
            candidates.len()
        );

        let found: BTreeSet<&Path> = candidates.iter().map(|c| c.path.as_path()).collect();
        let gone: BTreeSet<PathBuf> = self
            .registry
            .paths()
            .chain(self.usages.keys().map(PathBuf::as_path))
            .filter(|p| p.starts_with(dir) && !found.contains(p) && !self.library.is_artifact(p))
            .map(Path::to_path_buf)
            .collect();
        for path in gone {
            if self.remove_path(&path) {
                summary.removed.push(path);
            }
        }

        for candidate in candidates {
            if self.library.is_artifact(&candidate.path) {
                continue;
            }
            match self.reindex_file(&candidate.path).await {
                Ok(true) => summary.reindexed.push(candidate.path),
                Ok(false) => {}
                Err(e) => {
                    crate::warn_event!("watcher", "skipping {}: {e}", candidate.path.display());
                    summary.failed += 1;
                }
            }
        }
    }

    /// Re-read one file. Returns whether any icon or usage changed.
    async fn reindex_file(&mut self, path: &Path) -> IndexResult<bool> {
        let Some(kind) = self.scanner.classify(path) else {
            return Ok(false);
        };
        if !self.in_roots(path) || self.scanner.filter().matches(path) {
            return Ok(self.remove_path(path));
        }

        let candidate = Candidate {
            path: path.to_path_buf(),
            kind,
        };
        let Some(text) = self.scanner.read(&candidate).await? else {
            return Ok(self.remove_path(path));
        };

        let changed = match kind {
            CandidateKind::Svg => {
                let icons = name_from_path(path)
                    .map(|name| Icon::from_file(name, path, text.content))
                    .into_iter()
                    .collect();
                self.replace_file_icons(path, IconKind::SvgFile, icons)
            }
            CandidateKind::Source => {
                let inline = self.indexer.inline_svgs(path, &text.content);
                let icons_changed = self.replace_file_icons(path, IconKind::InlineSvg, inline);

                let sites = self.indexer.find_usages(path, &text.content);
                let previous = self.usages.get(path).map(Vec::as_slice).unwrap_or_default();
                let usages_changed = previous != sites.as_slice();
                if sites.is_empty() {
                    self.usages.remove(path);
                } else {
                    self.usages.insert(path.to_path_buf(), sites);
                }
                icons_changed || usages_changed
            }
        };

        if changed {
            crate::log_event!("watcher", "reindexed", "{}", path.display());
            self.notify(IconEvent::FileReindexed {
                path: path.to_path_buf(),
            });
        }
        Ok(changed)
    }

    /// Make `icons` the complete set of `kind` icons backed by `path`.
    fn replace_file_icons(&mut self, path: &Path, kind: IconKind, icons: Vec<Icon>) -> bool {
        let before: BTreeSet<IconKey> = self
            .registry
            .icons_in(path)
            .into_iter()
            .filter(|icon| icon.kind() == kind)
            .map(Icon::key)
            .collect();

        let mut changed = false;
        let mut seen = BTreeSet::new();
        for icon in icons {
            seen.insert(icon.key());
            changed |= self.registry.upsert(icon).is_change();
        }
        for key in before.difference(&seen) {
            self.registry.remove(key);
            changed = true;
        }
        changed
    }

    /// Drop every icon and usage backed by `path` or anything under it.
    pub fn remove_path(&mut self, path: &Path) -> bool {
        let backed: Vec<PathBuf> = self
            .registry
            .paths()
            .filter(|p| p.starts_with(path))
            .map(Path::to_path_buf)
            .collect();
        let mut icons = 0;
        for file in &backed {
            icons += self.registry.remove_path(file, None).len();
        }

        let before = self.usages.len();
        self.usages.retain(|p, _| !p.starts_with(path));
        let usage_files = before - self.usages.len();

        if icons == 0 && usage_files == 0 {
            return false;
        }
        crate::log_event!(
            "watcher",
            "removed",
            "{} ({icons} icons, {usage_files} files with usages)",
            path.display()
        );
        self.notify(IconEvent::FileDeleted {
            path: path.to_path_buf(),
        });
        true
    }

    // ---- editor actions ----

    /// Rewrite every reference to `old` as `new` through the host editor.
    ///
    /// Edits within one file are applied back to front so earlier spans stay
    /// valid. Touched files are re-indexed afterwards. Returns the edit count.
    pub async fn rename_references(
        &mut self,
        old: &str,
        new: &str,
        host: &dyn EditorHost,
    ) -> IndexResult<usize> {
        let mut by_file: BTreeMap<PathBuf, Vec<(usize, usize)>> = BTreeMap::new();
        for site in self.find_usages(old).usages {
            by_file.entry(site.file).or_default().push(site.span);
        }

        let mut edits = 0;
        for (file, spans) in &mut by_file {
            spans.sort_by(|a, b| b.0.cmp(&a.0));
            for span in spans.iter() {
                host.apply_edit(file, *span, new).await?;
                edits += 1;
            }
        }

        let files: Vec<PathBuf> = by_file.into_keys().collect();
        self.process_changes(&files).await;
        crate::log_event!("usages", "renamed", "{old} -> {new} ({edits} edits)");
        Ok(edits)
    }

    /// Jump to an icon's source location.
    pub async fn reveal_icon(&self, name: &str, host: &dyn EditorHost) -> IndexResult<Location> {
        let location = self
            .get_icon_by_name(name)
            .ok_or_else(|| IndexError::NotFound(name.to_string()))?
            .location()
            .ok_or_else(|| IndexError::NotFound(format!("{name} in workspace sources")))?;
        host.reveal(&location.file, location.line).await?;
        Ok(location)
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn settings(root: &Path) -> Arc<Settings> {
        Arc::new(Settings {
            workspace_root: Some(root.to_path_buf()),
            ..Settings::default()
        })
    }

    fn workspace() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(
            root.join("assets/arrow.svg"),
            r##"<svg viewBox="0 0 24 24"><path fill="#f00"/></svg>"##,
        )
        .unwrap();
        fs::write(
            root.join("src/App.tsx"),
            "<Icon name=\"arrow\" />\n<svg id=\"badge\"><circle fill=\"red\"/></svg>\n",
        )
        .unwrap();
        temp
    }

    #[tokio::test]
    async fn test_refresh_populates_all_views() {
        let temp = workspace();
        let mut index = IconIndex::new(settings(temp.path())).unwrap();
        let stats = index.refresh().await;

        assert_eq!(stats.icons, 2);
        assert_eq!(stats.usages, 1);
        assert!(!stats.superseded);
        assert_eq!(index.get_all_icons(Some(IconKind::SvgFile)).len(), 1);
        assert_eq!(index.get_icon_by_name("badge").unwrap().kind(), IconKind::InlineSvg);
        assert_eq!(
            index
                .get_icon_by_path(Path::new("assets/arrow.svg"))
                .unwrap()
                .name,
            "arrow"
        );

        let search = index.find_usages("arrow");
        assert_eq!(search.total, 1);
        assert_eq!(search.usages[0].line, 1);
    }

    #[tokio::test]
    async fn test_superseded_commit_is_discarded() {
        let temp = workspace();
        let mut index = IconIndex::new(settings(temp.path())).unwrap();

        let old = index.begin_scan(ScanRequest::all());
        let new = index.begin_scan(ScanRequest::all());
        let old = old.collect().await;
        let new = new.collect().await;

        let stats = index.commit(new);
        assert!(!stats.superseded);
        let stale = index.commit(old);
        assert!(stale.superseded);
        assert_eq!(index.get_all_icons(None).len(), 2);
        assert_eq!(index.find_usages("arrow").total, 1);
    }

    #[tokio::test]
    async fn test_process_changes_updates_and_removes() {
        let temp = workspace();
        let root = temp.path();
        let mut index = IconIndex::new(settings(root)).unwrap();
        index.refresh().await;

        let app = root.join("src/App.tsx");
        fs::write(&app, "<Icon name=\"arrow\" />\n<Icon name=\"star\" />\n").unwrap();
        let summary = index.process_changes(&[app.clone()]).await;
        assert_eq!(summary.reindexed, vec![app.clone()]);
        assert!(index.get_icon_by_name("badge").is_none());
        assert_eq!(index.find_usages("star").total, 1);

        // same content again is not a change
        let summary = index.process_changes(&[app.clone()]).await;
        assert!(summary.is_empty());

        let arrow = root.join("assets/arrow.svg");
        fs::remove_file(&arrow).unwrap();
        let summary = index.process_changes(&[arrow.clone()]).await;
        assert_eq!(summary.removed, vec![arrow]);
        assert!(index.get_icon_by_name("arrow").is_none());
    }

    #[tokio::test]
    async fn test_relevance() {
        let temp = workspace();
        let root = temp.path();
        let mut index = IconIndex::new(settings(root)).unwrap();
        index.refresh().await;

        assert!(index.is_relevant(&root.join("assets/new.svg")).await);
        assert!(index.is_relevant(&root.join(".iconignore")).await);
        assert!(index.is_relevant(&root.join("icons/icons.js")).await);
        assert!(index.is_relevant(&root.join("assets")).await);
        assert!(!index.is_relevant(&root.join("notes.txt")).await);
        assert!(!index.is_relevant(&root.join("node_modules/pkg/x.svg")).await);

        // a folder that appeared since the last scan
        fs::create_dir_all(root.join("fresh")).unwrap();
        assert!(index.is_relevant(&root.join("fresh")).await);
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        assert!(!index.is_relevant(&root.join("node_modules/pkg")).await);
    }

    #[tokio::test]
    async fn test_moved_directory_is_walked() {
        let temp = workspace();
        let root = temp.path();
        fs::create_dir_all(root.join("old")).unwrap();
        fs::write(root.join("old/home.svg"), r#"<svg><path/></svg>"#).unwrap();
        let mut index = IconIndex::new(settings(root)).unwrap();
        index.refresh().await;

        fs::rename(root.join("old"), root.join("new")).unwrap();
        let summary = index
            .process_changes(&[root.join("old"), root.join("new")])
            .await;

        assert_eq!(summary.removed, vec![root.join("old")]);
        assert_eq!(summary.reindexed, vec![root.join("new/home.svg")]);
        let home = index.get_icon_by_name("home").unwrap();
        assert_eq!(home.path(), Some(root.join("new/home.svg").as_path()));
    }

    #[tokio::test]
    async fn test_incremental_change_survives_in_flight_scan() {
        let temp = workspace();
        let root = temp.path();
        let mut index = IconIndex::new(settings(root)).unwrap();
        index.refresh().await;

        let job = index.begin_scan(ScanRequest::all());
        let collected = job.collect().await;

        // lands between collect and commit
        let arrow = root.join("assets/arrow.svg");
        let app = root.join("src/App.tsx");
        fs::write(&arrow, r##"<svg viewBox="0 0 24 24"><path fill="#00f"/></svg>"##).unwrap();
        fs::write(&app, "<Icon name=\"star\" />\n").unwrap();
        index.process_changes(&[arrow.clone(), app.clone()]).await;

        let stats = index.commit(collected);
        assert!(!stats.superseded);
        assert_eq!(index.get_icon_by_name("arrow").unwrap().colors, vec!["#0000ff"]);
        assert!(index.get_icon_by_name("badge").is_none());
        assert_eq!(index.find_usages("arrow").total, 0);
        assert_eq!(index.find_usages("star").total, 1);

        // with nothing in flight a later scan sees the files as they are
        index.refresh().await;
        assert_eq!(index.get_icon_by_name("arrow").unwrap().colors, vec!["#0000ff"]);
        assert_eq!(index.find_usages("star").total, 1);
    }
}
