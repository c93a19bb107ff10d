//! In-memory icon registry.
//!
//! The single mutable store of [`Icon`] records, keyed by `(kind, name)` with
//! a secondary index by backing file. Full rescans are bracketed by
//! [`IconRegistry::begin_generation`] / [`IconRegistry::end_generation`]:
//! every upsert stamps the entry with the scan's generation, and entries of the
//! scanned scope still carrying an older stamp are pruned at the end.
//!
//! Generations double as staleness tokens. Starting a newer scan of the same
//! kind supersedes an older one; writes and pruning through the superseded
//! token are discarded.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::error::IndexError;
use crate::types::{Icon, IconKey, IconKind};

/// What a full scan covers: one icon kind, optionally limited to a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanScope {
    pub kind: IconKind,
    pub root: Option<PathBuf>,
}

impl ScanScope {
    pub fn kind(kind: IconKind) -> Self {
        Self { kind, root: None }
    }

    pub fn folder(kind: IconKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: Some(root.into()),
        }
    }

    fn covers(&self, icon: &Icon) -> bool {
        if icon.kind() != self.kind {
            return false;
        }
        match (&self.root, icon.path()) {
            (None, _) => true,
            (Some(root), Some(path)) => path.starts_with(root),
            (Some(_), None) => false,
        }
    }
}

/// Handle for one full scan, returned by [`IconRegistry::begin_generation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanToken {
    generation: u64,
    scope: ScanScope,
}

impl ScanToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn scope(&self) -> &ScanScope {
        &self.scope
    }
}

/// Result of an upsert, used to suppress change notifications for no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Same content hash and origin; consumers see no change.
    Unchanged,
    /// Written through a superseded scan token and dropped.
    Discarded,
}

impl UpsertOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted | UpsertOutcome::Updated)
    }
}

/// Duplicate name seen twice within one generation. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub key: IconKey,
    pub previous: Option<PathBuf>,
    pub current: Option<PathBuf>,
    pub generation: u64,
}

/// Outcome of closing a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEnd {
    /// Stale entries removed.
    Pruned(Vec<IconKey>),
    /// A newer scan of the same kind started; nothing was pruned.
    Superseded,
}

#[derive(Debug, Clone)]
struct Entry {
    icon: Icon,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct IconRegistry {
    entries: HashMap<IconKey, Entry>,
    by_path: HashMap<PathBuf, BTreeSet<IconKey>>,
    /// Monotonic generation counter.
    counter: u64,
    /// Latest generation issued per kind; older tokens are stale.
    current: HashMap<IconKind, u64>,
    collisions: Vec<Collision>,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a full scan of `scope`, superseding any scan of the same kind.
    pub fn begin_generation(&mut self, scope: ScanScope) -> ScanToken {
        self.counter += 1;
        self.current.insert(scope.kind, self.counter);
        self.collisions.retain(|c| c.key.kind != scope.kind);
        crate::debug_event!(
            "registry",
            "begin generation",
            "{} for {}",
            self.counter,
            scope.kind
        );
        ScanToken {
            generation: self.counter,
            scope,
        }
    }

    /// Whether `token` is still the latest scan of its kind.
    pub fn is_current(&self, token: &ScanToken) -> bool {
        self.current.get(&token.scope.kind).copied() == Some(token.generation)
    }

    /// Upsert as part of a full scan.
    pub fn upsert_scanned(&mut self, token: &ScanToken, icon: Icon) -> UpsertOutcome {
        if !self.is_current(token) {
            crate::debug_event!(
                "registry",
                "discarded stale write",
                "{} from generation {}",
                icon.key(),
                token.generation
            );
            return UpsertOutcome::Discarded;
        }
        self.write(icon, token.generation, true)
    }

    /// Incremental upsert outside a full scan, stamped with the kind's current generation.
    pub fn upsert(&mut self, icon: Icon) -> UpsertOutcome {
        let generation = self.current.get(&icon.kind()).copied().unwrap_or(0);
        self.write(icon, generation, false)
    }

    fn write(&mut self, icon: Icon, generation: u64, scanned: bool) -> UpsertOutcome {
        let key = icon.key();

        let Some(existing) = self.entries.get(&key) else {
            if let Some(path) = icon.path() {
                self.by_path
                    .entry(path.to_path_buf())
                    .or_default()
                    .insert(key.clone());
            }
            self.entries.insert(key.clone(), Entry { icon, generation });
            crate::debug_event!("registry", "upsert", "{key} Inserted");
            return UpsertOutcome::Inserted;
        };

        // Within a scan any second origin for the same key collides; outside
        // one only a different backing file does.
        let collided = if scanned {
            existing.generation == generation && existing.icon.source != icon.source
        } else {
            existing.icon.path() != icon.path()
        };
        let unchanged = existing.icon.hash == icon.hash && existing.icon.source == icon.source;
        let old_path = existing.icon.path().map(Path::to_path_buf);

        if collided {
            let previous = existing.icon.clone();
            self.record_collision(&key, &previous, &icon, generation);
        }

        if unchanged {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.generation = generation;
            }
            return UpsertOutcome::Unchanged;
        }

        let new_path = icon.path().map(Path::to_path_buf);
        if old_path != new_path {
            if let Some(old) = &old_path {
                self.unindex_path(old, &key);
            }
            if let Some(new) = new_path {
                self.by_path.entry(new).or_default().insert(key.clone());
            }
        }
        self.entries.insert(key.clone(), Entry { icon, generation });
        crate::debug_event!("registry", "upsert", "{key} Updated");
        UpsertOutcome::Updated
    }

    fn record_collision(&mut self, key: &IconKey, previous: &Icon, current: &Icon, generation: u64) {
        let collision = Collision {
            key: key.clone(),
            previous: previous.path().map(Path::to_path_buf),
            current: current.path().map(Path::to_path_buf),
            generation,
        };
        let err = IndexError::NameCollision {
            kind: key.kind,
            name: key.name.clone(),
            previous: collision.previous.clone().unwrap_or_default(),
            current: collision.current.clone().unwrap_or_default(),
        };
        crate::warn_event!("registry", "{err}");
        self.collisions.push(collision);
    }

    /// Close a scan, pruning entries in its scope that it did not observe.
    pub fn end_generation(&mut self, token: &ScanToken) -> GenerationEnd {
        if !self.is_current(token) {
            crate::debug_event!(
                "registry",
                "superseded",
                "generation {} for {}",
                token.generation,
                token.scope.kind
            );
            return GenerationEnd::Superseded;
        }

        let mut stale: Vec<IconKey> = self
            .entries
            .iter()
            .filter(|(_, e)| e.generation < token.generation && token.scope.covers(&e.icon))
            .map(|(k, _)| k.clone())
            .collect();
        stale.sort();

        for key in &stale {
            self.remove(key);
        }

        if !stale.is_empty() {
            crate::log_event!(
                "registry",
                "pruned",
                "{} stale {} icons",
                stale.len(),
                token.scope.kind
            );
        }
        GenerationEnd::Pruned(stale)
    }

    pub fn remove(&mut self, key: &IconKey) -> Option<Icon> {
        let entry = self.entries.remove(key)?;
        if let Some(path) = entry.icon.path() {
            let path = path.to_path_buf();
            self.unindex_path(&path, key);
        }
        Some(entry.icon)
    }

    /// Remove every icon backed by `path`, optionally limited to one kind.
    pub fn remove_path(&mut self, path: &Path, kind: Option<IconKind>) -> Vec<IconKey> {
        let keys: Vec<IconKey> = self
            .by_path
            .get(path)
            .map(|keys| {
                keys.iter()
                    .filter(|k| kind.is_none_or(|kind| k.kind == kind))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for key in &keys {
            self.remove(key);
        }
        keys
    }

    fn unindex_path(&mut self, path: &Path, key: &IconKey) {
        if let Some(keys) = self.by_path.get_mut(path) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    pub fn get(&self, key: &IconKey) -> Option<&Icon> {
        self.entries.get(key).map(|e| &e.icon)
    }

    /// Look up by name, preferring draft kinds: file, then inline, then built.
    pub fn by_name(&self, name: &str) -> Option<&Icon> {
        IconKind::ALL
            .iter()
            .find_map(|kind| self.get(&IconKey::new(*kind, name)))
    }

    /// The icon backed by `path`; a standalone SVG wins over inline blocks.
    pub fn by_path(&self, path: &Path) -> Option<&Icon> {
        self.by_path
            .get(path)
            .and_then(|keys| keys.iter().next())
            .and_then(|key| self.get(key))
    }

    /// Every icon backed by `path`, in key order.
    pub fn icons_in(&self, path: &Path) -> Vec<&Icon> {
        self.by_path
            .get(path)
            .map(|keys| keys.iter().filter_map(|k| self.get(k)).collect())
            .unwrap_or_default()
    }

    /// All icons, optionally of one kind, sorted by kind then name.
    pub fn all(&self, kind: Option<IconKind>) -> Vec<&Icon> {
        let mut icons: Vec<&Icon> = self
            .entries
            .values()
            .map(|e| &e.icon)
            .filter(|icon| kind.is_none_or(|k| icon.kind() == k))
            .collect();
        icons.sort_by(|a, b| (a.kind(), &a.name).cmp(&(b.kind(), &b.name)));
        icons
    }

    /// Paths currently backing at least one icon.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.by_path.keys().map(PathBuf::as_path)
    }

    /// Collisions recorded by the current generation of each kind.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_path.clear();
        self.collisions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;

    fn file_icon(name: &str, path: &str, fill: &str) -> Icon {
        Icon::from_file(
            name,
            path,
            format!(r#"<svg viewBox="0 0 24 24"><path fill="{fill}"/></svg>"#),
        )
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut registry = IconRegistry::new();
        let icon = file_icon("home", "/w/home.svg", "#000");

        assert_eq!(registry.upsert(icon.clone()), UpsertOutcome::Inserted);
        assert_eq!(registry.upsert(icon.clone()), UpsertOutcome::Unchanged);
        assert_eq!(registry.len(), 1);

        let changed = file_icon("home", "/w/home.svg", "#fff");
        assert_eq!(registry.upsert(changed), UpsertOutcome::Updated);
        assert_eq!(registry.by_name("home").unwrap().colors, vec!["#ffffff"]);
    }

    #[test]
    fn test_lookup_by_name_and_path() {
        let mut registry = IconRegistry::new();
        registry.upsert(file_icon("home", "/w/home.svg", "#000"));
        registry.upsert(Icon::inline(
            "logo",
            Location::new("/w/App.vue", 3),
            (10, 40),
            "<svg id=\"logo\"></svg>",
        ));
        registry.upsert(Icon::built("home", "/w/icons/icons.js", "<svg></svg>"));

        // draft preferred over built
        assert_eq!(registry.by_name("home").unwrap().kind(), IconKind::SvgFile);
        assert_eq!(
            registry.by_path(Path::new("/w/App.vue")).unwrap().name,
            "logo"
        );
        assert!(registry.by_path(Path::new("/w/none.svg")).is_none());
        assert_eq!(registry.all(Some(IconKind::BuiltIcon)).len(), 1);
        assert_eq!(registry.all(None).len(), 3);
    }

    #[test]
    fn test_generational_pruning() {
        let mut registry = IconRegistry::new();

        let token = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));
        registry.upsert_scanned(&token, file_icon("a", "/w/a.svg", "#000"));
        registry.upsert_scanned(&token, file_icon("b", "/w/b.svg", "#000"));
        assert_eq!(registry.end_generation(&token), GenerationEnd::Pruned(vec![]));
        assert_eq!(registry.len(), 2);

        // b.svg deleted between scans
        let token = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));
        registry.upsert_scanned(&token, file_icon("a", "/w/a.svg", "#000"));
        let end = registry.end_generation(&token);
        assert_eq!(
            end,
            GenerationEnd::Pruned(vec![IconKey::new(IconKind::SvgFile, "b")])
        );
        assert!(registry.by_name("b").is_none());
        assert!(registry.by_path(Path::new("/w/b.svg")).is_none());
    }

    #[test]
    fn test_pruning_is_scoped() {
        let mut registry = IconRegistry::new();
        registry.upsert(file_icon("a", "/w/src/a.svg", "#000"));
        registry.upsert(file_icon("b", "/w/lib/b.svg", "#000"));
        registry.upsert(Icon::built("c", "/w/icons/icons.js", "<svg></svg>"));

        let token = registry.begin_generation(ScanScope::folder(IconKind::SvgFile, "/w/src"));
        registry.end_generation(&token);

        // only the scanned folder and kind lose unseen entries
        assert!(registry.by_name("a").is_none());
        assert!(registry.by_name("b").is_some());
        assert!(registry.by_name("c").is_some());
    }

    #[test]
    fn test_superseded_scan_is_discarded() {
        let mut registry = IconRegistry::new();
        registry.upsert(file_icon("keep", "/w/keep.svg", "#000"));

        let old = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));
        let new = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));

        assert_eq!(
            registry.upsert_scanned(&old, file_icon("late", "/w/late.svg", "#000")),
            UpsertOutcome::Discarded
        );
        assert_eq!(registry.end_generation(&old), GenerationEnd::Superseded);
        assert!(registry.by_name("keep").is_some());
        assert!(registry.by_name("late").is_none());

        registry.upsert_scanned(&new, file_icon("keep", "/w/keep.svg", "#000"));
        assert_eq!(registry.end_generation(&new), GenerationEnd::Pruned(vec![]));
    }

    #[test]
    fn test_name_collision_last_wins() {
        let mut registry = IconRegistry::new();
        let token = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));
        registry.upsert_scanned(&token, file_icon("star", "/w/a/star.svg", "#000"));
        registry.upsert_scanned(&token, file_icon("star", "/w/b/star.svg", "#fff"));
        registry.end_generation(&token);

        let icon = registry.by_name("star").unwrap();
        assert_eq!(icon.path(), Some(Path::new("/w/b/star.svg")));
        assert_eq!(registry.collisions().len(), 1);
        assert_eq!(
            registry.collisions()[0].previous.as_deref(),
            Some(Path::new("/w/a/star.svg"))
        );
        // the loser's path no longer resolves
        assert!(registry.by_path(Path::new("/w/a/star.svg")).is_none());

        // a fresh generation starts with a clean collision list
        let token = registry.begin_generation(ScanScope::kind(IconKind::SvgFile));
        registry.upsert_scanned(&token, file_icon("star", "/w/b/star.svg", "#fff"));
        assert!(registry.collisions().is_empty());
    }

    #[test]
    fn test_remove_path() {
        let mut registry = IconRegistry::new();
        let file = PathBuf::from("/w/page.html");
        for (i, name) in ["x", "y"].iter().enumerate() {
            registry.upsert(Icon::inline(
                *name,
                Location::new(&file, i as u32 + 1),
                (0, 1),
                "<svg></svg>",
            ));
        }
        assert_eq!(registry.icons_in(&file).len(), 2);

        let removed = registry.remove_path(&file, Some(IconKind::InlineSvg));
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.paths().count(), 0);
    }
}
