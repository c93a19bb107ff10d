//! Draft vs. built reconciliation.

use std::collections::BTreeMap;

use super::BuiltIcons;
use crate::error::IndexError;
use crate::indexing::IconRegistry;
use crate::svg::normalize_markup;
use crate::types::{BuildStatus, Icon};

/// Per-icon build status, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub statuses: BTreeMap<String, BuildStatus>,
}

impl Reconciliation {
    pub fn get(&self, name: &str) -> Option<BuildStatus> {
        self.statuses.get(name).copied()
    }

    pub fn count(&self, status: BuildStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BuildStatus)> {
        self.statuses.iter().map(|(name, s)| (name.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Stateless; re-run whenever either side changes.
pub struct BuildStateReconciler;

impl BuildStateReconciler {
    /// Classify every draft icon and every built entry.
    ///
    /// Drafts are matched by name. When a name exists as both a file and an
    /// inline icon, the file icon is compared. Bodies are compared after
    /// whitespace normalization so reformatting alone is not drift.
    pub fn reconcile(registry: &IconRegistry, built: &BuiltIcons) -> Reconciliation {
        let mut statuses = BTreeMap::new();

        // `all` is sorted by kind, so file icons are seen before inline ones.
        let drafts = registry.all(None).into_iter().filter(|i| i.kind().is_draft());
        for icon in drafts {
            if statuses.contains_key(&icon.name) {
                continue;
            }
            let status = match built.get(&icon.name) {
                Some(entry) => BuildStatus::Built {
                    stale: Self::drifted(icon, &entry.body),
                },
                None => BuildStatus::Draft,
            };
            statuses.insert(icon.name.clone(), status);
        }

        for name in built.keys() {
            if !statuses.contains_key(name) {
                statuses.insert(name.clone(), BuildStatus::Orphaned);
            }
        }

        crate::debug_event!("library", "reconciled", "{} icons", statuses.len());
        Reconciliation { statuses }
    }

    fn drifted(icon: &Icon, built_body: &str) -> bool {
        let drifted = normalize_markup(&icon.body()) != normalize_markup(built_body);
        if drifted {
            let mismatch = IndexError::ReconcileMismatch {
                name: icon.name.clone(),
            };
            crate::debug_event!("library", "stale", "{mismatch}");
        }
        drifted
    }
}
