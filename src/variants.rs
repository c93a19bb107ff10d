//! Color variants by positional substitution.
//!
//! A variant is an ordered color list; `colors[i]` replaces the icon's
//! `colors[i]`. The reserved `_original` variant snapshots the pristine
//! palette the first time a variant is saved. Applying always maps the
//! palette present in the markup onto the target over `min(len)` entries in
//! a single pass, so resetting is applying `_original`.
//!
//! Applying without an `_original` snapshot is an error rather than a guess:
//! the live palette of an already recolored icon is not a reliable base.

use std::collections::HashMap;
use thiserror::Error;

use crate::library::VariantTable;
use crate::svg::{normalize_color, replace_colors};
use crate::types::{Icon, ORIGINAL_VARIANT, Variant};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VariantError {
    #[error("Icon '{icon}' has no _original snapshot; save a variant first")]
    MissingOriginal { icon: String },

    #[error("Icon '{icon}' has no variant '{variant}'")]
    UnknownVariant { icon: String, variant: String },

    #[error("'{0}' is a reserved variant name")]
    ReservedName(String),

    #[error("Icon '{0}' markup is malformed and cannot be recolored")]
    NotEditable(String),
}

pub type VariantResult<T> = Result<T, VariantError>;

/// Variant store plus the variant each icon currently shows.
#[derive(Debug, Default)]
pub struct VariantColorEngine {
    table: VariantTable,
    /// Last variant applied per icon in this session.
    active: HashMap<String, String>,
}

impl VariantColorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a persisted table.
    pub fn from_table(table: VariantTable) -> Self {
        Self {
            table,
            active: HashMap::new(),
        }
    }

    /// The table in its persisted shape.
    pub fn table(&self) -> &VariantTable {
        &self.table
    }

    /// The icon's ordered palette, as cached on the icon.
    pub fn extract_colors<'a>(&self, icon: &'a Icon) -> &'a [String] {
        &icon.colors
    }

    pub fn variants(&self, icon: &str) -> Vec<Variant> {
        self.table
            .get(icon)
            .map(|variants| {
                variants
                    .iter()
                    .map(|(name, colors)| Variant::new(name, colors.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, icon: &str, variant: &str) -> Option<Variant> {
        self.table
            .get(icon)?
            .get(variant)
            .map(|colors| Variant::new(variant, colors.clone()))
    }

    pub fn active(&self, icon: &str) -> Option<&str> {
        self.active.get(icon).map(String::as_str)
    }

    /// Add or overwrite a variant, snapshotting `_original` on first use.
    pub fn save_variant(&mut self, icon: &Icon, name: &str, colors: Vec<String>) -> VariantResult<()> {
        if name == ORIGINAL_VARIANT {
            return Err(VariantError::ReservedName(name.to_string()));
        }
        if !icon.editable {
            return Err(VariantError::NotEditable(icon.name.clone()));
        }

        let variants = self.table.entry(icon.name.clone()).or_default();
        if !variants.contains_key(ORIGINAL_VARIANT) {
            variants.insert(ORIGINAL_VARIANT.to_string(), icon.colors.clone());
            crate::debug_event!("variants", "snapshot", "{} {:?}", icon.name, icon.colors);
        }
        let colors = colors.iter().map(|c| canonical(c)).collect();
        variants.insert(name.to_string(), colors);
        crate::log_event!("variants", "saved", "{}/{name}", icon.name);
        Ok(())
    }

    pub fn remove_variant(&mut self, icon: &str, name: &str) -> VariantResult<bool> {
        if name == ORIGINAL_VARIANT {
            return Err(VariantError::ReservedName(name.to_string()));
        }
        let removed = self
            .table
            .get_mut(icon)
            .and_then(|variants| variants.shift_remove(name))
            .is_some();
        if self.active(icon) == Some(name) {
            self.active.remove(icon);
        }
        Ok(removed)
    }

    /// Move an icon's variants to a new name.
    pub fn rename_icon(&mut self, old: &str, new: &str) -> bool {
        let Some(variants) = self.table.shift_remove(old) else {
            return false;
        };
        self.table.insert(new.to_string(), variants);
        if let Some(active) = self.active.remove(old) {
            self.active.insert(new.to_string(), active);
        }
        true
    }

    /// Recolor `icon` with the named variant and return the new markup.
    pub fn apply_variant(&mut self, icon: &Icon, name: &str) -> VariantResult<String> {
        if !icon.editable {
            return Err(VariantError::NotEditable(icon.name.clone()));
        }
        let variants = self
            .table
            .get(&icon.name)
            .ok_or_else(|| VariantError::MissingOriginal {
                icon: icon.name.clone(),
            })?;
        if !variants.contains_key(ORIGINAL_VARIANT) {
            return Err(VariantError::MissingOriginal {
                icon: icon.name.clone(),
            });
        }
        let target = variants
            .get(name)
            .ok_or_else(|| VariantError::UnknownVariant {
                icon: icon.name.clone(),
                variant: name.to_string(),
            })?;

        let svg = substitute(&icon.svg, &icon.colors, target);
        self.active.insert(icon.name.clone(), name.to_string());
        crate::debug_event!("variants", "applied", "{}/{name}", icon.name);
        Ok(svg)
    }

    /// Restore the `_original` palette.
    pub fn reset(&mut self, icon: &Icon) -> VariantResult<String> {
        self.apply_variant(icon, ORIGINAL_VARIANT)
    }
}

/// Positional mapping `from[i] -> to[i]` over `min(len)` entries, applied in one pass.
///
/// `from` is the de-duplicated palette read from the markup, so every source
/// color has exactly one target.
fn substitute(svg: &str, from: &[String], to: &[String]) -> String {
    let mapping: HashMap<String, String> = from
        .iter()
        .zip(to)
        .map(|(old, new)| (canonical(old), canonical(new)))
        .collect();
    replace_colors(svg, &mapping)
}

/// Normalized form when recognizable, lowercased input otherwise.
fn canonical(color: &str) -> String {
    normalize_color(color).unwrap_or_else(|| color.trim().to_ascii_lowercase())
}
