//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Workspace SVG icon index
#[derive(Parser)]
#[command(
    name = "iconscope",
    version = env!("CARGO_PKG_VERSION"),
    about = "Workspace SVG icon index",
    long_about = "Find SVG icons in a workspace, track where they are used, and reconcile them with a built icon library.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize workspace
    #[command(about = "Set up .iconscope directory and .iconignore")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    #[command(about = "Display active settings")]
    Config,

    /// Scan the workspace
    #[command(about = "Scan for SVG files, inline SVGs and icon usages")]
    Scan {
        /// Limit the SVG file scan to this folder
        #[arg(value_name = "PATH")]
        folder: Option<PathBuf>,

        /// Print icons as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find usages of an icon
    #[command(about = "List every place an icon is referenced")]
    Usages {
        /// Icon name
        name: String,

        /// Print usages as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show build state
    #[command(about = "Compare workspace icons with the built library")]
    Status,

    /// Add an icon to the library
    #[command(about = "Write a draft icon into the built library")]
    Build {
        /// Icon name
        name: String,
    },

    /// Manage color variants
    #[command(about = "Save, apply and list color variants")]
    Variant {
        #[command(subcommand)]
        action: VariantAction,
    },

    /// Rename an icon and its references
    #[command(about = "Rename an icon and rewrite every reference to it")]
    Rename {
        /// Current icon name
        old: String,

        /// New icon name
        new: String,
    },

    /// Print an icon's source location
    #[command(about = "Show where an icon is defined")]
    Reveal {
        /// Icon name
        name: String,
    },

    /// Watch the workspace
    #[command(about = "Keep the index current as files change")]
    Watch,
}

/// Variant subcommands
#[derive(Subcommand)]
pub enum VariantAction {
    /// Save a named palette for an icon
    Save {
        /// Icon name
        icon: String,

        /// Variant name
        name: String,

        /// Colors in palette order, e.g. "#ff0000"
        #[arg(required = true, num_args = 1..)]
        colors: Vec<String>,
    },

    /// Recolor an icon with a saved variant
    Apply {
        /// Icon name
        icon: String,

        /// Variant name
        name: String,
    },

    /// Restore an icon's original palette
    Reset {
        /// Icon name
        icon: String,
    },

    /// Delete a saved variant
    Remove {
        /// Icon name
        icon: String,

        /// Variant name
        name: String,
    },

    /// List an icon's palette and variants
    List {
        /// Icon name
        icon: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_variant_save() {
        let cli = Cli::parse_from([
            "iconscope", "variant", "save", "star", "gold", "#ffd700", "#000000",
        ]);
        match cli.command {
            Commands::Variant {
                action: VariantAction::Save { icon, name, colors },
            } => {
                assert_eq!(icon, "star");
                assert_eq!(name, "gold");
                assert_eq!(colors, vec!["#ffd700", "#000000"]);
            }
            _ => panic!("expected variant save"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["iconscope", "status", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(cli.command, Commands::Status));
    }
}
