//! CLI argument parsing using clap v4
//!
//! Defines the admin command-line interface for site-author.

use clap::{Parser, Subcommand};

use crate::types::{OverrideField, SiteId, UserId};

/// site-author - Per-site author display names and biographies
///
/// Inspects and edits the site-scoped author overrides stored in the
/// configured attribute document, acting as a network operator.
#[derive(Parser, Debug)]
#[command(name = "site-author")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SITE_AUTHOR_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// The (user, site) pair most commands operate on
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct Target {
    /// User id
    #[arg(short, long)]
    pub user: UserId,

    /// Site id
    #[arg(short, long)]
    pub site: SiteId,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the overrides stored for a user on a site
    Show {
        #[command(flatten)]
        target: Target,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save overrides for a user on a site (omitted fields are cleared)
    Set {
        #[command(flatten)]
        target: Target,

        /// Site-specific display name
        #[arg(long)]
        display_name: Option<String>,

        /// Site-specific biography
        #[arg(long)]
        description: Option<String>,
    },

    /// Resolve the effective value a site would display
    Resolve {
        #[command(flatten)]
        target: Target,

        /// Field to resolve: display-name or description
        #[arg(short, long, default_value = "display-name")]
        field: OverrideField,

        /// Base value (defaults to the user's global attribute)
        #[arg(long)]
        base: Option<String>,
    },

    /// Print the profile-edit form fields as HTML
    Render {
        #[command(flatten)]
        target: Target,
    },

    /// List the configured sites
    Sites,

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}
