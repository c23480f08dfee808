//! site-author - admin CLI
//!
//! Operates on the configured attribute document as a network operator:
//! inspect, save, resolve and render the per-site author overrides.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use site_author::cli::{Cli, Commands, ConfigSubcommand, Target};
use site_author::config::{self, AuthorConfig};
use site_author::error::Error;
use site_author::host::{
    AttributeStore, HostServices, NonceService, ProfileSanitizer, RoleAuthorizer,
    SignedNonceService, TomlAttributeStore,
};
use site_author::logging::{self, LogGuards};
use site_author::overlay::SiteOverlay;
use site_author::types::OverrideField;
use site_author::version;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        std::process::exit(report(&err));
    }
}

/// Print an error and pick the exit code
fn report(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(e) => {
            if err.chain().count() > 1 {
                eprintln!("{}", err);
            }
            eprint!("{}", e.format_for_terminal());
            e.exit_code()
        }
        None => {
            eprintln!("Error: {:#}", err);
            1
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Commands that need no configuration
    match &cli.command {
        Commands::Version => {
            print!("{}", version::build_info());
            return Ok(());
        }
        Commands::Config {
            subcommand: ConfigSubcommand::Init { path, force },
        } => {
            let path = config::init_config(path.as_deref(), *force)?;
            println!("Configuration file created: {}", path.display());
            return Ok(());
        }
        _ => {}
    }

    let config = AuthorConfig::load(cli.config.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards: LogGuards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    debug!(version = %build.full_version(), "Starting site-author");

    match cli.command {
        Commands::Config { subcommand } => handle_config_command(&config, subcommand),
        Commands::Sites => {
            list_sites(&config);
            Ok(())
        }
        Commands::Show { target, json } => {
            let (overlay, _) = open_overlay(&config, target)?;
            show(&overlay, target, json)
        }
        Commands::Set {
            target,
            display_name,
            description,
        } => {
            let (overlay, _) = open_overlay(&config, target)?;
            let submission =
                overlay.prepare_submission(display_name.as_deref(), description.as_deref());
            let saved = overlay.save(target.user, &submission)?;
            println!(
                "Saved overrides for user {} on site {}",
                saved.user_id, saved.site_id
            );
            for field in OverrideField::all() {
                println!("  {:<13} {}", field.slug(), display_value(saved.get(*field)));
            }
            Ok(())
        }
        Commands::Resolve {
            target,
            field,
            base,
        } => {
            let (overlay, store) = open_overlay(&config, target)?;
            let base = match base {
                Some(base) => base,
                None => store
                    .read_attribute(target.user, field.global_attribute())?
                    .unwrap_or_default(),
            };
            println!("{}", overlay.resolve(field, &base, Some(target.user)));
            Ok(())
        }
        Commands::Render { target } => {
            let (overlay, _) = open_overlay(&config, target)?;
            print!("{}", overlay.render_fields(target.user)?.to_html()?);
            Ok(())
        }
        Commands::Version => Ok(()),
    }
}

/// Build the overlay for the target site, backed by the configured store
fn open_overlay(
    config: &AuthorConfig,
    target: Target,
) -> anyhow::Result<(SiteOverlay, Arc<TomlAttributeStore>)> {
    if !config.network.multisite {
        return Err(Error::NotMultisite.into());
    }

    let site = config.site(target.site)?;
    let path = config.storage_path();
    let store = Arc::new(
        TomlAttributeStore::open(&path)
            .with_context(|| format!("Failed to open attribute store {}", path.display()))?,
    );

    let nonces: Arc<dyn NonceService> = match config.nonce_secret() {
        Some(secret) => Arc::new(SignedNonceService::new(
            secret,
            config.nonce_lifetime(),
            None,
        )),
        None => Arc::new(SignedNonceService::with_random_secret(
            config.nonce_lifetime(),
            None,
        )),
    };

    let host = HostServices::new(
        store.clone(),
        Arc::new(RoleAuthorizer::operator()),
        nonces,
        Arc::new(ProfileSanitizer::new()),
    );

    Ok((SiteOverlay::new(site, &config.overlay, host), store))
}

fn show(overlay: &SiteOverlay, target: Target, json: bool) -> anyhow::Result<()> {
    let overrides = overlay.overrides_for(target.user)?;

    if json {
        let value = serde_json::json!({
            "user_id": target.user,
            "site_id": target.site,
            "display_name": overrides.display_name,
            "description": overrides.description,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "User {} on site {} ({})",
        target.user,
        target.site,
        overlay.site().base_url
    );
    for field in OverrideField::all() {
        let value = overrides.get(*field).unwrap_or("(none)");
        println!("  {:<13} {}", field.slug(), value);
    }
    Ok(())
}

fn list_sites(config: &AuthorConfig) {
    if !config.network.multisite {
        eprintln!("{}", Error::NotMultisite);
    }
    for site in &config.network.sites {
        println!("{:>6}  {}", site.id, site.base_url);
    }
}

fn display_value(value: &str) -> &str {
    if value.is_empty() {
        "(cleared)"
    } else {
        value
    }
}

fn handle_config_command(config: &AuthorConfig, subcommand: ConfigSubcommand) -> anyhow::Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            println!("{}", toml::to_string_pretty(&config.redacted())?);
        }
        ConfigSubcommand::Validate => {
            // load() already validated
            println!("Configuration is valid.");
        }
        ConfigSubcommand::Init { .. } => {}
    }

    Ok(())
}
