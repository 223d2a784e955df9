mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, RootArgs, RootEditArgs};
use dotenv::dotenv;
use progress::CliReporter;
use relocator_core::{
    format_size, AppConfig, DirectoryLinkRoot, Preferences, RelocationEngine, RelocationStatus,
    RootDraft,
};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let config = match relocator_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let _guard = logging::init_logger(&config);

    let args = Cli::parse();

    if let Err(err) = run(args, &config) {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: Cli, config: &AppConfig) -> Result<()> {
    let prefs_path = PathBuf::from(&config.preferences_path);
    let mut prefs = Preferences::load(&prefs_path)
        .with_context(|| format!("Cannot read preferences {}", prefs_path.display()))?;

    let command = match args.command {
        Some(command) => command,
        None => {
            let _ = Cli::command().print_long_help();
            return Ok(());
        }
    };

    match command {
        Commands::Roots => print_roots(&prefs),
        Commands::AddRoot(RootArgs {
            name,
            original,
            backup,
        }) => {
            let mut draft = prefs.roots.begin_new();
            draft.name = name;
            draft.original_path = original;
            draft.backup_path = backup;
            commit_root(&mut prefs, &prefs_path, draft)?;
        }
        Commands::EditRoot(edit) => {
            let draft = prefs
                .roots
                .begin_edit()
                .ok_or_else(|| anyhow!("No root is configured"))?;
            commit_root(&mut prefs, &prefs_path, apply_edit(draft, edit))?;
        }
        Commands::CopyRoot(edit) => {
            let draft = prefs
                .roots
                .begin_copy()
                .ok_or_else(|| anyhow!("No root is configured"))?;
            commit_root(&mut prefs, &prefs_path, apply_edit(draft, edit))?;
        }
        Commands::DeleteRoot => {
            let removed = prefs.roots.delete_active()?;
            prefs.save(&prefs_path)?;
            info!("Deleted root {}", removed.name);
        }
        Commands::Select { root } => {
            let selected = prefs.roots.select(&root)?.name.clone();
            prefs.save(&prefs_path)?;
            info!("Active root is now {}", selected.cyan());
        }
        Commands::Scan => {
            let root = active_root(&prefs)?;
            let engine = engine(config, &prefs)?;
            let listing = engine.scan_root(&root, &CliReporter::new())?;
            print_listing(&root, &listing);
        }
        Commands::Relocate(target) => {
            let root = active_root(&prefs)?;
            let path = resolve(&root, &target.path);
            run_action(config, &prefs, |engine, reporter| {
                engine.create_junction(&root, &path, reporter)
            })?;
        }
        Commands::Restore(target) => {
            let root = active_root(&prefs)?;
            let path = resolve(&root, &target.path);
            run_action(config, &prefs, |engine, reporter| {
                engine.remove_junction(&root, &path, reporter)
            })?;
        }
        Commands::RemoveBackup { target, yes } => {
            let root = active_root(&prefs)?;
            let path = resolve(&root, &target.path);
            let prompt = format!(
                "Are you SURE you want to DELETE the backup of {}?",
                path.display()
            );
            if !yes && !prompt_confirm(&prompt, Some(false))? {
                return Ok(());
            }
            run_action(config, &prefs, |engine, reporter| {
                engine.remove_backup(&root, &path, reporter)
            })?;
        }
        Commands::Ignore(target) => {
            let path = resolve(&active_root(&prefs)?, &target.path);
            let engine = engine(config, &prefs)?;
            if !engine.mark_ignored(&path) {
                info!("{} is already ignored", path.display());
            }
            prefs.marks = engine.marks();
            prefs.save(&prefs_path)?;
        }
        Commands::Skip(target) => {
            let path = resolve(&active_root(&prefs)?, &target.path);
            let engine = engine(config, &prefs)?;
            if !engine.mark_skipped(&path) {
                info!("{} is already skipped", path.display());
            }
            prefs.marks = engine.marks();
            prefs.save(&prefs_path)?;
        }
        Commands::Unmark(target) => {
            let path = resolve(&active_root(&prefs)?, &target.path);
            let engine = engine(config, &prefs)?;
            if engine.unmark(&path).is_none() {
                info!("{} carries no mark", path.display());
            }
            prefs.marks = engine.marks();
            prefs.save(&prefs_path)?;
        }
        Commands::PrintConfig => {
            println!("Configuration: {:?}", config);
        }
    }

    Ok(())
}

fn engine(config: &AppConfig, prefs: &Preferences) -> Result<RelocationEngine> {
    Ok(RelocationEngine::new(config)?.with_marks(prefs.marks.clone()))
}

fn run_action<F>(config: &AppConfig, prefs: &Preferences, action: F) -> Result<()>
where
    F: FnOnce(&RelocationEngine, &CliReporter) -> Result<RelocationStatus, relocator_core::Error>,
{
    let engine = engine(config, prefs)?;
    let reporter = CliReporter::new();
    let result = action(&engine, &reporter);
    reporter.finish_bar();
    let status = result?;
    println!("{}", colorize(status));
    Ok(())
}

fn commit_root(prefs: &mut Preferences, prefs_path: &Path, draft: RootDraft) -> Result<()> {
    let name = prefs.roots.commit(draft)?.name.clone();
    prefs.save(prefs_path)?;
    info!("Saved root {}", name.cyan());
    Ok(())
}

fn apply_edit(mut draft: RootDraft, edit: RootEditArgs) -> RootDraft {
    if let Some(name) = edit.name {
        draft.name = name;
    }
    if let Some(original) = edit.original {
        draft.original_path = original;
    }
    if let Some(backup) = edit.backup {
        draft.backup_path = backup;
    }
    draft
}

fn active_root(prefs: &Preferences) -> Result<DirectoryLinkRoot> {
    prefs
        .roots
        .active()
        .cloned()
        .ok_or_else(|| anyhow!("No root is configured, add one with add-root"))
}

/// Relative paths are taken to be below the root's original path.
fn resolve(root: &DirectoryLinkRoot, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.original_path.join(path)
    }
}

fn colorize(status: RelocationStatus) -> ColoredString {
    let label = status.label();
    match status {
        RelocationStatus::Plain => label.normal(),
        RelocationStatus::BackupAvailable => label.yellow(),
        RelocationStatus::JunctionAvailable => label.green(),
        RelocationStatus::Ignored | RelocationStatus::Skipped => label.dimmed(),
    }
}

fn print_roots(prefs: &Preferences) {
    if prefs.roots.is_empty() {
        println!("No roots configured");
        return;
    }
    let active = prefs.roots.active().map(|r| r.original_path.clone());
    for root in prefs.roots.roots() {
        let marker = if Some(&root.original_path) == active.as_ref() {
            "*".green()
        } else {
            " ".normal()
        };
        println!(
            "{} {}  {} -> {}",
            marker,
            root.name.cyan(),
            root.original_path.display(),
            root.backup_path.display()
        );
    }
}

fn print_listing(root: &DirectoryLinkRoot, listing: &relocator_core::Listing) {
    println!(
        "{} ({}), {} total",
        root.name.cyan(),
        root.original_path.display(),
        format_size(listing.total_bytes()).red()
    );
    for entry in &listing.entries {
        let accessed = entry.last_accessed.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        let busy = if entry.is_busy { " (busy)" } else { "" };
        println!(
            "{:>10}  {}  {:<20}  {}{}",
            format_size(entry.size_bytes),
            accessed,
            colorize(entry.status),
            entry.path.display(),
            busy
        );
    }
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
