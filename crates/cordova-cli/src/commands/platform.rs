//! Platform command implementations

use std::path::Path;

use colored::Colorize;
use cordova_core::PlatformOptions;

use super::{open, print_warnings};
use crate::cli::SaveArgs;
use crate::error::Result;

fn options(save: &SaveArgs) -> PlatformOptions {
    PlatformOptions {
        save: !save.nosave,
        searchpath: save.searchpath.clone(),
        restoring: false,
    }
}

/// Run `platform add`. Returns the process exit code.
pub async fn run_platform_add(path: &Path, targets: &[String], save: &SaveArgs) -> Result<i32> {
    let cordova = open(path)?;
    println!(
        "{} Adding platforms: {}",
        "=>".blue().bold(),
        targets.join(", ").cyan()
    );
    let result = cordova.platform_add(targets, &options(save)).await;
    print_warnings(cordova.events());
    result?;
    println!("{} Platforms added.", "OK".green().bold());
    Ok(cordova.events().exit_code())
}

pub async fn run_platform_remove(path: &Path, targets: &[String], save: &SaveArgs) -> Result<i32> {
    let cordova = open(path)?;
    println!(
        "{} Removing platforms: {}",
        "=>".blue().bold(),
        targets.join(", ").cyan()
    );
    let result = cordova.platform_remove(targets, &options(save)).await;
    print_warnings(cordova.events());
    result?;
    println!("{} Platforms removed.", "OK".green().bold());
    Ok(cordova.events().exit_code())
}

pub async fn run_platform_update(path: &Path, targets: &[String], save: &SaveArgs) -> Result<i32> {
    let cordova = open(path)?;
    println!(
        "{} Updating platforms: {}",
        "=>".blue().bold(),
        targets.join(", ").cyan()
    );
    let result = cordova.platform_update(targets, &options(save)).await;
    print_warnings(cordova.events());
    result?;
    println!("{} Platforms updated.", "OK".green().bold());
    Ok(cordova.events().exit_code())
}

/// Run `platform list`
pub fn run_platform_list(path: &Path) -> Result<i32> {
    let cordova = open(path)?;
    let listing = cordova.platform_list()?;

    println!("{}", "Installed platforms:".bold());
    if listing.installed.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for platform in &listing.installed {
        match &platform.version {
            Some(version) => println!("  {} {}", platform.name.cyan(), version),
            None => println!("  {}", platform.name.cyan()),
        }
    }

    println!("{}", "Available platforms:".bold());
    for platform in &listing.available {
        println!("  {} {}", platform.name.cyan(), platform.spec.dimmed());
    }
    Ok(0)
}
