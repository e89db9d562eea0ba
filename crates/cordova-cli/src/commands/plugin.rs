//! Plugin command implementations

use std::collections::BTreeMap;
use std::path::Path;

use colored::Colorize;
use cordova_core::PluginOptions;

use super::{open, print_warnings};
use crate::cli::SaveArgs;
use crate::error::{CliError, Result};

/// Parse `KEY=VALUE` pairs. Later keys win.
pub fn parse_variables(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(CliError::user(format!(
                "Invalid variable '{pair}'. Expected KEY=VALUE."
            ))),
        })
        .collect()
}

fn options(save: &SaveArgs) -> PluginOptions {
    PluginOptions {
        save: !save.nosave,
        searchpath: save.searchpath.clone(),
        ..PluginOptions::default()
    }
}

/// Run `plugin add`. Returns the process exit code.
pub async fn run_plugin_add(
    path: &Path,
    targets: &[String],
    variables: &[String],
    save: &SaveArgs,
) -> Result<i32> {
    let variables = parse_variables(variables)?;
    let cordova = open(path)?;
    println!(
        "{} Adding plugins: {}",
        "=>".blue().bold(),
        targets.join(", ").cyan()
    );
    let options = PluginOptions {
        variables,
        ..options(save)
    };
    let result = cordova.plugin_add(targets, &options).await;
    print_warnings(cordova.events());
    result?;
    println!("{} Plugins added.", "OK".green().bold());
    Ok(cordova.events().exit_code())
}

pub async fn run_plugin_remove(path: &Path, targets: &[String], save: &SaveArgs) -> Result<i32> {
    let cordova = open(path)?;
    println!(
        "{} Removing plugins: {}",
        "=>".blue().bold(),
        targets.join(", ").cyan()
    );
    let result = cordova.plugin_remove(targets, &options(save)).await;
    print_warnings(cordova.events());
    result?;
    println!("{} Plugins removed.", "OK".green().bold());
    Ok(cordova.events().exit_code())
}

/// Run `plugin list`
pub fn run_plugin_list(path: &Path, json: bool) -> Result<i32> {
    let cordova = open(path)?;
    let plugins = cordova.plugin_list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plugins)?);
        return Ok(0);
    }
    if plugins.is_empty() {
        println!("No plugins added. Use `{}`.", "cordova plugin add <plugin>".cyan());
        return Ok(0);
    }
    for plugin in &plugins {
        let version = plugin.version.as_deref().unwrap_or("?");
        let name = plugin
            .name
            .as_deref()
            .map(|n| format!(" \"{n}\""))
            .unwrap_or_default();
        let dependency = if plugin.is_top_level {
            String::new()
        } else {
            format!(" {}", "(dependency)".dimmed())
        };
        println!("{} {}{}{}", plugin.id.cyan(), version, name, dependency);
    }
    Ok(0)
}
