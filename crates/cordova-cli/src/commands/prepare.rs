//! Prepare command implementation

use std::path::Path;

use colored::Colorize;
use cordova_core::PrepareOptions;

use super::{open, print_warnings};
use crate::error::Result;

/// Run `prepare`. Returns the process exit code, non-zero when something
/// could not be restored.
pub async fn run_prepare(path: &Path, platforms: &[String], searchpath: Option<String>) -> Result<i32> {
    let cordova = open(path)?;
    println!("{} Preparing project", "=>".blue().bold());
    let options = PrepareOptions {
        platforms: platforms.to_vec(),
        searchpath,
    };
    let result = cordova.prepare(&options).await;
    print_warnings(cordova.events());
    result?;

    let code = cordova.events().exit_code();
    if code == 0 {
        println!("{} Project prepared.", "OK".green().bold());
    } else {
        println!(
            "{} Project prepared with errors. See warnings above.",
            "!!".yellow().bold()
        );
    }
    Ok(code)
}
