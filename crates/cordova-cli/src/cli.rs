//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand};

/// Cordova - Manage the platforms and plugins of a mobile app project
#[derive(Parser, Debug)]
#[command(name = "cordova")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage project platforms
    Platform {
        #[command(subcommand)]
        action: PlatformAction,
    },

    /// Manage project plugins
    Plugin {
        #[command(subcommand)]
        action: PluginAction,
    },

    /// Restore declared platforms and plugins, then copy files into
    /// platforms
    ///
    /// Examples:
    ///   cordova prepare              # Every installed platform
    ///   cordova prepare android      # Only android
    Prepare {
        /// Platforms to prepare (default: all installed)
        platforms: Vec<String>,

        /// Local directories searched for packages before the registry
        #[arg(long)]
        searchpath: Option<String>,
    },
}

/// Options shared by commands that change installed state
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveArgs {
    /// Do not write changes to config.xml and package.json
    #[arg(long)]
    pub nosave: bool,

    /// Local directories searched for packages before the registry
    #[arg(long)]
    pub searchpath: Option<String>,
}

/// Platform subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PlatformAction {
    /// Add platforms
    ///
    /// Examples:
    ///   cordova platform add android
    ///   cordova platform add android@13.0.0
    ///   cordova platform add ../cordova-android
    Add {
        /// Platform names, name@spec, URLs or directories
        targets: Vec<String>,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Remove platforms
    #[command(visible_alias = "rm")]
    Remove {
        /// Platform names
        targets: Vec<String>,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Update platforms
    #[command(visible_alias = "up")]
    Update {
        /// Platform names or name@spec
        targets: Vec<String>,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// List installed and available platforms
    #[command(visible_alias = "ls")]
    List,
}

/// Plugin subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PluginAction {
    /// Add plugins
    ///
    /// Examples:
    ///   cordova plugin add cordova-plugin-camera
    ///   cordova plugin add cordova-plugin-camera --variable CAMERA_USAGE="Take photos"
    Add {
        /// Plugin ids, id@spec, URLs or directories
        targets: Vec<String>,

        /// Plugin install variable, as KEY=VALUE
        #[arg(long = "variable", value_name = "KEY=VALUE")]
        variables: Vec<String>,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// Remove plugins and the dependencies nothing else needs
    #[command(visible_alias = "rm")]
    Remove {
        /// Plugin ids
        targets: Vec<String>,

        #[command(flatten)]
        save: SaveArgs,
    },

    /// List installed plugins
    #[command(visible_alias = "ls")]
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
