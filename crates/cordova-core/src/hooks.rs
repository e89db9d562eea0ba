//! Lifecycle hooks around platform, plugin and prepare operations
//!
//! Hook scripts live in `hooks/<event>/` and in `config.xml` as
//! `<hook type="<event>" src="..."/>`. They run as subprocesses in the
//! project root with the operation's options serialized into
//! `CORDOVA_HOOK_PAYLOAD`.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::project::Project;

/// Events that can trigger hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforePlatformAdd,
    AfterPlatformAdd,
    BeforePlatformRm,
    AfterPlatformRm,
    BeforePlatformUpdate,
    AfterPlatformUpdate,
    BeforePluginAdd,
    AfterPluginAdd,
    BeforePluginRm,
    AfterPluginRm,
    BeforePrepare,
    AfterPrepare,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl HookEvent {
    pub const ALL: [HookEvent; 12] = [
        Self::BeforePlatformAdd,
        Self::AfterPlatformAdd,
        Self::BeforePlatformRm,
        Self::AfterPlatformRm,
        Self::BeforePlatformUpdate,
        Self::AfterPlatformUpdate,
        Self::BeforePluginAdd,
        Self::AfterPluginAdd,
        Self::BeforePluginRm,
        Self::AfterPluginRm,
        Self::BeforePrepare,
        Self::AfterPrepare,
    ];

    /// Directory and `<hook type>` name of the event
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforePlatformAdd => "before_platform_add",
            Self::AfterPlatformAdd => "after_platform_add",
            Self::BeforePlatformRm => "before_platform_rm",
            Self::AfterPlatformRm => "after_platform_rm",
            Self::BeforePlatformUpdate => "before_platform_update",
            Self::AfterPlatformUpdate => "after_platform_update",
            Self::BeforePluginAdd => "before_plugin_add",
            Self::AfterPluginAdd => "after_plugin_add",
            Self::BeforePluginRm => "before_plugin_rm",
            Self::AfterPluginRm => "after_plugin_rm",
            Self::BeforePrepare => "before_prepare",
            Self::AfterPrepare => "after_prepare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == s)
    }
}

/// Options of the operation firing the hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookPayload {
    pub platforms: Vec<String>,
    pub plugins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchpath: Option<String>,
    pub save: bool,
    pub restoring: bool,
}

impl HookPayload {
    pub fn for_platforms(platforms: &[String]) -> Self {
        Self {
            platforms: platforms.to_vec(),
            ..Self::default()
        }
    }

    pub fn for_plugins(plugins: &[String]) -> Self {
        Self {
            plugins: plugins.to_vec(),
            ..Self::default()
        }
    }
}

/// Runs the hooks registered for an event.
///
/// A failing hook aborts the operation that fired it.
#[async_trait]
pub trait HookRunner: Send + Sync {
    async fn fire(&self, event: HookEvent, payload: &HookPayload) -> Result<()>;
}

/// Runs hook scripts from the project's `hooks/` directory and `config.xml`
#[derive(Debug, Clone)]
pub struct ScriptHookRunner {
    project: Project,
}

impl ScriptHookRunner {
    pub fn new(project: Project) -> Self {
        Self { project }
    }

    /// Scripts for `event`: files in `hooks/<event>/` sorted by name, then
    /// `config.xml` hooks in document order.
    pub fn scripts_for(&self, event: HookEvent) -> Result<Vec<PathBuf>> {
        let dir = self.project.hooks_dir(event.name());
        let mut scripts = Vec::new();
        match std::fs::read_dir(&dir) {
            Ok(entries) => {
                for entry in entries {
                    let path = entry.map_err(|e| Error::io(&dir, e))?.path();
                    let hidden = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('.'));
                    if path.is_file() && !hidden {
                        scripts.push(path);
                    }
                }
                scripts.sort();
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&dir, e)),
        }

        if self.project.config_xml_path().is_file() {
            let config = self.project.load_config()?;
            scripts.extend(
                config
                    .hooks(event.name())
                    .into_iter()
                    .map(|hook| self.project.root().join(hook.src)),
            );
        }
        Ok(scripts)
    }

    async fn execute(&self, event: HookEvent, script: &Path, payload: &HookPayload) -> Result<()> {
        let payload_json = serde_json::to_string(payload)?;
        let is_js = script.extension().is_some_and(|ext| ext == "js");
        let mut cmd = if is_js {
            let mut cmd = Command::new("node");
            cmd.arg(script);
            cmd
        } else {
            Command::new(script)
        };
        cmd.current_dir(self.project.root())
            .env("CORDOVA_HOOK", script)
            .env("CORDOVA_HOOK_EVENT", event.name())
            .env("CORDOVA_HOOK_PAYLOAD", payload_json)
            .env("CORDOVA_PROJECT_ROOT", self.project.root())
            .env("CORDOVA_PLATFORMS", payload.platforms.join(","))
            .env("CORDOVA_PLUGINS", payload.plugins.join(","));

        tracing::debug!(event = %event, script = %script.display(), "running hook");
        let output = cmd.output().await.map_err(|e| Error::HookFailed {
            event: event.to_string(),
            script: script.display().to_string(),
            message: format!("Failed to execute: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr_snippet = stderr.trim();
            let message = if stderr_snippet.is_empty() {
                format!(
                    "Hook exited with non-zero status (exit code: {:?})",
                    output.status.code()
                )
            } else {
                format!(
                    "Hook exited with non-zero status (exit code: {:?}): {}",
                    output.status.code(),
                    stderr_snippet
                )
            };
            return Err(Error::HookFailed {
                event: event.to_string(),
                script: script.display().to_string(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HookRunner for ScriptHookRunner {
    async fn fire(&self, event: HookEvent, payload: &HookPayload) -> Result<()> {
        for script in self.scripts_for(event)? {
            self.execute(event, &script, payload).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordova_test_utils::TestProject;

    #[test]
    fn event_names_round_trip() {
        for event in HookEvent::ALL {
            assert_eq!(HookEvent::parse(event.name()), Some(event));
            assert_eq!(event.to_string(), event.name());
        }
        assert_eq!(HookEvent::parse("before_build"), None);
    }

    #[test]
    fn payload_serializes_options() {
        let payload = HookPayload {
            platforms: vec!["android".into()],
            save: true,
            ..HookPayload::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["platforms"][0], "android");
        assert_eq!(json["save"], true);
        assert!(json.get("searchpath").is_none());
    }

    #[test]
    fn collects_directory_scripts_then_config_hooks() {
        let test = TestProject::new()
            .with_www()
            .with_file(
                "config.xml",
                r#"<?xml version="1.0"?>
<widget id="io.example" version="1.0.0">
    <hook type="before_prepare" src="scripts/from-config.sh" />
    <hook type="after_prepare" src="scripts/other.sh" />
</widget>
"#,
            )
            .with_file("hooks/before_prepare/20_second.sh", "")
            .with_file("hooks/before_prepare/10_first.sh", "")
            .with_file("hooks/before_prepare/.hidden", "");

        let runner = ScriptHookRunner::new(Project::new(test.root()));
        let scripts = runner.scripts_for(HookEvent::BeforePrepare).unwrap();
        assert_eq!(
            scripts,
            vec![
                test.path("hooks/before_prepare/10_first.sh"),
                test.path("hooks/before_prepare/20_second.sh"),
                test.path("scripts/from-config.sh"),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_hook_aborts() {
        use std::os::unix::fs::PermissionsExt;

        let test = TestProject::new()
            .with_www()
            .with_config_xml(&[], &[])
            .with_file(
                "hooks/before_platform_add/fail.sh",
                "#!/bin/sh\necho broken >&2\nexit 3\n",
            );
        let script = test.path("hooks/before_platform_add/fail.sh");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = ScriptHookRunner::new(Project::new(test.root()));
        let err = runner
            .fire(HookEvent::BeforePlatformAdd, &HookPayload::default())
            .await
            .unwrap_err();
        match err {
            Error::HookFailed { event, message, .. } => {
                assert_eq!(event, "before_platform_add");
                assert!(message.contains("broken"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn no_hooks_is_a_no_op() {
        let test = TestProject::new().with_www().with_config_xml(&[], &[]);
        let runner = ScriptHookRunner::new(Project::new(test.root()));
        runner
            .fire(HookEvent::AfterPrepare, &HookPayload::default())
            .await
            .unwrap();
    }
}
