#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cordova_core::{
    Cordova, Error, Events, FetchOptions, Fetcher, HookEvent, HookPayload, HookRunner,
    PlatformApi, PlatformApiFactory, PlatformInfo, PlatformLocations, PlatformRequest,
    PluginInstall, PluginRegistry, Project, Result,
};
use cordova_spec::{PinnedVersions, Target, parse_version};
use cordova_test_utils::TestProject;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Records fired hook events by name
#[derive(Default)]
pub struct RecordingHooks {
    fired: Mutex<Vec<(String, HookPayload)>>,
}

impl RecordingHooks {
    pub fn events(&self) -> Vec<String> {
        self.fired
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn payload(&self, event: HookEvent) -> Option<HookPayload> {
        self.fired
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == event.name())
            .map(|(_, payload)| payload.clone())
    }
}

#[async_trait]
impl HookRunner for RecordingHooks {
    async fn fire(&self, event: HookEvent, payload: &HookPayload) -> Result<()> {
        self.fired
            .lock()
            .unwrap()
            .push((event.name().to_string(), payload.clone()));
        Ok(())
    }
}

enum Package {
    Platform { version: String },
    Plugin { version: String, dependencies: Vec<String> },
}

/// Serves packages from memory, unpacking them into `node_modules/`
#[derive(Default)]
pub struct ScriptedFetcher {
    packages: BTreeMap<String, Package>,
    failing: HashSet<String>,
    /// Location targets served as a registered package
    remotes: BTreeMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(mut self, package: &str, version: &str) -> Self {
        self.packages.insert(
            package.to_string(),
            Package::Platform {
                version: version.to_string(),
            },
        );
        self
    }

    pub fn plugin(mut self, id: &str, version: &str, dependencies: &[&str]) -> Self {
        self.packages.insert(
            id.to_string(),
            Package::Plugin {
                version: version.to_string(),
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            },
        );
        self
    }

    /// Serve `package` when `location` is fetched
    pub fn remote(mut self, location: &str, package: &str) -> Self {
        self.remotes.insert(location.to_string(), package.to_string());
        self
    }

    /// Fail every fetch of `package`
    pub fn failing(mut self, package: &str) -> Self {
        self.failing.insert(package.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, target: &str, project_root: &Path, _options: &FetchOptions) -> Result<PathBuf> {
        self.calls.lock().unwrap().push(target.to_string());

        let local = project_root.join(target);
        if local.is_dir() {
            return Ok(local);
        }

        let parsed = match self.remotes.get(target) {
            Some(package) => Target {
                name: package.clone(),
                spec: None,
            },
            None => Target::parse(target)?,
        };
        if self.failing.contains(&parsed.name) {
            return Err(Error::CommandFailed {
                program: "npm".to_string(),
                message: format!("404 Not Found - {}", parsed.name),
            });
        }
        let Some(package) = self.packages.get(&parsed.name) else {
            return Err(Error::CommandFailed {
                program: "npm".to_string(),
                message: format!("no such package {}", parsed.name),
            });
        };

        let dir = project_root.join("node_modules").join(&parsed.name);
        fs::create_dir_all(&dir).unwrap();
        let exact = parsed
            .spec
            .as_deref()
            .and_then(parse_version)
            .map(|v| v.to_string());
        match package {
            Package::Platform { version } => {
                let version = exact.unwrap_or_else(|| version.clone());
                fs::write(
                    dir.join("package.json"),
                    format!("{{\"name\": \"{}\", \"version\": \"{version}\"}}\n", parsed.name),
                )
                .unwrap();
                fs::create_dir_all(dir.join("bin")).unwrap();
            }
            Package::Plugin {
                version,
                dependencies,
            } => {
                let version = exact.unwrap_or_else(|| version.clone());
                let deps: String = dependencies
                    .iter()
                    .map(|d| format!("    <dependency id=\"{d}\" />\n"))
                    .collect();
                fs::write(
                    dir.join("plugin.xml"),
                    format!(
                        "<plugin id=\"{}\" version=\"{version}\">\n    <name>{}</name>\n{deps}</plugin>\n",
                        parsed.name, parsed.name
                    ),
                )
                .unwrap();
                fs::create_dir_all(dir.join("www")).unwrap();
                fs::write(dir.join("www").join("plugin.js"), "// plugin\n").unwrap();
            }
        }
        Ok(dir)
    }
}

/// Platform API that records every call into a shared log
pub struct FakeApi {
    info: PlatformInfo,
    log: Log,
}

impl FakeApi {
    fn new(name: &str, dir: &Path, log: Log) -> Self {
        Self {
            info: PlatformInfo {
                name: name.to_string(),
                root: dir.to_path_buf(),
                locations: PlatformLocations::standard(dir),
            },
            log,
        }
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    fn info(&self) -> &PlatformInfo {
        &self.info
    }

    async fn prepare(&self, _project: &Project, _events: &Events) -> Result<()> {
        self.record(format!("prepare {}", self.info.name));
        Ok(())
    }

    async fn add_plugin(&self, plugin: &PluginInstall, _events: &Events) -> Result<()> {
        self.record(format!("add_plugin {} {}", self.info.name, plugin.id));
        Ok(())
    }

    async fn remove_plugin(&self, id: &str, _events: &Events) -> Result<()> {
        self.record(format!("remove_plugin {} {id}", self.info.name));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePlatformFactory {
    pub log: Log,
}

#[async_trait]
impl PlatformApiFactory for FakePlatformFactory {
    async fn create_platform(
        &self,
        request: PlatformRequest<'_>,
        _events: &Events,
    ) -> Result<Arc<dyn PlatformApi>> {
        fs::create_dir_all(request.platform_dir.join("platform_www")).unwrap();
        fs::write(
            request.platform_dir.join("platform_www").join("cordova.js"),
            "// cordova\n",
        )
        .unwrap();
        self.log
            .lock()
            .unwrap()
            .push(format!("create {}", request.name));
        Ok(Arc::new(FakeApi::new(
            request.name,
            request.platform_dir,
            self.log.clone(),
        )))
    }

    async fn update_platform(
        &self,
        request: PlatformRequest<'_>,
        _events: &Events,
    ) -> Result<Arc<dyn PlatformApi>> {
        self.log
            .lock()
            .unwrap()
            .push(format!("update {}", request.name));
        Ok(Arc::new(FakeApi::new(
            request.name,
            request.platform_dir,
            self.log.clone(),
        )))
    }

    fn load(&self, name: &str, platform_dir: &Path) -> Result<Arc<dyn PlatformApi>> {
        if !platform_dir.is_dir() {
            return Err(Error::PlatformNotAdded {
                name: name.to_string(),
            });
        }
        Ok(Arc::new(FakeApi::new(name, platform_dir, self.log.clone())))
    }
}

/// A project wired to in-memory collaborators
pub struct Harness {
    pub test: TestProject,
    pub cordova: Cordova,
    pub hooks: Arc<RecordingHooks>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub log: Log,
}

impl Harness {
    pub fn new(test: TestProject, fetcher: ScriptedFetcher) -> Self {
        Self::build(test, fetcher, None)
    }

    pub fn with_registry(
        test: TestProject,
        fetcher: ScriptedFetcher,
        registry: Arc<dyn PluginRegistry>,
    ) -> Self {
        Self::build(test, fetcher, Some(registry))
    }

    fn build(
        test: TestProject,
        fetcher: ScriptedFetcher,
        registry: Option<Arc<dyn PluginRegistry>>,
    ) -> Self {
        let hooks = Arc::new(RecordingHooks::default());
        let fetcher = Arc::new(fetcher);
        let factory = Arc::new(FakePlatformFactory::default());
        let log = factory.log.clone();
        let mut builder = Cordova::builder(Project::new(test.root()))
            .hooks(hooks.clone())
            .fetcher(fetcher.clone())
            .platforms(factory)
            .pinned(PinnedVersions::default())
            .host_os("linux");
        if let Some(registry) = registry {
            builder = builder.registry(registry);
        }
        let cordova = builder.build();
        Self {
            test,
            cordova,
            hooks,
            fetcher,
            log,
        }
    }

    pub fn log(&self) -> Vec<String> {
        entries(&self.log)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.cordova.events().warnings()
    }
}

/// Fetcher knowing the usual platforms and a few plugins
pub fn standard_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .platform("cordova-android", "13.0.0")
        .platform("cordova-browser", "7.0.0")
        .platform("cordova-ios", "7.1.1")
        .plugin("cordova-plugin-device", "2.1.0", &[])
        .plugin("cordova-plugin-file", "8.0.0", &[])
        .plugin("cordova-plugin-camera", "6.0.0", &["cordova-plugin-file"])
}

/// `targets` as owned strings
pub fn targets(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
