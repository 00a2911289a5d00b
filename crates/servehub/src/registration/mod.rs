//! Package Registration
//!
//! `add` workflow: fetch the package manifest, check it is hub-compatible,
//! install it, then mount its export in the project manifest.
//!
//! There is no rollback: if the project manifest cannot be saved after the
//! installer succeeded, the package stays installed but unmounted.

use std::path::PathBuf;
use tracing::{debug, info};

use servehub_protocol::HubTransport;

use crate::common::{HubError, HubResult};
use crate::config::Settings;
use crate::install::Installer;
use crate::manifest::types::validate_mount_path;
use crate::manifest::{EntryPoint, ManifestDocument};
use crate::resolver::{PackageId, Resolver};

/// Outcome of a successful `add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub package: String,
    pub mount_path: String,
    pub entry: EntryPoint,
    /// Entry point previously mounted at the same path
    pub replaced: Option<EntryPoint>,
}

/// Mount path used when none is given: `/` followed by the identifier
pub fn default_mount_path(package: &str) -> String {
    format!("/{}", package)
}

/// Local identifiers are relative to the working directory, while the
/// installer runs in the project directory. Both must see the same path.
fn absolute_package_id(id: PackageId) -> HubResult<PackageId> {
    match id {
        PackageId::Local(path) => {
            let absolute = std::path::absolute(&path).map_err(|e| HubError::io(&path, e))?;
            debug!("Resolved local package {} to {:?}", path, absolute);
            Ok(PackageId::Local(absolute.to_string_lossy().into_owned()))
        }
        hub => Ok(hub),
    }
}

pub struct Registrar<'a, T, I> {
    settings: &'a Settings,
    resolver: Resolver,
    transport: &'a T,
    installer: &'a I,
    project_manifest: PathBuf,
}

impl<'a, T: HubTransport, I: Installer> Registrar<'a, T, I> {
    pub fn new(
        settings: &'a Settings,
        transport: &'a T,
        installer: &'a I,
        project_manifest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings,
            resolver: Resolver::new(settings),
            transport,
            installer,
            project_manifest: project_manifest.into(),
        }
    }

    /// Read-only snapshot of a package's own manifest
    pub async fn fetch_package_manifest(&self, id: &PackageId) -> HubResult<ManifestDocument> {
        let location = self.resolver.to_manifest_location(id);
        match id {
            PackageId::Local(_) => ManifestDocument::load_snapshot(&location, &self.settings.namespace),
            PackageId::Hub(_) => {
                ManifestDocument::from_remote(
                    &location,
                    &self.settings.namespace,
                    self.transport,
                    &self.settings.hub.token_env,
                )
                .await
            }
        }
    }

    pub async fn add(&self, package: &str, mount_path: Option<&str>) -> HubResult<Registration> {
        let id = absolute_package_id(PackageId::parse(package))?;
        let mount_path = mount_path
            .map(str::to_string)
            .unwrap_or_else(|| default_mount_path(package));
        validate_mount_path(&mount_path)?;

        let package_manifest = self.fetch_package_manifest(&id).await?;
        if !package_manifest.is_hub_compatible() {
            return Err(HubError::IncompatiblePackage {
                package: package.to_string(),
                section: package_manifest.section_key(),
            });
        }
        let entry = package_manifest.export()?;

        let source = self.resolver.to_source_location(&id);
        info!("Adding {} from {}", package, source);
        self.installer.add(&source).await?;

        let mut project = ManifestDocument::load(&self.project_manifest, &self.settings.namespace)?;
        let replaced = project.add_mount(&mount_path, entry.clone())?;
        project.save()?;

        info!("Mounted {} at {} ({})", package, mount_path, entry);
        Ok(Registration {
            package: package.to_string(),
            mount_path,
            entry,
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servehub_protocol::{redact_query, ContentEntry, ProtocolError};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    const PROJECT: &str = "[tool.poetry]\nname = \"my-app\"\n\n[tool.langserve]\n";

    const PIRATE: &str = r#"[tool.poetry]
name = "pirate"

[tool.langserve]
export_module = "pirate.chain"
export_attr = "chain"
"#;

    /// Serves manifests keyed by URL (query stripped)
    #[derive(Default)]
    struct FakeHub {
        manifests: HashMap<String, String>,
    }

    impl HubTransport for FakeHub {
        async fn fetch_text(&self, url: &str) -> Result<String, ProtocolError> {
            self.manifests
                .get(redact_query(url))
                .cloned()
                .ok_or_else(|| ProtocolError::NotFound { url: redact_query(url).to_string() })
        }

        async fn list_dir(&self, path: &str) -> Result<Vec<ContentEntry>, ProtocolError> {
            Err(ProtocolError::NotFound { url: path.to_string() })
        }

        async fn fetch_file(&self, entry: &ContentEntry) -> Result<Vec<u8>, ProtocolError> {
            Err(ProtocolError::NotFound { url: entry.path.clone() })
        }
    }

    #[derive(Default)]
    struct RecordingInstaller {
        added: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Installer for RecordingInstaller {
        async fn add(&self, source: &str) -> HubResult<()> {
            self.added.borrow_mut().push(source.to_string());
            if self.fail {
                return Err(HubError::Install {
                    command: format!("poetry add {}", source),
                    reason: "exited with exit status: 1".to_string(),
                });
            }
            Ok(())
        }

        async fn install(&self) -> HubResult<()> {
            Ok(())
        }
    }

    fn hub_url(package: &str) -> String {
        format!(
            "https://raw.githubusercontent.com/langchain-ai/langserve-hub/main/{}/pyproject.toml",
            package
        )
    }

    fn project() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyproject.toml");
        fs::write(&path, PROJECT).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_add_hub_package() {
        let settings = Settings::default();
        let mut hub = FakeHub::default();
        hub.manifests.insert(hub_url("simple/pirate"), PIRATE.to_string());
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();

        let registration = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/pirate", None)
            .await
            .unwrap();

        assert_eq!(registration.mount_path, "/simple/pirate");
        assert_eq!(registration.entry, EntryPoint::new("pirate.chain", "chain"));
        assert!(registration.replaced.is_none());
        assert_eq!(
            *installer.added.borrow(),
            vec!["git+https://github.com/langchain-ai/langserve-hub.git#subdirectory=simple/pirate"]
        );

        let saved = ManifestDocument::load(&path, "langserve").unwrap();
        assert_eq!(
            saved.list_mounts().get("/simple/pirate"),
            Some(&EntryPoint::new("pirate.chain", "chain"))
        );
    }

    #[tokio::test]
    async fn test_add_with_explicit_path_overwrites() {
        let settings = Settings::default();
        let mut hub = FakeHub::default();
        hub.manifests.insert(hub_url("simple/pirate"), PIRATE.to_string());
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();
        let registrar = Registrar::new(&settings, &hub, &installer, &path);

        registrar.add("simple/pirate", Some("/pirate")).await.unwrap();
        let second = registrar.add("simple/pirate", Some("/pirate")).await.unwrap();

        assert_eq!(second.replaced, Some(EntryPoint::new("pirate.chain", "chain")));
        let saved = ManifestDocument::load(&path, "langserve").unwrap();
        assert_eq!(saved.list_mounts().len(), 1);
    }

    #[tokio::test]
    async fn test_incompatible_package_leaves_project_untouched() {
        let settings = Settings::default();
        let mut hub = FakeHub::default();
        hub.manifests.insert(
            hub_url("simple/plain"),
            "[tool.poetry]\nname = \"plain\"\n".to_string(),
        );
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();

        let err = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/plain", None)
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::IncompatiblePackage { ref section, .. } if section == "tool.langserve"));
        assert!(installer.added.borrow().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT);
    }

    #[tokio::test]
    async fn test_fetch_failure_stops_before_install() {
        let settings = Settings::default();
        let hub = FakeHub::default();
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();

        let err = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/missing", None)
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::Fetch { .. }));
        assert!(installer.added.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_missing_export_stops_before_install() {
        let settings = Settings::default();
        let mut hub = FakeHub::default();
        hub.manifests.insert(
            hub_url("simple/half"),
            "[tool.langserve]\nexport_module = \"half\"\n".to_string(),
        );
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();

        let err = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/half", None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("export_attr"));
        assert!(installer.added.borrow().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT);
    }

    #[tokio::test]
    async fn test_installer_failure_leaves_project_untouched() {
        let settings = Settings::default();
        let mut hub = FakeHub::default();
        hub.manifests.insert(hub_url("simple/pirate"), PIRATE.to_string());
        let installer = RecordingInstaller {
            fail: true,
            ..Default::default()
        };
        let (_dir, path) = project();

        let err = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/pirate", None)
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::Install { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), PROJECT);
    }

    #[tokio::test]
    async fn test_add_local_package() {
        let settings = Settings::default();
        let hub = FakeHub::default();
        let installer = RecordingInstaller::default();
        let (dir, path) = project();

        let package_dir = dir.path().join("pirate");
        fs::create_dir(&package_dir).unwrap();
        fs::write(package_dir.join("pyproject.toml"), PIRATE).unwrap();
        let package = package_dir.display().to_string();

        let registration = Registrar::new(&settings, &hub, &installer, &path)
            .add(&package, Some("/pirate"))
            .await
            .unwrap();

        assert_eq!(registration.entry, EntryPoint::new("pirate.chain", "chain"));
        assert_eq!(*installer.added.borrow(), vec![package]);
    }

    #[tokio::test]
    async fn test_relative_local_package_installed_from_same_dir() {
        let settings = Settings::default();
        let hub = FakeHub::default();
        let installer = RecordingInstaller::default();

        // Project lives outside the working directory; the package inside it.
        let (_project_dir, path) = project();
        let package_dir = tempfile::Builder::new().prefix("pkg").tempdir_in(".").unwrap();
        fs::write(package_dir.path().join("pyproject.toml"), PIRATE).unwrap();
        let name = package_dir.path().file_name().unwrap().to_string_lossy().into_owned();
        let package = format!("./{}", name);

        let registration = Registrar::new(&settings, &hub, &installer, &path)
            .add(&package, None)
            .await
            .unwrap();

        assert_eq!(registration.mount_path, format!("/{}", package));
        let added = installer.added.borrow();
        let source = Path::new(&added[0]);
        assert!(source.is_absolute());
        assert_eq!(source, std::env::current_dir().unwrap().join(&name));
        assert!(source.join("pyproject.toml").is_file());
    }

    #[tokio::test]
    async fn test_invalid_mount_path_rejected_first() {
        let settings = Settings::default();
        let hub = FakeHub::default();
        let installer = RecordingInstaller::default();
        let (_dir, path) = project();

        let err = Registrar::new(&settings, &hub, &installer, &path)
            .add("simple/pirate", Some("pirate"))
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::InvalidMountPath(_)));
    }
}
