use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::info;

use servehub::{
    CommandInstaller, Installer, ManifestDocument, MountRegistry, ProcessRuntime, Registrar,
    ServeRuntime, Settings, TreeDownloader,
};
use servehub_protocol::HubClient;

/// Settings and paths shared by every command
pub struct Context {
    pub settings: Settings,
    pub manifest: PathBuf,
}

impl Context {
    pub fn new(config: Option<&Path>, manifest: PathBuf) -> anyhow::Result<Self> {
        let settings = Settings::load(config)?;
        Ok(Self { settings, manifest })
    }

    /// Directory the installer and runtime run in
    fn project_dir(&self) -> PathBuf {
        match self.manifest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn load_manifest(&self) -> anyhow::Result<ManifestDocument> {
        Ok(ManifestDocument::load(&self.manifest, &self.settings.namespace)?)
    }

    fn hub_client(&self) -> anyhow::Result<HubClient> {
        HubClient::new(
            self.settings.endpoint(),
            self.settings.access_token.clone(),
            &self.settings.http.user_agent,
            self.settings.http.timeout_secs,
        )
        .context("Failed to create hub client")
    }

    fn installer(&self) -> CommandInstaller {
        CommandInstaller::new(self.settings.installer.program.clone(), self.project_dir())
    }
}

pub fn list(ctx: &Context) -> anyhow::Result<()> {
    let manifest = ctx.load_manifest()?;

    for mount in manifest.list_mounts() {
        println!("{} -> {}", mount.path, mount.entry);
    }
    if let Ok(export) = manifest.export() {
        println!("export -> {}", export);
    }
    Ok(())
}

pub fn remove(ctx: &Context, path: &str) -> anyhow::Result<()> {
    let mut manifest = ctx.load_manifest()?;
    let removed = manifest.remove_mount(path)?;
    manifest.save()?;

    info!("Removed {} ({})", path, removed);
    Ok(())
}

pub async fn add(ctx: &Context, package: &str, path: Option<&str>) -> anyhow::Result<()> {
    let client = ctx.hub_client()?;
    let installer = ctx.installer();

    println!("Adding {}", package);
    let registration = Registrar::new(&ctx.settings, &client, &installer, &ctx.manifest)
        .add(package, path)
        .await?;

    if let Some(previous) = &registration.replaced {
        println!(
            "Replaced {} previously mounted at {}",
            previous, registration.mount_path
        );
    }
    println!(
        "Mounted {} at {} ({})",
        registration.package, registration.mount_path, registration.entry
    );
    Ok(())
}

pub async fn download(ctx: &Context, package: &str, localpath: &Path) -> anyhow::Result<()> {
    let client = ctx.hub_client()?;

    TreeDownloader::new(&client, ctx.settings.download_limit())
        .download(package, localpath)
        .await?;

    println!("Successfully downloaded {} to {}", package, localpath.display());
    Ok(())
}

pub async fn serve(ctx: &Context) -> anyhow::Result<()> {
    println!("Validating dependencies and installing missing ones");
    ctx.installer().install().await?;
    println!("Successfully installed missing dependencies");

    let manifest = ctx.load_manifest()?;
    let registry = MountRegistry::from_manifest(&manifest)?;
    if registry.is_empty() {
        tracing::warn!("No packages are mounted in {:?}", ctx.manifest);
    }

    let runtime = ProcessRuntime::new(&ctx.settings.serve, ctx.project_dir());
    println!("Check out the docs at {}", runtime.docs_url());
    runtime.serve(&registry).await?;
    Ok(())
}
