//! Choosing and installing the version a node starts with

use crate::{
    codebase::{self, CodebaseData},
    context::Context,
    error::{Error, ErrorKind::*},
    fetch::Fetcher,
    prelude::*,
    resolver::{ResolvedVersion, Resolver},
    upgrade::{self, Installer, UpgradeInfo},
};
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/// Name of versions installed from an explicit binary URL
pub const CUSTOM_VERSION_NAME: &str = "custom";

/// Which version the node should start with, and why.
///
/// Variants are listed in precedence order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selection {
    /// Explicitly configured binary URL
    ExplicitUrl {
        /// Upgrade name to install under
        name: String,
        /// Binary location
        url: String,
    },

    /// Explicitly configured version key
    ExplicitVersion(String),

    /// Recommended version, preferred by configuration
    Recommended(Option<String>),

    /// Recommended version, since state sync skips historical blocks
    StateSync(Option<String>),

    /// Upgrade recorded by the daemon in `upgrade-info.json`
    UpgradeInfo(PathBuf),

    /// Version active at genesis
    Genesis,
}

impl Selection {
    /// Apply the selection precedence to a context.
    ///
    /// Only configuration and the presence of `upgrade-info.json` are
    /// consulted; the registry is not read here.
    pub fn select(ctx: &Context) -> Self {
        let bootstrap = &ctx.bootstrap;

        if let Some(url) = &bootstrap.binary_url {
            let name = bootstrap
                .binary_version
                .clone()
                .unwrap_or_else(|| CUSTOM_VERSION_NAME.to_owned());

            return Selection::ExplicitUrl {
                name,
                url: url.clone(),
            };
        }

        if let Some(version) = &bootstrap.binary_version {
            return Selection::ExplicitVersion(version.clone());
        }

        if bootstrap.prefer_recommended {
            return Selection::Recommended(bootstrap.recommended_version.clone());
        }

        if bootstrap.statesync_enabled {
            return Selection::StateSync(bootstrap.recommended_version.clone());
        }

        let upgrade_info = ctx.upgrade_info_path();
        if upgrade_info.exists() {
            return Selection::UpgradeInfo(upgrade_info);
        }

        Selection::Genesis
    }

    /// Does resolving this selection need the registry?
    pub fn needs_registry(&self) -> bool {
        !matches!(
            self,
            Selection::ExplicitUrl { .. } | Selection::UpgradeInfo(_)
        )
    }

    /// Resolve the selection to an installable version
    pub fn resolve(&self, ctx: &Context, fetcher: &Fetcher) -> Result<ResolvedVersion, Error> {
        let resolved = match self {
            Selection::ExplicitUrl { name, url } => Some(ResolvedVersion::custom(name, url)),
            Selection::UpgradeInfo(path) => {
                info!("Using upgrade identified in {}", path.display());
                Some(UpgradeInfo::load(path)?.resolve(&ctx.arch, fetcher)?)
            }
            _ => {
                let codebase = codebase::load(ctx, fetcher)?;
                self.resolve_from(&codebase, ctx)
            }
        };

        resolved.ok_or_else(|| {
            format_err!(
                VersionNotFound,
                "no version matches {} for {}",
                self,
                ctx.arch
            )
            .into()
        })
    }

    /// Resolve a registry-backed selection against a loaded codebase
    pub fn resolve_from(&self, codebase: &CodebaseData, ctx: &Context) -> Option<ResolvedVersion> {
        let resolver = Resolver::new(codebase, &ctx.arch);

        match self {
            Selection::ExplicitUrl { name, url } => Some(ResolvedVersion::custom(name, url)),
            Selection::ExplicitVersion(key) => resolver.by_key(key),
            Selection::Recommended(key) | Selection::StateSync(key) => {
                resolver.recommended(key.as_deref())
            }
            Selection::UpgradeInfo(_) => None,
            Selection::Genesis => resolver.genesis(),
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::ExplicitUrl { name, url } => write!(f, "binary URL {} ({})", url, name),
            Selection::ExplicitVersion(key) => write!(f, "configured version `{}`", key),
            Selection::Recommended(Some(key)) => write!(f, "recommended version `{}`", key),
            Selection::Recommended(None) => f.write_str("recommended version"),
            Selection::StateSync(Some(key)) => {
                write!(f, "recommended version `{}` (state sync)", key)
            }
            Selection::StateSync(None) => f.write_str("recommended version (state sync)"),
            Selection::UpgradeInfo(path) => write!(f, "upgrade in {}", path.display()),
            Selection::Genesis => f.write_str("genesis version"),
        }
    }
}

/// Seed upgrades shipped with the image, then select, resolve, and install
/// the version this node starts with, pointing `current` at it
pub fn ensure_version_installed(
    ctx: &Context,
    fetcher: &Fetcher,
) -> Result<ResolvedVersion, Error> {
    match upgrade::seed_upgrades(&ctx.seed_dir, &ctx.upgrades_dir()) {
        Ok(seeded) if !seeded.is_empty() => {
            info!("Seeded {} from {}", seeded.join(", "), ctx.seed_dir.display());
        }
        Ok(_) => (),
        Err(e) => warn!("couldn't seed upgrades from {}: {}", ctx.seed_dir.display(), e),
    }

    let selection = Selection::select(ctx);
    info!("Preparing {}...", selection);

    let version = selection.resolve(ctx, fetcher)?;
    let installation = Installer::new(ctx, fetcher).install(&version, true)?;

    if installation.library_errors > 0 {
        warn!(
            "{} libraries for {} could not be installed",
            installation.library_errors, installation.name
        );
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootConfig;
    use crate::fetch::Transport;
    use std::{cell::Cell, fs, io::Write, path::Path, rc::Rc};

    /// Fails every download, counting attempts
    struct OfflineTransport(Rc<Cell<usize>>);

    impl Transport for OfflineTransport {
        fn download(&self, url: &str, _out: &mut dyn Write) -> Result<u64, Error> {
            self.0.set(self.0.get() + 1);
            fail!(FetchFailed, "offline: {}", url)
        }
    }

    fn config(home: &Path) -> BootConfig {
        let mut config = BootConfig::default();
        config.arch = Some("linux/amd64".to_owned());
        config.node.daemon_home = Some(home.to_owned());
        config.node.daemon_name = Some("terrad".to_owned());
        config.node.seed_dir = home.join("seed");
        config.registry.chain_json_path = home.join("chain.json");
        config.registry.upgrades_json_path = home.join("upgrades.json");
        config.registry.upgrades_yaml_path = home.join("upgrades.yml");
        config.registry.registry_base_url = "http://127.0.0.1:1".to_owned();
        config
    }

    fn context(config: &BootConfig) -> Context {
        Context::from_config(config).unwrap()
    }

    /// Writes a local binary per version and a chain.json pointing at them
    fn write_registry(home: &Path) {
        let mut versions = vec![];
        for (name, height) in [("v1", None), ("v2", Some(1000)), ("v3", Some(5000))] {
            let binary = home.join(format!("dist/{}/terrad", name));
            fs::create_dir_all(binary.parent().unwrap()).unwrap();
            fs::write(&binary, format!("{} binary", name)).unwrap();

            let mut entry = serde_json::json!({
                "name": name,
                "tag": format!("{}.0.0", name),
                "binaries": {"linux/amd64": binary.display().to_string()},
            });
            if let Some(height) = height {
                entry["height"] = serde_json::json!(height);
            }
            versions.push(entry);
        }

        let chain = serde_json::json!({
            "chain_name": "terra2",
            "daemon_name": "terrad",
            "codebase": {"recommended_version": "v2.0.0", "versions": versions},
        });
        fs::write(home.join("chain.json"), chain.to_string()).unwrap();
    }

    #[test]
    fn precedence_order() {
        let home = tempfile::tempdir().unwrap();
        let mut config = config(home.path());

        assert_eq!(Selection::select(&context(&config)), Selection::Genesis);

        let info_path = context(&config).upgrade_info_path();
        fs::create_dir_all(info_path.parent().unwrap()).unwrap();
        fs::write(&info_path, r#"{"name": "v2"}"#).unwrap();
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::UpgradeInfo(info_path.clone())
        );

        config.bootstrap.statesync_enabled = true;
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::StateSync(None)
        );

        config.bootstrap.prefer_recommended = true;
        config.bootstrap.recommended_version = Some("v3.0.0".to_owned());
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::Recommended(Some("v3.0.0".to_owned()))
        );

        config.bootstrap.binary_version = Some("v1".to_owned());
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::ExplicitVersion("v1".to_owned())
        );

        config.bootstrap.binary_url = Some("https://example.com/terrad".to_owned());
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::ExplicitUrl {
                name: "v1".to_owned(),
                url: "https://example.com/terrad".to_owned()
            }
        );

        config.bootstrap.binary_version = None;
        assert_eq!(
            Selection::select(&context(&config)),
            Selection::ExplicitUrl {
                name: CUSTOM_VERSION_NAME.to_owned(),
                url: "https://example.com/terrad".to_owned()
            }
        );
    }

    #[test]
    fn only_registry_selections_need_registry() {
        assert!(Selection::Genesis.needs_registry());
        assert!(Selection::StateSync(None).needs_registry());
        assert!(!Selection::UpgradeInfo(PathBuf::from("upgrade-info.json")).needs_registry());
        assert!(!Selection::ExplicitUrl {
            name: "custom".to_owned(),
            url: "/bin/true".to_owned()
        }
        .needs_registry());
    }

    #[test]
    fn genesis_install_on_fresh_node() {
        let home = tempfile::tempdir().unwrap();
        write_registry(home.path());
        let ctx = context(&config(home.path()));
        let fetcher = Fetcher::new(&ctx);

        let version = ensure_version_installed(&ctx, &fetcher).unwrap();
        assert_eq!(version.name, "v1");

        let current = fs::read_link(ctx.current_link()).unwrap();
        assert_eq!(current, ctx.upgrade_dir("v1"));
        assert_eq!(
            fs::read(ctx.binary_path(&current)).unwrap(),
            b"v1 binary"
        );
    }

    #[test]
    fn state_sync_uses_recommended_version() {
        let home = tempfile::tempdir().unwrap();
        write_registry(home.path());
        let mut config = config(home.path());
        config.bootstrap.statesync_enabled = true;
        let ctx = context(&config);
        let fetcher = Fetcher::new(&ctx);

        let version = ensure_version_installed(&ctx, &fetcher).unwrap();
        assert_eq!(version.name, "v2");
        assert!(ctx
            .upgrade_dir("v2")
            .join(crate::context::UPGRADE_INFO_FILE)
            .exists());
    }

    #[test]
    fn upgrade_info_bypasses_registry() {
        let home = tempfile::tempdir().unwrap();
        let ctx = context(&config(home.path()));
        let binary = home.path().join("dist/terrad");
        fs::create_dir_all(binary.parent().unwrap()).unwrap();
        fs::write(&binary, b"upgraded").unwrap();

        fs::create_dir_all(ctx.data_dir()).unwrap();
        fs::write(
            ctx.upgrade_info_path(),
            serde_json::json!({
                "name": "v2.5",
                "height": 7603700,
                "info": format!("{{'binaries': {{'linux/amd64': '{}'}}}}", binary.display()),
            })
            .to_string(),
        )
        .unwrap();

        let version = ensure_version_installed(&ctx, &Fetcher::new(&ctx)).unwrap();
        assert_eq!(version.name, "v2.5");
        assert_eq!(
            fs::read(ctx.binary_path(&ctx.upgrade_dir("v2.5"))).unwrap(),
            b"upgraded"
        );
        assert!(!ctx.registry.chain_json_path.exists());
    }

    #[test]
    fn unknown_version_is_fatal() {
        let home = tempfile::tempdir().unwrap();
        write_registry(home.path());
        let mut config = config(home.path());
        config.bootstrap.binary_version = Some("v9".to_owned());
        let ctx = context(&config);

        let err = ensure_version_installed(&ctx, &Fetcher::new(&ctx)).unwrap_err();
        assert_eq!(err.kind(), VersionNotFound);
        assert!(fs::symlink_metadata(ctx.current_link()).is_err());
    }

    #[test]
    fn unavailable_registry_is_fatal() {
        let home = tempfile::tempdir().unwrap();
        let ctx = context(&config(home.path()));

        let err = ensure_version_installed(&ctx, &Fetcher::new(&ctx)).unwrap_err();
        assert_eq!(err.kind(), RegistryUnavailable);
    }

    #[test]
    fn explicit_url_installs_under_custom_name() {
        let home = tempfile::tempdir().unwrap();
        let binary = home.path().join("prebuilt-terrad");
        fs::write(&binary, b"custom build").unwrap();
        let mut config = config(home.path());
        config.bootstrap.binary_url = Some(binary.display().to_string());
        let ctx = context(&config);

        let version = ensure_version_installed(&ctx, &Fetcher::new(&ctx)).unwrap();
        assert_eq!(version.name, CUSTOM_VERSION_NAME);
        assert_eq!(
            fs::read_link(ctx.genesis_link()).unwrap(),
            ctx.upgrade_dir(CUSTOM_VERSION_NAME)
        );
    }

    #[test]
    fn seeded_upgrade_needs_no_download() {
        let home = tempfile::tempdir().unwrap();
        let chain = serde_json::json!({
            "chain_name": "terra2",
            "codebase": {"versions": [
                {"name": "v1", "binaries": {"linux/amd64": "https://example.com/v1/terrad"}}
            ]}
        });
        fs::write(home.path().join("chain.json"), chain.to_string()).unwrap();

        let seeded = home.path().join("seed/upgrades/v1/bin/terrad");
        fs::create_dir_all(seeded.parent().unwrap()).unwrap();
        fs::write(&seeded, b"image v1").unwrap();

        let ctx = context(&config(home.path()));
        let requests = Rc::new(Cell::new(0));
        let fetcher = Fetcher::with_transport(&ctx, Box::new(OfflineTransport(requests.clone())));

        let version = ensure_version_installed(&ctx, &fetcher).unwrap();
        assert_eq!(version.name, "v1");
        assert_eq!(requests.get(), 0);
        assert_eq!(
            fs::read(ctx.binary_path(&ctx.upgrade_dir("v1"))).unwrap(),
            b"image v1"
        );
        assert_eq!(
            fs::read_link(ctx.current_link()).unwrap(),
            ctx.upgrade_dir("v1")
        );
    }

    #[test]
    fn unseeded_upgrade_is_downloaded() {
        let home = tempfile::tempdir().unwrap();
        let chain = serde_json::json!({
            "chain_name": "terra2",
            "codebase": {"versions": [
                {"name": "v1", "binaries": {"linux/amd64": "https://example.com/v1/terrad"}}
            ]}
        });
        fs::write(home.path().join("chain.json"), chain.to_string()).unwrap();

        let ctx = context(&config(home.path()));
        let requests = Rc::new(Cell::new(0));
        let fetcher = Fetcher::with_transport(&ctx, Box::new(OfflineTransport(requests.clone())));

        let err = ensure_version_installed(&ctx, &fetcher).unwrap_err();
        assert_eq!(err.kind(), FetchFailed);
        assert_eq!(requests.get(), 1);
    }
}
