//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--no-watcher`, `--theme`, etc.)
//! 2. `$SVNVIEW_CONFIG` environment variable (path to config file)
//! 3. Project-local `.svnview.toml` in the current working directory
//! 4. Global `~/.config/svnview/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::vcs::watcher::DEFAULT_DEBOUNCE_MS;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// The Subversion client, substituted for `$svn`.
    pub vcs_binary: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Where to write the log.
    pub log_file: Option<String>,
}

/// Command templates. `$svn`, `$file_name`, `$path`, `$rev_option`, `$src`
/// and `$dst` are substituted before the line is handed to `/bin/sh -c`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CommandsConfig {
    pub status: Option<String>,
    pub update: Option<String>,
    pub proplist: Option<String>,
    pub list: Option<String>,
    pub add: Option<String>,
    pub remove: Option<String>,
    pub revert: Option<String>,
    pub resolved: Option<String>,
    #[serde(rename = "move")]
    pub rename: Option<String>,
    pub mkdir: Option<String>,
    pub copy: Option<String>,
}

/// Repository tree settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Seconds between background refreshes; 0 disables them.
    pub refresh_interval_secs: Option<u64>,
}

/// Working-copy watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Refresh the status list when files change.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub fg: Option<String>,
    pub selected_bg: Option<String>,
    pub marked_fg: Option<String>,
    pub dir_fg: Option<String>,
    pub added_fg: Option<String>,
    pub removed_fg: Option<String>,
    pub error_fg: Option<String>,
    pub dim_fg: Option<String>,
    pub emphasis_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

/// Persisted state settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StateConfig {
    /// File holding the open repository paths between runs.
    pub file: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub commands: CommandsConfig,
    pub tree: TreeConfig,
    pub watcher: WatcherConfig,
    pub theme: ThemeConfig,
    pub state: StateConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

pub const DEFAULT_VCS_BINARY: &str = "svn";
pub const DEFAULT_STATUS_COMMAND: &str = "$svn --non-interactive status";
pub const DEFAULT_UPDATE_COMMAND: &str = "$svn --non-interactive update";
pub const DEFAULT_PROPLIST_COMMAND: &str = "$svn --non-interactive proplist $file_name";
pub const DEFAULT_LIST_COMMAND: &str = "$svn --non-interactive list $rev_option --xml $path";
pub const DEFAULT_ADD_COMMAND: &str = "$svn add $file_name";
pub const DEFAULT_REMOVE_COMMAND: &str = "$svn remove $file_name";
pub const DEFAULT_REVERT_COMMAND: &str = "$svn revert $file_name";
pub const DEFAULT_RESOLVED_COMMAND: &str = "$svn resolved $file_name";
pub const DEFAULT_MOVE_COMMAND: &str = "$svn --non-interactive move $src $dst";
pub const DEFAULT_MKDIR_COMMAND: &str = "$svn --non-interactive mkdir -m 'Created directory' $path";
pub const DEFAULT_COPY_COMMAND: &str = "$svn --non-interactive copy -m 'Copied' $rev_option $src $dst";
/// The repository tree refreshes itself once a minute.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

const APP_DIR: &str = "svnview";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does not include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("SVNVIEW_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".svnview.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_DIR).join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// `<data_dir>/svnview/<name>`.
fn data_file(name: &str) -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR).join(name))
}

fn pick(over: &Option<String>, base: Option<String>) -> Option<String> {
    over.clone().or(base)
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `Some` values in `other` win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        let c = other.commands.clone();
        AppConfig {
            general: GeneralConfig {
                vcs_binary: pick(&other.general.vcs_binary, self.general.vcs_binary),
                mouse: other.general.mouse.or(self.general.mouse),
                log_file: pick(&other.general.log_file, self.general.log_file),
            },
            commands: CommandsConfig {
                status: c.status.or(self.commands.status),
                update: c.update.or(self.commands.update),
                proplist: c.proplist.or(self.commands.proplist),
                list: c.list.or(self.commands.list),
                add: c.add.or(self.commands.add),
                remove: c.remove.or(self.commands.remove),
                revert: c.revert.or(self.commands.revert),
                resolved: c.resolved.or(self.commands.resolved),
                rename: c.rename.or(self.commands.rename),
                mkdir: c.mkdir.or(self.commands.mkdir),
                copy: c.copy.or(self.commands.copy),
            },
            tree: TreeConfig {
                refresh_interval_secs: other
                    .tree
                    .refresh_interval_secs
                    .or(self.tree.refresh_interval_secs),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            theme: ThemeConfig {
                scheme: pick(&other.theme.scheme, self.theme.scheme),
                custom: other.theme.custom.clone().or(self.theme.custom),
            },
            state: StateConfig {
                file: pick(&other.state.file, self.state.file),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher overwrites.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn vcs_binary(&self) -> &str {
        self.general
            .vcs_binary
            .as_deref()
            .unwrap_or(DEFAULT_VCS_BINARY)
    }

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(false)
    }

    /// Log file, or `None` if no data directory is known.
    pub fn log_file(&self) -> Option<PathBuf> {
        match &self.general.log_file {
            Some(path) => Some(PathBuf::from(path)),
            None => data_file("svnview.log"),
        }
    }

    /// Saved expansion state file.
    pub fn state_file(&self) -> Option<PathBuf> {
        match &self.state.file {
            Some(path) => Some(PathBuf::from(path)),
            None => data_file("state.json"),
        }
    }

    pub fn status_command(&self) -> &str {
        self.commands.status.as_deref().unwrap_or(DEFAULT_STATUS_COMMAND)
    }

    pub fn update_command(&self) -> &str {
        self.commands.update.as_deref().unwrap_or(DEFAULT_UPDATE_COMMAND)
    }

    pub fn proplist_command(&self) -> &str {
        self.commands
            .proplist
            .as_deref()
            .unwrap_or(DEFAULT_PROPLIST_COMMAND)
    }

    pub fn list_command(&self) -> &str {
        self.commands.list.as_deref().unwrap_or(DEFAULT_LIST_COMMAND)
    }

    pub fn add_command(&self) -> &str {
        self.commands.add.as_deref().unwrap_or(DEFAULT_ADD_COMMAND)
    }

    pub fn remove_command(&self) -> &str {
        self.commands.remove.as_deref().unwrap_or(DEFAULT_REMOVE_COMMAND)
    }

    pub fn revert_command(&self) -> &str {
        self.commands.revert.as_deref().unwrap_or(DEFAULT_REVERT_COMMAND)
    }

    pub fn resolved_command(&self) -> &str {
        self.commands
            .resolved
            .as_deref()
            .unwrap_or(DEFAULT_RESOLVED_COMMAND)
    }

    pub fn move_command(&self) -> &str {
        self.commands.rename.as_deref().unwrap_or(DEFAULT_MOVE_COMMAND)
    }

    pub fn mkdir_command(&self) -> &str {
        self.commands.mkdir.as_deref().unwrap_or(DEFAULT_MKDIR_COMMAND)
    }

    pub fn copy_command(&self) -> &str {
        self.commands.copy.as_deref().unwrap_or(DEFAULT_COPY_COMMAND)
    }

    /// Seconds between background tree refreshes; 0 means never.
    pub fn refresh_interval_secs(&self) -> u64 {
        self.tree
            .refresh_interval_secs
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.vcs_binary(), "svn");
        assert!(!cfg.mouse_enabled());
        assert_eq!(cfg.status_command(), "$svn --non-interactive status");
        assert_eq!(
            cfg.list_command(),
            "$svn --non-interactive list $rev_option --xml $path"
        );
        assert_eq!(cfg.add_command(), "$svn add $file_name");
        assert_eq!(cfg.refresh_interval_secs(), 60);
        assert!(cfg.watcher_enabled());
        assert_eq!(cfg.debounce_ms(), 300);
        assert_eq!(cfg.theme_scheme(), "dark");
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[general]
vcs_binary = "/opt/svn/bin/svn"
mouse = true
log_file = "/tmp/svnview.log"

[commands]
status = "$svn status --ignore-externals"
move = "$svn mv $src $dst"

[tree]
refresh_interval_secs = 0

[watcher]
enabled = false
debounce_ms = 500

[theme]
scheme = "light"

[state]
file = "/tmp/state.json"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.vcs_binary(), "/opt/svn/bin/svn");
        assert!(cfg.mouse_enabled());
        assert_eq!(cfg.log_file(), Some(PathBuf::from("/tmp/svnview.log")));
        assert_eq!(cfg.status_command(), "$svn status --ignore-externals");
        assert_eq!(cfg.move_command(), "$svn mv $src $dst");
        assert_eq!(cfg.refresh_interval_secs(), 0);
        assert!(!cfg.watcher_enabled());
        assert_eq!(cfg.debounce_ms(), 500);
        assert_eq!(cfg.theme_scheme(), "light");
        assert_eq!(cfg.state_file(), Some(PathBuf::from("/tmp/state.json")));
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[commands]
update = "$svn update --accept postpone"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.update_command(), "$svn update --accept postpone");
        assert_eq!(cfg.revert_command(), "$svn revert $file_name");
        assert_eq!(cfg.vcs_binary(), "svn");
    }

    #[test]
    fn test_toml_parsing_empty() {
        let cfg: AppConfig = toml::from_str("").expect("parse failed");
        assert_eq!(cfg.proplist_command(), DEFAULT_PROPLIST_COMMAND);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            general: GeneralConfig {
                vcs_binary: Some("svn1".into()),
                mouse: Some(true),
                ..Default::default()
            },
            commands: CommandsConfig {
                add: Some("svn1 add $file_name".into()),
                remove: Some("svn1 rm $file_name".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let over = AppConfig {
            general: GeneralConfig {
                vcs_binary: Some("svn2".into()),
                ..Default::default()
            },
            commands: CommandsConfig {
                add: Some("svn2 add $file_name".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.vcs_binary(), "svn2");
        assert!(merged.mouse_enabled());
        assert_eq!(merged.add_command(), "svn2 add $file_name");
        assert_eq!(merged.remove_command(), "svn1 rm $file_name");
    }

    #[test]
    fn test_merge_none_does_not_clear_some() {
        let base = AppConfig {
            watcher: WatcherConfig {
                enabled: Some(false),
                debounce_ms: Some(500),
            },
            tree: TreeConfig {
                refresh_interval_secs: Some(5),
            },
            ..Default::default()
        };
        let merged = base.merge(&AppConfig::default());
        assert!(!merged.watcher_enabled());
        assert_eq!(merged.debounce_ms(), 500);
        assert_eq!(merged.refresh_interval_secs(), 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[general]
vcs_binary = "svn-1.14"

[tree]
refresh_interval_secs = 120
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.vcs_binary(), "svn-1.14");
        assert_eq!(cfg.refresh_interval_secs(), 120);
        assert!(cfg.watcher_enabled());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[general]
mouse = true

[watcher]
enabled = true
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            watcher: WatcherConfig {
                enabled: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert!(!cfg.watcher_enabled());
        assert!(cfg.mouse_enabled());
    }

    #[test]
    fn test_theme_custom_colors() {
        let toml = r##"
[theme]
scheme = "custom"

[theme.custom]
added_fg = "#a6e3a1"
error_fg = "#f38ba8"
"##;
        let cfg: AppConfig = toml::from_str(toml).expect("parse");
        assert_eq!(cfg.theme_scheme(), "custom");
        let custom = cfg.theme.custom.as_ref().expect("custom present");
        assert_eq!(custom.added_fg.as_deref(), Some("#a6e3a1"));
        assert!(custom.status_bg.is_none());
    }
}
