//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".bundles/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub build: Build,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub codegen: Codegen,
}

/// External toolchain and scratch space settings.
///
/// Unset fields fall back to built-in defaults, so a layer only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Build {
    #[serde(default)]
    compiler: Option<String>,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(default)]
    scratch_dir: Option<PathBuf>,
    #[serde(default)]
    source_file: Option<String>,
}

impl Build {
    fn default_compiler() -> &'static str {
        "rustc"
    }

    fn default_args() -> Vec<String> {
        vec!["--edition".into(), "2021".into(), "-O".into()]
    }

    fn default_scratch_dir() -> PathBuf {
        PathBuf::from("temp")
    }

    fn default_source_file() -> &'static str {
        "dispatch.rs"
    }

    pub fn compiler(&self) -> String {
        self.compiler
            .clone()
            .unwrap_or_else(|| Self::default_compiler().to_owned())
    }

    pub fn args(&self) -> Vec<String> {
        self.args.clone().unwrap_or_else(Self::default_args)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(Self::default_scratch_dir)
    }

    pub fn source_file(&self) -> String {
        self.source_file
            .clone()
            .unwrap_or_else(|| Self::default_source_file().to_owned())
    }
}

/// Compile-time checks applied to item values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Validation {
    #[serde(default)]
    app_extension: Option<String>,
}

impl Validation {
    fn default_app_extension() -> &'static str {
        "exe"
    }

    pub fn app_extension(&self) -> String {
        self.app_extension
            .clone()
            .unwrap_or_else(|| Self::default_app_extension().to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Codegen {
    #[serde(default)]
    template: Option<String>,
}

impl Codegen {
    fn default_template() -> &'static str {
        "dispatcher"
    }

    /// Built-in template name or a path to a template file.
    pub fn template(&self) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| Self::default_template().to_owned())
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = Some(template.into());
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    compiler: Option<String>,
    scratch_dir: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            compiler: env::var("BUNDLES_COMPILER").ok(),
            scratch_dir: env::var("BUNDLES_SCRATCH_DIR").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(compiler: &str, scratch_dir: &str) -> Self {
        Self {
            compiler: Some(compiler.to_owned()),
            scratch_dir: Some(scratch_dir.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            build: merge_build(self.build, other.build),
            validation: merge_validation(self.validation, other.validation),
            codegen: merge_codegen(self.codegen, other.codegen),
        }
    }
}

fn merge_build(mut base: Build, overlay: Build) -> Build {
    if let Some(value) = overlay.compiler {
        base.compiler = Some(value);
    }
    if let Some(value) = overlay.args {
        base.args = Some(value);
    }
    if let Some(value) = overlay.scratch_dir {
        base.scratch_dir = Some(value);
    }
    if let Some(value) = overlay.source_file {
        base.source_file = Some(value);
    }
    base
}

fn merge_validation(mut base: Validation, overlay: Validation) -> Validation {
    if let Some(value) = overlay.app_extension {
        base.app_extension = Some(value);
    }
    base
}

fn merge_codegen(mut base: Codegen, overlay: Codegen) -> Codegen {
    if let Some(value) = overlay.template {
        base.template = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("bundles/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(compiler) = env.compiler {
        config.build.compiler = Some(compiler);
    }
    if let Some(scratch_dir) = env.scratch_dir {
        config.build.scratch_dir = Some(PathBuf::from(scratch_dir));
    }
    config
}
