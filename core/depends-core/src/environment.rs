//! The build environment threaded through the configure and copy phases.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name of the serialized environment inside the build directory.
pub const ENV_FILE: &str = "depends-env.json";

/// The closed set of toolchain variables a manifest may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainVar {
    Ar,
    Cc,
    Cxx,
}

impl ToolchainVar {
    pub const ALL: [ToolchainVar; 3] = [ToolchainVar::Ar, ToolchainVar::Cc, ToolchainVar::Cxx];

    /// Manifest/environment key for this variable.
    pub fn key(self) -> &'static str {
        match self {
            ToolchainVar::Ar => "AR",
            ToolchainVar::Cc => "CC",
            ToolchainVar::Cxx => "CXX",
        }
    }

    /// Match a manifest key against the recognized set.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "AR" => Some(ToolchainVar::Ar),
            "CC" => Some(ToolchainVar::Cc),
            "CXX" => Some(ToolchainVar::Cxx),
            _ => None,
        }
    }
}

/// Configuration state produced by `configure` and consumed by the copy
/// phase and other build-description code.
///
/// One instance exists per build directory. It is passed explicitly rather
/// than living in process-global state, and round-trips through
/// [`ENV_FILE`] between invocations so the phases can run as separate
/// processes.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BuildEnvironment {
    /// Dependency tree root, stored verbatim after trimming.
    pub depends_dir: PathBuf,
    /// Whether system packages may be used alongside the depends tree.
    pub allow_system: bool,
    /// Base name of the depends directory, tagging the build target.
    pub host: String,
    /// Archiver command tokens.
    pub ar: Vec<String>,
    /// C compiler command tokens.
    pub cc: Vec<String>,
    /// C++ compiler command tokens.
    pub cxx: Vec<String>,
    /// `-I` additions scoped to the depends tree.
    pub cppflags_depends: Vec<String>,
    /// `-L` additions scoped to the depends tree.
    pub linkflags_depends: Vec<String>,
    /// Value for `PKG_CONFIG_PATH`.
    pub pkg_config_path: Option<String>,
    /// Value for `PKG_CONFIG_LIBDIR`; present only when system packages are
    /// disallowed, which confines pkg-config to the depends tree.
    pub pkg_config_libdir: Option<String>,
}

impl BuildEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored dependency root, verbatim.
    pub fn host_path(&self) -> &Path {
        &self.depends_dir
    }

    /// Command tokens for a toolchain variable.
    pub fn toolchain(&self, var: ToolchainVar) -> &[String] {
        match var {
            ToolchainVar::Ar => &self.ar,
            ToolchainVar::Cc => &self.cc,
            ToolchainVar::Cxx => &self.cxx,
        }
    }

    /// Replace a toolchain command outright.
    pub fn set_toolchain(&mut self, var: ToolchainVar, command: Vec<String>) {
        match var {
            ToolchainVar::Ar => self.ar = command,
            ToolchainVar::Cc => self.cc = command,
            ToolchainVar::Cxx => self.cxx = command,
        }
    }

    /// Append a compile flag unless an identical one is already present.
    pub fn add_cppflag(&mut self, flag: String) {
        append_unique(&mut self.cppflags_depends, flag);
    }

    /// Append a link flag unless an identical one is already present.
    pub fn add_linkflag(&mut self, flag: String) {
        append_unique(&mut self.linkflags_depends, flag);
    }

    /// Environment variables this configuration exports.
    pub fn exported_env(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();
        if let Some(path) = &self.pkg_config_path {
            vars.push(("PKG_CONFIG_PATH", path.clone()));
        }
        if let Some(libdir) = &self.pkg_config_libdir {
            vars.push(("PKG_CONFIG_LIBDIR", libdir.clone()));
        }
        vars
    }

    /// Path of the serialized environment inside `build_dir`.
    pub fn file_path(build_dir: &Path) -> PathBuf {
        build_dir.join(ENV_FILE)
    }

    /// Load a previously stored environment, or `None` when the build
    /// directory has no environment file yet.
    pub fn load(build_dir: &Path) -> Result<Option<Self>> {
        let path = Self::file_path(build_dir);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let env = serde_json::from_str(&text).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {err}", path.display()),
            )
        })?;
        Ok(Some(env))
    }

    /// Store the environment into `build_dir`, creating it if needed.
    pub fn store(&self, build_dir: &Path) -> Result<()> {
        fs::create_dir_all(build_dir)?;
        let text = serde_json::to_string_pretty(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(Self::file_path(build_dir), text)?;
        Ok(())
    }
}

fn append_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|existing| existing == &value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_unique_skips_duplicates() {
        let mut env = BuildEnvironment::new();
        env.add_cppflag("-I/opt/deps/include".to_string());
        env.add_cppflag("-I/opt/deps/include".to_string());
        env.add_cppflag("-I/other/include".to_string());

        assert_eq!(
            env.cppflags_depends,
            vec!["-I/opt/deps/include", "-I/other/include"]
        );
    }

    #[test]
    fn toolchain_accessors_cover_all_vars() {
        let mut env = BuildEnvironment::new();
        for var in ToolchainVar::ALL {
            assert!(env.toolchain(var).is_empty());
            env.set_toolchain(var, vec![var.key().to_lowercase()]);
        }

        assert_eq!(env.ar, vec!["ar"]);
        assert_eq!(env.cc, vec!["cc"]);
        assert_eq!(env.cxx, vec!["cxx"]);
    }

    #[test]
    fn from_key_rejects_unknown_keys() {
        assert_eq!(ToolchainVar::from_key("CC"), Some(ToolchainVar::Cc));
        assert_eq!(ToolchainVar::from_key("CFLAGS"), None);
        assert_eq!(ToolchainVar::from_key("cc"), None);
    }

    #[test]
    fn exported_env_reflects_pkg_config_scoping() {
        let mut env = BuildEnvironment::new();
        assert!(env.exported_env().is_empty());

        env.pkg_config_path = Some("/opt/deps/lib/pkgconfig".to_string());
        env.pkg_config_libdir = Some("/opt/deps/lib/pkgconfig".to_string());

        let exported = env.exported_env();
        assert_eq!(
            exported,
            vec![
                ("PKG_CONFIG_PATH", "/opt/deps/lib/pkgconfig".to_string()),
                ("PKG_CONFIG_LIBDIR", "/opt/deps/lib/pkgconfig".to_string()),
            ]
        );
    }

    #[test]
    fn environment_round_trips_through_build_dir() {
        let tmp = tempdir().expect("tempdir");
        let build_dir = tmp.path().join("build");

        let mut env = BuildEnvironment::new();
        env.depends_dir = PathBuf::from("/opt/deps");
        env.host = "deps".to_string();
        env.cc = vec!["gcc".to_string(), "-m64".to_string()];
        env.add_linkflag("-L/opt/deps/lib".to_string());
        env.store(&build_dir).expect("store");

        let loaded = BuildEnvironment::load(&build_dir)
            .expect("load")
            .expect("environment present");
        assert_eq!(loaded.depends_dir, PathBuf::from("/opt/deps"));
        assert_eq!(loaded.host, "deps");
        assert_eq!(loaded.cc, vec!["gcc", "-m64"]);
        assert_eq!(loaded.linkflags_depends, vec!["-L/opt/deps/lib"]);
    }

    #[test]
    fn load_returns_none_without_environment_file() {
        let tmp = tempdir().expect("tempdir");
        let loaded = BuildEnvironment::load(tmp.path()).expect("load");
        assert!(loaded.is_none());
    }
}
