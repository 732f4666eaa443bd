//! The configuration phase: wire a depends tree into the build environment.

use std::path::{Path, PathBuf};

use crate::environment::BuildEnvironment;
use crate::error::Result;
use crate::manifest::{manifest_path, DependencyManifest};

/// User-facing configure options.
#[derive(Debug, Default, Clone)]
pub struct ConfigureOptions {
    /// Where dependency tools and libraries are located.
    pub depends: String,
    /// Allow usage of system packages along with those in the depends path.
    pub allow_system: bool,
}

/// Populate `env` from `opts` and the depends tree's manifest.
///
/// The tree is optional: a path that does not exist (including the empty
/// default) records the option values and returns without touching anything
/// else. A tree that exists but carries a broken manifest is a hard error.
///
/// Toolchain variables already set in `env` are never clobbered, and flag
/// appends are deduplicated, so reconfiguring against the same tree is
/// idempotent.
pub fn configure(env: &mut BuildEnvironment, opts: &ConfigureOptions) -> Result<()> {
    let root = PathBuf::from(opts.depends.trim());
    env.depends_dir = root.clone();
    env.allow_system = opts.allow_system;

    if !root.exists() {
        return Ok(());
    }

    let manifest = DependencyManifest::load(&manifest_path(&root))?;

    env.host = host_label(&root);

    let pkgconfig = format!("{}/lib/pkgconfig", root.display());
    env.pkg_config_path = Some(pkgconfig.clone());
    env.pkg_config_libdir = if opts.allow_system {
        None
    } else {
        Some(pkgconfig)
    };

    for (var, command) in &manifest.entries {
        if !env.toolchain(*var).is_empty() {
            continue;
        }
        env.set_toolchain(*var, command.clone());
    }

    env.add_cppflag(format!("-I{}/include", root.display()));
    env.add_linkflag(format!("-L{}/lib", root.display()));

    Ok(())
}

fn host_label(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
