//! Post-link copy step: stage built and bundled libraries for packaging.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::environment::BuildEnvironment;
use crate::error::{DependsError, Result};

/// Just-built shared libraries staged into [`BIN_DIR`], relative to the
/// project root.
pub const COMPILED_LIBRARIES: [&str; 2] =
    ["build/lib/element.dll", "build/lib/element_juce.dll"];

/// Bundled LV2 host libraries staged into [`PLUGIN_DIR`], relative to the
/// depends tree.
pub const BUNDLED_LIBRARIES: [&str; 5] = [
    "lib/serd-0.dll",
    "lib/sord-0.dll",
    "lib/sratom-0.dll",
    "lib/lilv-0.dll",
    "lib/suil-0.dll",
];

/// Compiler runtime libraries resolved through the configured C compiler.
pub const RUNTIME_LIBRARIES: [&str; 3] =
    ["libgcc_s_seh-1.dll", "libstdc++-6.dll", "libwinpthread-1.dll"];

/// Binary output directory, relative to the project root.
pub const BIN_DIR: &str = "build/bin";

/// Plugin output directory, relative to the project root.
pub const PLUGIN_DIR: &str = "build/modules/LV2.element";

/// Run all three copy passes in order.
///
/// A failure aborts mid-sequence and leaves earlier copies in place; re-runs
/// overwrite idempotently.
pub fn copy_runtime_dependencies(
    env: &BuildEnvironment,
    project_root: &Path,
    mut progress: impl Write,
) -> Result<()> {
    copy_compiled_libraries(project_root, &mut progress)?;
    copy_bundled_libraries(env, project_root, &mut progress)?;
    copy_compiler_runtime(env, project_root, &mut progress)?;
    Ok(())
}

/// Stage the just-built shared libraries into [`BIN_DIR`].
pub fn copy_compiled_libraries(project_root: &Path, mut progress: impl Write) -> Result<()> {
    let dest = project_root.join(BIN_DIR);
    for library in COMPILED_LIBRARIES {
        copy_into(&project_root.join(library), &dest, &mut progress)?;
    }
    Ok(())
}

/// Stage the bundled third-party libraries into [`PLUGIN_DIR`].
pub fn copy_bundled_libraries(
    env: &BuildEnvironment,
    project_root: &Path,
    mut progress: impl Write,
) -> Result<()> {
    let dest = project_root.join(PLUGIN_DIR);
    for library in BUNDLED_LIBRARIES {
        copy_into(&env.host_path().join(library), &dest, &mut progress)?;
    }
    Ok(())
}

/// Resolve the compiler runtime libraries through the configured C compiler
/// and stage them into [`BIN_DIR`].
pub fn copy_compiler_runtime(
    env: &BuildEnvironment,
    project_root: &Path,
    mut progress: impl Write,
) -> Result<()> {
    let dest = project_root.join(BIN_DIR);
    for library in RUNTIME_LIBRARIES {
        let resolved = resolve_runtime_library(&env.cc, library)?;
        copy_into(&resolved, &dest, &mut progress)?;
    }
    Ok(())
}

/// Ask the configured C compiler where a runtime library lives.
///
/// The compiler is the first token of the CC command containing `gcc`,
/// matching how MinGW cross toolchains name their drivers. The reported
/// path must exist; a compiler that merely echoes the library name back
/// resolves to nothing.
pub fn resolve_runtime_library(cc: &[String], library: &str) -> Result<PathBuf> {
    let program = cc.iter().find(|token| token.contains("gcc")).ok_or_else(|| {
        DependsError::ToolchainResolution {
            library: library.to_string(),
            detail: "no gcc entry in the configured CC command".to_string(),
        }
    })?;

    let output = Command::new(program)
        .arg(format!("-print-file-name={library}"))
        .output()
        .map_err(|err| DependsError::ToolchainResolution {
            library: library.to_string(),
            detail: format!("could not run {program}: {err}"),
        })?;

    let resolved = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    if resolved.as_os_str().is_empty() || !resolved.exists() {
        return Err(DependsError::ToolchainResolution {
            library: library.to_string(),
            detail: format!("resolved path {} does not exist", resolved.display()),
        });
    }

    Ok(resolved)
}

fn copy_into(path: &Path, dest_dir: &Path, progress: &mut impl Write) -> Result<()> {
    if !path.exists() {
        return Err(DependsError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }

    let file_name = path.file_name().ok_or_else(|| DependsError::MissingArtifact {
        path: path.to_path_buf(),
    })?;

    fs::create_dir_all(dest_dir)?;
    fs::copy(path, dest_dir.join(file_name))?;
    writeln!(progress, "copy: {}", path.display())?;
    Ok(())
}
