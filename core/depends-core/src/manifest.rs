//! The dependency tree manifest: `share/config.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::environment::ToolchainVar;
use crate::error::{DependsError, Result};

/// Location of the manifest inside a depends tree.
pub fn manifest_path(depends_dir: &Path) -> PathBuf {
    depends_dir.join("share").join("config.json")
}

/// Toolchain overrides declared by a dependency tree.
///
/// The manifest is a flat JSON object mapping toolchain variables to
/// whitespace-separated command strings. Keys outside the recognized
/// [`ToolchainVar`] set are rejected at load time, naming the offender.
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    pub entries: Vec<(ToolchainVar, Vec<String>)>,
}

impl DependencyManifest {
    /// Read and validate the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| DependsError::ManifestRead {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let object: Map<String, Value> =
            serde_json::from_str(&text).map_err(|err| DependsError::ManifestRead {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        let mut entries = Vec::new();
        for (key, value) in &object {
            let var = ToolchainVar::from_key(key)
                .ok_or_else(|| DependsError::ManifestKey { key: key.clone() })?;
            let command = value.as_str().ok_or_else(|| DependsError::ManifestRead {
                path: path.to_path_buf(),
                reason: format!("key `{key}` must be a string"),
            })?;
            entries.push((var, split_command(command)));
        }

        Ok(Self { entries })
    }
}

/// Split a manifest command string on whitespace.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_manifest(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("config.json");
        fs::write(&path, contents).expect("write manifest");
        (tmp, path)
    }

    #[test]
    fn splits_command_strings_on_whitespace() {
        assert_eq!(split_command("gcc -m64"), vec!["gcc", "-m64"]);
        assert_eq!(split_command("  gcc\t-m64 "), vec!["gcc", "-m64"]);
        assert!(split_command("").is_empty());
    }

    #[test]
    fn loads_recognized_keys() {
        let (_tmp, path) = write_manifest(r#"{"CC": "gcc -m64", "CXX": "g++ -m64"}"#);
        let manifest = DependencyManifest::load(&path).expect("load");

        assert_eq!(
            manifest.entries,
            vec![
                (ToolchainVar::Cc, vec!["gcc".to_string(), "-m64".to_string()]),
                (ToolchainVar::Cxx, vec!["g++".to_string(), "-m64".to_string()]),
            ]
        );
    }

    #[test]
    fn rejects_unrecognized_key_by_name() {
        let (_tmp, path) = write_manifest(r#"{"CC": "gcc", "CFLAGS": "-O2"}"#);
        let err = DependencyManifest::load(&path).expect_err("unknown key");

        match &err {
            DependsError::ManifestKey { key } => assert_eq!(key, "CFLAGS"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("CFLAGS"));
    }

    #[test]
    fn rejects_non_string_values() {
        let (_tmp, path) = write_manifest(r#"{"CC": ["gcc", "-m64"]}"#);
        let err = DependencyManifest::load(&path).expect_err("non-string value");

        match err {
            DependsError::ManifestRead { reason, .. } => {
                assert!(reason.contains("CC"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error_naming_the_path() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("share").join("config.json");
        let err = DependencyManifest::load(&path).expect_err("missing manifest");

        match err {
            DependsError::ManifestRead { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn broken_json_is_a_read_error() {
        let (_tmp, path) = write_manifest("{not json");
        let err = DependencyManifest::load(&path).expect_err("broken json");
        assert!(matches!(err, DependsError::ManifestRead { .. }));
    }
}
