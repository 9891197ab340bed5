//! Writing artifacts and JSON reports to disk.

use anyhow::{anyhow, Context, Result};
use classforge_codegen::Artifact;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path};

/// Write every artifact under `out`. Returns the number of files written.
pub fn write_artifacts(out: &Path, artifacts: &[Artifact]) -> Result<usize> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    for artifact in artifacts {
        let relative = Path::new(&artifact.relative_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(anyhow!(
                "refusing to write artifact outside the output directory: {}",
                artifact.relative_path
            ));
        }
        let path = out.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, &artifact.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote artifact");
    }
    Ok(artifacts.len())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
