use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Metadata recorded next to a triangulation artifact.
pub struct Payload {
    pub params: Value,
    pub tag: Option<String>,
}

impl Payload {
    pub fn new(params: Value, tag: Option<String>) -> Self {
        Self { params, tag }
    }
}

/// Provenance block shared by sidecars and `report`.
pub fn block(payload: &Payload, outputs: &[String]) -> Value {
    json!({
        "code_rev": current_git_rev(),
        "version": trimarshal::VERSION,
        "tag": payload.tag,
        "params": payload.params,
        "outputs": outputs
    })
}

/// Write `<artifact>.provenance.json` containing the git commit, params, and outputs.
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let provenance_path = provenance_path(artifact);
    if let Some(parent) = provenance_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }
    let doc = block(&payload, &[artifact.to_string_lossy().into_owned()]);
    fs::write(&provenance_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", provenance_path.display()))?;
    Ok(provenance_path)
}

/// `mesh.json` -> `mesh.provenance.json`, next to the artifact.
fn provenance_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// Code revision recorded in provenance blocks.
///
/// `GIT_COMMIT` wins when non-empty, read at build time first (for binaries built
/// outside a checkout) and then at run time. Otherwise `git rev-parse HEAD` in the
/// working directory, or `"unknown"`.
pub fn current_git_rev() -> String {
    [
        option_env!("GIT_COMMIT").map(str::to_owned),
        std::env::var("GIT_COMMIT").ok(),
    ]
    .into_iter()
    .flatten()
    .find(|rev| !rev.is_empty())
    .or_else(git_head)
    .unwrap_or_else(|| "unknown".to_owned())
}

fn git_head() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?;
    Some(rev.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn provenance_path_rewrites_extension() {
        let base = Path::new("/tmp/output/mesh.json");
        let derived = provenance_path(base);
        assert_eq!(derived, Path::new("/tmp/output/mesh.provenance.json"));
        assert_eq!(
            provenance_path(Path::new("out/mesh")),
            Path::new("out/mesh.provenance.json")
        );
    }

    #[test]
    fn write_sidecar_records_params_and_tag() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("mesh.json");
        fs::write(&artifact, "{}").unwrap();
        let payload = Payload::new(json!({"switches": "pYQ"}), Some("demo".into()));
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["params"]["switches"], "pYQ");
        assert_eq!(parsed["tag"], "demo");
        assert_eq!(parsed["version"], trimarshal::VERSION);
    }
}
