// src/catalog/mod.rs

//! External collaborators of the engine: the dataset store, step scripts,
//! the grapher checksum mirror and remote freshness probes.
//!
//! The engine only talks to these through the [`Catalog`] trait, so tests can
//! swap in [`mock::MemoryCatalog`] and the core never hardcodes storage
//! mechanics.

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, info};

use crate::errors::{EtlError, Result};
use crate::step::checksum::{checksum_bytes, checksum_file, checksum_pairs};
use crate::step::uri::{Scheme, StepUri};
use crate::step::{Step, StepKind};

pub mod mock;

/// Per-dataset metadata file carrying the recorded `source_checksum`, the
/// only persisted state the incremental build relies on.
pub const INDEX_FILE: &str = "index.toml";

/// Capability set each step's domain logic is plugged in through.
pub trait Catalog: Send + Sync + Debug {
    /// `(name, checksum)` pairs for the files defining this step's own logic.
    fn source_checksums(&self, uri: &StepUri) -> Result<Vec<(String, String)>>;

    /// Whether the step's output has been materialized at all.
    fn output_exists(&self, uri: &StepUri) -> Result<bool>;

    /// Content checksum of the step's current output.
    fn output_checksum(&self, uri: &StepUri) -> Result<String>;

    /// The `source_checksum` recorded when the step last ran, if any.
    fn recorded_source_checksum(&self, uri: &StepUri) -> Result<Option<String>>;

    /// Persist a fresh `source_checksum` into the step's output metadata.
    fn record_source_checksum(&self, uri: &StepUri, checksum: &str) -> Result<()>;

    /// Flag the step's output as non-public.
    fn mark_output_private(&self, uri: &StepUri) -> Result<()>;

    /// Execute the step's domain logic. Mutates shared catalog state; the
    /// executor never invokes this concurrently.
    fn run_step(&self, step: &Step) -> Result<()>;
}

/// Catalog backed by the local working directory layout:
///
/// ```text
/// data/<path>/            data/backport step outputs (+ index.toml)
/// snapshots/<path>        snapshot payloads, <path>.toml metadata
/// steps/<scheme>/<path>   step scripts (.sh / .py, or a directory)
/// .etlcat/grapher/<path>  checksum mirror of the grapher database
/// ```
#[derive(Debug)]
pub struct LocalCatalog {
    data_dir: PathBuf,
    snapshots_dir: PathBuf,
    steps_dir: PathBuf,
    grapher_dir: PathBuf,
    http: reqwest::blocking::Client,
}

impl LocalCatalog {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            data_dir: root.join("data"),
            snapshots_dir: root.join("snapshots"),
            steps_dir: root.join("steps"),
            grapher_dir: root.join(".etlcat").join("grapher"),
            http,
        })
    }

    fn output_dir(&self, uri: &StepUri) -> PathBuf {
        self.data_dir.join(&uri.path)
    }

    fn index_path(&self, uri: &StepUri) -> PathBuf {
        self.output_dir(uri).join(INDEX_FILE)
    }

    fn snapshot_payload(&self, uri: &StepUri) -> PathBuf {
        self.snapshots_dir.join(&uri.path)
    }

    fn snapshot_metadata(&self, uri: &StepUri) -> PathBuf {
        self.snapshots_dir.join(format!("{}.toml", uri.path))
    }

    fn grapher_record(&self, uri: &StepUri) -> PathBuf {
        self.grapher_dir.join(&uri.path)
    }

    /// Script candidates for a step: `<base>.sh`, `<base>.py`, or every file
    /// under the directory `<base>/`.
    fn script_files(&self, uri: &StepUri) -> Vec<PathBuf> {
        let base = self.steps_dir.join(uri.scheme.as_str()).join(&uri.path);
        let mut files = Vec::new();

        for ext in ["sh", "py"] {
            let candidate = base.with_extension(ext);
            if candidate.is_file() {
                files.push(candidate);
            }
        }
        if base.is_dir() {
            collect_files(&base, &mut files);
        }

        files.sort();
        files
    }

    fn read_index(&self, uri: &StepUri) -> Result<Option<toml::Table>> {
        let path = self.index_path(uri);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(contents.parse::<toml::Table>()?))
    }

    fn write_index(&self, uri: &StepUri, index: &toml::Table) -> Result<()> {
        let path = self.index_path(uri);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string(index).with_context(|| format!("serializing {:?}", path))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    fn update_index(&self, uri: &StepUri, key: &str, value: toml::Value) -> Result<()> {
        let mut index = self.read_index(uri)?.unwrap_or_default();
        index.insert(key.to_string(), value);
        self.write_index(uri, &index)
    }

    fn etag_checksum(&self, uri: &StepUri) -> Result<String> {
        let url = format!("https://{}", uri.path);
        let resp = self
            .http
            .head(&url)
            .send()
            .with_context(|| format!("HEAD request to {}", url))?;

        let header = resp
            .headers()
            .get(reqwest::header::ETAG)
            .or_else(|| resp.headers().get(reqwest::header::LAST_MODIFIED))
            .ok_or_else(|| anyhow!("no ETag or Last-Modified header at {}", url))?;

        Ok(checksum_bytes(header.as_bytes()))
    }

    fn github_checksum(&self, uri: &StepUri) -> Result<String> {
        let url = format!(
            "https://api.github.com/repos/{}/commits?per_page=1",
            uri.path
        );
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, "etlcat")
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("fetching latest commit for {}", uri.path))?;

        let commits: serde_json::Value = resp
            .json()
            .with_context(|| format!("decoding commit listing for {}", uri.path))?;
        let sha = commits
            .get(0)
            .and_then(|c| c.get("sha"))
            .and_then(|s| s.as_str())
            .ok_or_else(|| anyhow!("no commits found for github://{}", uri.path))?;

        Ok(sha.to_string())
    }

    fn run_script(&self, step: &Step) -> Result<()> {
        let uri = &step.uri;
        let scripts = self.script_files(uri);
        let script = scripts
            .iter()
            .find(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("sh") | Some("py")
                )
            })
            .ok_or_else(|| EtlError::StepFailed {
                step: uri.to_string(),
                message: format!(
                    "no runnable script under {:?}",
                    self.steps_dir.join(uri.scheme.as_str()).join(&uri.path)
                ),
            })?;

        let interpreter = match script.extension().and_then(|e| e.to_str()) {
            Some("py") => "python3",
            _ => "sh",
        };

        info!(step = %uri, script = ?script, "running step script");
        let status = Command::new(interpreter)
            .arg(script)
            .arg(uri.to_string())
            .env("ETLCAT_STEP", uri.to_string())
            .env("ETLCAT_DATA_DIR", &self.data_dir)
            .env("ETLCAT_OUTPUT_DIR", self.output_dir(uri))
            .status()
            .with_context(|| format!("spawning script for step '{}'", uri))?;

        if !status.success() {
            return Err(EtlError::StepFailed {
                step: uri.to_string(),
                message: format!("script exited with status {}", status.code().unwrap_or(-1)),
            });
        }
        Ok(())
    }
}

impl Catalog for LocalCatalog {
    fn source_checksums(&self, uri: &StepUri) -> Result<Vec<(String, String)>> {
        let files = match uri.scheme {
            Scheme::Snapshot | Scheme::SnapshotPrivate | Scheme::Walden | Scheme::WaldenPrivate => {
                let meta = self.snapshot_metadata(uri);
                if meta.is_file() { vec![meta] } else { Vec::new() }
            }
            Scheme::Github | Scheme::Etag => Vec::new(),
            _ => self.script_files(uri),
        };

        files
            .into_iter()
            .map(|path| {
                let checksum = checksum_file(&path)?;
                Ok((path.to_string_lossy().into_owned(), checksum))
            })
            .collect()
    }

    fn output_exists(&self, uri: &StepUri) -> Result<bool> {
        match uri.scheme {
            Scheme::Snapshot | Scheme::SnapshotPrivate | Scheme::Walden | Scheme::WaldenPrivate => {
                Ok(self.snapshot_payload(uri).exists())
            }
            Scheme::Grapher | Scheme::GrapherPrivate => {
                Ok(self.grapher_record(uri).is_file())
            }
            Scheme::Github | Scheme::Etag => Ok(true),
            _ => Ok(self.output_dir(uri).is_dir()),
        }
    }

    fn output_checksum(&self, uri: &StepUri) -> Result<String> {
        match uri.scheme {
            Scheme::Snapshot | Scheme::SnapshotPrivate | Scheme::Walden | Scheme::WaldenPrivate => {
                // The metadata file embeds the payload's content checksum, so
                // hashing it captures re-ingestion without touching the
                // (potentially large) payload.
                checksum_file(&self.snapshot_metadata(uri)).map_err(Into::into)
            }
            Scheme::Etag => self.etag_checksum(uri),
            Scheme::Github => self.github_checksum(uri),
            Scheme::Grapher | Scheme::GrapherPrivate => self
                .recorded_source_checksum(uri)?
                .ok_or_else(|| EtlError::from(anyhow!("no grapher output recorded for '{}'", uri))),
            _ => {
                let dir = self.output_dir(uri);
                let mut files = Vec::new();
                collect_files(&dir, &mut files);

                let mut pairs = Vec::new();
                for path in files {
                    // Provenance metadata is rewritten after every run and is
                    // not part of the dataset content.
                    if path.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE) {
                        continue;
                    }
                    let name = path
                        .strip_prefix(&dir)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .into_owned();
                    pairs.push((name, checksum_file(&path)?));
                }
                Ok(checksum_pairs(pairs))
            }
        }
    }

    fn recorded_source_checksum(&self, uri: &StepUri) -> Result<Option<String>> {
        match uri.scheme {
            Scheme::Grapher | Scheme::GrapherPrivate => {
                let path = self.grapher_record(uri);
                if !path.is_file() {
                    return Ok(None);
                }
                Ok(Some(fs::read_to_string(path)?.trim().to_string()))
            }
            _ => {
                let index = self.read_index(uri)?;
                Ok(index.and_then(|idx| {
                    idx.get("source_checksum")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                }))
            }
        }
    }

    fn record_source_checksum(&self, uri: &StepUri, checksum: &str) -> Result<()> {
        debug!(step = %uri, checksum = %checksum, "recording source checksum");
        match uri.scheme {
            Scheme::Grapher | Scheme::GrapherPrivate => {
                let path = self.grapher_record(uri);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, checksum)?;
                Ok(())
            }
            Scheme::Snapshot
            | Scheme::SnapshotPrivate
            | Scheme::Walden
            | Scheme::WaldenPrivate
            | Scheme::Github
            | Scheme::Etag => Ok(()),
            _ => self.update_index(uri, "source_checksum", toml::Value::String(checksum.into())),
        }
    }

    fn mark_output_private(&self, uri: &StepUri) -> Result<()> {
        match uri.scheme {
            Scheme::DataPrivate | Scheme::BackportPrivate => {
                self.update_index(uri, "is_public", toml::Value::Boolean(false))
            }
            // Grapher privacy lives in the database, snapshots carry it in
            // their metadata; nothing to do locally.
            _ => Ok(()),
        }
    }

    fn run_step(&self, step: &Step) -> Result<()> {
        match step.kind {
            StepKind::Data | StepKind::Backport | StepKind::Grapher => self.run_script(step),
            StepKind::Snapshot | StepKind::Walden => {
                if self.snapshot_payload(&step.uri).exists() {
                    Ok(())
                } else {
                    Err(EtlError::StepFailed {
                        step: step.uri.to_string(),
                        message: format!(
                            "snapshot payload missing at {:?}; ingest it first",
                            self.snapshot_payload(&step.uri)
                        ),
                    })
                }
            }
            StepKind::Reference | StepKind::Github | StepKind::Etag => Ok(()),
        }
    }
}

/// Recursively collect every file under `dir` (no-op if it does not exist).
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
