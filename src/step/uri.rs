// src/step/uri.rs

//! Step identifiers of the form `scheme://path`.

use std::fmt;
use std::str::FromStr;

use crate::errors::EtlError;

/// Step kind, encoded as the URI scheme.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scheme {
    Data,
    DataPrivate,
    Snapshot,
    SnapshotPrivate,
    Walden,
    WaldenPrivate,
    Grapher,
    GrapherPrivate,
    Backport,
    BackportPrivate,
    Github,
    Etag,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Data => "data",
            Scheme::DataPrivate => "data-private",
            Scheme::Snapshot => "snapshot",
            Scheme::SnapshotPrivate => "snapshot-private",
            Scheme::Walden => "walden",
            Scheme::WaldenPrivate => "walden-private",
            Scheme::Grapher => "grapher",
            Scheme::GrapherPrivate => "grapher-private",
            Scheme::Backport => "backport",
            Scheme::BackportPrivate => "backport-private",
            Scheme::Github => "github",
            Scheme::Etag => "etag",
        }
    }

    /// Whether this scheme designates a private step family.
    pub fn is_private(&self) -> bool {
        matches!(
            self,
            Scheme::DataPrivate
                | Scheme::SnapshotPrivate
                | Scheme::WaldenPrivate
                | Scheme::GrapherPrivate
                | Scheme::BackportPrivate
        )
    }

    /// Whether this scheme belongs to the grapher family (public or private).
    pub fn is_grapher(&self) -> bool {
        matches!(self, Scheme::Grapher | Scheme::GrapherPrivate)
    }
}

impl FromStr for Scheme {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(Scheme::Data),
            "data-private" => Ok(Scheme::DataPrivate),
            "snapshot" => Ok(Scheme::Snapshot),
            "snapshot-private" => Ok(Scheme::SnapshotPrivate),
            "walden" => Ok(Scheme::Walden),
            "walden-private" => Ok(Scheme::WaldenPrivate),
            "grapher" => Ok(Scheme::Grapher),
            "grapher-private" => Ok(Scheme::GrapherPrivate),
            "backport" => Ok(Scheme::Backport),
            "backport-private" => Ok(Scheme::BackportPrivate),
            "github" => Ok(Scheme::Github),
            "etag" => Ok(Scheme::Etag),
            other => Err(EtlError::UnknownScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed step name.
///
/// The `path` meaning is scheme-specific: a dataset-store-relative path for
/// data/snapshot/grapher steps, an `org/repo` pair for github steps, a bare
/// URL with the protocol stripped for etag steps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepUri {
    pub scheme: Scheme,
    pub path: String,
}

impl StepUri {
    pub fn new(scheme: Scheme, path: impl Into<String>) -> Self {
        Self {
            scheme,
            path: path.into(),
        }
    }
}

impl FromStr for StepUri {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, path) = s
            .split_once("://")
            .ok_or_else(|| EtlError::UnknownScheme(s.to_string()))?;
        Ok(StepUri {
            scheme: scheme.parse()?,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for StepUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_to_canonical_form() {
        for name in [
            "data://garden/who/2023-01-01/gho",
            "data-private://garden/imf/2024/weo",
            "snapshot://who/2023-01-01/gho.csv",
            "github://owid/etl",
            "etag://example.org/data.csv",
            "grapher://grapher/who/2023-01-01/gho",
            "backport-private://backport/owid/dataset_123",
        ] {
            let uri: StepUri = name.parse().unwrap();
            assert_eq!(uri.to_string(), name);
        }
    }

    #[test]
    fn unknown_scheme_is_fatal() {
        assert!(matches!(
            "ftp://somewhere".parse::<StepUri>(),
            Err(EtlError::UnknownScheme(_))
        ));
        assert!(matches!(
            "no-separator".parse::<StepUri>(),
            Err(EtlError::UnknownScheme(_))
        ));
    }
}
