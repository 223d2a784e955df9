use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, IoResultExt};
use crate::marks::PathMarks;
use crate::model::DirectoryLinkRoot;
use crate::roots::RootList;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    roots: Vec<DirectoryLinkRoot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    directories: Vec<MarkRecord>,
}

const IGNORED: &str = "Ignored";
const SKIPPED: &str = "Skipped";

/// Kept as free text so records written with statuses this build does not
/// know still load.
#[derive(Debug, Serialize, Deserialize)]
struct MarkRecord {
    path: PathBuf,
    status: String,
}

fn mark_records(ignored: &[PathBuf], skipped: &[PathBuf]) -> Vec<MarkRecord> {
    let ignored = ignored.iter().map(|path| MarkRecord {
        path: path.clone(),
        status: IGNORED.to_string(),
    });
    let skipped = skipped.iter().map(|path| MarkRecord {
        path: path.clone(),
        status: SKIPPED.to_string(),
    });
    ignored.chain(skipped).collect()
}

fn to_toml(document: &PreferencesDocument) -> Result<String, Error> {
    toml::to_string_pretty(document).map_err(|e| Error::Preferences(e.to_string()))
}

fn from_toml(document: &str) -> Result<PreferencesDocument, Error> {
    toml::from_str(document).map_err(|e| Error::Preferences(e.to_string()))
}

/// Write root pairs and marks as a TOML document.
pub fn serialize(
    roots: &[DirectoryLinkRoot],
    ignored: &[PathBuf],
    skipped: &[PathBuf],
) -> Result<String, Error> {
    to_toml(&PreferencesDocument {
        active: None,
        roots: roots.to_vec(),
        directories: mark_records(ignored, skipped),
    })
}

/// Read a document written by [`serialize`]. Directory records carrying any
/// status other than Ignored or Skipped are dropped, including status names
/// unknown to this build.
pub fn deserialize(
    document: &str,
) -> Result<(Vec<DirectoryLinkRoot>, Vec<PathBuf>, Vec<PathBuf>), Error> {
    let document = from_toml(document)?;
    let (ignored, skipped) = split_marks(document.directories);
    Ok((document.roots, ignored, skipped))
}

fn split_marks(records: Vec<MarkRecord>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut ignored = Vec::new();
    let mut skipped = Vec::new();
    for record in records {
        match record.status.as_str() {
            IGNORED => ignored.push(record.path),
            SKIPPED => skipped.push(record.path),
            other => debug!("Dropping {} record for {}", other, record.path.display()),
        }
    }
    (ignored, skipped)
}

/// Everything the operator configures: root pairs, the active root and marks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub roots: RootList,
    pub marks: PathMarks,
}

impl Preferences {
    pub fn new(roots: RootList, marks: PathMarks) -> Self {
        Self { roots, marks }
    }

    /// Load the document at `path`. A missing file yields empty preferences.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            info!("No preferences at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).at(path)?;
        Self::from_document(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::write(path, self.to_document()?).at(path)?;
        debug!("Saved preferences to {}", path.display());
        Ok(())
    }

    pub fn from_document(text: &str) -> Result<Self, Error> {
        let document = from_toml(text)?;
        let (ignored, skipped) = split_marks(document.directories);
        Ok(Self {
            roots: RootList::new(document.roots, document.active.as_deref()),
            marks: PathMarks::new(ignored, skipped),
        })
    }

    pub fn to_document(&self) -> Result<String, Error> {
        to_toml(&PreferencesDocument {
            active: self.roots.active().map(|r| r.original_path.clone()),
            roots: self.roots.roots().to_vec(),
            directories: mark_records(self.marks.ignored(), self.marks.skipped()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_roots() -> Vec<DirectoryLinkRoot> {
        vec![
            DirectoryLinkRoot::new("Games", "/data/games", "/mnt/archive/games"),
            DirectoryLinkRoot::new("Music", "/data/music", "/mnt/archive/music"),
        ]
    }

    #[test]
    fn test_document_round_trip() {
        let roots = sample_roots();
        let ignored = vec![PathBuf::from("/data/games/steam")];
        let skipped = vec![
            PathBuf::from("/data/games/gog"),
            PathBuf::from("/data/music/flac"),
        ];

        let text = serialize(&roots, &ignored, &skipped).unwrap();
        let (r, i, s) = deserialize(&text).unwrap();
        assert_eq!(r, roots);
        assert_eq!(i, ignored);
        assert_eq!(s, skipped);
    }

    #[test]
    fn test_non_mark_statuses_are_dropped() {
        let text = r#"
[[roots]]
name = "Games"
original_path = "/data/games"
backup_path = "/mnt/games"

[[directories]]
path = "/data/games/a"
status = "Plain"

[[directories]]
path = "/data/games/b"
status = "Ignored"
"#;
        let (roots, ignored, skipped) = deserialize(text).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(ignored, vec![PathBuf::from("/data/games/b")]);
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_unknown_statuses_are_dropped() {
        let text = r#"
[[directories]]
path = "/data/games/a"
status = "StandardDirectory"

[[directories]]
path = "/data/games/b"
status = "Ignored"

[[directories]]
path = "/data/games/c"
status = "Skipped"
"#;
        let (_, ignored, skipped) = deserialize(text).unwrap();
        assert_eq!(ignored, vec![PathBuf::from("/data/games/b")]);
        assert_eq!(skipped, vec![PathBuf::from("/data/games/c")]);
    }

    #[test]
    fn test_written_marks_use_status_names() {
        let text = serialize(&[], &[PathBuf::from("/a")], &[PathBuf::from("/b")]).unwrap();
        assert!(text.contains(r#"status = "Ignored""#));
        assert!(text.contains(r#"status = "Skipped""#));
    }

    #[test]
    fn test_empty_document() {
        let (roots, ignored, skipped) = deserialize("").unwrap();
        assert!(roots.is_empty() && ignored.is_empty() && skipped.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(deserialize("[[roots]\n"), Err(Error::Preferences(_))));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let tmp = tempdir().unwrap();
        let prefs = Preferences::load(&tmp.path().join("none.toml")).unwrap();
        assert!(prefs.roots.is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_active_root() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("preferences.toml");

        let mut marks = PathMarks::default();
        marks.mark_skipped(Path::new("/data/music/flac"));
        let prefs = Preferences::new(
            RootList::new(sample_roots(), Some(Path::new("/data/music"))),
            marks,
        );
        prefs.save(&path).unwrap();

        let loaded = Preferences::load(&path).unwrap();
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.roots.active().unwrap().name, "Music");
    }
}
