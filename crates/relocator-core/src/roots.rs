use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::DirectoryLinkRoot;
use crate::platform::path_key;

/// A root pair being edited, kept apart from the stored list until committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootDraft {
    pub name: String,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    /// Original path of the stored root this draft replaces; `None` appends a new root.
    pub replaces: Option<PathBuf>,
}

impl RootDraft {
    fn into_root(self) -> DirectoryLinkRoot {
        DirectoryLinkRoot::new(self.name, self.original_path, self.backup_path)
    }
}

/// The configured root pairs and which one is active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootList {
    roots: Vec<DirectoryLinkRoot>,
    active: Option<usize>,
}

impl RootList {
    /// The root matching `active` is selected, otherwise the first one.
    pub fn new(roots: Vec<DirectoryLinkRoot>, active: Option<&Path>) -> Self {
        let selected = active
            .and_then(|path| roots.iter().position(|r| r.is_same_root(path)))
            .or(if roots.is_empty() { None } else { Some(0) });
        Self {
            roots,
            active: selected,
        }
    }

    pub fn roots(&self) -> &[DirectoryLinkRoot] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn active(&self) -> Option<&DirectoryLinkRoot> {
        self.active.and_then(|i| self.roots.get(i))
    }

    /// Look a root up by name or by original path.
    pub fn find(&self, name_or_path: &str) -> Option<&DirectoryLinkRoot> {
        self.roots
            .iter()
            .find(|r| r.name == name_or_path)
            .or_else(|| self.roots.iter().find(|r| r.is_same_root(Path::new(name_or_path))))
    }

    pub fn select(&mut self, name_or_path: &str) -> Result<&DirectoryLinkRoot, Error> {
        let original = self
            .find(name_or_path)
            .map(|r| r.original_path.clone())
            .ok_or_else(|| Error::InvalidArgument(format!("No root named {}", name_or_path)))?;
        let index = self.index_of(&original).ok_or_else(|| {
            Error::InvalidArgument(format!("No root named {}", name_or_path))
        })?;
        self.active = Some(index);
        Ok(&self.roots[index])
    }

    pub fn begin_new(&self) -> RootDraft {
        RootDraft::default()
    }

    /// Draft that edits the active root in place once committed.
    pub fn begin_edit(&self) -> Option<RootDraft> {
        self.active().map(|root| RootDraft {
            name: root.name.clone(),
            original_path: root.original_path.clone(),
            backup_path: root.backup_path.clone(),
            replaces: Some(root.original_path.clone()),
        })
    }

    /// Draft of a new root seeded from the active one.
    pub fn begin_copy(&self) -> Option<RootDraft> {
        self.active().map(|root| RootDraft {
            name: format!("{} - Copy", root.name),
            original_path: root.original_path.clone(),
            backup_path: root.backup_path.clone(),
            replaces: None,
        })
    }

    /// Append or replace according to the draft and make the result active.
    pub fn commit(&mut self, draft: RootDraft) -> Result<&DirectoryLinkRoot, Error> {
        validate_draft(&draft)?;

        let replaced_index = match &draft.replaces {
            Some(original) => Some(self.index_of(original).ok_or_else(|| {
                Error::NotFound(original.clone())
            })?),
            None => None,
        };

        let clash = self
            .roots
            .iter()
            .enumerate()
            .any(|(i, r)| Some(i) != replaced_index && r.is_same_root(&draft.original_path));
        if clash {
            return Err(Error::Conflict(draft.original_path));
        }

        let index = match replaced_index {
            Some(index) => {
                self.roots[index] = draft.into_root();
                index
            }
            None => {
                self.roots.push(draft.into_root());
                self.roots.len() - 1
            }
        };
        self.active = Some(index);
        Ok(&self.roots[index])
    }

    /// Remove the active root. The last remaining root cannot be deleted.
    pub fn delete_active(&mut self) -> Result<DirectoryLinkRoot, Error> {
        let index = self
            .active
            .ok_or_else(|| Error::InvalidArgument("No root is selected".to_string()))?;
        if self.roots.len() <= 1 {
            return Err(Error::InvalidArgument(
                "Cannot delete the only configured root".to_string(),
            ));
        }
        let removed = self.roots.remove(index);
        self.active = Some(0);
        Ok(removed)
    }

    fn index_of(&self, original_path: &Path) -> Option<usize> {
        self.roots.iter().position(|r| r.is_same_root(original_path))
    }
}

fn validate_draft(draft: &RootDraft) -> Result<(), Error> {
    if draft.name.trim().is_empty() {
        return Err(Error::InvalidArgument("Root name is empty".to_string()));
    }
    if draft.original_path.as_os_str().is_empty() || draft.backup_path.as_os_str().is_empty() {
        return Err(Error::InvalidArgument("Root paths must not be empty".to_string()));
    }
    if paths_overlap(&draft.original_path, &draft.backup_path) {
        return Err(Error::InvalidArgument(format!(
            "{} and {} overlap",
            draft.original_path.display(),
            draft.backup_path.display()
        )));
    }
    Ok(())
}

/// Whether either path is the other or lies below it.
pub fn paths_overlap(left: &Path, right: &Path) -> bool {
    let left_key = path_key(left);
    let right_key = path_key(right);
    let left_path = Path::new(&left_key);
    let right_path = Path::new(&right_key);
    left_path.starts_with(right_path) || right_path.starts_with(left_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RootList {
        RootList::new(
            vec![
                DirectoryLinkRoot::new("Games", "/data/games", "/mnt/archive/games"),
                DirectoryLinkRoot::new("Music", "/data/music", "/mnt/archive/music"),
            ],
            Some(Path::new("/data/music")),
        )
    }

    #[test]
    fn test_active_defaults_to_first() {
        let list = RootList::new(
            vec![DirectoryLinkRoot::new("Games", "/data/games", "/mnt/games")],
            None,
        );
        assert_eq!(list.active().unwrap().name, "Games");
        assert!(RootList::default().active().is_none());
    }

    #[test]
    fn test_select_by_name_or_path() {
        let mut list = sample();
        assert_eq!(list.active().unwrap().name, "Music");
        list.select("Games").unwrap();
        assert_eq!(list.active().unwrap().name, "Games");
        list.select("/data/music/").unwrap();
        assert_eq!(list.active().unwrap().name, "Music");
        assert!(list.select("Videos").is_err());
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let mut list = sample();
        let mut draft = list.begin_edit().unwrap();
        draft.backup_path = PathBuf::from("/mnt/other/music");
        list.commit(draft).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.active().unwrap().backup_path,
            PathBuf::from("/mnt/other/music")
        );
    }

    #[test]
    fn test_copy_appends_with_suffix() {
        let mut list = sample();
        let mut draft = list.begin_copy().unwrap();
        assert_eq!(draft.name, "Music - Copy");

        // same original path as the source root is a clash
        assert!(matches!(list.commit(draft.clone()), Err(Error::Conflict(_))));

        draft.original_path = PathBuf::from("/data/podcasts");
        list.commit(draft).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.active().unwrap().name, "Music - Copy");
    }

    #[test]
    fn test_commit_rejects_nested_paths() {
        let mut list = sample();
        let draft = RootDraft {
            name: "Nested".to_string(),
            original_path: PathBuf::from("/data/videos"),
            backup_path: PathBuf::from("/data/videos/backup"),
            replaces: None,
        };
        assert!(matches!(list.commit(draft), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_commit_rejects_empty_name() {
        let mut list = sample();
        let mut draft = list.begin_new();
        draft.original_path = PathBuf::from("/data/videos");
        draft.backup_path = PathBuf::from("/mnt/videos");
        assert!(list.commit(draft).is_err());
    }

    #[test]
    fn test_delete_keeps_last_root() {
        let mut list = sample();
        let removed = list.delete_active().unwrap();
        assert_eq!(removed.name, "Music");
        assert_eq!(list.active().unwrap().name, "Games");
        assert!(list.delete_active().is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_paths_overlap() {
        assert!(paths_overlap(Path::new("/a/b"), Path::new("/a")));
        assert!(paths_overlap(Path::new("/a"), Path::new("/a/b/c")));
        assert!(!paths_overlap(Path::new("/a/b"), Path::new("/a/bc")));
    }
}
