use std::path::{Path, PathBuf};

use crate::error::{PilotError, Result};

/// Ordered, immutable list of destination volumes.
///
/// Rotation walks it from the last entry to the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationList {
    paths: Vec<PathBuf>,
}

impl DestinationList {
    pub fn new(paths: Vec<PathBuf>) -> Result<Self> {
        if paths.is_empty() {
            return Err(PilotError::NoDestinations);
        }
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Index a fresh rotation starts from.
    pub fn initial_index(&self) -> usize {
        self.paths.len() - 1
    }

    pub fn check_index(&self, index: usize) -> Result<&Path> {
        self.get(index).ok_or(PilotError::StateOutOfRange {
            index,
            len: self.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            DestinationList::new(vec![]),
            Err(PilotError::NoDestinations)
        ));
    }

    #[test]
    fn test_initial_index_is_last() {
        let list = DestinationList::new(vec!["/a".into(), "/b".into(), "/c".into()]).unwrap();
        assert_eq!(list.initial_index(), 2);
        assert_eq!(list.get(2), Some(Path::new("/c")));
    }

    #[test]
    fn test_check_index_out_of_range() {
        let list = DestinationList::new(vec!["/a".into()]).unwrap();
        assert!(list.check_index(0).is_ok());
        assert!(matches!(
            list.check_index(1),
            Err(PilotError::StateOutOfRange { index: 1, len: 1 })
        ));
    }
}
