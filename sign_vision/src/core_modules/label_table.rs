// THEORY:
// The label table is the only piece of data the recognizer reads from disk
// besides the model itself. It is a two-column CSV (`ClassId`, `SignName`)
// exported alongside the training set, loaded once at startup and never
// mutated afterwards.
//
// Missing and malformed files are distinguished because they call for
// different fixes from the operator: the first is a path problem, the second
// a data problem. A class id the table does not know about is not an error at
// all; it resolves to `FALLBACK_LABEL`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VisionError};

/// Label used whenever the classifier reports an id the table does not contain.
pub const FALLBACK_LABEL: &str = "Unknown Class";

#[derive(Debug, Deserialize)]
struct LabelRecord {
    #[serde(rename = "ClassId")]
    class_id: usize,
    #[serde(rename = "SignName")]
    sign_name: String,
}

/// Read-only mapping from class id to human-readable sign name.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    names: HashMap<usize, String>,
}

impl LabelTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VisionError::LabelsNotFound(path.to_path_buf()),
            _ => VisionError::LabelsMalformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::parse(file, path)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(reader, Path::new("<reader>"))
    }

    fn parse<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let malformed = |reason: String| VisionError::LabelsMalformed {
            path: PathBuf::from(origin),
            reason,
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(|e| malformed(e.to_string()))?;
        for required in ["ClassId", "SignName"] {
            if !headers.iter().any(|h| h == required) {
                return Err(malformed(format!("missing column `{required}`")));
            }
        }

        let mut names = HashMap::new();
        for record in csv_reader.deserialize::<LabelRecord>() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            if let Some(previous) = names.insert(record.class_id, record.sign_name) {
                log::warn!(
                    "duplicate ClassId {} in {}; replacing {:?}",
                    record.class_id,
                    origin.display(),
                    previous
                );
            }
        }

        if names.is_empty() {
            log::warn!("label table {} has no rows", origin.display());
        }

        Ok(Self { names })
    }

    /// Resolves a class id, falling back to [`FALLBACK_LABEL`].
    pub fn name_for(&self, class_id: usize) -> &str {
        self.names
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_LABEL)
    }

    pub fn contains(&self, class_id: usize) -> bool {
        self.names.contains_key(&class_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(usize, String)> for LabelTable {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "ClassId,SignName\n0,Give way\n1,No entry\n2,One-way traffic\n";

    #[test]
    fn resolves_known_ids() {
        let table = LabelTable::from_reader(SAMPLE.as_bytes()).expect("sample parses");
        assert_eq!(table.len(), 3);
        assert_eq!(table.name_for(1), "No entry");
    }

    #[test]
    fn unknown_id_uses_fallback() {
        let table = LabelTable::from_reader(SAMPLE.as_bytes()).expect("sample parses");
        assert_eq!(table.name_for(58), FALLBACK_LABEL);
        assert!(!table.contains(58));
    }

    #[test]
    fn extra_columns_and_whitespace_are_tolerated() {
        let csv = "ClassId, SignName ,Notes\n 7 , Height limit ,metric\n";
        let table = LabelTable::from_reader(csv.as_bytes()).expect("parses");
        assert_eq!(table.name_for(7), "Height limit");
    }

    #[test]
    fn later_duplicate_wins() {
        let csv = "ClassId,SignName\n3,Old\n3,New\n";
        let table = LabelTable::from_reader(csv.as_bytes()).expect("parses");
        assert_eq!(table.len(), 1);
        assert_eq!(table.name_for(3), "New");
    }

    #[test]
    fn missing_column_is_malformed() {
        let csv = "Id,Name\n0,Stop\n";
        let err = LabelTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, VisionError::LabelsMalformed { .. }), "{err}");
    }

    #[test]
    fn non_numeric_id_is_malformed() {
        let csv = "ClassId,SignName\nzero,Stop\n";
        let err = LabelTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, VisionError::LabelsMalformed { .. }), "{err}");
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("traffic_sign.csv");
        let err = LabelTable::from_path(&path).unwrap_err();
        match err {
            VisionError::LabelsNotFound(p) => assert_eq!(p, path),
            other => panic!("expected LabelsNotFound, got {other}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write sample");
        let table = LabelTable::from_path(file.path()).expect("loads");
        assert_eq!(table.name_for(0), "Give way");
    }
}
