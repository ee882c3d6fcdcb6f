//! JSON file export for sweep results.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::info;
use placesweep_core::{ResultSet, ResultSink};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when writing results to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create or open the output directory.
    #[error("failed to prepare output directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be prepared.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Serialising the result set failed.
    #[error("failed to serialise results")]
    Serialize {
        /// Source error returned by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Writing the output file failed.
    #[error("failed to write results to {path:?}")]
    Write {
        /// Destination file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Writes the result set as one JSON object keyed by place identifier.
///
/// The file name `output-{uuid}.json` is chosen when the sink is created, so
/// [`JsonFileSink::path`] can be reported before or after the export.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: Utf8PathBuf,
    file_name: String,
}

impl JsonFileSink {
    /// Create a sink writing a fresh `output-{uuid}.json` inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<Utf8PathBuf>) -> Self {
        let dir = dir.into();
        let dir = if dir.as_str().is_empty() {
            Utf8PathBuf::from(".")
        } else {
            dir
        };
        Self {
            dir,
            file_name: format!("output-{}.json", Uuid::new_v4()),
        }
    }

    /// Destination file path.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.dir.join(&self.file_name)
    }

    fn open_dir(&self) -> Result<fs_utf8::Dir, ExportError> {
        let to_error = |source| ExportError::CreateDirectory {
            path: self.dir.clone(),
            source,
        };
        let (base, relative) = base_dir_and_relative(&self.dir);
        let base = fs_utf8::Dir::open_ambient_dir(base, ambient_authority()).map_err(to_error)?;
        if relative.as_str().is_empty() {
            return Ok(base);
        }
        base.create_dir_all(relative).map_err(to_error)?;
        base.open_dir(relative).map_err(to_error)
    }
}

fn base_dir_and_relative(dir: &Utf8Path) -> (&str, &Utf8Path) {
    if dir.is_absolute() {
        ("/", dir.strip_prefix("/").unwrap_or(dir))
    } else {
        (".", dir)
    }
}

impl ResultSink for JsonFileSink {
    type Error = ExportError;

    fn export(&self, places: &ResultSet) -> Result<(), Self::Error> {
        let contents =
            serde_json::to_vec_pretty(places).map_err(|source| ExportError::Serialize { source })?;
        let dir = self.open_dir()?;
        dir.write(&self.file_name, contents)
            .map_err(|source| ExportError::Write {
                path: self.path(),
                source,
            })?;
        info!("wrote {} places to {}", places.len(), self.path());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placesweep_core::Place;
    use rstest::{fixture, rstest};
    use serde_json::{Map, Value, json};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("utf-8 path")
    }

    fn sample() -> ResultSet {
        let mut attributes = Map::new();
        attributes.insert("name".to_owned(), Value::from("Diner"));
        [Place::new("b", attributes), Place::with_id("a")]
            .into_iter()
            .collect()
    }

    #[rstest]
    fn file_name_is_output_uuid_json(temp_dir: TempDir) {
        let sink = JsonFileSink::in_dir(utf8(temp_dir.path()));

        let name = sink.path().file_name().expect("file name").to_owned();

        let id = name
            .strip_prefix("output-")
            .and_then(|rest| rest.strip_suffix(".json"))
            .expect("output-{uuid}.json");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[rstest]
    fn sinks_choose_distinct_files(temp_dir: TempDir) {
        let first = JsonFileSink::in_dir(utf8(temp_dir.path()));
        let second = JsonFileSink::in_dir(utf8(temp_dir.path()));

        assert_ne!(first.path(), second.path());
    }

    #[rstest]
    fn export_writes_object_keyed_by_id(temp_dir: TempDir) {
        let sink = JsonFileSink::in_dir(utf8(temp_dir.path()));

        sink.export(&sample()).expect("export");

        let written = std::fs::read_to_string(sink.path()).expect("read export");
        let value: Value = serde_json::from_str(&written).expect("valid JSON");
        assert_eq!(
            value,
            json!({
                "a": {"place_id": "a"},
                "b": {"place_id": "b", "name": "Diner"}
            })
        );
    }

    #[rstest]
    fn export_creates_missing_directories(temp_dir: TempDir) {
        let dir = utf8(&temp_dir.path().join("nested/results"));
        let sink = JsonFileSink::in_dir(dir.clone());

        sink.export(&ResultSet::new()).expect("export");

        assert!(dir.is_dir());
        let written = std::fs::read_to_string(sink.path()).expect("read export");
        assert_eq!(written.trim(), "{}");
    }

    #[rstest]
    fn export_into_a_file_path_fails(temp_dir: TempDir) {
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("write blocker");
        let sink = JsonFileSink::in_dir(utf8(&blocker));

        let err = sink.export(&sample()).expect_err("cannot write under a file");

        assert!(matches!(err, ExportError::CreateDirectory { .. }));
    }
}
