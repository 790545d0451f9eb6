use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// This function reads a file from `file_path`, attempts to parse it
/// as JSON, and returns an instance of `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path.as_ref()).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

/// Writes `value` as pretty printed JSON (two space indent) to `file_path`.
pub fn write_json_file<T: Serialize>(file_path: impl AsRef<Path>, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(file_path.as_ref(), data)?;
    Ok(())
}

/// Resolves `path` against `base_dir` unless it is already absolute.
pub fn resolve_path(base_dir: &Path, path: impl AsRef<Path>) -> std::path::PathBuf {
    let path = path.as_ref();
    if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Sample {
        name: String,
        count: i64,
    }

    #[test]
    fn test_write_then_parse_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let sample = Sample { name: "hpso01".to_string(), count: 3 };

        write_json_file(&path, &sample).unwrap();
        let parsed: Sample = parse_json_file(&path).unwrap();

        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result: Result<Sample> = parse_json_file("does/not/exist.json");
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"name\": ").unwrap();

        let result: Result<Sample> = parse_json_file(&path);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_resolve_path_keeps_absolute_paths() {
        let base = Path::new("/configs");
        assert_eq!(resolve_path(base, "plan.json"), Path::new("/configs/plan.json"));
        assert_eq!(resolve_path(base, "/data/plan.json"), Path::new("/data/plan.json"));
    }
}
