use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use image_optimizer_core::ImageFormat;

use crate::error::CliError;

/// Whether the extension names a container the engine reads.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ImageFormat::from_key(&ext.to_ascii_lowercase()))
        .is_some()
}

/// Collect all supported image files from the input path.
/// If `recursive` is true, walk subdirectories.
pub fn collect_files(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, CliError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(CliError::ReadFile {
            path: input.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a file or directory"),
        });
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(input).max_depth(max_depth) {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Where the output for `input_file` goes, given the engine's suggested name.
///
/// Without `output_base` the result lands next to the input. A single input
/// with an output path that has an extension is written exactly there;
/// otherwise the output is a directory and the input tree is mirrored.
pub fn resolve_output(
    input_file: &Path,
    input_base: &Path,
    output_base: Option<&Path>,
    suggested_name: &str,
) -> PathBuf {
    match output_base {
        None => input_file
            .parent()
            .unwrap_or(Path::new("."))
            .join(suggested_name),
        Some(out) => {
            if input_base.is_file() {
                if out.extension().is_some() {
                    out.to_path_buf()
                } else {
                    out.join(suggested_name)
                }
            } else {
                let relative_dir = input_file
                    .strip_prefix(input_base)
                    .ok()
                    .and_then(Path::parent)
                    .unwrap_or(Path::new(""));
                out.join(relative_dir).join(suggested_name)
            }
        }
    }
}

/// Read file contents.
pub fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write file contents, creating parent directories as needed.
pub fn write_file(path: &Path, data: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CliError::WriteFile {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, data).map_err(|e| CliError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load pipeline steps from a JSON file holding either the array itself or
/// an object with a `steps` field.
pub fn read_steps(path: &Path) -> Result<Value, CliError> {
    let data = read_file(path)?;
    let value: Value = serde_json::from_slice(&data).map_err(|e| CliError::PipelineFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(mut map) => Ok(map.remove("steps").unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_files_filters_and_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("b.JPG"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.webp"), b"x").unwrap();

        let flat = collect_files(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 2);

        let deep = collect_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().any(|p| p.ends_with("nested/c.webp")));
    }

    #[test]
    fn test_collect_files_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_files(&dir.path().join("nope"), false).unwrap_err();
        assert!(matches!(err, CliError::ReadFile { .. }));
    }

    #[test]
    fn test_resolve_output() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, b"x").unwrap();

        assert_eq!(resolve_output(&file, &file, None, "abc.webp"), dir.path().join("abc.webp"));
        assert_eq!(
            resolve_output(&file, &file, Some(Path::new("out/final.webp")), "abc.webp"),
            PathBuf::from("out/final.webp")
        );
        assert_eq!(
            resolve_output(&file, &file, Some(Path::new("out")), "abc.webp"),
            PathBuf::from("out/abc.webp")
        );

        let nested = dir.path().join("sub/photo.jpg");
        assert_eq!(
            resolve_output(&nested, dir.path(), Some(Path::new("out")), "abc.webp"),
            PathBuf::from("out/sub/abc.webp")
        );
    }

    #[test]
    fn test_read_steps_accepts_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let bare = dir.path().join("bare.json");
        fs::write(&bare, r#"[{"type": "flip", "vertical": true}]"#).unwrap();
        assert!(read_steps(&bare).unwrap().is_array());

        let wrapped = dir.path().join("wrapped.json");
        fs::write(&wrapped, r#"{"steps": [{"type": "compress"}]}"#).unwrap();
        assert_eq!(read_steps(&wrapped).unwrap().as_array().map(Vec::len), Some(1));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        assert!(matches!(read_steps(&broken), Err(CliError::PipelineFile { .. })));
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.png");
        write_file(&path, b"data").unwrap();
        assert_eq!(read_file(&path).unwrap(), b"data");
    }
}
