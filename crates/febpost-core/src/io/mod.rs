//! Input-path resolution shared by every stage.
//!
//! Validates that the requested report or table exists and normalizes the
//! directory/file split before anything is opened.

use crate::domain::{PostError, PostResult};
use std::path::{Path, PathBuf};

/// Save name used when a stage is not given an explicit one.
pub const DEFAULT_SAVE_FILE: &str = "febio4.out.csv";

/// Where a stage persists its output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// `DEFAULT_SAVE_FILE` next to the input.
    Default,
    /// A caller-chosen file name next to the input.
    Named(String),
    /// Write back over the input file itself.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    directory: PathBuf,
    file_name: String,
}

impl ResolvedInput {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn input_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn save_path(&self, target: &SaveTarget) -> PathBuf {
        match target {
            SaveTarget::Default => self.directory.join(DEFAULT_SAVE_FILE),
            SaveTarget::Named(name) => self.directory.join(name),
            SaveTarget::Overwrite => self.input_path(),
        }
    }
}

/// Validate `directory`/`file` into a readable location without opening it.
///
/// With no directory, `file` may be a composite path and is split into its
/// parent and trailing file name. With a directory, the pair must point at an
/// existing file as given.
pub fn resolve_input(directory: Option<&Path>, file: Option<&str>) -> PostResult<ResolvedInput> {
    let file = file.ok_or_else(|| {
        PostError::configuration("INPUT.FILE_REQUIRED", "file name must be specified")
    })?;

    match directory {
        None => {
            let composite = Path::new(file);
            if !composite.exists() {
                return Err(PostError::not_found(
                    "INPUT.PATH_NOT_FOUND",
                    format!(
                        "directory was not specified and '{file}' does not exist in the working directory"
                    ),
                ));
            }

            let file_name = composite
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    PostError::configuration(
                        "INPUT.FILE_REQUIRED",
                        format!("path '{file}' does not name a file"),
                    )
                })?;
            let parent = composite.parent().unwrap_or_else(|| Path::new(""));

            Ok(ResolvedInput {
                directory: parent.to_path_buf(),
                file_name: file_name.to_string(),
            })
        }
        Some(directory) => {
            let candidate = directory.join(file);
            if !candidate.exists() {
                return Err(PostError::not_found(
                    "INPUT.PATH_NOT_FOUND",
                    format!("path '{}' does not exist", candidate.display()),
                ));
            }

            Ok(ResolvedInput {
                directory: directory.to_path_buf(),
                file_name: file.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SAVE_FILE, SaveTarget, resolve_input};
    use crate::domain::PostErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_name_is_a_configuration_error() {
        let error = resolve_input(None, None).expect_err("missing file should fail");
        assert_eq!(error.category(), PostErrorCategory::Configuration);
        assert_eq!(error.code(), "INPUT.FILE_REQUIRED");
    }

    #[test]
    fn composite_path_is_split_into_directory_and_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let report = temp.path().join("febio4.out");
        fs::write(&report, "Step = 0\n").expect("fixture should be written");

        let resolved = resolve_input(None, report.to_str())
            .expect("existing composite path should resolve");

        assert_eq!(resolved.directory(), temp.path());
        assert_eq!(resolved.file_name(), "febio4.out");
        assert_eq!(resolved.input_path(), report);
    }

    #[test]
    fn missing_composite_path_is_not_found() {
        let error =
            resolve_input(None, Some("no-such-report.out")).expect_err("missing path should fail");
        assert_eq!(error.category(), PostErrorCategory::NotFound);
    }

    #[test]
    fn directory_and_file_must_exist_together() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(temp.path().join("present.out"), "x\n").expect("fixture should be written");

        let resolved = resolve_input(Some(temp.path()), Some("present.out"))
            .expect("existing pair should resolve");
        assert_eq!(resolved.file_name(), "present.out");

        let error = resolve_input(Some(temp.path()), Some("absent.out"))
            .expect_err("missing pair should fail");
        assert_eq!(error.category(), PostErrorCategory::NotFound);
        assert!(error.message().contains("absent.out"));
    }

    #[test]
    fn save_targets_resolve_next_to_the_input() {
        let temp = TempDir::new().expect("tempdir should be created");
        let report = temp.path().join("bend.out");
        fs::write(&report, "x\n").expect("fixture should be written");

        let resolved = resolve_input(Some(temp.path()), Some("bend.out")).expect("resolve");

        assert_eq!(
            resolved.save_path(&SaveTarget::Default),
            temp.path().join(DEFAULT_SAVE_FILE)
        );
        assert_eq!(
            resolved.save_path(&SaveTarget::Named("table.csv".into())),
            temp.path().join("table.csv")
        );
        assert_eq!(resolved.save_path(&SaveTarget::Overwrite), report);
    }
}
