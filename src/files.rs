use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

#[derive(Debug)]
pub enum FileSourceError {
    InvalidName(String),
    Io { name: String, source: io::Error },
    Internal(String),
}

impl std::fmt::Display for FileSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(reason) => f.write_str(reason),
            Self::Io { name, source } => write!(f, "write file `{name}`: {source}"),
            Self::Internal(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for FileSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidName(_) | Self::Internal(_) => None,
        }
    }
}

/// One logical destination for recorded artifacts. Names are caller-chosen
/// opaque strings; writing under an existing name overwrites it.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn write_text(&self, name: &str, content: &str) -> Result<(), FileSourceError>;
    async fn write_binary(&self, name: &str, content: &[u8]) -> Result<(), FileSourceError>;
}

/// Directory-backed file source. Blocking filesystem work runs on the tokio
/// blocking pool, one task per write.
#[derive(Debug, Clone)]
pub struct DiskFileSource {
    root: PathBuf,
}

impl DiskFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FileSourceError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| {
            FileSourceError::Internal(format!(
                "create file storage root {}: {source}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, FileSourceError> {
        if name.is_empty() {
            return Err(FileSourceError::InvalidName(
                "file name cannot be empty".to_owned(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(FileSourceError::InvalidName(format!(
                "file name `{name}` cannot contain path separators"
            )));
        }
        if name == "." || name == ".." {
            return Err(FileSourceError::InvalidName(
                "file name cannot be `.` or `..`".to_owned(),
            ));
        }
        Ok(self.root.join(name))
    }

    async fn write(&self, name: &str, content: Vec<u8>) -> Result<(), FileSourceError> {
        let path = self.resolve(name)?;
        let task_name = name.to_owned();
        tokio::task::spawn_blocking(move || {
            fs::write(&path, content).map_err(|source| FileSourceError::Io {
                name: task_name,
                source,
            })
        })
        .await
        .map_err(|err| {
            FileSourceError::Internal(format!("join write task for `{name}` failed: {err}"))
        })?
    }
}

#[async_trait]
impl FileSource for DiskFileSource {
    async fn write_text(&self, name: &str, content: &str) -> Result<(), FileSourceError> {
        self.write(name, content.as_bytes().to_vec()).await
    }

    async fn write_binary(&self, name: &str, content: &[u8]) -> Result<(), FileSourceError> {
        self.write(name, content.to_vec()).await
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{DiskFileSource, FileSource, FileSourceError};

    #[tokio::test]
    async fn writes_text_and_binary_under_the_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = DiskFileSource::new(temp_dir.path().join("files")).unwrap();

        source.write_text("mapping-a.json", "{}").await.unwrap();
        source
            .write_binary("body-a.json", &[0x1f, 0x8b, 0x00])
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(source.root().join("mapping-a.json")).unwrap(),
            "{}"
        );
        assert_eq!(
            fs::read(source.root().join("body-a.json")).unwrap(),
            vec![0x1f, 0x8b, 0x00]
        );
    }

    #[tokio::test]
    async fn writing_the_same_name_overwrites() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = DiskFileSource::new(temp_dir.path()).unwrap();

        source.write_text("mapping-a.json", "first").await.unwrap();
        source.write_text("mapping-a.json", "second").await.unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("mapping-a.json")).unwrap(),
            "second"
        );
    }

    #[tokio::test]
    async fn rejects_names_with_path_separators() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = DiskFileSource::new(temp_dir.path()).unwrap();

        let err = source.write_text("../escape.json", "{}").await.unwrap_err();
        assert!(
            matches!(err, FileSourceError::InvalidName(_)),
            "error: {err}"
        );

        let err = source.write_text("", "{}").await.unwrap_err();
        assert!(
            matches!(err, FileSourceError::InvalidName(_)),
            "error: {err}"
        );
    }

    #[test]
    fn new_creates_the_root_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("nested").join("mappings");
        let source = DiskFileSource::new(&root).unwrap();
        assert!(source.root().is_dir());
    }
}
