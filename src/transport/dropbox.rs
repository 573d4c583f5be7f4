use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::Dropbox;
use crate::error::TransportError;

/// 挂载到本地的 SAP dropbox 目录；目录必须已存在
#[derive(Debug, Clone)]
pub struct DirectoryDropbox {
    root: PathBuf,
}

impl DirectoryDropbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Dropbox for DirectoryDropbox {
    async fn put(&self, file_name: &str, contents: &str) -> Result<(), TransportError> {
        if !tokio::fs::try_exists(&self.root).await? {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dropbox directory '{}' does not exist", self.root.display()),
            )
            .into());
        }
        let path = self.root.join(file_name);
        debug!(path = %path.display(), bytes = contents.len(), "writing dropbox file");
        tokio::fs::write(&path, contents.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_into_dropbox_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dropbox = DirectoryDropbox::new(dir.path());
        dropbox.put("dlibsapg.0003.20220111000000", "B...\n").await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("dlibsapg.0003.20220111000000")).unwrap();
        assert_eq!(written, "B...\n");
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dropbox = DirectoryDropbox::new(dir.path().join("not-mounted"));
        assert!(dropbox.put("x", "y").await.is_err());
    }
}
