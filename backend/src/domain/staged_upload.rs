//! Transient storage for uploaded images.
//!
//! An uploaded image is streamed into a named temporary file inside the
//! configured staging directory and lives only for the duration of one
//! generation request. [`StagedUpload::release`] removes the file and may be
//! called any number of times; dropping an unreleased upload removes the file
//! as well, so early returns and cancelled requests cannot leave orphans.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::{Stream, StreamExt, stream};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::SourceReference;

const STAGED_FILE_PREFIX: &str = "upload-";

/// Failures raised while staging an upload.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// The staging directory or file could not be created.
    #[error("failed to prepare staging area {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Writing upload bytes to disk failed.
    #[error("failed to write staged upload: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
    /// The client stream broke off mid-upload.
    #[error("upload stream failed: {message}")]
    Stream { message: String },
}

/// Factory for [`StagedUpload`] values rooted in one directory.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    dir: PathBuf,
}

impl UploadStaging {
    /// Stage uploads under `dir`, which is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding staged files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream `chunks` into a fresh staged file.
    ///
    /// On any error the partially written file is removed before returning.
    pub async fn stage<S, C, E>(
        &self,
        file_name: Option<String>,
        content_type: Option<String>,
        mut chunks: S,
    ) -> Result<StagedUpload, StagingError>
    where
        S: Stream<Item = Result<C, E>> + Unpin,
        C: AsRef<[u8]>,
        E: fmt::Display,
    {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| self.prepare_error(source))?;
        let (file, path) = self.create_temp_file().await?.into_parts();

        let mut upload = StagedUpload {
            path: Some(path),
            file_name,
            content_type,
            size_bytes: 0,
        };
        let mut file = tokio::fs::File::from_std(file);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|error| StagingError::Stream {
                message: error.to_string(),
            })?;
            let bytes = chunk.as_ref();
            file.write_all(bytes)
                .await
                .map_err(|source| StagingError::Write { source })?;
            upload.size_bytes += bytes.len() as u64;
        }
        file.flush()
            .await
            .map_err(|source| StagingError::Write { source })?;

        debug!(
            size_bytes = upload.size_bytes,
            path = ?upload.path(),
            "upload staged"
        );
        Ok(upload)
    }

    /// Stage an in-memory buffer.
    pub async fn stage_bytes(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StagedUpload, StagingError> {
        let chunks = stream::iter([Ok::<_, io::Error>(bytes)]);
        self.stage(
            file_name.map(str::to_owned),
            content_type.map(str::to_owned),
            chunks,
        )
        .await
    }

    /// Create the backing file on the blocking pool.
    ///
    /// A file created after the caller went away is dropped with the task
    /// output, which deletes it.
    async fn create_temp_file(&self) -> Result<NamedTempFile, StagingError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGED_FILE_PREFIX)
                .tempfile_in(dir)
        })
        .await
        .map_err(|err| self.prepare_error(io::Error::other(err)))?
        .map_err(|source| self.prepare_error(source))
    }

    fn prepare_error(&self, source: io::Error) -> StagingError {
        StagingError::Prepare {
            path: self.dir.clone(),
            source,
        }
    }
}

/// An uploaded image held on local disk for one request.
#[derive(Debug)]
pub struct StagedUpload {
    path: Option<TempPath>,
    file_name: Option<String>,
    content_type: Option<String>,
    size_bytes: u64,
}

impl StagedUpload {
    /// Location of the staged file, or `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name supplied by the client, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// MIME type supplied by the client, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Number of bytes written to disk.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Whether the client sent no image bytes at all.
    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }

    /// Reference stored in history for the submitted image.
    pub fn source_reference(&self) -> SourceReference {
        SourceReference::from_file_name(self.file_name())
    }

    /// Whether [`Self::release`] has already run.
    pub fn is_released(&self) -> bool {
        self.path.is_none()
    }

    /// Remove the staged file.
    ///
    /// Idempotent: releasing twice, or releasing a file somebody else already
    /// deleted, succeeds.
    pub fn release(&mut self) -> io::Result<()> {
        let Some(path) = self.path.take() else {
            return Ok(());
        };
        match path.close() {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn staging_dir() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    #[rstest]
    #[tokio::test]
    async fn stage_writes_all_chunks(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(b"abc".to_vec()),
            Ok(b"defg".to_vec()),
        ]);

        let upload = staging
            .stage(Some("face.png".into()), Some("image/png".into()), chunks)
            .await
            .expect("stage");

        let path = upload.path().expect("live upload");
        assert_eq!(std::fs::read(path).expect("read back"), b"abcdefg");
        assert_eq!(upload.size_bytes(), 7);
        assert_eq!(upload.source_reference().as_str(), "face.png");
        assert!(path.starts_with(staging_dir.path()));
    }

    #[rstest]
    #[tokio::test]
    async fn release_removes_file_and_is_idempotent(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());
        let mut upload = staging
            .stage_bytes(None, None, b"bytes")
            .await
            .expect("stage");
        let path = upload.path().expect("live upload").to_path_buf();

        upload.release().expect("first release");
        upload.release().expect("second release");

        assert!(!path.exists());
        assert!(upload.is_released());
    }

    #[rstest]
    #[tokio::test]
    async fn release_tolerates_externally_removed_file(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());
        let mut upload = staging
            .stage_bytes(None, None, b"bytes")
            .await
            .expect("stage");
        let path = upload.path().expect("live upload").to_path_buf();
        std::fs::remove_file(&path).expect("external removal");

        upload.release().expect("release after removal");
    }

    #[rstest]
    #[tokio::test]
    async fn dropping_unreleased_upload_removes_file(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());
        let upload = staging
            .stage_bytes(None, None, b"bytes")
            .await
            .expect("stage");
        let path = upload.path().expect("live upload").to_path_buf();

        drop(upload);

        assert!(!path.exists());
    }

    #[rstest]
    #[tokio::test]
    async fn broken_stream_leaves_no_file_behind(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());
        let chunks = stream::iter(vec![
            Ok(b"partial".to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ]);

        let error = staging
            .stage(None, None, chunks)
            .await
            .expect_err("stream error");

        assert!(matches!(error, StagingError::Stream { .. }));
        let leftovers = std::fs::read_dir(staging_dir.path())
            .expect("list staging dir")
            .count();
        assert_eq!(leftovers, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn creates_missing_staging_directory(staging_dir: TempDir) {
        let nested = staging_dir.path().join("nested").join("uploads");
        let staging = UploadStaging::new(&nested);

        let upload = staging
            .stage_bytes(None, None, b"x")
            .await
            .expect("stage");

        assert!(nested.is_dir());
        assert!(upload.path().is_some_and(|path| path.starts_with(&nested)));
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_stages_get_distinct_files(staging_dir: TempDir) {
        let staging = UploadStaging::new(staging_dir.path());

        let uploads = futures_util::future::join_all(
            (0_u8..8).map(|n| {
                let staging = staging.clone();
                async move { staging.stage_bytes(None, None, &[n; 4]).await }
            }),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("stage all");

        let mut paths = uploads
            .iter()
            .filter_map(StagedUpload::path)
            .map(Path::to_path_buf)
            .collect::<Vec<_>>();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
        for (n, upload) in (0_u8..).zip(&uploads) {
            let path = upload.path().expect("live upload");
            assert_eq!(std::fs::read(path).expect("read back"), vec![n; 4]);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn staging_under_a_file_is_a_prepare_error(staging_dir: TempDir) {
        let blocker = staging_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").expect("write blocker");
        let staging = UploadStaging::new(&blocker);

        let error = staging
            .stage_bytes(None, None, b"x")
            .await
            .expect_err("cannot stage under a file");

        assert!(matches!(error, StagingError::Prepare { ref path, .. } if path == &blocker));
    }
}
