//! Cloud sync of notes.json
//!
//! Last writer wins. Pull only fills in a missing local file; push always
//! overwrites the remote copy. Both are skipped, not retried, when the
//! network is unreachable.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::NoteflowError;
use crate::google_api::{drive, GoogleApiError, TokenStore};

const PROBE_ADDR: &str = "www.google.com:80";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[async_trait]
pub trait SyncAdapter: Send + Sync {
    async fn is_reachable(&self) -> bool;
    async fn push(&self, blob: Vec<u8>) -> Result<(), NoteflowError>;
    async fn pull(&self) -> Result<Option<Vec<u8>>, NoteflowError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed,
    Pulled,
    /// Pull found a local file and left it alone.
    LocalKept,
    /// Pull found nothing on the remote side.
    NothingRemote,
    Offline,
}

/// TCP connect to a well-known host.
pub async fn is_connected() -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(PROBE_ADDR)).await,
        Ok(Ok(_))
    )
}

/// Applies the sync policy on top of an adapter.
pub struct SyncCoordinator {
    adapter: Arc<dyn SyncAdapter>,
}

impl SyncCoordinator {
    pub fn new(adapter: Arc<dyn SyncAdapter>) -> Self {
        Self { adapter }
    }

    /// Upload the local notes file.
    pub async fn push_local(&self, path: &Path) -> Result<SyncOutcome, NoteflowError> {
        if !self.adapter.is_reachable().await {
            log::info!("No internet connection; skipping upload");
            return Ok(SyncOutcome::Offline);
        }
        let blob = tokio::fs::read(path).await?;
        self.adapter.push(blob).await?;
        Ok(SyncOutcome::Pushed)
    }

    /// Download the remote copy when there is no local file yet.
    pub async fn pull_if_missing(&self, path: &Path) -> Result<SyncOutcome, NoteflowError> {
        if path.exists() {
            return Ok(SyncOutcome::LocalKept);
        }
        if !self.adapter.is_reachable().await {
            log::info!("No internet connection; cannot download notes");
            return Ok(SyncOutcome::Offline);
        }
        match self.adapter.pull().await? {
            Some(blob) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, blob).await?;
                Ok(SyncOutcome::Pulled)
            }
            None => Ok(SyncOutcome::NothingRemote),
        }
    }
}

/// A connection that drops after the reachability check is reported as
/// `Unreachable` rather than as a Drive error.
fn drive_error(err: GoogleApiError) -> NoteflowError {
    match err {
        GoogleApiError::Http(e) if e.is_connect() || e.is_timeout() => {
            log::warn!("Google Drive unreachable: {}", e);
            NoteflowError::Unreachable
        }
        other => NoteflowError::Google(other),
    }
}

/// Google Drive backed adapter.
pub struct DriveSync {
    client: reqwest::Client,
    tokens: Arc<TokenStore>,
    file_name: String,
}

impl DriveSync {
    pub fn new(tokens: Arc<TokenStore>, file_name: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            file_name: file_name.into(),
        }
    }
}

#[async_trait]
impl SyncAdapter for DriveSync {
    async fn is_reachable(&self) -> bool {
        is_connected().await
    }

    async fn push(&self, blob: Vec<u8>) -> Result<(), NoteflowError> {
        let token = self.tokens.valid_access_token().await?;
        drive::upload_json(&self.client, &token, &self.file_name, blob)
            .await
            .map_err(drive_error)?;
        Ok(())
    }

    async fn pull(&self) -> Result<Option<Vec<u8>>, NoteflowError> {
        let token = self.tokens.valid_access_token().await?;
        drive::download(&self.client, &token, &self.file_name)
            .await
            .map_err(drive_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeRemote {
        reachable: bool,
        remote: Mutex<Option<Vec<u8>>>,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn new(reachable: bool, remote: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reachable,
                remote: Mutex::new(remote.map(|s| s.as_bytes().to_vec())),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SyncAdapter for FakeRemote {
        async fn is_reachable(&self) -> bool {
            self.reachable
        }

        async fn push(&self, blob: Vec<u8>) -> Result<(), NoteflowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.remote.lock().unwrap() = Some(blob);
            Ok(())
        }

        async fn pull(&self) -> Result<Option<Vec<u8>>, NoteflowError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.remote.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn push_is_skipped_when_unreachable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{}").unwrap();

        let remote = FakeRemote::new(false, None);
        let sync = SyncCoordinator::new(remote.clone());
        assert_eq!(sync.push_local(&path).await.unwrap(), SyncOutcome::Offline);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn push_overwrites_remote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "local").unwrap();

        let remote = FakeRemote::new(true, Some("older remote"));
        let sync = SyncCoordinator::new(remote.clone());
        assert_eq!(sync.push_local(&path).await.unwrap(), SyncOutcome::Pushed);
        assert_eq!(
            remote.remote.lock().unwrap().as_deref(),
            Some("local".as_bytes())
        );
    }

    #[tokio::test]
    async fn pull_keeps_existing_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "local").unwrap();

        let remote = FakeRemote::new(true, Some("remote"));
        let sync = SyncCoordinator::new(remote.clone());
        assert_eq!(sync.pull_if_missing(&path).await.unwrap(), SyncOutcome::LocalKept);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "local");
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pull_fills_missing_local_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("notes.json");

        let remote = FakeRemote::new(true, Some("remote"));
        let sync = SyncCoordinator::new(remote);
        assert_eq!(sync.pull_if_missing(&path).await.unwrap(), SyncOutcome::Pulled);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "remote");
    }

    #[tokio::test]
    async fn pull_without_remote_file_or_network() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.json");

        let empty = SyncCoordinator::new(FakeRemote::new(true, None));
        assert_eq!(
            empty.pull_if_missing(&path).await.unwrap(),
            SyncOutcome::NothingRemote
        );

        let offline_remote = FakeRemote::new(false, Some("remote"));
        let offline = SyncCoordinator::new(offline_remote.clone());
        assert_eq!(offline.pull_if_missing(&path).await.unwrap(), SyncOutcome::Offline);
        assert_eq!(offline_remote.calls.load(Ordering::SeqCst), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(
            drive_error(GoogleApiError::Http(err)),
            NoteflowError::Unreachable
        ));
        assert!(matches!(
            drive_error(GoogleApiError::AuthExpired),
            NoteflowError::Google(GoogleApiError::AuthExpired)
        ));
    }
}
