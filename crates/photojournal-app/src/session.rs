//! One-operation-at-a-time access to the repository for callers whose calls
//! can overlap, such as JS promises.

use photojournal_core::{PhotoGalleryState, PhotoRepository};

/// Owns the repository between operations and the state shown meanwhile.
pub struct GallerySession {
    /// `None` while an operation owns the repository.
    repository: Option<PhotoRepository>,
    /// State as of the last finished operation.
    snapshot: PhotoGalleryState,
    /// Error revision of `snapshot`.
    snapshot_revision: u64,
    /// Revision of an error dismissed while the repository was checked out.
    dismissed: Option<u64>,
}

impl GallerySession {
    pub fn new(repository: PhotoRepository) -> Self {
        Self {
            snapshot: repository.state().clone(),
            snapshot_revision: repository.error_revision(),
            repository: Some(repository),
            dismissed: None,
        }
    }

    /// Take the repository for one operation. `None` while another holds it.
    pub fn checkout(&mut self) -> Option<PhotoRepository> {
        let repository = self.repository.take()?;
        self.snapshot.loading = true;
        Some(repository)
    }

    /// Hand the repository back after an operation.
    pub fn checkin(&mut self, mut repository: PhotoRepository) {
        // A dismissal only applies to the error it was made against.
        if self.dismissed.take() == Some(repository.error_revision()) {
            repository.clear_error();
        }
        self.snapshot = repository.state().clone();
        self.snapshot_revision = repository.error_revision();
        self.repository = Some(repository);
    }

    pub fn is_busy(&self) -> bool {
        self.repository.is_none()
    }

    pub fn state(&self) -> &PhotoGalleryState {
        &self.snapshot
    }

    pub fn loading(&self) -> bool {
        self.is_busy() || self.snapshot.loading
    }

    pub fn clear_error(&mut self) {
        match self.repository.as_mut() {
            Some(repository) => repository.clear_error(),
            None => {
                if self.snapshot.error.is_some() {
                    self.dismissed = Some(self.snapshot_revision);
                }
            }
        }
        self.snapshot.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photojournal_core::capture::{CaptureOutcome, CaptureResult};
    use photojournal_core::share::NoShare;
    use photojournal_core::storage::{MemoryBlobStore, MemoryKeyValueStore};
    use photojournal_core::{BoxFuture, CaptureAdapter, CaptureError, IndexStore};
    use pollster::block_on;
    use std::sync::Arc;

    struct DeniedCamera;

    impl CaptureAdapter for DeniedCamera {
        fn capture(&self) -> BoxFuture<'_, CaptureResult<CaptureOutcome>> {
            Box::pin(async { Err(CaptureError::PermissionDenied) })
        }
    }

    fn session() -> GallerySession {
        let table = Arc::new(MemoryKeyValueStore::new());
        GallerySession::new(PhotoRepository::new(
            Arc::new(MemoryBlobStore::new()),
            IndexStore::new(table, "photos"),
            Box::new(DeniedCamera),
            Box::new(NoShare),
        ))
    }

    fn failed_capture(session: &mut GallerySession) {
        let mut repository = session.checkout().unwrap();
        block_on(repository.take_photo());
        session.checkin(repository);
    }

    #[test]
    fn test_one_operation_at_a_time() {
        let mut session = session();
        let repository = session.checkout().unwrap();
        assert!(session.checkout().is_none());
        assert!(session.loading());

        session.checkin(repository);
        assert!(!session.loading());
        assert!(session.checkout().is_some());
    }

    #[test]
    fn test_dismissed_error_stays_cleared_after_operation() {
        let mut session = session();
        failed_capture(&mut session);
        assert!(session.state().error.is_some());

        let mut repository = session.checkout().unwrap();
        session.clear_error();
        assert_eq!(session.state().error, None);

        block_on(repository.load_saved_photos());
        session.checkin(repository);
        assert_eq!(session.state().error, None);

        let repository = session.checkout().unwrap();
        assert_eq!(repository.error(), None);
    }

    #[test]
    fn test_dismissal_keeps_newer_error() {
        let mut session = session();
        failed_capture(&mut session);

        let mut repository = session.checkout().unwrap();
        session.clear_error();
        // Same message, but raised after the dismissal.
        block_on(repository.take_photo());
        session.checkin(repository);
        assert!(session.state().error.is_some());
    }
}
