//! The photo repository.
//!
//! Owns the in-memory gallery and keeps it, the blob store and the index in
//! agreement:
//!
//! - a blob is written before the index entry that references it is saved;
//! - every mutation builds the new photo list, persists it, and only then
//!   replaces the in-memory list;
//! - index records whose blob has gone missing are dropped on load.
//!
//! Mutating operations take `&mut self`, so they never interleave. Public
//! operations do not return errors: failures land in the sticky error slot of
//! [`PhotoGalleryState`] until [`PhotoRepository::clear_error`] is called.

use crate::capture::{CaptureAdapter, CaptureOutcome, RawImage, resolve_raw_image};
use crate::error::GalleryError;
use crate::photo::{Photo, PhotoGalleryState, PhotoPhase, next_photo_id};
use crate::share::{ShareRequest, ShareTarget};
use crate::storage::{BlobStore, IndexStore, StorageError, StorageRef};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Create/read/update/delete over the photo journal.
pub struct PhotoRepository {
    blobs: Arc<dyn BlobStore>,
    index: IndexStore,
    camera: Box<dyn CaptureAdapter>,
    share: Box<dyn ShareTarget>,
    state: PhotoGalleryState,
    /// Bumped each time an error is recorded.
    error_revision: u64,
}

impl PhotoRepository {
    /// Create a repository with an empty gallery. Call
    /// [`load_saved_photos`](Self::load_saved_photos) to populate it.
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        index: IndexStore,
        camera: Box<dyn CaptureAdapter>,
        share: Box<dyn ShareTarget>,
    ) -> Self {
        Self {
            blobs,
            index,
            camera,
            share,
            state: PhotoGalleryState::default(),
            error_revision: 0,
        }
    }

    /// Create a repository over the platform stores for `config`.
    pub fn open_default(
        config: &crate::GalleryConfig,
        camera: Box<dyn CaptureAdapter>,
        share: Box<dyn ShareTarget>,
    ) -> Result<Self, GalleryError> {
        let (blobs, index) = crate::storage::create_default_stores(config)?;
        log::info!(
            "Opened {} photo storage ({})",
            crate::Platform::current().name(),
            config.app_name
        );
        Ok(Self::new(blobs, index, camera, share))
    }

    pub fn state(&self) -> &PhotoGalleryState {
        &self.state
    }

    /// Photos, newest first.
    pub fn photos(&self) -> &[Photo] {
        &self.state.photos
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Changes whenever a new error is recorded, even one with the same
    /// message as the last.
    pub fn error_revision(&self) -> u64 {
        self.error_revision
    }

    fn report(&mut self, error: &GalleryError) {
        self.state.error = Some(error.user_message());
        self.error_revision += 1;
    }

    /// Look up a photo in the in-memory gallery.
    pub fn get_photo_by_id(&self, id: &str) -> Option<&Photo> {
        self.state.find(id)
    }

    fn enter(&mut self, phase: PhotoPhase) {
        log::debug!("Photo phase: {}", phase);
        self.state.phase = Some(phase);
    }

    fn finish(&mut self) {
        self.state.loading = false;
        self.state.phase = None;
    }

    fn fail(&mut self, operation: &str, error: GalleryError) {
        log::error!("Failed to {}: {}", operation, error);
        self.report(&error);
        self.finish();
    }

    /// Rebuild the gallery from the index, dropping records whose blob is
    /// missing. The index itself is left untouched.
    pub async fn load_saved_photos(&mut self) {
        self.state.loading = true;

        let records = match self.index.load().await {
            Ok(records) => records,
            Err(e) => return self.fail("load photos", e.into()),
        };

        let mut seen = HashSet::new();
        let mut valid = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id.clone()) {
                log::warn!("Skipping duplicate photo id {}", record.id);
                continue;
            }

            let reference = StorageRef::new(record.filepath.clone());
            match self.blobs.exists(&reference).await {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!("Photo file not found: {}", record.filepath);
                    continue;
                }
                Err(e) => {
                    log::warn!("Cannot check photo file {}: {}", record.filepath, e);
                    continue;
                }
            }

            match self.blobs.to_renderable(&reference).await {
                Ok(uri) => valid.push(Photo {
                    webview_path: Some(uri),
                    ..record
                }),
                Err(e) => log::warn!("Cannot render photo {}: {}", record.filepath, e),
            }
        }

        log::info!("Loaded {} photos", valid.len());
        self.state.photos = valid;
        self.finish();
    }

    /// Capture a photo and save it. `None` when the user cancels or on
    /// failure (see [`error`](Self::error)).
    pub async fn take_photo(&mut self) -> Option<Photo> {
        self.state.error = None;
        self.state.loading = true;
        self.enter(PhotoPhase::Capturing);

        if !self.camera.is_supported() {
            self.fail("take photo", GalleryError::UnsupportedEnvironment);
            return None;
        }

        let raw = match self.camera.capture().await {
            Ok(CaptureOutcome::Captured(raw)) => raw,
            Ok(CaptureOutcome::Cancelled) => {
                log::info!("Photo capture cancelled");
                self.finish();
                return None;
            }
            Err(e) => {
                self.fail("take photo", e.into());
                return None;
            }
        };

        self.save_picture(raw).await
    }

    /// Store a captured image as a new, untitled photo at the front of the
    /// gallery.
    pub async fn save_picture(&mut self, raw: RawImage) -> Option<Photo> {
        self.state.loading = true;
        match self.persist_picture(raw).await {
            Ok(photo) => {
                self.finish();
                Some(photo)
            }
            Err(e) => {
                self.fail("save photo", e);
                None
            }
        }
    }

    async fn persist_picture(&mut self, raw: RawImage) -> Result<Photo, GalleryError> {
        self.enter(PhotoPhase::Saving);
        let image = resolve_raw_image(&*self.camera, raw).await?;

        let now = Utc::now();
        let id = next_photo_id(now, &self.state.photos);
        let file_name = Photo::file_name_for(&id, image.format.extension());

        let reference = self.blobs.write(&file_name, &image).await?;
        match self.index_new_photo(id, &reference, now).await {
            Ok(photo) => {
                self.enter(PhotoPhase::Persisted);
                log::info!("Saved photo {} ({} bytes)", photo.id, image.len());
                Ok(photo)
            }
            Err(e) => {
                // Without an index entry the blob is unreachable.
                if let Err(cleanup) = self.blobs.delete(&reference).await {
                    log::warn!("Leaving orphaned photo {}: {}", reference, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Record a freshly written blob at the front of the gallery.
    async fn index_new_photo(
        &mut self,
        id: String,
        reference: &StorageRef,
        now: chrono::DateTime<Utc>,
    ) -> Result<Photo, GalleryError> {
        let webview_path = self.blobs.to_renderable(reference).await?;
        let photo = Photo::new(id, reference.as_str(), now).with_webview_path(webview_path);

        let mut updated = Vec::with_capacity(self.state.photos.len() + 1);
        updated.push(photo.clone());
        updated.extend(self.state.photos.iter().cloned());

        self.index.save(&updated).await?;
        self.state.photos = updated;
        Ok(photo)
    }

    /// Set the title of `photo`.
    pub async fn save_photo_with_title(&mut self, photo: &Photo, title: &str) {
        self.update_photo_title(&photo.id, title).await;
    }

    /// Set the title of the photo with `id`. Unknown ids are ignored.
    pub async fn update_photo_title(&mut self, id: &str, title: &str) {
        if !self.state.contains(id) {
            log::warn!("Cannot retitle unknown photo {}", id);
            return;
        }

        let updated: Vec<Photo> = self
            .state
            .photos
            .iter()
            .map(|p| {
                if p.id == id {
                    Photo {
                        title: title.to_string(),
                        ..p.clone()
                    }
                } else {
                    p.clone()
                }
            })
            .collect();

        match self.index.save(&updated).await {
            Ok(()) => self.state.photos = updated,
            Err(e) => {
                let e = GalleryError::from(e);
                log::error!("Failed to update title of {}: {}", id, e);
                self.report(&e);
            }
        }
    }

    /// Delete a photo's blob and its index entry.
    ///
    /// A blob that is already gone is not an error. Any other blob failure
    /// aborts and keeps the index entry. Deleting a photo that is not in the
    /// gallery does nothing.
    pub async fn delete_photo(&mut self, photo: &Photo) {
        let Some(filepath) = self.state.find(&photo.id).map(|p| p.filepath.clone()) else {
            log::debug!("Photo {} already deleted", photo.id);
            return;
        };

        self.state.loading = true;
        self.enter(PhotoPhase::Deleting);

        match self.blobs.delete(&StorageRef::new(filepath.clone())).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                log::warn!("Photo file already missing: {}", filepath);
            }
            Err(e) => return self.fail("delete photo", e.into()),
        }

        let updated: Vec<Photo> = self
            .state
            .photos
            .iter()
            .filter(|p| p.id != photo.id)
            .cloned()
            .collect();

        // The blob is gone either way, so the gallery drops the entry even if
        // the index write fails; the next load skips the stale record.
        let saved = self.index.save(&updated).await;
        self.state.photos = updated;
        self.enter(PhotoPhase::Deleted);
        match saved {
            Ok(()) => {
                log::info!("Deleted photo {}", photo.id);
                self.finish();
            }
            Err(e) => self.fail("delete photo", e.into()),
        }
    }

    /// Hand a photo to the host share sheet.
    pub async fn share_photo(&mut self, photo: &Photo) {
        if let Err(e) = self.share.share(ShareRequest::for_photo(photo)).await {
            let e = GalleryError::from(e);
            log::error!("Failed to share photo {}: {}", photo.id, e);
            self.report(&e);
        }
    }

    /// Delete blobs that no index entry references. Returns how many were
    /// removed.
    pub async fn collect_orphans(&mut self) -> usize {
        self.state.loading = true;
        match self.remove_unreferenced_blobs().await {
            Ok(removed) => {
                self.finish();
                removed
            }
            Err(e) => {
                self.fail("clean up photo storage", e);
                0
            }
        }
    }

    async fn remove_unreferenced_blobs(&self) -> Result<usize, GalleryError> {
        let records = self.index.load().await?;
        let referenced: HashSet<StorageRef> = records
            .iter()
            .filter_map(|p| self.blobs.canonical(&StorageRef::new(p.filepath.clone())).ok())
            .collect();

        let mut removed = 0;
        for reference in self.blobs.list().await? {
            match self.blobs.canonical(&reference) {
                Ok(canonical) if !referenced.contains(&canonical) => {}
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping unresolvable photo {}: {}", reference, e);
                    continue;
                }
            }
            match self.blobs.delete(&reference).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {
                    log::info!("Removed orphaned photo {}", reference);
                    removed += 1;
                }
                Err(e) => log::warn!("Cannot remove orphaned photo {}: {}", reference, e),
            }
        }
        Ok(removed)
    }
}
