//! WebAssembly entry point and the JS-facing gallery handle.

use js_sys::Promise;
use photojournal_core::capture::WebCamera;
use photojournal_core::storage::LOCAL_REF_SCHEME;
use crate::session::GallerySession;
use photojournal_core::{
    BoxFuture, GalleryConfig, Photo, PhotoRepository, ShareError, ShareRequest, ShareTarget,
};
use serde::Serialize;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};

const BUSY: &str = "Another photo operation is still running";

#[wasm_bindgen(start)]
pub fn run_wasm() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Already set when the module is instantiated twice.
    let _ = console_log::init_with_level(log::Level::Info);

    log::info!("Starting Photo Journal (WASM)");
}

/// Photo as handed to JS, including the display URI.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PhotoView<'a> {
    id: &'a str,
    filepath: &'a str,
    title: &'a str,
    webview_path: Option<&'a str>,
    created_at: String,
}

impl<'a> From<&'a Photo> for PhotoView<'a> {
    fn from(photo: &'a Photo) -> Self {
        Self {
            id: &photo.id,
            filepath: &photo.filepath,
            title: &photo.title,
            webview_path: photo.webview_path.as_deref(),
            created_at: photo.created_at.to_rfc3339(),
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn photo_value(photo: Option<&Photo>) -> Result<JsValue, JsValue> {
    match photo {
        Some(photo) => to_js(&PhotoView::from(photo)),
        None => Ok(JsValue::UNDEFINED),
    }
}

/// Shares through `navigator.share` where the browser offers it.
#[derive(Default)]
pub struct NavigatorShare;

impl ShareTarget for NavigatorShare {
    fn share(&self, request: ShareRequest) -> BoxFuture<'_, Result<(), ShareError>> {
        Box::pin(async move {
            let navigator = web_sys::window()
                .ok_or(ShareError::Unavailable)?
                .navigator();
            let share = js_sys::Reflect::get(&navigator, &JsValue::from_str("share"))
                .ok()
                .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
                .ok_or(ShareError::Unavailable)?;

            let data = js_sys::Object::new();
            let set = |key: &str, value: &str| {
                js_sys::Reflect::set(&data, &JsValue::from_str(key), &JsValue::from_str(value))
                    .map_err(|e| ShareError::Failed(format!("{:?}", e)))
            };
            set("title", &request.title)?;
            set("text", &request.text)?;
            // Blobs kept in local storage have no URL another app could open.
            if !request.url.starts_with(LOCAL_REF_SCHEME) {
                set("url", &request.url)?;
            }

            let promise = share
                .call1(&navigator, &data)
                .map_err(|e| ShareError::Failed(format!("{:?}", e)))?
                .dyn_into::<Promise>()
                .map_err(|_| ShareError::Unavailable)?;
            match JsFuture::from(promise).await {
                Ok(_) => Ok(()),
                Err(e) => match e.dyn_ref::<web_sys::DomException>().map(|d| d.name()) {
                    Some(name) if name == "AbortError" => {
                        log::info!("Share dismissed");
                        Ok(())
                    }
                    Some(name) if name == "NotAllowedError" => Err(ShareError::Unavailable),
                    _ => Err(ShareError::Failed(format!("{:?}", e))),
                },
            }
        })
    }
}

/// Gallery handle exported to JS.
///
/// One mutating call at a time: a call made while another is still pending
/// is rejected.
#[wasm_bindgen]
pub struct WebGallery {
    session: Rc<RefCell<GallerySession>>,
}

impl WebGallery {
    fn spawn<F, Fut>(&self, op: F) -> Promise
    where
        F: FnOnce(PhotoRepository) -> Fut,
        Fut: Future<Output = (PhotoRepository, Result<JsValue, JsValue>)> + 'static,
    {
        let Some(repository) = self.session.borrow_mut().checkout() else {
            return Promise::reject(&JsValue::from_str(BUSY));
        };

        let session = self.session.clone();
        let work = op(repository);
        future_to_promise(async move {
            let (repository, result) = work.await;
            session.borrow_mut().checkin(repository);
            result
        })
    }
}

#[wasm_bindgen]
impl WebGallery {
    /// Open the gallery over browser local storage.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebGallery, JsValue> {
        let repository = PhotoRepository::open_default(
            &GalleryConfig::default(),
            Box::new(WebCamera::new()),
            Box::new(NavigatorShare),
        )
        .map_err(|e| JsValue::from_str(&e.user_message()))?;
        Ok(Self {
            session: Rc::new(RefCell::new(GallerySession::new(repository))),
        })
    }

    /// Rebuild the gallery from storage.
    pub fn load(&self) -> Promise {
        self.spawn(|mut repository| async move {
            repository.load_saved_photos().await;
            (repository, Ok(JsValue::UNDEFINED))
        })
    }

    /// Resolves with the new photo, or `undefined` when nothing was saved.
    #[wasm_bindgen(js_name = takePhoto)]
    pub fn take_photo(&self) -> Promise {
        self.spawn(|mut repository| async move {
            let photo = repository.take_photo().await;
            let value = photo_value(photo.as_ref());
            (repository, value)
        })
    }

    #[wasm_bindgen(js_name = savePhotoWithTitle)]
    pub fn save_photo_with_title(&self, id: String, title: String) -> Promise {
        self.spawn(|mut repository| async move {
            if let Some(photo) = repository.get_photo_by_id(&id).cloned() {
                repository.save_photo_with_title(&photo, &title).await;
            }
            (repository, Ok(JsValue::UNDEFINED))
        })
    }

    #[wasm_bindgen(js_name = updatePhotoTitle)]
    pub fn update_photo_title(&self, id: String, title: String) -> Promise {
        self.spawn(|mut repository| async move {
            repository.update_photo_title(&id, &title).await;
            (repository, Ok(JsValue::UNDEFINED))
        })
    }

    #[wasm_bindgen(js_name = deletePhoto)]
    pub fn delete_photo(&self, id: String) -> Promise {
        self.spawn(|mut repository| async move {
            if let Some(photo) = repository.get_photo_by_id(&id).cloned() {
                repository.delete_photo(&photo).await;
            }
            (repository, Ok(JsValue::UNDEFINED))
        })
    }

    #[wasm_bindgen(js_name = sharePhoto)]
    pub fn share_photo(&self, id: String) -> Promise {
        self.spawn(|mut repository| async move {
            if let Some(photo) = repository.get_photo_by_id(&id).cloned() {
                repository.share_photo(&photo).await;
            }
            (repository, Ok(JsValue::UNDEFINED))
        })
    }

    /// Delete stored blobs no index entry refers to. Resolves with the count.
    #[wasm_bindgen(js_name = collectOrphans)]
    pub fn collect_orphans(&self) -> Promise {
        self.spawn(|mut repository| async move {
            let removed = repository.collect_orphans().await;
            (repository, Ok(JsValue::from_f64(removed as f64)))
        })
    }

    #[wasm_bindgen(js_name = getPhotoById)]
    pub fn get_photo_by_id(&self, id: &str) -> Result<JsValue, JsValue> {
        photo_value(self.session.borrow().state().find(id))
    }

    #[wasm_bindgen(getter)]
    pub fn photos(&self) -> Result<JsValue, JsValue> {
        let session = self.session.borrow();
        let views: Vec<PhotoView<'_>> = session.state().photos.iter().map(PhotoView::from).collect();
        to_js(&views)
    }

    #[wasm_bindgen(getter)]
    pub fn loading(&self) -> bool {
        self.session.borrow().loading()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.session.borrow().state().error.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> Option<String> {
        self.session.borrow().state().phase.map(|p| p.to_string())
    }

    /// Dismiss the current error, including while an operation is running.
    #[wasm_bindgen(js_name = clearError)]
    pub fn clear_error(&self) {
        self.session.borrow_mut().clear_error();
    }
}
