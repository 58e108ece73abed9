//! Browser camera: live preview over `getUserMedia` with capture/cancel
//! controls, grabbing one JPEG frame.

use super::{CaptureAdapter, CaptureError, CaptureOutcome, CaptureResult, RawImage, decode_data_url};
use crate::BoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, DomException, Element, HtmlButtonElement,
    HtmlCanvasElement, HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack,
};

const JPEG_QUALITY: f64 = 0.9;
const IDEAL_WIDTH: f64 = 1920.0;
const IDEAL_HEIGHT: f64 = 1080.0;

const MODAL_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
    background: rgba(0, 0, 0, 0.9); display: flex; flex-direction: column; \
    align-items: center; justify-content: center; z-index: 9999;";
const VIDEO_STYLE: &str = "max-width: 90%; max-height: 70%; border-radius: 8px;";
const TITLE_STYLE: &str = "color: white; margin-bottom: 20px; font-size: 24px; font-weight: bold;";
const BUTTONS_STYLE: &str = "margin-top: 20px; display: flex; gap: 15px;";
const CAPTURE_BUTTON_STYLE: &str = "background: #3b82f6; color: white; border: none; \
    padding: 12px 24px; border-radius: 8px; font-size: 16px; font-weight: 600; cursor: pointer;";
const CANCEL_BUTTON_STYLE: &str = "background: #ef4444; color: white; border: none; \
    padding: 12px 24px; border-radius: 8px; font-size: 16px; font-weight: 600; cursor: pointer;";

/// Camera capture through the browser's media devices.
#[derive(Default)]
pub struct WebCamera;

impl WebCamera {
    pub fn new() -> Self {
        Self
    }
}

/// Holds the acquired stream and the preview overlay.
///
/// Dropping it stops every track and removes the overlay, whichever way the
/// capture ends.
struct CaptureSession {
    stream: MediaStream,
    modal: Option<Element>,
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let tracks = self.stream.get_tracks();
        for track in tracks.iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        if let Some(modal) = self.modal.take() {
            modal.remove();
        }
    }
}

fn js_error(context: &str, e: JsValue) -> CaptureError {
    CaptureError::Unknown(format!("{}: {:?}", context, e))
}

/// Map a `getUserMedia` rejection onto the capture error kinds.
fn media_error(e: JsValue) -> CaptureError {
    match e.dyn_ref::<DomException>().map(|d| d.name()) {
        Some(name) if name == "NotAllowedError" || name == "SecurityError" => {
            CaptureError::PermissionDenied
        }
        Some(name) if name == "NotFoundError" || name == "OverconstrainedError" => {
            CaptureError::DeviceNotFound
        }
        Some(name) if name == "NotSupportedError" => CaptureError::Unsupported,
        _ => CaptureError::Unknown(format!("Cannot access the camera: {:?}", e)),
    }
}

fn document() -> CaptureResult<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or(CaptureError::Unsupported)
}

fn styled(document: &Document, tag: &str, style: &str) -> CaptureResult<Element> {
    let element = document
        .create_element(tag)
        .map_err(|e| js_error("createElement", e))?;
    element
        .set_attribute("style", style)
        .map_err(|e| js_error("setAttribute", e))?;
    Ok(element)
}

async fn open_stream() -> CaptureResult<MediaStream> {
    let devices = web_sys::window()
        .ok_or(CaptureError::Unsupported)?
        .navigator()
        .media_devices()
        .map_err(|_| CaptureError::Unsupported)?;

    let video = js_sys::Object::new();
    let set = |target: &js_sys::Object, key: &str, value: &JsValue| {
        js_sys::Reflect::set(target, &JsValue::from_str(key), value)
            .map_err(|e| js_error("constraints", e))
    };
    let ideal = |value: f64| -> CaptureResult<js_sys::Object> {
        let object = js_sys::Object::new();
        set(&object, "ideal", &JsValue::from_f64(value))?;
        Ok(object)
    };
    set(&video, "width", &ideal(IDEAL_WIDTH)?)?;
    set(&video, "height", &ideal(IDEAL_HEIGHT)?)?;
    set(&video, "facingMode", &JsValue::from_str("environment"))?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&video);

    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(media_error)?;
    let stream = JsFuture::from(promise).await.map_err(media_error)?;
    stream
        .dyn_into::<MediaStream>()
        .map_err(|e| js_error("getUserMedia result", e))
}

/// Draw the current video frame and encode it as a JPEG data URI.
fn grab_frame(video: &HtmlVideoElement, canvas: &HtmlCanvasElement) -> Result<String, JsValue> {
    canvas.set_width(video.video_width());
    canvas.set_height(video.video_height());

    let context = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    context.draw_image_with_html_video_element_and_dw_and_dh(
        video,
        0.0,
        0.0,
        canvas.width() as f64,
        canvas.height() as f64,
    )?;
    canvas.to_data_url_with_type_and_encoder_options("image/jpeg", &JsValue::from_f64(JPEG_QUALITY))
}

async fn capture_frame() -> CaptureResult<CaptureOutcome> {
    let stream = open_stream().await?;
    let mut session = CaptureSession { stream, modal: None };

    let document = document()?;
    let body = document.body().ok_or(CaptureError::Unsupported)?;

    let modal = styled(&document, "div", MODAL_STYLE)?;
    session.modal = Some(modal.clone());

    let title = styled(&document, "h2", TITLE_STYLE)?;
    title.set_text_content(Some("Camera"));

    let video: HtmlVideoElement = styled(&document, "video", VIDEO_STYLE)?
        .dyn_into()
        .map_err(|e| js_error("video element", e.into()))?;
    video.set_src_object(Some(&session.stream));
    video.set_autoplay(true);
    video.set_muted(true);
    video
        .set_attribute("playsinline", "")
        .map_err(|e| js_error("setAttribute", e))?;

    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| js_error("createElement", e))?
        .dyn_into()
        .map_err(|e| js_error("canvas element", e.into()))?;

    let buttons = styled(&document, "div", BUTTONS_STYLE)?;
    let capture_button: HtmlButtonElement = styled(&document, "button", CAPTURE_BUTTON_STYLE)?
        .dyn_into()
        .map_err(|e| js_error("button element", e.into()))?;
    capture_button.set_text_content(Some("📸 Take photo"));
    let cancel_button: HtmlButtonElement = styled(&document, "button", CANCEL_BUTTON_STYLE)?
        .dyn_into()
        .map_err(|e| js_error("button element", e.into()))?;
    cancel_button.set_text_content(Some("❌ Cancel"));

    // Handlers must outlive the await below; they drop with this vector.
    let handlers: Rc<RefCell<Vec<Closure<dyn FnMut()>>>> = Rc::default();
    let outcome = {
        let handlers = handlers.clone();
        let video = video.clone();
        let capture_button = capture_button.clone();
        let cancel_button = cancel_button.clone();
        js_sys::Promise::new(&mut |resolve, reject| {
            let on_capture = {
                let resolve = resolve.clone();
                let reject = reject.clone();
                let video = video.clone();
                let canvas = canvas.clone();
                Closure::<dyn FnMut()>::new(move || match grab_frame(&video, &canvas) {
                    Ok(data_url) => {
                        let _ = resolve.call1(&JsValue::NULL, &JsValue::from_str(&data_url));
                    }
                    Err(e) => {
                        let _ = reject.call1(&JsValue::NULL, &e);
                    }
                })
            };
            let on_cancel = {
                let resolve = resolve.clone();
                Closure::<dyn FnMut()>::new(move || {
                    let _ = resolve.call1(&JsValue::NULL, &JsValue::NULL);
                })
            };
            let on_error = {
                let reject = reject.clone();
                Closure::<dyn FnMut()>::new(move || {
                    let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("Video stream failed"));
                })
            };

            capture_button.set_onclick(Some(on_capture.as_ref().unchecked_ref()));
            cancel_button.set_onclick(Some(on_cancel.as_ref().unchecked_ref()));
            video.set_onerror(Some(on_error.as_ref().unchecked_ref()));
            handlers.borrow_mut().extend([on_capture, on_cancel, on_error]);
        })
    };

    buttons
        .append_child(&capture_button)
        .and_then(|_| buttons.append_child(&cancel_button))
        .and_then(|_| modal.append_child(&title))
        .and_then(|_| modal.append_child(&video))
        .and_then(|_| modal.append_child(&buttons))
        .and_then(|_| body.append_child(&modal))
        .map_err(|e| js_error("appendChild", e))?;

    let result = JsFuture::from(outcome).await;

    capture_button.set_onclick(None);
    cancel_button.set_onclick(None);
    video.set_onerror(None);
    drop(session);
    drop(handlers);

    let value = result.map_err(|e| js_error("Camera capture failed", e))?;
    match value.as_string() {
        Some(data_url) => Ok(CaptureOutcome::Captured(RawImage::Inline(decode_data_url(&data_url)?))),
        None => {
            log::info!("Camera capture cancelled");
            Ok(CaptureOutcome::Cancelled)
        }
    }
}

impl CaptureAdapter for WebCamera {
    fn is_supported(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        // Insecure contexts expose no `mediaDevices` at all.
        let devices = match js_sys::Reflect::get(&window.navigator(), &JsValue::from_str("mediaDevices")) {
            Ok(devices) if devices.is_object() => devices,
            _ => return false,
        };
        js_sys::Reflect::get(&devices, &JsValue::from_str("getUserMedia"))
            .map(|f| f.is_function())
            .unwrap_or(false)
    }

    fn capture(&self) -> BoxFuture<'_, CaptureResult<CaptureOutcome>> {
        Box::pin(capture_frame())
    }
}
