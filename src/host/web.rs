// Web host - Browser session driven by requestAnimationFrame
//
// The page provides a canvas and an element for the FPS line. Frames are
// drawn with `putImageData`; each animation frame callback becomes one
// `LoopController::on_frame` call, and the callback is only re-armed while
// the loop asks for another refresh.
//
//   const session = new WebSession("target", "fps");
//   session.start();
//   session.loadROM([new Uint8Array(bytes)]);
//   session.stop();

use crate::config::AppConfig;
use crate::host::{Compositor, FrameScheduler, StatusSurface};
use crate::rom::{ElementType, HostBuffer, IdleEmulator, RomBridge};
use crate::session::{LoopController, LoopState, StopHandle};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, Element, HtmlCanvasElement, ImageData};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// DOM surfaces the loop draws to
struct DomHost {
    context: CanvasRenderingContext2d,
    fps: Option<Element>,
    status: Option<Element>,
    scheduled: bool,
}

impl DomHost {
    fn take_scheduled(&mut self) -> bool {
        std::mem::take(&mut self.scheduled)
    }
}

impl Compositor for DomHost {
    fn present_image(&mut self, rgba: &[u8], width: usize) {
        let drawn = ImageData::new_with_u8_clamped_array(Clamped(rgba), width as u32)
            .and_then(|image| self.context.put_image_data(&image, 0.0, 0.0));
        if let Err(err) = drawn {
            web_sys::console::error_2(&"failed to present frame".into(), &err);
        }
    }
}

impl StatusSurface for DomHost {
    fn set_fps_text(&mut self, text: &str) {
        if let Some(fps) = &self.fps {
            fps.set_inner_html(text);
        }
    }

    fn set_status_text(&mut self, text: &str) {
        if let Some(status) = &self.status {
            status.set_inner_html(text);
        }
    }
}

impl FrameScheduler for DomHost {
    fn schedule_next_frame(&mut self) {
        self.scheduled = true;
    }
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

fn request_animation_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    window()?.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// Type tag and bytes of one JavaScript argument
fn host_buffer(value: &JsValue) -> HostBuffer {
    let name = js_sys::Reflect::get(value, &JsValue::from_str("constructor"))
        .ok()
        .and_then(|ctor| ctor.dyn_into::<js_sys::Function>().ok())
        .map(|ctor| String::from(ctor.name()))
        .unwrap_or_else(|| "undefined".to_string());

    let bytes = value
        .dyn_ref::<js_sys::Uint8Array>()
        .map(|array| array.to_vec())
        .unwrap_or_default();

    HostBuffer::new(ElementType::from_constructor_name(&name), bytes)
}

/// A presentation loop bound to a canvas
#[wasm_bindgen]
pub struct WebSession {
    controller: Rc<RefCell<LoopController<DomHost>>>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
    stop: StopHandle,
    bridge: RomBridge<IdleEmulator>,
}

#[wasm_bindgen]
impl WebSession {
    /// Bind to the canvas with id `canvas_id` and the FPS element `fps_id`
    ///
    /// An element with id `status` receives ROM status lines when present.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, fps_id: &str) -> Result<WebSession, JsValue> {
        let document = window()?
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", canvas_id)))?
            .dyn_into()?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;

        let config = AppConfig::default();
        canvas.set_width(config.video.width as u32);
        canvas.set_height(config.video.height as u32);

        let host = DomHost {
            context,
            fps: document.get_element_by_id(fps_id),
            status: document.get_element_by_id("status"),
            scheduled: false,
        };
        let controller = LoopController::new(config.presenter(), host)
            .with_fps_placeholder(config.status.fps_placeholder.clone());

        Ok(WebSession {
            stop: controller.stop_handle(),
            controller: Rc::new(RefCell::new(controller)),
            callback: Rc::new(RefCell::new(None)),
            bridge: RomBridge::new(IdleEmulator::new()),
        })
    }

    /// Draw the first frame and hand the loop to requestAnimationFrame
    pub fn start(&self) -> Result<(), JsValue> {
        if self.callback.borrow().is_some() {
            return Ok(());
        }

        let controller = Rc::clone(&self.controller);
        let rearm = Rc::clone(&self.callback);
        let callback = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            let mut controller = controller.borrow_mut();
            controller.on_frame(timestamp_ms);
            match controller.finish_if_stopping() {
                Ok(LoopState::Running) => {
                    if controller.host_mut().take_scheduled() {
                        if let Some(callback) = rearm.borrow().as_ref() {
                            if let Err(err) = request_animation_frame(callback) {
                                web_sys::console::error_1(&err);
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(err) => web_sys::console::error_1(&err.to_string().into()),
            }
        }) as Box<dyn FnMut(f64)>);

        let state = {
            let mut controller = self.controller.borrow_mut();
            controller.start();
            controller
                .finish_if_stopping()
                .map_err(|err| JsValue::from_str(&err.to_string()))?
        };
        if state == LoopState::Running && self.controller.borrow_mut().host_mut().take_scheduled()
        {
            request_animation_frame(&callback)?;
        }

        *self.callback.borrow_mut() = Some(callback);
        Ok(())
    }

    /// Stop after the next animation frame
    ///
    /// The final frame clears the canvas and resets the FPS line.
    pub fn stop(&self) {
        self.stop.request_stop();
        if self.callback.borrow().is_none() {
            // Never started: nothing will observe the request
            if let Err(err) = self.controller.borrow_mut().finish() {
                web_sys::console::warn_1(&err.to_string().into());
            }
        }
    }

    /// Lifecycle state: "running", "stopping" or "stopped"
    pub fn state(&self) -> String {
        self.stop.state().to_string()
    }

    /// Submit a ROM; `args` must hold exactly one `Uint8Array`
    #[wasm_bindgen(js_name = loadROM)]
    pub fn load_rom(&self, args: &js_sys::Array) -> bool {
        let buffers: Vec<HostBuffer> = args.iter().map(|value| host_buffer(&value)).collect();
        let accepted = self.bridge.submit_rom(&buffers);

        if let Some(status) = self.bridge.last_status() {
            if accepted {
                web_sys::console::log_1(&status.as_str().into());
            } else {
                web_sys::console::error_1(&status.as_str().into());
            }
            self.controller.borrow_mut().host_mut().set_status_text(&status);
        }
        accepted
    }
}
