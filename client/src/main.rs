mod app;
mod chat;
mod config;
mod dashboard;
mod error;
mod http;
mod incidents;
mod leaflet;
mod logging;
mod markup;
mod overlay;
mod picker;
mod ports;
mod refresh;
mod route;
mod session;
mod state;
#[cfg(test)]
mod testing;
mod viewport;

use leptos::mount::mount_to;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

use crate::config::ClientConfig;

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn main() {
    console_error_panic_hook::set_once();
    logging::init(&ClientConfig::from_location().log_filter);

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        tracing::error!("no mount target for the dashboard");
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Drop a previous mount so its effects stop touching the page.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
