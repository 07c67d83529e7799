//! [`MapSurface`] backed by the page's global Leaflet (`L`).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use js_sys::Reflect;
use serde::Serialize;
use serde_json::json;
use traffic_shared::LatLon;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::config::{
    IMAGERY_ATTRIBUTION, IMAGERY_TILE_URL, LABEL_LAYER_OPACITY, MAX_TILE_ZOOM, STREETS_ATTRIBUTION,
    STREETS_TILE_URL,
};
use crate::ports::{MapSurface, Overlay, OverlayHandle, PinIcon, TileLayer};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Map)]
    type LMap;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    fn l_map(container: &web_sys::HtmlElement, options: &JsValue) -> Result<LMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LMap, center: &JsValue, zoom: u8);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &LMap, layer: &LLayer);

    #[wasm_bindgen(method)]
    fn on(this: &LMap, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(js_name = Layer)]
    type LLayer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &LLayer, map: &LMap);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &LLayer, html: &str);

    #[wasm_bindgen(method, js_name = openPopup)]
    fn open_popup(this: &LLayer);

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> LLayer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(position: &JsValue, options: &JsValue) -> LLayer;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(position: &JsValue, options: &JsValue) -> LLayer;

    #[wasm_bindgen(js_namespace = L, js_name = polyline)]
    fn polyline(points: &JsValue, options: &JsValue) -> LLayer;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::UNDEFINED)
}

fn pin_icon(icon: PinIcon) -> JsValue {
    let (html, size, anchor) = match icon {
        PinIcon::Start => (dot_html("#00ff00"), [20, 20], [10, 10]),
        PinIcon::End => (dot_html("#ff0000"), [20, 20], [10, 10]),
        PinIcon::Search => (
            "<div class=\"search-marker\">📍</div>".to_string(),
            [40, 40],
            [20, 40],
        ),
    };
    div_icon(&to_js(&json!({
        "html": html,
        "className": "",
        "iconSize": size,
        "iconAnchor": anchor,
    })))
}

fn dot_html(color: &str) -> String {
    format!(
        "<div style=\"background: {color}; width: 20px; height: 20px; border-radius: 50%; border: 3px solid white;\"></div>"
    )
}

fn tile_options(layer: TileLayer) -> (&'static str, serde_json::Value) {
    match layer {
        TileLayer::Streets => (
            STREETS_TILE_URL,
            json!({ "attribution": STREETS_ATTRIBUTION, "maxZoom": MAX_TILE_ZOOM }),
        ),
        TileLayer::Satellite | TileLayer::Hybrid => (
            IMAGERY_TILE_URL,
            json!({ "attribution": IMAGERY_ATTRIBUTION, "maxZoom": MAX_TILE_ZOOM }),
        ),
        TileLayer::HybridLabels => (
            STREETS_TILE_URL,
            json!({ "maxZoom": MAX_TILE_ZOOM, "opacity": LABEL_LAYER_OPACITY }),
        ),
    }
}

fn build_layer(overlay: &Overlay) -> (LLayer, Option<&str>) {
    match overlay {
        Overlay::Pin {
            position,
            icon,
            popup,
        } => {
            let options = to_js(&json!({}));
            let _ = Reflect::set(&options, &JsValue::from_str("icon"), &pin_icon(*icon));
            (marker(&to_js(position), &options), popup.as_deref())
        }
        Overlay::Circle {
            position,
            radius,
            fill_color,
            fill_opacity,
            popup,
        } => {
            let options = json!({
                "radius": radius,
                "fillColor": fill_color,
                "color": "white",
                "weight": 2,
                "opacity": 1,
                "fillOpacity": fill_opacity,
            });
            (
                circle_marker(&to_js(position), &to_js(&options)),
                popup.as_deref(),
            )
        }
        Overlay::Polyline {
            points,
            color,
            weight,
            opacity,
            popup,
        } => {
            let options = json!({
                "color": color,
                "weight": weight,
                "opacity": opacity,
                "lineJoin": "round",
            });
            (polyline(&to_js(points), &to_js(&options)), popup.as_deref())
        }
    }
}

/// Owns the Leaflet map and every layer the dashboard put on it.
pub struct LeafletMap {
    map: LMap,
    tiles: RefCell<HashMap<TileLayer, LLayer>>,
    overlays: RefCell<HashMap<OverlayHandle, LLayer>>,
    next_id: Cell<u64>,
    on_click: RefCell<Option<Closure<dyn Fn(JsValue)>>>,
}

impl LeafletMap {
    pub fn new(container: &web_sys::HtmlElement) -> Result<Self, String> {
        let map = l_map(container, &JsValue::UNDEFINED)
            .map_err(|e| format!("failed to create map: {e:?}"))?;
        Ok(Self {
            map,
            tiles: RefCell::new(HashMap::new()),
            overlays: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            on_click: RefCell::new(None),
        })
    }

    /// Route map clicks to `handler`. Replaces any earlier handler.
    pub fn on_click(&self, handler: impl Fn(LatLon) + 'static) {
        let callback = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
            let Ok(latlng) = Reflect::get(&event, &JsValue::from_str("latlng")) else {
                return;
            };
            let coord = |key: &str| {
                Reflect::get(&latlng, &JsValue::from_str(key))
                    .ok()
                    .and_then(|v| v.as_f64())
            };
            if let (Some(lat), Some(lon)) = (coord("lat"), coord("lng")) {
                handler(LatLon::new(lat, lon));
            }
        });
        self.map.on("click", callback.as_ref().unchecked_ref());
        *self.on_click.borrow_mut() = Some(callback);
    }
}

impl MapSurface for LeafletMap {
    fn set_view(&self, center: LatLon, zoom: u8) {
        self.map.set_view(&to_js(&center), zoom);
    }

    fn fit_bounds(&self, points: &[LatLon], padding_px: f64) {
        if points.is_empty() {
            return;
        }
        let options = json!({ "padding": [padding_px, padding_px] });
        self.map.fit_bounds(&to_js(points), &to_js(&options));
    }

    fn add_tile_layer(&self, layer: TileLayer) {
        let mut tiles = self.tiles.borrow_mut();
        if tiles.contains_key(&layer) {
            return;
        }
        let (url, options) = tile_options(layer);
        let tile = tile_layer(url, &to_js(&options));
        tile.add_to(&self.map);
        tiles.insert(layer, tile);
    }

    fn remove_tile_layer(&self, layer: TileLayer) {
        if let Some(tile) = self.tiles.borrow_mut().remove(&layer) {
            self.map.remove_layer(&tile);
        }
    }

    fn add_overlay(&self, overlay: &Overlay) -> OverlayHandle {
        let (layer, popup) = build_layer(overlay);
        if let Some(html) = popup {
            layer.bind_popup(html);
        }
        layer.add_to(&self.map);

        let handle = OverlayHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);
        self.overlays.borrow_mut().insert(handle, layer);
        handle
    }

    fn remove_overlay(&self, handle: OverlayHandle) {
        if let Some(layer) = self.overlays.borrow_mut().remove(&handle) {
            self.map.remove_layer(&layer);
        }
    }

    fn open_popup(&self, handle: OverlayHandle) {
        if let Some(layer) = self.overlays.borrow().get(&handle) {
            layer.open_popup();
        }
    }
}
