use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn generate_grid_pdf(json: &str) -> Result<Vec<u8>, JsValue> {
    crate::render_json(json).map_err(|e| JsValue::from_str(&e.to_string()))
}
