//! Reflection over page globals that have no typed bindings (`$`, `ace`).

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// `owner[key]`, unless null or undefined.
pub fn property(owner: &JsValue, key: &str) -> Option<JsValue> {
    let value = Reflect::get(owner, &JsValue::from_str(key)).ok()?;
    (!value.is_null() && !value.is_undefined()).then_some(value)
}

/// Resolve a dotted path from `window`, returning the value and its owner.
pub fn lookup(path: &[&str]) -> Option<(JsValue, JsValue)> {
    let (last, parents) = path.split_last()?;
    let mut owner: JsValue = web_sys::window()?.into();
    for key in parents {
        owner = property(&owner, key)?;
    }
    let value = property(&owner, last)?;
    Some((owner, value))
}

/// Call `owner[name](...args)` with `owner` as `this`.
pub fn invoke(owner: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let method = property(owner, name)
        .ok_or_else(|| JsValue::from_str(&format!("`{name}` is not defined")))?
        .dyn_into::<Function>()?;
    method.apply(owner, &args.iter().collect::<Array>())
}

/// Call the function at `path`. Returns whether it exists and did not throw.
pub fn call(path: &[&str], args: &[JsValue]) -> bool {
    let Some((this, value)) = lookup(path) else {
        return false;
    };
    let Ok(func) = value.dyn_into::<Function>() else {
        return false;
    };
    func.apply(&this, &args.iter().collect::<Array>()).is_ok()
}

/// `$(target)` with the page's jQuery.
pub fn jquery(target: &JsValue) -> Option<JsValue> {
    let (_, dollar) = lookup(&["$"])?;
    let dollar = dollar.dyn_into::<Function>().ok()?;
    dollar.call1(&JsValue::UNDEFINED, target).ok()
}
