//! WebAssembly bindings for JavaScript
//!
//! This module provides WASM bindings using wasm-bindgen for use in browsers
//! and Node.js. Enable with the "wasm" feature flag.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::compile::Compiler;
use crate::exec::MatchResult;
use crate::flags::UnicodePolicy;
use crate::regex::Regex;
use crate::replace::Replacer;
use crate::subject::Value;

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// JavaScript-facing regex wrapper
#[wasm_bindgen]
pub struct JsRegex {
    regex: Regex,
}

#[wasm_bindgen]
impl JsRegex {
    /// Compile a pattern with optional flags.
    ///
    /// `unicodePolicy` selects what happens without the `u` flag
    /// (`throw`, `warn`, `warnOnce` or `nothing`).
    #[wasm_bindgen(constructor)]
    pub fn new(
        pattern: &str,
        flags: Option<String>,
        unicode_policy: Option<String>,
    ) -> Result<JsRegex, JsValue> {
        let policy = match unicode_policy {
            Some(name) => name.parse::<UnicodePolicy>().map_err(to_js)?,
            None => UnicodePolicy::default(),
        };
        let regex = Compiler::with_policy(policy)
            .compile(pattern, flags.as_deref())
            .map_err(to_js)?;
        Ok(JsRegex { regex })
    }

    /// The display source
    #[wasm_bindgen(getter)]
    pub fn source(&self) -> String {
        self.regex.source().to_string()
    }

    /// The flags, in `gimuy` order
    #[wasm_bindgen(getter)]
    pub fn flags(&self) -> String {
        self.regex.flags().to_string()
    }

    /// The cursor
    #[wasm_bindgen(getter = lastIndex)]
    pub fn last_index(&self) -> f64 {
        self.regex.last_index() as f64
    }

    /// Move the cursor; negative and NaN values become 0
    #[wasm_bindgen(setter = lastIndex)]
    pub fn set_last_index(&mut self, value: f64) {
        self.regex.assign_last_index(value);
    }

    /// Run once from the cursor; returns an array with `index`, `input`
    /// and `groups` properties, or `null`
    pub fn exec(&mut self, input: &str) -> Result<JsValue, JsValue> {
        match self.regex.exec(input).map_err(to_js)? {
            Some(m) => Ok(match_to_js(&m, input)?.into()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Whether the pattern matches from the cursor
    pub fn test(&mut self, input: &str) -> Result<bool, JsValue> {
        self.regex.test(input).map_err(to_js)
    }

    /// Replace with a template string or a function
    pub fn replace(&mut self, input: &str, replacement: JsValue) -> Result<String, JsValue> {
        let replacer = match replacement.dyn_into::<js_sys::Function>() {
            Ok(func) => Replacer::callback(move |m: &MatchResult<'_>| {
                let args = js_sys::Array::new();
                for group in m.iter() {
                    args.push(&group.map_or(JsValue::UNDEFINED, |g| JsValue::from_str(&g.to_string())));
                }
                args.push(&JsValue::from_f64(m.index() as f64));
                args.push(&JsValue::from_str(input));
                if m.groups().is_some() {
                    args.push(&groups_to_js(m).map_err(|e| format!("{:?}", e))?);
                }
                let result = func
                    .apply(&JsValue::NULL, &args)
                    .map_err(|e| format!("{:?}", e))?;
                Ok(Value::Text(result.as_string().unwrap_or_default()))
            }),
            Err(value) => Replacer::template(value.as_string().unwrap_or_default()),
        };
        let value = self.regex.replace(input, replacer).map_err(to_js)?;
        Ok(value.to_string())
    }

    /// Index of the first match, or -1
    pub fn search(&self, input: &str) -> Result<f64, JsValue> {
        Ok(self
            .regex
            .search(input)
            .map_err(to_js)?
            .map_or(-1.0, |index| index as f64))
    }
}

fn match_to_js(m: &MatchResult<'_>, input: &str) -> Result<js_sys::Array, JsValue> {
    let array = js_sys::Array::new();
    for group in m.iter() {
        array.push(&group.map_or(JsValue::UNDEFINED, |g| JsValue::from_str(&g.to_string())));
    }
    js_sys::Reflect::set(&array, &"index".into(), &JsValue::from_f64(m.index() as f64))?;
    js_sys::Reflect::set(&array, &"input".into(), &JsValue::from_str(input))?;

    js_sys::Reflect::set(&array, &"groups".into(), &groups_to_js(m)?)?;

    if let Some(index) = m.pattern_index() {
        js_sys::Reflect::set(&array, &"patternIndex".into(), &JsValue::from_f64(index as f64))?;
    }
    Ok(array)
}

/// Named groups as a plain object, or `undefined` without named groups
fn groups_to_js(m: &MatchResult<'_>) -> Result<JsValue, JsValue> {
    let Some(named) = m.groups() else {
        return Ok(JsValue::UNDEFINED);
    };
    let object = js_sys::Object::new();
    for (name, value) in named {
        let value = value.map_or(JsValue::UNDEFINED, |v| JsValue::from_str(&v.to_string()));
        js_sys::Reflect::set(&object, &JsValue::from_str(name), &value)?;
    }
    Ok(object.into())
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
