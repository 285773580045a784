use std::os::raw::{c_char, c_int};

use serde_json::{Map, Value};

use crate::engine::EngineFault;
use crate::status::Status;

use super::*;

/// Allocate an empty config; null when allocation fails
pub unsafe extern "C" fn kv_config_new() -> *mut kv_config {
    Box::into_raw(Box::new(kv_config { entries: Map::new() }))
}

/// Free a config that was not handed to `kv_open`
pub unsafe extern "C" fn kv_config_delete(config: *mut kv_config) {
    if !config.is_null() {
        drop(Box::from_raw(config));
    }
}

/// Merge the entries of a JSON object into `config`
///
/// Fails with `KV_STATUS_CONFIG_PARSING_ERROR` when the text is not JSON or
/// is not an object; `config` is left unchanged in that case.
pub unsafe extern "C" fn kv_config_from_json(config: *mut kv_config, json: *const c_char) -> c_int {
    status_code((|| {
        if config.is_null() {
            return Err(invalid_argument("config must not be null"));
        }
        let text = cstr_to_str(json, "json", Status::ConfigParsingError)?;

        let parsed: Value = serde_json::from_str(text).map_err(|e| {
            fail(EngineFault::new(
                Status::ConfigParsingError,
                format!("config is not valid JSON: {}", e),
            ))
        })?;

        let Value::Object(entries) = parsed else {
            return Err(fail(EngineFault::new(
                Status::ConfigParsingError,
                "config must be a JSON object",
            )));
        };

        (*config).entries.extend(entries);
        Ok(KV_STATUS_OK)
    })())
}
