//! The deployment manifest (`config.json`) and its merge with prior state.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use outpack_core::{ImagesConfig, PackError};

/// Build output protocol version written to every manifest.
pub const MANIFEST_VERSION: u32 = 3;
pub const MANIFEST_FILE: &str = "config.json";

/// Keys the merger computes; prior values for these are discarded.
const COMPUTED_KEYS: &[&str] = &["version", "routes", "images"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Route {
    /// Serve matching files from the static output before anything else.
    Handle { handle: &'static str },
    /// Send every request through the middleware function.
    #[serde(rename_all = "camelCase")]
    Middleware {
        src: &'static str,
        middleware_path: &'static str,
        #[serde(rename = "continue")]
        continue_: bool,
    },
}

impl Route {
    pub fn filesystem() -> Self {
        Route::Handle {
            handle: "filesystem",
        }
    }

    pub fn middleware() -> Self {
        Route::Middleware {
            src: "/(.*)",
            middleware_path: "_middleware",
            continue_: true,
        }
    }
}

/// Route list for a run. Middleware replaces the filesystem route.
pub fn routes(has_middleware: bool) -> Vec<Route> {
    if has_middleware {
        vec![Route::middleware()]
    } else {
        vec![Route::filesystem()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentManifest {
    pub version: u32,
    pub routes: Vec<Route>,
    pub images: ImagesConfig,
    /// Top-level keys from the prior manifest this system does not manage.
    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl DeploymentManifest {
    /// Merge freshly computed routes and images over `existing`, the bytes
    /// of a prior manifest if one was found.
    pub fn merge(existing: Option<&[u8]>, images: &ImagesConfig, has_middleware: bool) -> Self {
        let mut passthrough = match existing.map(parse_prior) {
            Some(Ok(map)) => map,
            Some(Err(err)) => {
                warn!(error = %err, "ignoring unreadable prior manifest");
                Map::new()
            }
            None => {
                warn!("no prior manifest, starting from empty state");
                Map::new()
            }
        };
        for key in COMPUTED_KEYS {
            passthrough.remove(*key);
        }

        Self {
            version: MANIFEST_VERSION,
            routes: routes(has_middleware),
            images: images.clone(),
            passthrough,
        }
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn parse_prior(bytes: &[u8]) -> Result<Map<String, Value>, PackError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PackError::ManifestParse(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
        Err(err) => Err(PackError::ManifestParse(err.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
