//! Per-function runtime descriptors (`.vc-config.json`).

use serde::Serialize;

use outpack_core::FunctionRole;

use crate::descriptor::FunctionDescriptor;

/// Managed Node.js runtime serverless functions run on.
pub const SERVERLESS_RUNTIME: &str = "nodejs16.x";
pub const EDGE_RUNTIME: &str = "edge";

/// Execution class a role maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    /// Edge runtime; the entry file name comes from the descriptor.
    Edge,
    /// Edge runtime with the fixed `index.js` entry.
    EdgeFixedEntry,
    /// Node.js launcher with request helpers.
    Node,
}

const fn profile(role: FunctionRole) -> Profile {
    match role {
        FunctionRole::EdgeFunction => Profile::Edge,
        FunctionRole::ServerlessFunction => Profile::Node,
        FunctionRole::Middleware => Profile::EdgeFixedEntry,
    }
}

/// Contents of a function's runtime config file. Field order is the
/// serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuntimeConfig {
    Edge {
        runtime: &'static str,
        entrypoint: String,
    },
    #[serde(rename_all = "camelCase")]
    Serverless {
        runtime: &'static str,
        launcher_type: &'static str,
        should_add_helpers: bool,
        handler: String,
    },
}

impl RuntimeConfig {
    /// Runtime config for `descriptor`, selected by its role.
    pub fn synthesize(descriptor: &FunctionDescriptor) -> Self {
        match profile(descriptor.role) {
            Profile::Edge => RuntimeConfig::Edge {
                runtime: EDGE_RUNTIME,
                entrypoint: format!("index.{}", descriptor.extension),
            },
            Profile::EdgeFixedEntry => RuntimeConfig::Edge {
                runtime: EDGE_RUNTIME,
                entrypoint: "index.js".to_string(),
            },
            Profile::Node => RuntimeConfig::Serverless {
                runtime: SERVERLESS_RUNTIME,
                launcher_type: "Nodejs",
                should_add_helpers: true,
                handler: format!("index.{}", descriptor.extension),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
