//! Dataplane-attached network endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::Labels;

/// Endpoint configuration flags (flag name -> enabled).
pub type EpOpts = BTreeMap<String, bool>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Opaque, externally supplied id.
    pub id: String,
    /// Security identity the endpoint is bound to; 0 until joined.
    #[serde(default)]
    pub sec_label_id: u32,
    /// Labels presented at join time.
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub options: EpOpts,
}

impl Endpoint {
    pub fn new(id: impl Into<String>, labels: Labels) -> Self {
        Self {
            id: id.into(),
            sec_label_id: 0,
            labels,
            options: EpOpts::new(),
        }
    }

    /// Merge `opts` into the current options, overwriting flags present in both.
    pub fn apply_opts(&mut self, opts: EpOpts) {
        self.options.extend(opts);
    }
}

/// Reply to a liveness ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub node_address: String,
    pub version: String,
}
