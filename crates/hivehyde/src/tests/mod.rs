use super::*;

use serde_json::json;
use std::sync::Arc;

mod support;
use support::*;

mod anomaly_scan;
mod engine_signing;
