//! PCB defect inspection client.
//!
//! This crate submits a photograph of a printed-circuit board to a remote
//! workflow-inference gateway and turns the heterogeneous response into a
//! display-ready summary.
//!
//! # Flow
//!
//! 1. `config` loads gateway credentials from the environment (or a JSON
//!    config file) into an explicit struct, once, at startup.
//! 2. `gateway` performs one synchronous workflow call per inspection and
//!    converts every gateway-level failure into a degraded result instead of
//!    an error.
//! 3. `normalize` decodes the visualization payload (data URI, bare base64,
//!    or fetchable URL), extracts detection records with defensive defaults,
//!    and computes the class histogram and majority class.
//! 4. `report` renders the normalized result as the textual inspection
//!    report shown to the operator.
//!
//! # Module Structure
//!
//! - `config`: `GatewayConfig` (endpoint, credentials, output path)
//! - `gateway`: `GatewayClient` (one call, uniform degradation)
//! - `normalize`: `Normalizer`, `NormalizedResult`, `DetectionRecord`
//! - `report`: plain-text report rendering

pub mod config;
pub mod gateway;
pub mod normalize;
pub mod report;

pub use config::GatewayConfig;
pub use gateway::GatewayClient;
pub use normalize::{
    ClassCounts, DetectionRecord, MajorityClass, NormalizedResult, Normalizer,
    RawInspectionResponse, NO_RESULT_VERDICT, VISUALIZATION_FILE,
};
pub use report::{render_report, summary_line};
