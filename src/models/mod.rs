//! Data models for fleet-dtc.

mod diagnostic;

pub use diagnostic::{
    recording_now, DiagnosticRecord, NewDiagnostic, RECORDED_AT_FORMAT, SENTINEL,
};
