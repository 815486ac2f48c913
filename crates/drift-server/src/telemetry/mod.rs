//! Tracing setup: structured JSON logs, plus OTLP span export when an
//! endpoint is configured.
//!
//! # Telemetry invariants
//!
//! - **No secrets** (encryption key, access tokens, account ids, envelopes)
//!   may appear in any span attribute or log field.
//! - Log level is configurable via `LOG_LEVEL`; `RUST_LOG` overrides it.

pub mod init;

pub use init::init_telemetry;
