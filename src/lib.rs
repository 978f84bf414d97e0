//! Async polling client for simulator telemetry.
//!
//! Trackside reads a racing simulator's published state through a pluggable
//! [`Provider`] and turns it into a typed event stream: connection edges,
//! parsed session snapshots and per-tick telemetry frames.
//!
//! # Features
//!
//! - **Session snapshots**: best-effort parsing of the simulator's
//!   YAML-shaped session text into a [`SessionValue`] tree
//! - **Typed telemetry**: variable-table reads decoded per the published
//!   headers, whole-table or by name
//! - **Polling client**: a single serial tick task with connect/disconnect
//!   edge detection and broadcast command helpers
//! - **Pluggable providers**: anything implementing [`Provider`] can back a
//!   client; a deterministic [`providers::ScriptedProvider`] ships for tests
//!
//! # Quick start
//!
//! ```rust,no_run
//! use trackside::{Event, TelemetryClient, providers::ScriptedProvider};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = ScriptedProvider::builder()
//!         .int_var("Gear", 3)
//!         .double_var("SessionTime", 42.0)
//!         .build();
//!
//!     let client = TelemetryClient::new(provider);
//!     let mut events = client.events();
//!     client.start();
//!
//!     while let Some(event) = events.next().await {
//!         match event {
//!             Event::Telemetry(frame) => println!("{:?}", frame.get("Gear")),
//!             other => println!("{other:?}"),
//!         }
//!     }
//! }
//! ```

pub mod car_number;
pub mod client;
pub mod commands;
mod error;
pub mod provider;
pub mod providers;
pub mod session;
pub mod vars;

pub use car_number::CarNumber;
pub use client::{ClientOptions, Event, SessionUpdate, TelemetryClient};
pub use commands::BroadcastCode;
pub use error::{Result, TelemetryError};
pub use provider::Provider;
pub use session::{SessionValue, parse_session};
pub use vars::{TelemetryFrame, TelemetryValue, VarHeader, VariableType};
