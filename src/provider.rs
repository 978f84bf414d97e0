//! Provider trait for telemetry data sources.

use std::time::Duration;

use crate::commands::BroadcastCode;
use crate::vars::VarHeader;
use crate::Result;

/// Capability interface over the native telemetry layer.
///
/// The provider owns the shared-memory (or recorded, or networked) access to
/// the simulator; everything above it only speaks this trait, which keeps the
/// session parsing and the polling state machine testable against a
/// deterministic in-memory fake.
///
/// `wait_for_data` is the only suspension point in the system: it may block
/// up to its timeout (zero means a non-blocking poll). Every other method is
/// a cheap synchronous read of already-published state.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Wait until new telemetry is ready or the timeout elapses.
    ///
    /// Returns `true` when fresh data is available to read.
    async fn wait_for_data(&mut self, timeout: Duration) -> Result<bool>;

    /// Whether the simulator is currently publishing data.
    fn is_connected(&self) -> Result<bool>;

    /// Connection status identifier; increments on reconnects.
    fn status_id(&self) -> Result<i32>;

    /// Monotonic counter bumped whenever the session info string changes.
    fn session_update_count(&self) -> Result<i32>;

    /// True if the session info string changed since the last check.
    fn session_info_updated(&mut self) -> Result<bool>;

    /// The raw session text blob, or `None` when no session is published.
    fn session_text(&mut self) -> Result<Option<String>>;

    /// The published variable table, in declaration order.
    fn var_headers(&self) -> Result<Vec<VarHeader>>;

    /// Slot index of a variable by name, or `None` when unknown.
    fn var_slot(&self, name: &str) -> Result<Option<usize>>;

    /// Read one boolean entry of a variable slot.
    fn read_bool(&self, slot: usize, entry: usize) -> Result<bool>;

    /// Read one integer entry (char, int and bitfield slots).
    fn read_int(&self, slot: usize, entry: usize) -> Result<i32>;

    /// Read one single-precision float entry.
    fn read_float(&self, slot: usize, entry: usize) -> Result<f32>;

    /// Read one double-precision float entry.
    fn read_double(&self, slot: usize, entry: usize) -> Result<f64>;

    /// Pack a car number and its pad count into the wire representation.
    ///
    /// The bit layout is the provider's contract with the simulator and is
    /// deliberately not re-derived on this side of the boundary.
    fn pad_car_number(&self, value: i32, pad: i32) -> i32;

    /// Send a broadcast control message to the simulator.
    fn send_command(&mut self, code: BroadcastCode, var1: i32, var2: i32, var3: i32) -> Result<()>;
}
