//! Deterministic in-memory provider for tests and development.
//!
//! [`ScriptedProvider`] serves a variable table and session text from plain
//! Rust data instead of simulator shared memory. A [`ScriptedHandle`] can
//! flip connection state, publish new session text or inject a failure while
//! a client is polling, which is how the polling state machine gets exercised
//! without a simulator.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::commands::BroadcastCode;
use crate::provider::Provider;
use crate::vars::VarHeader;
use crate::{Result, TelemetryError};

#[derive(Debug, Clone)]
enum SlotData {
    Bool(Vec<bool>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl SlotData {
    fn type_code(&self) -> i32 {
        match self {
            SlotData::Bool(_) => 1,
            SlotData::Int(_) => 2,
            SlotData::Float(_) => 4,
            SlotData::Double(_) => 5,
        }
    }

    fn count(&self) -> usize {
        match self {
            SlotData::Bool(v) => v.len(),
            SlotData::Int(v) => v.len(),
            SlotData::Float(v) => v.len(),
            SlotData::Double(v) => v.len(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    header: VarHeader,
    data: SlotData,
}

#[derive(Debug, Default)]
struct Shared {
    connected: bool,
    data_ready: bool,
    status_id: i32,
    session_text: Option<String>,
    session_count: i32,
    slots: Vec<Slot>,
    sent: Vec<(BroadcastCode, i32, i32, i32)>,
    wait_error: Option<String>,
}

/// In-memory [`Provider`] driven entirely by scripted state.
pub struct ScriptedProvider {
    shared: Arc<Mutex<Shared>>,
    seen_session_count: Option<i32>,
}

/// Control handle for mutating a [`ScriptedProvider`] while it is polled.
#[derive(Clone)]
pub struct ScriptedHandle {
    shared: Arc<Mutex<Shared>>,
}

/// Builder for [`ScriptedProvider`]; starts connected with data ready.
pub struct ScriptedProviderBuilder {
    shared: Shared,
}

impl ScriptedProvider {
    pub fn builder() -> ScriptedProviderBuilder {
        ScriptedProviderBuilder {
            shared: Shared { connected: true, data_ready: true, ..Shared::default() },
        }
    }

    /// A control handle sharing this provider's state.
    pub fn handle(&self) -> ScriptedHandle {
        ScriptedHandle { shared: Arc::clone(&self.shared) }
    }

    /// Snapshot of the scripted variable table's headers.
    pub fn headers(&self) -> Vec<VarHeader> {
        let shared = self.lock();
        shared.slots.iter().map(|s| s.header.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        // Shared state is only ever held across plain reads and writes, so a
        // poisoned lock means a panicking test, not recoverable state.
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ScriptedHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    pub fn set_data_ready(&self, ready: bool) {
        self.lock().data_ready = ready;
    }

    pub fn set_status_id(&self, status_id: i32) {
        self.lock().status_id = status_id;
    }

    /// Publish new session text, bumping the update counter.
    pub fn publish_session(&self, text: impl Into<String>) {
        let mut shared = self.lock();
        shared.session_text = Some(text.into());
        shared.session_count += 1;
    }

    /// Withdraw the session text without touching the counter.
    pub fn clear_session(&self) {
        self.lock().session_text = None;
    }

    /// Make the next `wait_for_data` call fail with a provider error.
    pub fn fail_next_wait(&self, reason: impl Into<String>) {
        self.lock().wait_error = Some(reason.into());
    }

    /// Commands sent through the provider so far, in order.
    pub fn sent_commands(&self) -> Vec<(BroadcastCode, i32, i32, i32)> {
        self.lock().sent.clone()
    }
}

impl ScriptedProviderBuilder {
    pub fn connected(mut self, connected: bool) -> Self {
        self.shared.connected = connected;
        self
    }

    pub fn data_ready(mut self, ready: bool) -> Self {
        self.shared.data_ready = ready;
        self
    }

    /// Seed session text; the update counter starts at 1.
    pub fn session(mut self, text: impl Into<String>) -> Self {
        self.shared.session_text = Some(text.into());
        self.shared.session_count = 1;
        self
    }

    pub fn bool_var(self, name: &str, value: bool) -> Self {
        self.var(name, SlotData::Bool(vec![value]))
    }

    pub fn int_var(self, name: &str, value: i32) -> Self {
        self.var(name, SlotData::Int(vec![value]))
    }

    pub fn float_var(self, name: &str, value: f32) -> Self {
        self.var(name, SlotData::Float(vec![value]))
    }

    pub fn double_var(self, name: &str, value: f64) -> Self {
        self.var(name, SlotData::Double(vec![value]))
    }

    pub fn float_array_var(self, name: &str, values: &[f32]) -> Self {
        self.var(name, SlotData::Float(values.to_vec()))
    }

    pub fn int_array_var(self, name: &str, values: &[i32]) -> Self {
        self.var(name, SlotData::Int(values.to_vec()))
    }

    fn var(mut self, name: &str, data: SlotData) -> Self {
        let header = VarHeader {
            name: name.to_string(),
            type_code: data.type_code(),
            count: data.count(),
            offset: 0,
            count_as_time: false,
            desc: String::new(),
            unit: String::new(),
        };
        self.shared.slots.push(Slot { header, data });
        self
    }

    pub fn build(self) -> ScriptedProvider {
        ScriptedProvider {
            shared: Arc::new(Mutex::new(self.shared)),
            seen_session_count: None,
        }
    }
}

fn read_error(kind: &str, slot: usize, entry: usize) -> TelemetryError {
    TelemetryError::provider(format!("scripted {kind} read failed at slot {slot} entry {entry}"))
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    async fn wait_for_data(&mut self, _timeout: Duration) -> Result<bool> {
        let mut shared = self.lock();
        if let Some(reason) = shared.wait_error.take() {
            return Err(TelemetryError::provider(reason));
        }
        Ok(shared.data_ready)
    }

    fn is_connected(&self) -> Result<bool> {
        Ok(self.lock().connected)
    }

    fn status_id(&self) -> Result<i32> {
        Ok(self.lock().status_id)
    }

    fn session_update_count(&self) -> Result<i32> {
        Ok(self.lock().session_count)
    }

    fn session_info_updated(&mut self) -> Result<bool> {
        let current = {
            let shared = self.lock();
            if shared.session_text.is_none() {
                return Ok(false);
            }
            shared.session_count
        };
        if self.seen_session_count != Some(current) {
            self.seen_session_count = Some(current);
            return Ok(true);
        }
        Ok(false)
    }

    fn session_text(&mut self) -> Result<Option<String>> {
        Ok(self.lock().session_text.clone())
    }

    fn var_headers(&self) -> Result<Vec<VarHeader>> {
        Ok(self.headers())
    }

    fn var_slot(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.lock().slots.iter().position(|s| s.header.name == name))
    }

    fn read_bool(&self, slot: usize, entry: usize) -> Result<bool> {
        match self.lock().slots.get(slot).map(|s| &s.data) {
            Some(SlotData::Bool(values)) => {
                values.get(entry).copied().ok_or_else(|| read_error("bool", slot, entry))
            }
            _ => Err(read_error("bool", slot, entry)),
        }
    }

    fn read_int(&self, slot: usize, entry: usize) -> Result<i32> {
        match self.lock().slots.get(slot).map(|s| &s.data) {
            Some(SlotData::Int(values)) => {
                values.get(entry).copied().ok_or_else(|| read_error("int", slot, entry))
            }
            _ => Err(read_error("int", slot, entry)),
        }
    }

    fn read_float(&self, slot: usize, entry: usize) -> Result<f32> {
        match self.lock().slots.get(slot).map(|s| &s.data) {
            Some(SlotData::Float(values)) => {
                values.get(entry).copied().ok_or_else(|| read_error("float", slot, entry))
            }
            _ => Err(read_error("float", slot, entry)),
        }
    }

    fn read_double(&self, slot: usize, entry: usize) -> Result<f64> {
        match self.lock().slots.get(slot).map(|s| &s.data) {
            Some(SlotData::Double(values)) => {
                values.get(entry).copied().ok_or_else(|| read_error("double", slot, entry))
            }
            _ => Err(read_error("double", slot, entry)),
        }
    }

    fn pad_car_number(&self, value: i32, pad: i32) -> i32 {
        // Same packing the simulator applies to padded car numbers.
        let mut places = 1;
        if value > 99 {
            places = 3;
        } else if value > 9 {
            places = 2;
        }
        if pad > 0 {
            return value + 1000 * (places + pad);
        }
        value
    }

    fn send_command(&mut self, code: BroadcastCode, var1: i32, var2: i32, var3: i32) -> Result<()> {
        self.lock().sent.push((code, var1, var2, var3));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_reports_scripted_readiness_and_failures() {
        let mut provider = ScriptedProvider::builder().data_ready(false).build();
        let handle = provider.handle();

        assert!(!provider.wait_for_data(Duration::ZERO).await.unwrap());

        handle.set_data_ready(true);
        assert!(provider.wait_for_data(Duration::ZERO).await.unwrap());

        handle.fail_next_wait("shared memory unmapped");
        let err = provider.wait_for_data(Duration::ZERO).await.unwrap_err();
        assert!(err.is_retryable());
        // One-shot failure: the next wait succeeds again.
        assert!(provider.wait_for_data(Duration::ZERO).await.unwrap());
    }

    #[test]
    fn session_updated_fires_once_per_publish() {
        let mut provider = ScriptedProvider::builder().build();
        let handle = provider.handle();

        assert!(!provider.session_info_updated().unwrap());

        handle.publish_session("WeekendInfo:\n TrackName: okayama");
        assert!(provider.session_info_updated().unwrap());
        assert!(!provider.session_info_updated().unwrap());

        handle.publish_session("WeekendInfo:\n TrackName: spa");
        assert!(provider.session_info_updated().unwrap());
        assert_eq!(provider.session_update_count().unwrap(), 2);
    }

    #[test]
    fn car_number_packing_accounts_for_digit_places() {
        let provider = ScriptedProvider::builder().build();
        assert_eq!(provider.pad_car_number(7, 0), 7);
        assert_eq!(provider.pad_car_number(7, 1), 2007);
        assert_eq!(provider.pad_car_number(7, 2), 3007);
        assert_eq!(provider.pad_car_number(12, 1), 3012);
        assert_eq!(provider.pad_car_number(123, 0), 123);
    }

    #[test]
    fn typed_reads_reject_mismatched_slots() {
        let provider = ScriptedProvider::builder().int_var("Gear", 3).build();
        assert_eq!(provider.read_int(0, 0).unwrap(), 3);
        assert!(provider.read_double(0, 0).is_err());
        assert!(provider.read_int(0, 1).is_err());
        assert!(provider.read_int(1, 0).is_err());
    }
}
