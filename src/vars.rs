//! Typed decoding of the live variable table.
//!
//! The simulator publishes a flat table of variables, each described by a
//! [`VarHeader`] (name, element type, element count). The decoders here turn
//! provider reads into [`TelemetryValue`]s: scalars for single-entry
//! variables, arrays for multi-entry ones. A whole read of the table is a
//! [`TelemetryFrame`], an ordered name-to-value mapping rebuilt on every
//! poll.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::provider::Provider;
use crate::{Result, TelemetryError};

/// Element type of a telemetry variable.
///
/// The codes are the simulator's; [`VariableType::from_code`] returns `None`
/// for anything outside the known range, and such variables decode to null
/// rather than failing the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum VariableType {
    Char = 0,
    Bool = 1,
    Int = 2,
    BitField = 3,
    Float = 4,
    Double = 5,
}

impl VariableType {
    /// Map a raw type code to a known type, if any.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VariableType::Char),
            1 => Some(VariableType::Bool),
            2 => Some(VariableType::Int),
            3 => Some(VariableType::BitField),
            4 => Some(VariableType::Float),
            5 => Some(VariableType::Double),
            _ => None,
        }
    }

    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Descriptor of one variable slot in the published table.
///
/// Serializes to the export shape downstream consumers expect:
/// `{name, type, count, offset, countAsTime, desc, unit}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarHeader {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: i32,
    pub count: usize,
    pub offset: i32,
    pub count_as_time: bool,
    pub desc: String,
    pub unit: String,
}

impl VarHeader {
    /// The decoded element type, or `None` for an unknown code.
    pub fn var_type(&self) -> Option<VariableType> {
        VariableType::from_code(self.type_code)
    }
}

/// One decoded telemetry value.
///
/// Chars, ints and bitfields all decode as `Int`; floats widen to `Double`.
/// `Null` covers unknown type codes and unknown variable names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Null,
    Bool(bool),
    Int(i32),
    Double(f64),
    Array(Vec<TelemetryValue>),
}

impl TelemetryValue {
    pub fn is_null(&self) -> bool {
        matches!(self, TelemetryValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TelemetryValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TelemetryValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view: integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Double(d) => Some(*d),
            TelemetryValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// One read of the variable table: an ordered name-to-value mapping.
///
/// Order follows the request (or the table's declaration order for a full
/// read). Lookups are linear; frames are small and short-lived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    entries: Vec<(String, TelemetryValue)>,
}

impl TelemetryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: TelemetryValue) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&TelemetryValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TelemetryValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for TelemetryFrame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Decode a single entry of a variable slot.
///
/// The entry index must be inside `[0, count)`; the dispatch follows the
/// header's type code, with unknown codes decoding to null.
pub fn decode_entry<P>(
    provider: &P,
    slot: usize,
    header: &VarHeader,
    entry: usize,
) -> Result<TelemetryValue>
where
    P: Provider + ?Sized,
{
    if entry >= header.count {
        return Err(TelemetryError::out_of_range(format!(
            "entry {entry} outside [0, {}) for variable '{}'",
            header.count, header.name
        )));
    }

    let value = match header.var_type() {
        Some(VariableType::Bool) => TelemetryValue::Bool(provider.read_bool(slot, entry)?),
        Some(VariableType::Char | VariableType::Int | VariableType::BitField) => {
            TelemetryValue::Int(provider.read_int(slot, entry)?)
        }
        Some(VariableType::Float) => TelemetryValue::Double(provider.read_float(slot, entry)? as f64),
        Some(VariableType::Double) => TelemetryValue::Double(provider.read_double(slot, entry)?),
        None => {
            trace!(name = %header.name, code = header.type_code, "unknown variable type code");
            TelemetryValue::Null
        }
    };
    Ok(value)
}

/// Decode a whole variable slot: a scalar when `count == 1`, otherwise an
/// array in ascending entry order.
pub fn decode_variable<P>(provider: &P, slot: usize, header: &VarHeader) -> Result<TelemetryValue>
where
    P: Provider + ?Sized,
{
    if header.count <= 1 {
        return decode_entry(provider, slot, header, 0);
    }

    let mut items = Vec::with_capacity(header.count);
    for entry in 0..header.count {
        items.push(decode_entry(provider, slot, header, entry)?);
    }
    Ok(TelemetryValue::Array(items))
}

/// Read a caller-selected set of variables by name.
///
/// Unknown names produce null entries rather than errors, so a frame always
/// has one entry per requested name, in request order.
pub fn read_variables<P, S>(provider: &P, names: &[S]) -> Result<TelemetryFrame>
where
    P: Provider + ?Sized,
    S: AsRef<str>,
{
    let headers = provider.var_headers()?;
    let mut frame = TelemetryFrame::new();

    for name in names {
        let name = name.as_ref();
        let value = match provider.var_slot(name)? {
            Some(slot) => match headers.get(slot) {
                Some(header) => decode_variable(provider, slot, header)?,
                None => TelemetryValue::Null,
            },
            None => {
                trace!(%name, "requested variable not in table");
                TelemetryValue::Null
            }
        };
        frame.insert(name.to_string(), value);
    }

    Ok(frame)
}

/// Read the entire variable table in declaration order.
///
/// Returns `None` when the simulator is disconnected, an empty frame when the
/// table has no variables. Slots with empty names are skipped.
pub fn read_all_variables<P>(provider: &P) -> Result<Option<TelemetryFrame>>
where
    P: Provider + ?Sized,
{
    if !provider.is_connected()? {
        return Ok(None);
    }

    let headers = provider.var_headers()?;
    let mut frame = TelemetryFrame::new();

    for (slot, header) in headers.iter().enumerate() {
        if header.name.is_empty() {
            continue;
        }
        let value = decode_variable(provider, slot, header)?;
        frame.insert(header.name.clone(), value);
    }

    Ok(Some(frame))
}
