//! Decoded debug data: entries, per-pass snapshots, and the append-only
//! capture history.

use std::fmt;

use crate::layout::{TYPE_F32, TYPE_I32, TYPE_U32};

/// One debug value with its shader-side type carried along.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugValue {
    U32(u32),
    I32(i32),
    F32(f32),
}

impl DebugValue {
    /// The wire type tag this value was (or would be) stored with.
    pub fn type_tag(&self) -> u32 {
        match self {
            DebugValue::U32(_) => TYPE_U32,
            DebugValue::I32(_) => TYPE_I32,
            DebugValue::F32(_) => TYPE_F32,
        }
    }

    /// Raw bit pattern as stored in the buffer's value word.
    pub fn raw_bits(&self) -> u32 {
        match *self {
            DebugValue::U32(v) => v,
            DebugValue::I32(v) => v as u32,
            DebugValue::F32(v) => v.to_bits(),
        }
    }
}

impl fmt::Display for DebugValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DebugValue::U32(v) => write!(f, "{v}u"),
            DebugValue::I32(v) => write!(f, "{v}i"),
            DebugValue::F32(v) => write!(f, "{v}f"),
        }
    }
}

/// One value emitted by a `dbg_*` call in the shader.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugEntry {
    pub value: DebugValue,
    /// `None` when the call did not attach a mark (wire sentinel 999999).
    pub mark: Option<u32>,
    /// Consumer-side flag for incremental rendering; never part of the wire
    /// format and never set by the decoder.
    pub processed: bool,
}

impl DebugEntry {
    pub fn new(value: DebugValue, mark: Option<u32>) -> Self {
        Self {
            value,
            mark,
            processed: false,
        }
    }
}

/// One captured snapshot: the entry list of every execution unit at one
/// point in device execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pass {
    units: Vec<Vec<DebugEntry>>,
}

impl Pass {
    pub fn with_unit_count(unit_count: u32) -> Self {
        Self {
            units: vec![Vec::new(); unit_count as usize],
        }
    }

    pub fn unit(&self, uid: u32) -> &[DebugEntry] {
        &self.units[uid as usize]
    }

    pub fn unit_count(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn unit_mut(&mut self, uid: u32) -> &mut Vec<DebugEntry> {
        &mut self.units[uid as usize]
    }

    pub fn units(&self) -> impl Iterator<Item = &[DebugEntry]> {
        self.units.iter().map(|u| u.as_slice())
    }
}

/// Append-only history of decoded passes for one capture session.
///
/// Grows without bound as passes are captured; that is the documented
/// behavior, and `clear` (driven by reconfiguration) is the only way to
/// drop passes.
#[derive(Debug, Default)]
pub struct Record {
    passes: Vec<Pass>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, pass: Pass) {
        self.passes.push(pass);
    }

    pub fn get(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn last(&self) -> Option<&Pass> {
        self.passes.last()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pass> {
        self.passes.iter()
    }

    pub fn clear(&mut self) {
        self.passes.clear();
    }

    /// Reset the `processed` flag on every entry of every stored pass.
    /// Used by consumers that render incrementally and want a full repaint.
    pub fn clear_processed(&mut self) {
        for pass in &mut self.passes {
            for unit in &mut pass.units {
                for entry in unit {
                    entry.processed = false;
                }
            }
        }
    }

    /// Mutable access for consumers that track per-entry `processed` state.
    pub fn pass_mut(&mut self, index: usize) -> Option<&mut Pass> {
        self.passes.get_mut(index)
    }
}
