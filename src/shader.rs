//! WGSL instrumentation: generates the `dbg_*` function fragment spliced in
//! front of a user shader, and scans shader source for mark-name comments.
//!
//! The generated call surface is identical in active and inactive mode, so
//! a shader compiles unchanged with instrumentation on or off.

use hashbrown::HashMap;

use crate::layout::{ENTRY_WORDS, HEADER_WORDS, MARK_UNSET, UNIT_HEADER_WORDS};

/// Mark id -> human-readable name, scraped from shader comments.
pub type MarkTable = HashMap<u32, String>;

/// No-op stubs with the same signatures as the active fragment.
const INACTIVE_FRAGMENT: &str = "\
fn dbg_init(uid: u32) {}

fn dbg_u32(val: u32) {}
fn dbg_i32(val: i32) {}
fn dbg_f32(val: f32) {}
fn dbg_32(val: u32, vtype: i32) {}

fn dbg_u32m(mark: i32, val: u32) {}
fn dbg_i32m(mark: i32, val: i32) {}
fn dbg_f32m(mark: i32, val: f32) {}
fn dbg_32m(mark: i32, val: u32, vtype: i32) {}";

/// Build the WGSL debug-function fragment.
///
/// `group` is the bind group slot the storage buffer is bound at (always
/// binding 0 inside it). `capacity` is the per-unit stored-entry limit and
/// must match the [`crate::layout::BufferLayout`] the buffers were sized
/// with. When `active` is false the fragment is all no-op stubs.
pub fn debug_functions(group: u32, capacity: u32, active: bool) -> String {
    if !active {
        return INACTIVE_FRAGMENT.to_owned();
    }
    let unit_words = UNIT_HEADER_WORDS + capacity as usize * ENTRY_WORDS;
    format!(
        "\
@group({group}) @binding(0) var<storage,read_write> _dbg: array<u32>;

var<private> _dbg_unit: u32;

fn dbg_init(uid: u32) {{
    // point this invocation at its unit and reset the entry count
    _dbg_unit = {HEADER_WORDS}u + uid * {unit_words}u;
    _dbg[_dbg_unit] = 0u;
}}

fn dbg_32m(mark: i32, val: u32, vtype: i32) {{
    // count every call; store detail only while below capacity
    var entry_count = _dbg[_dbg_unit];
    _dbg[_dbg_unit] = entry_count + 1u;
    if (entry_count >= {capacity}u) {{
        return;
    }}
    var entry_off = _dbg_unit + {UNIT_HEADER_WORDS}u + entry_count * {ENTRY_WORDS}u;
    _dbg[entry_off] = u32(vtype);
    _dbg[entry_off + 1u] = val;
    _dbg[entry_off + 2u] = u32(mark);
}}

fn dbg_u32m(mark: i32, val: u32) {{ dbg_32m(mark, val, 1); }}
fn dbg_i32m(mark: i32, val: i32) {{ dbg_32m(mark, bitcast<u32>(val), 2); }}
fn dbg_f32m(mark: i32, val: f32) {{ dbg_32m(mark, bitcast<u32>(val), 3); }}
fn dbg_32(val: u32, vtype: i32) {{ dbg_32m({MARK_UNSET}, val, vtype); }}
fn dbg_u32(val: u32) {{ dbg_u32m({MARK_UNSET}, val); }}
fn dbg_i32(val: i32) {{ dbg_i32m({MARK_UNSET}, val); }}
fn dbg_f32(val: f32) {{ dbg_f32m({MARK_UNSET}, val); }}"
    )
}

/// True if any line of `src` starts (after indentation) with a `dbg_init`
/// call. Active instrumentation without one produces meaningless data.
pub fn has_init_call(src: &str) -> bool {
    src.lines()
        .any(|l| l.trim_start_matches([' ', '\t']).starts_with("dbg_init"))
}

/// Scan shader source for mark names.
///
/// This is a deliberately narrow single-line match, not a WGSL parser.
/// A line contributes one table entry iff it has the shape
///
/// ```text
/// <ws> dbg_{u32m|i32m|f32m|32m} <ws> ( <ws> <uint literal> ... ; <ws> ("//" | "/*") <name>
/// ```
///
/// where `...` contains no `;`. The integer literal is the key and the
/// trimmed `<name>` (minus a trailing `*/`) the value. Anything else is
/// silently skipped; an unannotated mark call simply stays unnamed.
pub fn extract_marks(src: &str) -> MarkTable {
    let mut marks = MarkTable::new();
    for line in src.lines() {
        if let Some((mark, name)) = mark_from_line(line) {
            marks.insert(mark, name);
        }
    }
    marks
}

fn mark_from_line(line: &str) -> Option<(u32, String)> {
    let rest = line.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix("dbg_")?;
    let rest = ["u32m", "i32m", "f32m", "32m"]
        .iter()
        .find_map(|k| rest.strip_prefix(k))?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let rest = rest.strip_prefix('(')?;
    let rest = rest.trim_start_matches([' ', '\t']);
    let digits = rest.split(|c: char| !c.is_ascii_digit()).next()?;
    let mark: u32 = digits.parse().ok()?;
    let rest = &rest[digits.len()..];
    let semi = rest.find(';')?;
    let after = rest[semi + 1..].trim_start_matches([' ', '\t']);
    let comment = after
        .strip_prefix("//")
        .or_else(|| after.strip_prefix("/*"))?;
    let name = comment.trim().trim_end_matches("*/").trim();
    Some((mark, name.to_owned()))
}

/// Prepend the debug fragment to `src` and collect its mark table.
///
/// Warns (non-fatally) when `active` and the shader never calls `dbg_init`.
pub fn instrument(src: &str, group: u32, capacity: u32, active: bool) -> (String, MarkTable) {
    if active && !has_init_call(src) {
        log::warn!("shader contains no dbg_init() call, debug data will be meaningless");
    }
    let marks = extract_marks(src);
    log::debug!("instrumented shader, {} named marks", marks.len());
    let combined = format!("{}\n{}", debug_functions(group, capacity, active), src);
    (combined, marks)
}
