//! Append-only history semantics.

use wgsl_probe::{DebugEntry, DebugValue, LogOutput, Output, Pass, Record};

fn pass_with(uid: u32, unit_count: u32, values: &[u32]) -> Pass {
    let mut pass = Pass::with_unit_count(unit_count);
    for &v in values {
        pass.unit_mut(uid)
            .push(DebugEntry::new(DebugValue::U32(v), None));
    }
    pass
}

#[test]
fn append_only_growth() {
    let mut record = Record::new();
    assert!(record.is_empty());

    for n in 0..5u32 {
        record.append(pass_with(0, 2, &[n, n + 100]));
        assert_eq!(record.len(), n as usize + 1);
    }

    // earlier passes are untouched by later appends
    for n in 0..5u32 {
        let pass = record.get(n as usize).expect("pass must exist");
        let got: Vec<_> = pass.unit(0).iter().map(|e| e.value).collect();
        assert_eq!(got, vec![DebugValue::U32(n), DebugValue::U32(n + 100)]);
        assert!(pass.unit(1).is_empty());
    }
    assert!(record.get(5).is_none());
}

#[test]
fn clear_drops_everything() {
    let mut record = Record::new();
    record.append(pass_with(0, 1, &[1]));
    record.append(pass_with(0, 1, &[2]));
    record.clear();
    assert!(record.is_empty());
    assert!(record.get(0).is_none());
    assert!(record.last().is_none());
}

#[test]
fn log_output_handles_any_record_state() {
    // the fallback output must cope with whatever the session hands it:
    // empty history, empty units, marked and unmarked entries
    let mut output = LogOutput;
    let record = Record::new();
    output.update(&record);

    let mut record = Record::new();
    record.append(Pass::with_unit_count(3));
    let mut pass = pass_with(0, 3, &[7, 8]);
    pass.unit_mut(2)
        .push(DebugEntry::new(DebugValue::F32(0.5), Some(4)));
    record.append(pass);
    output.update(&record);
    output.reset();

    // the output only reads; history is untouched
    assert_eq!(record.len(), 2);
    assert_eq!(record.get(1).unwrap().unit(0).len(), 2);
}

#[test]
fn clear_processed_resets_every_entry() {
    let mut record = Record::new();
    record.append(pass_with(0, 2, &[1, 2]));
    record.append(pass_with(1, 2, &[3]));

    // a consumer walks the history and marks entries as rendered
    for i in 0..record.len() {
        let pass = record.pass_mut(i).expect("pass");
        for uid in 0..2 {
            for entry in pass.unit_mut(uid) {
                entry.processed = true;
            }
        }
    }
    assert!(record.iter().flat_map(|p| p.units()).flatten().all(|e| e.processed));

    record.clear_processed();
    assert!(record.iter().flat_map(|p| p.units()).flatten().all(|e| !e.processed));
}
