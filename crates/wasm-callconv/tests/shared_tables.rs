//! Convention tables are built once and read from many threads.

use std::thread;

use wasm_callconv::test_harness::sig;
use wasm_callconv::{CallInformation, CallRole, ConventionKind, Conventions, Target};

const SIGNATURES: [&str; 6] = [
    "() -> ()",
    "(i32, i64, f32, f64) -> (i32)",
    "(i64, i64, i64, i64, i64, i64, i64, i64, i64) -> (i64, i64)",
    "(externref, funcref, f64, f64, f64, f64, f64, f64, f64, f64, f64) -> (f64, f64)",
    "(i32) -> (i32, i64, f32, f64, i32, i64, i32, i64)",
    "(ref, refnull, exnref, i32) -> (refnull)",
];

fn layouts(conventions: &Conventions, kind: ConventionKind) -> Vec<CallInformation> {
    let table = conventions.get(kind).expect("convention exists");
    SIGNATURES
        .iter()
        .flat_map(|text| {
            let signature = sig(text);
            [CallRole::Caller, CallRole::Callee]
                .map(|role| table.call_information_for(&signature, role))
        })
        .collect()
}

#[test]
fn test_concurrent_queries_match_sequential_ones() {
    for target in Target::all() {
        let conventions = Conventions::new(target);
        let kinds: Vec<ConventionKind> = ConventionKind::ALL
            .into_iter()
            .filter(|&kind| target.supports(kind))
            .collect();
        let expected: Vec<Vec<CallInformation>> = kinds
            .iter()
            .map(|&kind| layouts(&conventions, kind))
            .collect();

        thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let kind = kinds[i % kinds.len()];
                    let conventions = &conventions;
                    scope.spawn(move || (kind, layouts(conventions, kind)))
                })
                .collect();
            for handle in handles {
                let (kind, got) = handle.join().expect("worker panicked");
                let index = kinds.iter().position(|&k| k == kind).unwrap();
                assert_eq!(got, expected[index], "{} {kind}", target.name);
            }
        });
    }
}
