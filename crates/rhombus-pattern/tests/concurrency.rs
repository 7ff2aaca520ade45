//! Sharing one generator between threads

use pretty_assertions::assert_eq;
use rhombus_pattern::{PatternGenerator, PatternResult};
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn generator_is_send_and_sync() {
    assert_send_sync::<PatternGenerator>();
    assert_send_sync::<PatternResult>();
}

#[test]
fn shared_generator_matches_sequential_output() {
    let generator = PatternGenerator::default();
    let heights: Vec<i64> = (1..=64).collect();

    let sequential: Vec<String> = heights
        .iter()
        .map(|&n| generator.generate(n).unwrap().text())
        .collect();

    let concurrent: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = heights
            .iter()
            .map(|&n| {
                let generator = &generator;
                scope.spawn(move || generator.generate(n).unwrap().text())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(concurrent, sequential);
}
