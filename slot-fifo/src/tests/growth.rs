use std::thread;
use std::vec::Vec;

use crate::Fifo;

#[test]
fn capacity_one_grows_to_two_on_the_second_push() {
    let queue = Fifo::with_capacity(1);
    assert_eq!(queue.capacity(), 1);

    queue.push(1u32).unwrap();
    assert_eq!(queue.capacity(), 1);

    queue.push(2).unwrap();
    assert_eq!(queue.capacity(), 2);

    assert_eq!(queue.pop(), Some(1));
    assert_eq!(queue.pop(), Some(2));
}

#[test]
fn growth_doubles_across_every_boundary() {
    let queue = Fifo::with_capacity(1);
    for i in 0..100u32 {
        queue.push(i).unwrap();
    }
    // Doubling from 1 while claims walk past each boundary: 128 covers 100.
    assert_eq!(queue.capacity(), 128);
    let mut drained = Vec::new();
    queue.pop_all(&mut drained);
    assert_eq!(drained.len(), 100);
}

#[test]
fn indices_are_stable_across_growth() {
    let queue = Fifo::with_capacity(2);
    queue.push(10u32).unwrap();
    queue.push(20).unwrap();
    // The next claim lands on the boundary and grows the slab; the two
    // published slots must survive the reallocation untouched.
    queue.push(30).unwrap();
    assert_eq!(queue.capacity(), 4);
    assert_eq!(queue.pop(), Some(10));
    assert_eq!(queue.pop(), Some(20));
    assert_eq!(queue.pop(), Some(30));
}

#[test]
fn growth_stress_from_capacity_one() {
    const PRODUCERS: usize = 32;
    const PER_PRODUCER: usize = 10_000;
    const TOTAL: usize = PRODUCERS * PER_PRODUCER;

    let queue = Fifo::with_capacity(1);
    thread::scope(|s| {
        for id in 0..PRODUCERS {
            let queue = &queue;
            s.spawn(move || {
                for k in 0..PER_PRODUCER {
                    queue.push(id * PER_PRODUCER + k).unwrap();
                }
            });
        }
    });

    let capacity = queue.capacity();
    assert!(capacity.is_power_of_two());
    assert!(capacity >= TOTAL, "capacity {capacity} does not cover {TOTAL} claims");

    let mut drained = Vec::with_capacity(TOTAL);
    queue.pop_all(&mut drained);
    drained.sort_unstable();
    assert_eq!(drained.len(), TOTAL);
    for (expected, value) in drained.iter().enumerate() {
        assert_eq!(*value, expected);
    }
}
