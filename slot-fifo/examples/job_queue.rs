//! Worker-thread job queue driven by `Fifo`.
//!
//! Producers enqueue boxed jobs; a pool of workers drains the queue until no
//! job is left, then the executed-job count is printed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use slot_fifo::Fifo;

type Job = Box<dyn FnOnce() + Send>;

const JOBS: usize = 1_000;
const WORKERS: usize = 20;

fn main() {
    let queue: Fifo<Job> = Fifo::new();
    let executed = Arc::new(AtomicUsize::new(0));

    for _ in 0..JOBS {
        let executed = Arc::clone(&executed);
        let job: Job = Box::new(move || {
            executed.fetch_add(1, Ordering::Relaxed);
        });
        queue
            .push(job)
            .expect("a fresh queue cannot exhaust its counters");
    }

    thread::scope(|s| {
        for _ in 0..WORKERS {
            s.spawn(|| {
                while let Some(job) = queue.pop() {
                    job();
                }
            });
        }
    });

    println!("{}", executed.load(Ordering::Relaxed));
}
