//! Common stress tests for [`ConcurrentOrderedList`], generic over the guard.
//!
//! Keys are drawn from a small range so that adds and removes collide on the same
//! nodes, which drives the flag, mark and backlink paths hard.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data_structures::ConcurrentOrderedList;
use crate::guard::Guard;

type TestList<G> = ConcurrentOrderedList<i32, G>;

/// Percentages of add, remove and contains in a workload.
///
#[derive(Debug, Clone, Copy)]
pub struct OpMix {
    pub add: u32,
    pub remove: u32,
    pub contains: u32,
}

impl OpMix {
    pub const BALANCED: OpMix = OpMix { add: 34, remove: 33, contains: 33 };
    pub const UPDATE_ONLY: OpMix = OpMix { add: 50, remove: 50, contains: 0 };
    pub const READ_HEAVY: OpMix = OpMix { add: 25, remove: 25, contains: 50 };
}

/// Run `ops_per_thread` random operations per thread over keys in `0..key_range`.
///
/// Every thread tallies its successful adds and removes per key; at quiescence
/// the list must contain exactly the keys whose tallies differ, in sorted order.
pub fn test_mixed_workload<G: Guard>(threads: usize, mix: OpMix) {
    let list = Arc::new(TestList::<G>::new());
    let key_range: i32 = 128;
    let ops_per_thread = 20_000;
    let barrier = Arc::new(Barrier::new(threads));

    // Successful adds and removes per key, across all threads
    let adds: Arc<Vec<AtomicUsize>> =
        Arc::new((0..key_range).map(|_| AtomicUsize::new(0)).collect());
    let removes: Arc<Vec<AtomicUsize>> =
        Arc::new((0..key_range).map(|_| AtomicUsize::new(0)).collect());

    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let list = Arc::clone(&list);
            let barrier = Arc::clone(&barrier);
            let adds = Arc::clone(&adds);
            let removes = Arc::clone(&removes);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t as u64);
                barrier.wait();

                for _ in 0..ops_per_thread {
                    let key = rng.random_range(0..key_range);
                    let roll = rng.random_range(0..100u32);

                    if roll < mix.add {
                        if list.insert(key) == Ok(true) {
                            adds[key as usize].fetch_add(1, Ordering::Relaxed);
                        }
                    } else if roll < mix.add + mix.remove {
                        if let Some(node) = list.remove(&key) {
                            assert_eq!(*node.key(), key);
                            removes[key as usize].fetch_add(1, Ordering::Relaxed);
                        }
                    } else {
                        list.contains(&key);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected: Vec<i32> = (0..key_range)
        .filter(|&key| {
            let added = adds[key as usize].load(Ordering::Relaxed);
            let removed = removes[key as usize].load(Ordering::Relaxed);
            assert!(
                added == removed || added == removed + 1,
                "key {}: {} adds, {} removes",
                key,
                added,
                removed
            );
            added > removed
        })
        .collect();

    let keys = list.to_vec();
    assert!(keys.windows(2).all(|w| w[0] < w[1]), "list out of order");
    assert_eq!(keys, expected);
    for key in 0..key_range {
        assert_eq!(list.contains(&key), expected.binary_search(&key).is_ok());
    }

    println!(
        "{} threads, mix {:?}: {} ops in {:?}, {} keys left",
        threads,
        mix,
        threads * ops_per_thread,
        start.elapsed(),
        keys.len()
    );
}

/// Many threads delete the same value: exactly one succeeds
pub fn test_concurrent_delete_same_value<G: Guard>() {
    let list = Arc::new(TestList::<G>::new());
    let num_threads = 32;
    let test_value = 42;

    for key in [41, 42, 43] {
        list.insert(key).unwrap();
    }

    let success_count = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let list = Arc::clone(&list);
            let success = Arc::clone(&success_count);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if list.delete(&test_value) {
                    success.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        success_count.load(Ordering::Relaxed),
        1,
        "Exactly one thread should successfully delete the value"
    );
    assert!(!list.contains(&test_value), "Value should be gone");
    assert_eq!(list.to_vec(), vec![41, 43]);
}

/// Each thread owns its keys: an add is visible until its own delete
pub fn test_linearizability<G: Guard>() {
    let list = Arc::new(TestList::<G>::new());
    let num_threads = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8);
    let num_ops = 2_000;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for i in 0..num_ops {
                    let key = (t * num_ops + i) as i32;

                    assert_eq!(list.insert(key), Ok(true), "Failed to add unique key {}", key);
                    assert!(list.contains(&key), "Key {} not found after add", key);
                    assert!(list.delete(&key), "Failed to delete existing key {}", key);
                    assert!(!list.contains(&key), "Key {} found after delete", key);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(list.is_empty());
    println!(
        "Linearizability test completed with {} threads x {} ops",
        num_threads, num_ops
    );
}

/// Add and remove race on one key; successes alternate
pub fn test_extreme_contention_single_key<G: Guard>() {
    let list = Arc::new(TestList::<G>::new());
    let num_threads = 16;
    let ops_per_thread = 1_000;
    let the_key = 42;

    let successful_adds = Arc::new(AtomicUsize::new(0));
    let successful_removes = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let list = Arc::clone(&list);
            let adds = Arc::clone(&successful_adds);
            let removes = Arc::clone(&successful_removes);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();

                for _ in 0..ops_per_thread {
                    if list.insert(the_key) == Ok(true) {
                        adds.fetch_add(1, Ordering::Relaxed);
                    }
                    if list.delete(&the_key) {
                        removes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let total_adds = successful_adds.load(Ordering::Relaxed);
    let total_removes = successful_removes.load(Ordering::Relaxed);

    println!(
        "Single key contention - Adds: {}, Removes: {}",
        total_adds, total_removes
    );

    // Every thread ends with a delete, so the key cannot survive
    assert_eq!(total_adds, total_removes);
    assert!(list.is_empty());
}

/// Neighbouring keys removed at once, so removals meet flagged and marked predecessors
pub fn test_adjacent_removals<G: Guard>() {
    let num_threads = 8;
    let keys_per_thread = 64;
    let total = (num_threads * keys_per_thread) as i32;

    for _ in 0..20 {
        let list = Arc::new(TestList::<G>::new());
        for key in 0..total {
            list.insert(key).unwrap();
        }
        let barrier = Arc::new(Barrier::new(num_threads));

        let handles: Vec<_> = (0..num_threads)
            .map(|t| {
                let list = Arc::clone(&list);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Thread t removes every num_threads-th key, so neighbours belong
                    // to different threads
                    let mut key = t as i32;
                    while key < total {
                        assert!(list.delete(&key), "key {} vanished", key);
                        key += num_threads as i32;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(list.is_empty());
    }
}

/// Readers never see a stable key go missing while writers churn around it
pub fn test_concurrent_find_and_modify<G: Guard>() {
    let list = Arc::new(TestList::<G>::new());
    let stop = Arc::new(AtomicBool::new(false));

    // Even keys are stable, odd keys churn
    for key in (0..200).step_by(2) {
        list.insert(key).unwrap();
    }

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let list = Arc::clone(&list);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(100 + t);
                while !stop.load(Ordering::Relaxed) {
                    let key = rng.random_range(0..100) * 2 + 1;
                    if rng.random_bool(0.5) {
                        let _ = list.insert(key);
                    } else {
                        list.delete(&key);
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for _ in 0..200 {
                    for key in (0..200).step_by(2) {
                        assert!(list.contains(&key), "stable key {} missing", key);
                    }
                    let snapshot = list.to_vec();
                    assert!(snapshot.windows(2).all(|w| w[0] < w[1]));
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }

    let keys = list.to_vec();
    for key in (0..200).step_by(2) {
        assert!(keys.binary_search(&key).is_ok());
    }
}

/// Lock-freedom: with every thread hammering its own keys, all of them make progress
pub fn test_progress_guarantee<G: Guard>() {
    let list = Arc::new(TestList::<G>::new());
    let num_threads = 4;
    let progress: Arc<Vec<AtomicUsize>> =
        Arc::new((0..num_threads).map(|_| AtomicUsize::new(0)).collect());
    let stop = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let list = Arc::clone(&list);
            let progress = Arc::clone(&progress);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut i = 0i32;
                while !stop.load(Ordering::Relaxed) {
                    let key = (t as i32) * 1_000_000 + (i % 1_000);
                    if list.insert(key) == Ok(true) {
                        progress[t].fetch_add(1, Ordering::Relaxed);
                    }
                    if list.delete(&key) {
                        progress[t].fetch_add(1, Ordering::Relaxed);
                    }
                    i += 1;
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(500));
    stop.store(true, Ordering::Relaxed);

    for handle in handles {
        handle.join().unwrap();
    }

    for (t, counter) in progress.iter().enumerate() {
        assert!(
            counter.load(Ordering::Relaxed) > 0,
            "thread {} made no progress",
            t
        );
    }
    assert!(list.is_empty());
}
