//! Request sharing across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use dataview_core::DataError;
use dataview_runtime::{RequestCache, UiLoop};
use futures::channel::oneshot;
use futures::executor::block_on;

#[test]
fn threads_asking_for_one_key_share_one_execution() {
    let cache: RequestCache<u32, DataError> = RequestCache::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = oneshot::channel::<u32>();
    let rx = Arc::new(std::sync::Mutex::new(Some(rx)));
    let joined = Arc::new(Barrier::new(5));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let (cache, starts, rx, joined) = (
                cache.clone(),
                Arc::clone(&starts),
                Arc::clone(&rx),
                Arc::clone(&joined),
            );
            thread::spawn(move || {
                let handle = cache.get_or_start("feed", || {
                    starts.fetch_add(1, Ordering::SeqCst);
                    let rx = rx.lock().unwrap().take();
                    async move {
                        match rx {
                            Some(rx) => rx.await.map_err(|_| DataError::Cancelled),
                            None => Err(DataError::Unknown),
                        }
                    }
                });
                joined.wait();
                block_on(handle)
            })
        })
        .collect();

    joined.wait();
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    tx.send(42).unwrap();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), Ok(42));
    }
    assert!(cache.is_empty());
}

#[test]
fn ui_loop_wakes_for_a_result_finished_elsewhere() {
    let mut ui = UiLoop::new();
    let cache: RequestCache<String, DataError> = RequestCache::new();
    let (tx, rx) = oneshot::channel::<String>();
    let handle = cache.get_or_start("profile", move || async move {
        rx.await.map_err(|_| DataError::Cancelled)
    });

    let worker = thread::spawn(move || tx.send("ann".to_owned()).unwrap());
    assert_eq!(ui.run_until(handle), Ok("ann".to_owned()));
    worker.join().unwrap();
}
