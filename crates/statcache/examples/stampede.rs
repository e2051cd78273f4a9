// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Many threads missing the same key trigger a single load.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use statcache::{CacheTier, KeyLockingCache, MemoryCache};

fn main() {
    let cache = Arc::new(KeyLockingCache::new(MemoryCache::<String, String>::new(statcache::system_clock())));
    let loads = Arc::new(AtomicUsize::new(0));

    let callers: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let loads = Arc::clone(&loads);
            thread::spawn(move || {
                futures::executor::block_on(cache.get_or_load(&"ECB/flows".to_string(), Duration::from_secs(60), || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    // Simulate a slow request
                    thread::sleep(Duration::from_millis(100));
                    Ok::<_, std::io::Error>("EXR,ICP".to_string())
                }))
            })
        })
        .collect();

    for caller in callers {
        match caller.join() {
            Ok(Ok(flows)) => println!("got {flows}"),
            Ok(Err(error)) => println!("load failed: {error}"),
            Err(_) => println!("caller panicked"),
        }
    }

    println!("loader ran {} time(s)", loads.load(Ordering::SeqCst));
}
