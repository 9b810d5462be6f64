use probing_buckets::{HashTable, TableConfig};
use std::time::Instant;
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt::try_init().expect("config log fail");

    const CAPACITY: usize = 50000;
    const SAMPLE_SIZE: usize = 100000;
    const MAX_LOAD_FACTOR: f64 = 0.7;

    let mut samples: Vec<u64> = Vec::with_capacity(SAMPLE_SIZE);
    for _ in 0..SAMPLE_SIZE {
        samples.push(rand::random::<u64>());
    }

    let config: TableConfig = TableConfig::new()
        .initial_capacity(CAPACITY)
        .max_load_factor(MAX_LOAD_FACTOR);
    let mut h: HashTable<u64, u64> = match HashTable::with_config(config) {
        Ok(h) => h,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let now: Instant = Instant::now();
    for &key in samples.iter() {
        h.insert(key, key);
    }
    let elapsed: usize = now.elapsed().as_nanos() as usize;

    println!("Initial capacity {} actual capacity {}", CAPACITY, h.capacity());
    println!("Initial entries {} actual entries {}", SAMPLE_SIZE, h.len());
    println!("Load factor {}", h.load_factor());
    println!("Avg time to insert {}", elapsed as f64 / SAMPLE_SIZE as f64);

    let now: Instant = Instant::now();
    for key in samples.iter() {
        if h.get(key).is_none() {
            panic!("Failed to get key {}", key);
        }
    }
    let elapsed: usize = now.elapsed().as_nanos() as usize;
    println!("Avg time to lookup {}", elapsed as f64 / SAMPLE_SIZE as f64);

    println!("{}", h.stats());

    benchmarking::warm_up();
    match benchmarking::measure_function(|measurer| {
        for key in samples.iter() {
            measurer.measure(|| h.contains_key(key));
        }
    }) {
        Ok(result) => println!("Measured time to lookup {:?}", result.elapsed()),
        Err(e) => error!("benchmark failed: {:?}", e),
    }

    let now: Instant = Instant::now();
    for key in samples.iter() {
        h.erase(key);
    }
    let elapsed: usize = now.elapsed().as_nanos() as usize;

    println!("Actual capacity {} entries {} tombstones {}", h.capacity(), h.len(), h.tombstones());
    println!("Avg time to erase {}", elapsed as f64 / SAMPLE_SIZE as f64);

    let tombstones: usize = h.tombstones();
    match h.rehash(0) {
        Ok(()) => info!(tombstones, capacity = h.capacity(), "purged tombstones"),
        Err(e) => error!("{}", e),
    }
}
