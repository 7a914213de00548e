use std::time::Duration;

use heavytop::{Config, HeavyKeeper};

fn main() {
    // Create a new HeavyKeeper with:
    // - k=3 (number of top items to track)
    // - width=1000 (size of hash table, larger values use more memory but reduce collisions)
    // - depth=4 (number of hash functions, more depth increases accuracy but uses more CPU)
    // - decay=0.9 (conflict decay factor, higher values make it easier to displace a bucket's owner)
    // - fading every 500ms, halving all counters
    let config = Config::new(3, 1000, 4, 0.9).with_fading(true, 2, Duration::from_millis(500));
    let topk = HeavyKeeper::new(config).expect("valid configuration");
    let expelled = topk.expelled();

    // Add some example items with weights to show frequency counting
    topk.add("frequent item", 50);
    topk.add("less frequent item", 30);
    topk.add("rare item", 10);

    // A burst pushes the least frequent item out of the top-k set
    let (evicted, accepted) = topk.add("burst item", 40);
    println!("burst accepted: {}, evicted: {:?}", accepted, evicted);

    println!("Top items and their frequencies:");
    for node in topk.list() {
        println!("{}: {}", node.key, node.count);
    }

    for node in expelled.try_iter() {
        println!("expelled {} with count {}", node.key, node.count);
    }

    let item = "frequent item";
    println!("\nCount for '{}': {:?}", item, topk.count(item));
    println!(
        "Is '{}' in top-k? {}",
        item,
        if topk.query(item) { "yes" } else { "no" }
    );

    // Let one fading sweep run
    std::thread::sleep(Duration::from_millis(600));
    println!("\nAfter fading, total = {}", topk.total());
    for node in topk.list() {
        println!("{}: {}", node.key, node.count);
    }
}
