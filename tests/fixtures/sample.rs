use std::collections::HashMap;

/// Counts word frequencies
pub struct Counter {
    counts: HashMap<String, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self { counts: HashMap::new() }
    }

    pub fn add(&mut self, word: &str) -> usize {
        let entry = self.counts.entry(word.to_lowercase()).or_insert(0);
        *entry += 1;
        *entry
    }
}

fn main() {
    let mut counter = Counter::new();
    for word in "the quick brown fox jumps over the lazy dog".split(' ') {
        counter.add(word);
    }
    println!("the: {}", counter.add("the"));
}
