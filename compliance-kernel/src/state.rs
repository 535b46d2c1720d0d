use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// File bornée : les plus anciens éléments sont évincés au-delà de `capacity`
pub fn push_bounded<T>(queue: &Shared<VecDeque<T>>, item: T, capacity: usize) {
    let mut q = queue.lock();
    q.push_back(item);
    while q.len() > capacity {
        q.pop_front();
    }
}
