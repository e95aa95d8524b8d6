/// Fixed-width pool for running independent work items in parallel.
///
/// Work is split into at most `num_threads` contiguous chunks, each run on a
/// scoped thread, so items may borrow from the caller.
///
/// # Example
///
/// ```
/// use keepsake_graph::ThreadPool;
///
/// let pool = ThreadPool::new(4);
///
/// let mut results = vec![1u32, 2, 3, 4, 5];
/// pool.for_each_mut(&mut results, |value| *value *= 10);
/// assert_eq!(results, vec![10, 20, 30, 40, 50]);
/// ```
#[derive(Debug, Clone)]
pub struct ThreadPool {
    num_threads: usize,
}

impl ThreadPool {
    /// Creates a pool running at most `num_threads` items at once.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    /// Creates a thread pool sized to the number of available CPU cores.
    pub fn default_threads() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Runs `f` on every item and returns once all calls finished.
    ///
    /// With one thread, or a single item, everything runs on the caller.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let threads = self.num_threads.min(items.len());
        if threads <= 1 {
            items.iter_mut().for_each(&f);
            return;
        }

        let chunk = items.len().div_ceil(threads);
        let f = &f;
        std::thread::scope(|s| {
            for part in items.chunks_mut(chunk) {
                s.spawn(move || part.iter_mut().for_each(f));
            }
        });
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn runs_every_item() {
        let pool = ThreadPool::new(3);
        let mut items: Vec<u32> = (0..10).collect();

        pool.for_each_mut(&mut items, |x| *x += 1);

        assert_eq!(items, (1..11).collect::<Vec<_>>());
    }

    #[test]
    fn shared_state_across_threads() {
        let pool = ThreadPool::new(4);
        let counter = AtomicU32::new(0);
        let mut items = vec![(); 8];

        pool.for_each_mut(&mut items, |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(counter.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn single_thread_and_empty_input() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.num_threads(), 1);

        let mut empty: Vec<u32> = Vec::new();
        pool.for_each_mut(&mut empty, |_| unreachable!());

        let mut one = vec![5u32];
        pool.for_each_mut(&mut one, |x| *x *= 2);
        assert_eq!(one, vec![10]);
    }

    #[test]
    fn default_threads_creates_pool() {
        let pool = ThreadPool::default_threads();
        assert!(pool.num_threads() >= 1);
    }
}
