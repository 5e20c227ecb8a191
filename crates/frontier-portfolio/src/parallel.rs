//! Conditional parallel iteration.
//!
//! Uses rayon when the `parallel` feature is enabled and the engine config
//! asks for it; otherwise iterates sequentially. Output order always matches
//! input order.

use crate::config::EngineConfig;

/// Maps `f` over `items` with their indices, in parallel when allowed.
#[allow(unused_variables)]
pub fn maybe_parallel_map<T, U, F>(items: &[T], config: &EngineConfig, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(usize, &T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if config.should_parallelize(items.len()) {
            return items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect();
        }
    }

    items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
}
