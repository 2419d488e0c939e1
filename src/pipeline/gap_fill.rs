//! Bounded "top up to N items" combinator.
//!
//! Several stages ask the model for a list of a given size and get back
//! fewer items than requested. [`fill_gap`] asks a generator for the missing
//! items, at most `max_rounds` times, and always returns at most `target`
//! items. A generator error or a round that adds nothing ends the fill early.

use std::future::Future;

/// Default number of top-up rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Outcome of a gap fill.
#[derive(Debug)]
pub struct GapFill<T, E> {
    /// The list, truncated to the target.
    pub items: Vec<T>,
    /// Generator calls made.
    pub rounds: usize,
    /// The error that ended the fill, if any.
    pub error: Option<E>,
}

impl<T, E> GapFill<T, E> {
    /// Whether the list reached `target`.
    pub fn is_complete(&self, target: usize) -> bool {
        self.items.len() >= target
    }
}

/// Top `current` up to `target` items.
///
/// The generator receives the number of missing items and the items so far
/// (for use as negative context) and returns new items.
pub async fn fill_gap<T, E, F, Fut>(
    mut current: Vec<T>,
    target: usize,
    max_rounds: usize,
    mut generate: F,
) -> GapFill<T, E>
where
    F: FnMut(usize, &[T]) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut rounds = 0;
    let mut error = None;

    while current.len() < target && rounds < max_rounds {
        let missing = target - current.len();
        rounds += 1;

        match generate(missing, &current).await {
            Ok(new_items) => {
                if new_items.is_empty() {
                    tracing::debug!(round = rounds, "Gap fill round produced nothing");
                    break;
                }
                current.extend(new_items.into_iter().take(missing));
            }
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }

    current.truncate(target);
    GapFill {
        items: current,
        rounds,
        error,
    }
}
