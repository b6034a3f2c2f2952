//! The shuffled working set of images for the current cycle.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::SliceRandom;

/// Shuffled image paths plus a cursor into them.
///
/// Every image is handed out exactly once per cycle. When the cursor runs past
/// the end the pool is reshuffled (the wrap boundary). Reshuffles never place
/// the previously shown image first unless it is the only one.
#[derive(Debug, Default, Clone)]
pub struct ImagePool {
    items: Vec<PathBuf>,
    /// `None` until the first pick after a refresh.
    cursor: Option<usize>,
    last_shown: Option<PathBuf>,
}

impl ImagePool {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            last_shown: None,
        }
    }

    /// Replaces the pool contents with a freshly shuffled listing.
    pub fn replace<R: Rng + ?Sized>(&mut self, items: Vec<PathBuf>, rng: &mut R) {
        self.items = items;
        shuffle_avoiding(&mut self.items, self.last_shown.as_deref(), rng);
        self.cursor = None;
    }

    /// Advances to the next image, reshuffling at the end of a cycle.
    ///
    /// Returns `None` when the pool is empty.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PathBuf> {
        if self.items.is_empty() {
            return None;
        }

        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        let index = if next >= self.items.len() {
            shuffle_avoiding(&mut self.items, self.last_shown.as_deref(), rng);
            0
        } else {
            next
        };

        self.cursor = Some(index);
        let picked = self.items[index].clone();
        self.last_shown = Some(picked.clone());
        Some(picked)
    }

    /// Number of images in the current cycle.
    #[must_use]
    pub fn len(&self) -> usize { self.items.len() }

    /// Whether the pool holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    #[cfg(test)]
    pub(super) fn items(&self) -> &[PathBuf] { &self.items }
}

fn shuffle_avoiding<R: Rng + ?Sized>(items: &mut [PathBuf], avoid: Option<&Path>, rng: &mut R) {
    items.shuffle(rng);

    if items.len() > 1 && avoid.is_some_and(|avoid| items[0] == avoid) {
        let swap_with = rng.random_range(1..items.len());
        items.swap(0, swap_with);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> { names.iter().map(PathBuf::from).collect() }

    fn seeded(seed: u64) -> StdRng { StdRng::seed_from_u64(seed) }

    #[test]
    fn test_empty_pool_yields_nothing() {
        let mut pool = ImagePool::new();
        assert!(pool.next(&mut seeded(1)).is_none());
        assert!(pool.last_shown.is_none());
    }

    #[test]
    fn test_singleton_repeats_forever() {
        let mut pool = ImagePool::new();
        let mut rng = seeded(2);
        pool.replace(paths(&["only.png"]), &mut rng);

        for _ in 0..5 {
            assert_eq!(pool.next(&mut rng), Some(PathBuf::from("only.png")));
        }
    }

    #[test]
    fn test_each_cycle_shows_every_image_once() {
        let names = ["a.png", "b.jpg", "c.gif", "d.bmp", "e.jpeg"];
        let mut pool = ImagePool::new();
        let mut rng = seeded(3);
        pool.replace(paths(&names), &mut rng);

        for _ in 0..4 {
            let cycle: HashSet<PathBuf> =
                (0..names.len()).map(|_| pool.next(&mut rng).unwrap()).collect();
            assert_eq!(cycle.len(), names.len());
        }
    }

    #[test]
    fn test_no_consecutive_repeats_across_many_seeds() {
        for seed in 0..200 {
            let mut pool = ImagePool::new();
            let mut rng = seeded(seed);
            pool.replace(paths(&["a", "b", "c"]), &mut rng);

            let mut previous = None;
            for _ in 0..30 {
                let picked = pool.next(&mut rng).unwrap();
                assert_ne!(Some(&picked), previous.as_ref(), "seed {seed} repeated {picked:?}");
                previous = Some(picked);
            }
        }
    }

    #[test]
    fn test_two_n_picks_show_every_image_twice() {
        let names = ["1.png", "2.png", "3.png", "4.png"];
        let mut pool = ImagePool::new();
        let mut rng = seeded(4);
        pool.replace(paths(&names), &mut rng);

        let mut counts: HashMap<PathBuf, usize> = HashMap::new();
        for _ in 0..names.len() * 2 {
            *counts.entry(pool.next(&mut rng).unwrap()).or_default() += 1;
        }

        assert_eq!(counts.len(), names.len());
        assert!(counts.values().all(|&count| count == 2));
    }

    #[test]
    fn test_replace_resets_cursor_and_avoids_last_shown() {
        for seed in 0..100 {
            let mut pool = ImagePool::new();
            let mut rng = seeded(seed);
            pool.replace(paths(&["x", "y"]), &mut rng);
            let shown = pool.next(&mut rng).unwrap();

            pool.replace(paths(&["x", "y"]), &mut rng);
            assert_eq!(pool.cursor, None);
            assert_ne!(pool.next(&mut rng).unwrap(), shown);
        }
    }

    #[test]
    fn test_replace_with_empty_listing_clears_pool() {
        let mut pool = ImagePool::new();
        let mut rng = seeded(5);
        pool.replace(paths(&["a", "b"]), &mut rng);
        pool.replace(Vec::new(), &mut rng);

        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
        assert!(pool.next(&mut rng).is_none());
    }
}
