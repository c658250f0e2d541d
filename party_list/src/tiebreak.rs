use log::debug;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::*;

/// Lottery used to settle ties at a seat cutoff.
///
/// The generator is owned by the tiebreaker and threaded through the
/// allocation and the seat assignment, so one seed pins a whole run.
///
/// ```
/// use party_list::Tiebreaker;
///
/// let mut tb = Tiebreaker::from_seed(42);
/// let picked = tb.choose(5, 2)?;
/// assert_eq!(picked.len(), 2);
/// assert!(picked[0] < picked[1] && picked[1] < 5);
/// # Ok::<(), party_list::ElectionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tiebreaker<R: Rng = ChaCha20Rng> {
    rng: R,
    draws: u64,
}

impl Tiebreaker<ChaCha20Rng> {
    pub fn from_seed(seed: u64) -> Self {
        Tiebreaker::new(ChaCha20Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Tiebreaker::new(ChaCha20Rng::from_entropy())
    }

    pub fn from_mode(mode: TieBreakMode) -> Self {
        match mode {
            TieBreakMode::Random => Tiebreaker::from_entropy(),
            TieBreakMode::Seeded(seed) => Tiebreaker::from_seed(seed),
        }
    }
}

impl<R: Rng> Tiebreaker<R> {
    pub fn new(rng: R) -> Self {
        Tiebreaker { rng, draws: 0 }
    }

    /// Number of lotteries drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Picks `r` distinct indices out of `[0, n)`, every subset being equally
    /// likely. The indices are returned in increasing order.
    pub fn choose(&mut self, n: usize, r: usize) -> Result<Vec<usize>, ElectionError> {
        if r == 0 || n < r {
            return Err(ElectionError::InvalidArgument {
                message: format!("cannot tiebreak n={}, r={}: need n >= r > 0", n, r),
            });
        }
        let mut picked = index::sample(&mut self.rng, n, r).into_vec();
        picked.sort_unstable();
        self.draws += 1;
        Ok(picked)
    }

    /// Selects the `seats` winners out of a ranking.
    ///
    /// `keys` must be sorted in decreasing order. Every position strictly
    /// above the tie band at the cutoff wins. The remaining seats are drawn
    /// by lottery among the tie band, the maximal run of positions sharing
    /// the key of the last seat. Returns the winning positions in increasing
    /// order.
    pub(crate) fn fill_cutoff(
        &mut self,
        keys: &[u64],
        seats: usize,
    ) -> Result<Vec<usize>, ElectionError> {
        if seats == 0 {
            return Ok(vec![]);
        }
        if seats > keys.len() {
            return Err(ElectionError::InvalidArgument {
                message: format!("cannot fill {} seats from {} contenders", seats, keys.len()),
            });
        }
        debug_assert!(keys.windows(2).all(|w| w[0] >= w[1]));

        let cutoff = seats - 1;
        let cut_key = keys[cutoff];
        let tie_start = keys.iter().position(|k| *k == cut_key).unwrap_or(cutoff);
        let tie_end = cutoff + keys[cutoff..].iter().take_while(|k| **k == cut_key).count();

        let mut winners: Vec<usize> = (0..tie_start).collect();
        let band = tie_end - tie_start;
        let needed = seats - tie_start;
        if needed == band {
            winners.extend(tie_start..tie_end);
        } else {
            let drawn = self.choose(band, needed)?;
            debug!(
                "fill_cutoff: tie band {}..{} on key {}, drawn {:?}",
                tie_start, tie_end, cut_key, drawn
            );
            winners.extend(drawn.iter().map(|idx| tie_start + idx));
        }
        Ok(winners)
    }
}
