use std::fmt;

use rand::{
    distributions::{Alphanumeric, DistString},
    Rng,
};

/// Length of the random suffix appended to every payload.
pub const TOKEN_LEN: usize = 20;

/// A logical channel on the target service, addressed as `topic_{index}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(usize);

impl Topic {
    pub fn new(index: usize) -> Self {
        Topic(index)
    }

    /// Picks uniformly from `topic_1..=topic_{count}`. A count of zero behaves like one.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        Topic(rng.gen_range(1..=count.max(1)))
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic_{}", self.0)
    }
}

/// Builds the body of one publish call. The content is never read back.
pub fn payload<R: Rng + ?Sized>(worker: usize, rng: &mut R) -> String {
    format!("Worker {} - {}", worker, Alphanumeric.sample_string(rng, TOKEN_LEN))
}
