// Copyright 2018-2020 Kodebox, Inc.
// This file is part of CodeChain.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::cmp;
use std::time::Duration;

use rand::Rng;

const MAX_DELAY_MS: u64 = 1000;
const MAX_JITTER_MS: u64 = 20;

/// Exponential backoff with jitter: `min(2^attempt + jitter, 1000)` ms.
///
/// A delay is never shorter than the one before it, so the jitter cannot make
/// the sequence shrink.
pub struct Backoff {
    attempt: u32,
    previous: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Backoff {
            attempt: 0,
            previous: Duration::from_millis(0),
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = cmp::max(delay_of(self.attempt), self.previous);
        self.attempt = self.attempt.saturating_add(1);
        self.previous = delay;
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::new()
    }
}

fn delay_of(attempt: u32) -> Duration {
    // 2^10 already exceeds the cap.
    let exponential = 1u64 << cmp::min(attempt, 10);
    let jitter = rand::thread_rng().gen_range(0, MAX_JITTER_MS);
    Duration::from_millis(cmp::min(exponential + jitter, MAX_DELAY_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially() {
        for attempt in 0..9 {
            let delay = delay_of(attempt);
            let lower = Duration::from_millis(1 << attempt);
            assert!(lower <= delay, "{:?} < {:?}", delay, lower);
            assert!(delay < lower + Duration::from_millis(MAX_JITTER_MS));
        }
        assert!(Duration::from_millis(8) <= delay_of(3));
    }

    #[test]
    fn delay_is_capped() {
        for attempt in &[10, 11, 32, 1000, u32::max_value()] {
            assert_eq!(Duration::from_millis(MAX_DELAY_MS), delay_of(*attempt));
        }
    }

    #[test]
    fn delays_never_decrease() {
        for _ in 0..20 {
            let mut backoff = Backoff::new();
            let mut previous = Duration::from_millis(0);
            for _ in 0..15 {
                let delay = backoff.next_delay();
                assert!(previous <= delay);
                assert!(delay <= Duration::from_millis(MAX_DELAY_MS));
                previous = delay;
            }
            assert_eq!(Duration::from_millis(MAX_DELAY_MS), previous);
        }
    }
}
