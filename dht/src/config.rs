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

use std::time::Duration;

use super::{ALPHA, DATA_TTL, K, REQUEST_TIMEOUT, SWEEP_INTERVAL};

#[derive(Clone, Debug)]
pub struct Config {
    /// Bucket size and the width of a closest-contacts query.
    pub k: usize,
    /// Number of concurrent requests per lookup round.
    pub alpha: usize,
    pub request_timeout: Duration,
    pub data_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    pub fn new(
        k: Option<usize>,
        alpha: Option<usize>,
        request_timeout: Option<Duration>,
        data_ttl: Option<Duration>,
        sweep_interval: Option<Duration>,
    ) -> Self {
        let k = k.unwrap_or(K);
        let alpha = alpha.unwrap_or(ALPHA);
        let request_timeout = request_timeout.unwrap_or(REQUEST_TIMEOUT);
        let data_ttl = data_ttl.unwrap_or(DATA_TTL);
        let sweep_interval = sweep_interval.unwrap_or(SWEEP_INTERVAL);

        Self {
            k,
            alpha,
            request_timeout,
            data_ttl,
            sweep_interval,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(None, None, None, None, None)
    }
}
