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

mod clock;
mod data_store;
mod sweeper;

pub use self::clock::{Clock, FakeClock, SystemClock};
pub use self::data_store::{DataStore, ExpiredCallback};

pub trait Store: Send + Sync {
    /// Returns the live value of `key` and renews its expiration.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    /// Returns false without touching the store if `key` holds a live value.
    fn set(&self, key: &str, value: Vec<u8>) -> bool;
    fn remove(&self, key: &str) -> Option<Vec<u8>>;
    fn refresh(&self, key: &str) -> bool;
}
