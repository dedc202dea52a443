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

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogTarget {
    DHT,
    ROUTING,
    STORE,
    NETWORK,
    LOOKUP,
    SHELL,
    REST,
}

impl LogTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            LogTarget::DHT => "dht",
            LogTarget::ROUTING => "routing",
            LogTarget::STORE => "store",
            LogTarget::NETWORK => "network",
            LogTarget::LOOKUP => "lookup",
            LogTarget::SHELL => "shell",
            LogTarget::REST => "rest",
        }
    }
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[macro_export]
macro_rules! clog {
    ($target:ident, $lvl:expr, $($arg:tt)+) => ({
        $crate::log::log!(target: $crate::LogTarget::$target.as_str(), $lvl, $($arg)+);
    });
}

#[macro_export]
macro_rules! cerror {
    ($target:ident, $($arg:tt)*) => (
        $crate::log::error!(target: $crate::LogTarget::$target.as_str(), $($arg)*);
    );
}

#[macro_export]
macro_rules! cwarn {
    ($target:ident, $($arg:tt)*) => (
        $crate::log::warn!(target: $crate::LogTarget::$target.as_str(), $($arg)*);
    );
}

#[macro_export]
macro_rules! cinfo {
    ($target:ident, $($arg:tt)*) => (
        $crate::log::info!(target: $crate::LogTarget::$target.as_str(), $($arg)*);
    );
}

#[macro_export]
macro_rules! cdebug {
    ($target:ident, $($arg:tt)*) => (
        $crate::log::debug!(target: $crate::LogTarget::$target.as_str(), $($arg)*);
    );
}

#[macro_export]
macro_rules! ctrace {
    ($target:ident, $($arg:tt)*) => (
        $crate::log::trace!(target: $crate::LogTarget::$target.as_str(), $($arg)*);
    );
}
