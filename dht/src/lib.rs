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

#[macro_use]
extern crate codechain_logger as clogger;
extern crate crossbeam_channel as crossbeam;
#[cfg(test)]
#[macro_use]
extern crate lazy_static;

mod backoff;
mod candidate_list;
mod config;
mod contact;
mod error;
mod kademlia;
pub mod network;
mod node_id;
mod routing_table;
mod store;

use std::time::Duration;

use rustc_hex::ToHex;
use sha1::{Digest, Sha1};

/// Bucket size and the width of every closest-contacts query.
pub const K: usize = 20;
/// Number of concurrent queries per lookup round.
pub const ALPHA: usize = 3;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const DATA_TTL: Duration = Duration::from_secs(60 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const MAX_PACKET_SIZE: usize = 8192;

pub use crate::candidate_list::{Candidate, CandidateList};
pub use crate::config::Config;
pub use crate::contact::Contact;
pub use crate::error::{Error, Result};
pub use crate::kademlia::{Kademlia, KademliaApi};
pub use crate::network::{outbound_ip, Message, Network, Rpc, Transport};
pub use crate::node_id::{NodeId, B, ID_LENGTH};
pub use crate::routing_table::{Routing, RoutingTable};
pub use crate::store::{Clock, DataStore, ExpiredCallback, FakeClock, Store, SystemClock};

/// The key of `data`: its SHA-1 digest in lower-case hex.
pub fn hash(data: &[u8]) -> String {
    Sha1::digest(data).to_hex()
}
