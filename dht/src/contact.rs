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
use std::hash::{Hash, Hasher};

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use crate::node_id::NodeId;

/// A node identifier bound to the address it can be reached at.
///
/// Two contacts are the same node iff their identifiers are equal. The cached
/// distance is not part of the identity.
#[derive(Clone, Debug)]
pub struct Contact {
    pub id: NodeId,
    pub address: String,
    distance: Option<NodeId>,
}

impl Contact {
    pub fn new(id: NodeId, address: String) -> Self {
        Contact {
            id,
            address,
            distance: None,
        }
    }

    /// A contact whose identifier is not known yet.
    pub fn bootstrap(address: String) -> Self {
        Contact::new(NodeId::default(), address)
    }

    pub fn calc_distance(&mut self, target: &NodeId) {
        self.distance = Some(self.id.distance(target));
    }

    pub fn distance(&self) -> Option<&NodeId> {
        self.distance.as_ref()
    }

    /// Compares the cached distances. Both sides must have been measured
    /// against the same target.
    pub fn less(&self, other: &Contact) -> bool {
        debug_assert!(self.distance.is_some() && other.distance.is_some());
        self.distance < other.distance
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}

impl Encodable for Contact {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2).append(&self.id).append(&self.address);
    }
}

impl Decodable for Contact {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen)
        }
        Ok(Contact::new(rlp.val_at(0)?, rlp.val_at(1)?))
    }
}
