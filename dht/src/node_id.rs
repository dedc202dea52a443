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
use std::ops::BitXor;
use std::str::FromStr;

use rand::RngCore;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use rustc_hex::{FromHex, ToHex};

use crate::error::Error;

/// Length of an identifier in bytes.
pub const ID_LENGTH: usize = 20;
/// Length of an identifier in bits. It is also the number of buckets.
pub const B: usize = ID_LENGTH * 8;

/// A 160-bit identifier of a node or of a stored value.
///
/// The derived ordering compares the bytes MSB-first, which is the numeric
/// order of the 160-bit unsigned integer. It is only meaningful on distances.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId([u8; ID_LENGTH]);

impl NodeId {
    pub fn new(bytes: [u8; ID_LENGTH]) -> Self {
        NodeId(bytes)
    }

    pub fn random() -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        NodeId(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ID_LENGTH {
            return None
        }
        let mut id = [0u8; ID_LENGTH];
        id.copy_from_slice(bytes);
        Some(NodeId(id))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    pub fn distance(&self, other: &NodeId) -> NodeId {
        let mut distance = [0u8; ID_LENGTH];
        for (i, byte) in distance.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        NodeId(distance)
    }

    pub fn less(&self, other: &NodeId) -> bool {
        self < other
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// Index of the first bit at which `self` and `other` differ, counted from
    /// the most significant bit. Equal identifiers map to the last index.
    pub fn common_prefix_length(&self, other: &NodeId) -> usize {
        let distance = self.distance(other);
        for (i, byte) in distance.0.iter().enumerate() {
            if *byte != 0 {
                return i * 8 + byte.leading_zeros() as usize
            }
        }
        B - 1
    }
}

impl BitXor for NodeId {
    type Output = NodeId;

    fn bitxor(self, rhs: NodeId) -> NodeId {
        self.distance(&rhs)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ID_LENGTH * 2 {
            return Err(Error::InvalidNodeId(s.to_string()))
        }
        let bytes: Vec<u8> = s.from_hex().map_err(|_| Error::InvalidNodeId(s.to_string()))?;
        NodeId::from_slice(&bytes).ok_or_else(|| Error::InvalidNodeId(s.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

impl Encodable for NodeId {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Decodable for NodeId {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        let bytes: Vec<u8> = rlp.as_val()?;
        NodeId::from_slice(&bytes).ok_or(DecoderError::RlpInvalidLength)
    }
}
