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

use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use crate::contact::Contact;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rpc {
    Ping = 1,
    Store = 2,
    FindNode = 3,
    FindValue = 4,
    DataRefresh = 5,
    DataForget = 6,
    Response = 10,
}

impl Rpc {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(Rpc::Ping),
            2 => Some(Rpc::Store),
            3 => Some(Rpc::FindNode),
            4 => Some(Rpc::FindValue),
            5 => Some(Rpc::DataRefresh),
            6 => Some(Rpc::DataForget),
            10 => Some(Rpc::Response),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub rpc: Rpc,
    pub sender: Contact,
    pub target: Contact,
    pub body_digest: String,
    pub body: Vec<u8>,
    pub contacts: Vec<Contact>,
}

impl Message {
    pub fn new(
        rpc: Rpc,
        sender: Contact,
        target: Contact,
        body_digest: String,
        body: Vec<u8>,
        contacts: Vec<Contact>,
    ) -> Self {
        Message {
            rpc,
            sender,
            target,
            body_digest,
            body,
            contacts,
        }
    }

    /// Turns a request into the envelope of its response, sent by `me`.
    pub fn into_response(mut self, me: &Contact) -> Self {
        self.target = self.sender;
        self.sender = me.clone();
        self.rpc = Rpc::Response;
        self
    }
}

impl Encodable for Message {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(6)
            .append(&self.rpc.code())
            .append(&self.sender)
            .append(&self.target)
            .append(&self.body_digest)
            .append(&self.body);
        s.begin_list(self.contacts.len());
        for contact in &self.contacts {
            s.append(contact);
        }
    }
}

impl Decodable for Message {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 6 {
            return Err(DecoderError::RlpIncorrectListLen)
        }
        let code: u8 = rlp.val_at(0)?;
        let rpc = Rpc::from_u8(code).ok_or(DecoderError::Custom("Unknown rpc code"))?;
        Ok(Message {
            rpc,
            sender: rlp.val_at(1)?,
            target: rlp.val_at(2)?,
            body_digest: rlp.val_at(3)?,
            body: rlp.val_at(4)?,
            contacts: rlp.list_at(5)?,
        })
    }
}
