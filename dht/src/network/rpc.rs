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

use super::{Message, Rpc, Transport};
use crate::contact::Contact;
use crate::node_id::NodeId;

fn request<T: Transport + ?Sized>(transport: &T, rpc: Rpc, target: &Contact, body_digest: &str, body: Vec<u8>) -> Message {
    Message::new(rpc, transport.me().clone(), target.clone(), body_digest.to_string(), body, Vec::new())
}

pub fn ping<T: Transport + ?Sized>(transport: &T, contact: &Contact) -> bool {
    let message = request(transport, Rpc::Ping, contact, "", Vec::new());
    let alive = transport.send_message_with_response(&message).is_some();
    if !alive {
        cdebug!(NETWORK, "Ping timeout: {}", contact);
    }
    alive
}

pub fn store<T: Transport + ?Sized>(transport: &T, contact: &Contact, hash: &str, data: &[u8]) -> bool {
    let message = request(transport, Rpc::Store, contact, hash, data.to_vec());
    match transport.send_message_with_response(&message) {
        Some(response) => response.body == b"true",
        None => {
            cdebug!(NETWORK, "Store timeout: {}", contact);
            false
        }
    }
}

pub fn find_node<T: Transport + ?Sized>(transport: &T, contact: &Contact, id: &NodeId) -> Vec<Contact> {
    let message = request(transport, Rpc::FindNode, contact, "", id.to_string().into_bytes());
    match transport.send_message_with_response(&message) {
        Some(response) => response.contacts,
        None => {
            cdebug!(NETWORK, "Find node timeout: {}", contact);
            Vec::new()
        }
    }
}

/// Returns the value `contact` holds for `hash`, if any.
pub fn find_value<T: Transport + ?Sized>(transport: &T, contact: &Contact, hash: &str) -> Option<Vec<u8>> {
    let message = request(transport, Rpc::FindValue, contact, hash, Vec::new());
    match transport.send_message_with_response(&message) {
        Some(ref response) if response.body.is_empty() => None,
        Some(response) => Some(response.body),
        None => {
            cdebug!(NETWORK, "Find value timeout: {}", contact);
            None
        }
    }
}

pub fn refresh_data<T: Transport + ?Sized>(transport: &T, contact: &Contact, hash: &str) {
    transport.send_message(&request(transport, Rpc::DataRefresh, contact, hash, Vec::new()));
}

pub fn forget_data<T: Transport + ?Sized>(transport: &T, contact: &Contact, hash: &str) {
    transport.send_message(&request(transport, Rpc::DataForget, contact, hash, Vec::new()));
}
