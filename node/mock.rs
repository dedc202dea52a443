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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cdht::{
    Contact, DataStore, Error, KademliaApi, Message, NodeId, Result, Routing, RoutingTable, Store, Transport,
};
use parking_lot::Mutex;

struct MockTransport {
    me: Contact,
    routing_table: Arc<dyn Routing>,
    alive: HashSet<String>,
}

impl Transport for MockTransport {
    fn me(&self) -> &Contact {
        &self.me
    }

    fn routing_table(&self) -> Arc<dyn Routing> {
        Arc::clone(&self.routing_table)
    }

    fn send_message_with_response(&self, message: &Message) -> Option<Message> {
        if self.alive.contains(&message.target.address) {
            Some(message.clone().into_response(&message.target))
        } else {
            None
        }
    }

    fn send_message(&self, _message: &Message) {}
}

/// Keeps stored values in a map and answers every lookup with a fixed set of
/// contacts.
pub struct MockKademlia {
    transport: Arc<MockTransport>,
    store: Arc<DataStore>,
    contacts: Vec<Contact>,
    values: Mutex<HashMap<String, Vec<u8>>>,
    forgotten: Mutex<Vec<(String, Vec<Contact>)>>,
}

impl MockKademlia {
    pub fn new(contacts: Vec<Contact>, alive: &[&str]) -> Self {
        let me = Contact::new(NodeId::default(), "127.0.0.1:3000".to_string());
        let routing_table = RoutingTable::new(me.id, cdht::K);
        for contact in &contacts {
            routing_table.add_contact(contact.clone());
        }
        let store = DataStore::new(cdht::DATA_TTL, cdht::SWEEP_INTERVAL, None).unwrap();
        MockKademlia {
            transport: Arc::new(MockTransport {
                me,
                routing_table: Arc::new(routing_table),
                alive: alive.iter().map(|address| address.to_string()).collect(),
            }),
            store: Arc::new(store),
            contacts,
            values: Mutex::new(HashMap::new()),
            forgotten: Mutex::new(Vec::new()),
        }
    }

    pub fn contact(last: u8) -> Contact {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        Contact::new(NodeId::new(bytes), format!("127.0.0.1:{}", 3000 + u16::from(last)))
    }

    pub fn stored(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }

    pub fn forgotten(&self) -> Vec<(String, Vec<Contact>)> {
        self.forgotten.lock().clone()
    }
}

impl KademliaApi for MockKademlia {
    fn me(&self) -> Contact {
        self.transport.me.clone()
    }

    fn network(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport) as Arc<dyn Transport>
    }

    fn data_store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store) as Arc<dyn Store>
    }

    fn lookup_contact(&self, _target: &NodeId) -> Vec<Contact> {
        self.contacts.clone()
    }

    fn lookup_data(&self, hash: &str) -> Result<Option<(Vec<u8>, Contact)>> {
        hash.parse::<NodeId>()?;
        Ok(self.values.lock().get(hash).map(|value| (value.clone(), self.me())))
    }

    fn store(&self, data: &[u8]) -> Result<String> {
        if self.contacts.is_empty() {
            return Err(Error::NoSuitableContacts)
        }
        let hash = cdht::hash(data);
        self.values.lock().insert(hash.clone(), data.to_vec());
        Ok(hash)
    }

    fn forget_data(&self, hash: &str, contacts: &[Contact]) -> Result<()> {
        hash.parse::<NodeId>()?;
        self.values.lock().remove(hash);
        self.forgotten.lock().push((hash.to_string(), contacts.to_vec()));
        Ok(())
    }

    fn join_network(&self, _bootstrap: &Contact, _max_retries: usize) -> bool {
        false
    }
}
