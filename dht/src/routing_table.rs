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

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::contact::Contact;
use crate::node_id::{NodeId, B};

pub trait Routing: Send + Sync {
    /// Inserts or refreshes `contact`.
    ///
    /// Returns the least-recently-seen contact of the bucket when the bucket is
    /// full and `contact` is not in it. `contact` is not inserted in that case.
    fn add_contact(&self, contact: Contact) -> Option<Contact>;
    fn remove_contact(&self, id: &NodeId);
    fn find_closest_contacts(&self, target: &NodeId, count: usize) -> Vec<Contact>;
    fn number_of_nodes(&self) -> usize;
    fn nodes(&self) -> Vec<Contact>;
}

pub struct RoutingTable {
    local_id: NodeId,
    buckets: RwLock<Vec<Bucket>>,
}

impl RoutingTable {
    pub fn new(local_id: NodeId, bucket_size: usize) -> Self {
        let buckets = (0..B).map(|_| Bucket::new(bucket_size)).collect();
        RoutingTable {
            local_id,
            buckets: RwLock::new(buckets),
        }
    }

    pub fn local_id(&self) -> NodeId {
        self.local_id
    }

    fn bucket_index(&self, id: &NodeId) -> usize {
        self.local_id.common_prefix_length(id)
    }
}

impl Routing for RoutingTable {
    fn add_contact(&self, contact: Contact) -> Option<Contact> {
        if contact.id == self.local_id {
            return None
        }
        let index = self.bucket_index(&contact.id);
        let mut buckets = self.buckets.write();
        let head = buckets[index].touch_contact(contact);
        if let Some(head) = &head {
            ctrace!(ROUTING, "Bucket {} is full, least recently seen is {}", index, head);
        }
        head
    }

    fn remove_contact(&self, id: &NodeId) {
        let index = self.bucket_index(id);
        self.buckets.write()[index].remove_contact(id);
    }

    fn find_closest_contacts(&self, target: &NodeId, count: usize) -> Vec<Contact> {
        let start = self.bucket_index(target);
        let buckets = self.buckets.read();

        // Every bucket above the target's index is closer to the target than any
        // bucket below it, so those are taken as a whole before walking down.
        let mut result: Vec<Contact> = buckets[start..].iter().flat_map(|bucket| bucket.contacts.iter().cloned()).collect();
        let mut index = start;
        while result.len() < count && index > 0 {
            index -= 1;
            result.extend(buckets[index].contacts.iter().cloned());
        }
        drop(buckets);

        for contact in result.iter_mut() {
            contact.calc_distance(target);
        }
        result.sort_by(|a, b| a.distance().cmp(&b.distance()));
        result.truncate(count);
        result
    }

    fn number_of_nodes(&self) -> usize {
        self.buckets.read().iter().map(|bucket| bucket.contacts.len()).sum()
    }

    fn nodes(&self) -> Vec<Contact> {
        self.buckets.read().iter().flat_map(|bucket| bucket.contacts.iter().cloned()).collect()
    }
}

struct Bucket {
    contacts: VecDeque<Contact>,
    bucket_size: usize,
}

impl Bucket {
    fn new(bucket_size: usize) -> Self {
        Bucket {
            contacts: VecDeque::new(),
            bucket_size,
        }
    }

    fn touch_contact(&mut self, contact: Contact) -> Option<Contact> {
        if let Some(position) = self.contacts.iter().position(|old| old.id == contact.id) {
            self.contacts.remove(position);
            self.contacts.push_back(contact);
            return None
        }
        if self.contacts.len() < self.bucket_size {
            self.contacts.push_back(contact);
            return None
        }
        self.contacts.front().cloned()
    }

    fn remove_contact(&mut self, id: &NodeId) {
        self.contacts.retain(|contact| &contact.id != id);
    }
}
