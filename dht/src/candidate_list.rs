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

use parking_lot::RwLock;

use crate::contact::Contact;
use crate::node_id::NodeId;

#[derive(Clone, Debug)]
pub struct Candidate {
    pub contact: Contact,
    pub checked: bool,
    pub distance: NodeId,
}

/// The shortlist of an iterative lookup, sorted by distance to the target.
pub struct CandidateList {
    target: NodeId,
    limit: usize,
    candidates: RwLock<Vec<Candidate>>,
}

impl CandidateList {
    pub fn new(target: NodeId, limit: usize) -> Self {
        CandidateList {
            target,
            limit,
            candidates: RwLock::new(Vec::with_capacity(limit)),
        }
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn add(&self, contact: Contact) {
        let mut candidates = self.candidates.write();
        self.insert(&mut candidates, contact);
    }

    pub fn add_multiple(&self, contacts: Vec<Contact>) {
        let mut candidates = self.candidates.write();
        for contact in contacts {
            self.insert(&mut candidates, contact);
        }
    }

    fn insert(&self, candidates: &mut Vec<Candidate>, mut contact: Contact) {
        if candidates.iter().any(|candidate| candidate.contact.id == contact.id) {
            return
        }
        contact.calc_distance(&self.target);
        let distance = contact.id.distance(&self.target);
        let candidate = Candidate {
            contact,
            checked: false,
            distance,
        };

        if candidates.len() < self.limit {
            candidates.push(candidate);
        } else {
            match candidates.last_mut() {
                Some(farthest) if distance.less(&farthest.distance) => *farthest = candidate,
                _ => return,
            }
        }
        candidates.sort_by(|a, b| a.distance.cmp(&b.distance));
    }

    pub fn get(&self, id: &NodeId) -> Option<Candidate> {
        self.candidates.read().iter().find(|candidate| &candidate.contact.id == id).cloned()
    }

    pub fn exists(&self, id: &NodeId) -> bool {
        self.candidates.read().iter().any(|candidate| &candidate.contact.id == id)
    }

    pub fn get_all(&self) -> Vec<Candidate> {
        self.candidates.read().clone()
    }

    pub fn len(&self) -> usize {
        self.candidates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.read().is_empty()
    }

    /// Marks the candidate as queried. Returns true only for the call that
    /// changed the flag, so concurrent branches can claim a candidate.
    pub fn check(&self, id: &NodeId) -> bool {
        let mut candidates = self.candidates.write();
        match candidates.iter_mut().find(|candidate| &candidate.contact.id == id) {
            Some(candidate) if !candidate.checked => {
                candidate.checked = true;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, id: &NodeId) {
        self.candidates.write().retain(|candidate| &candidate.contact.id != id);
    }
}
