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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, Builder};

use crate::backoff::Backoff;
use crate::candidate_list::CandidateList;
use crate::config::Config;
use crate::contact::Contact;
use crate::error::{Error, Result};
use crate::network::{rpc, Transport};
use crate::node_id::NodeId;
use crate::store::Store;

/// The operations a node offers to its front ends.
pub trait KademliaApi: Send + Sync {
    fn me(&self) -> Contact;
    fn network(&self) -> Arc<dyn Transport>;
    fn data_store(&self) -> Arc<dyn Store>;
    /// Returns up to `k` contacts closest to `target`, sorted by distance.
    fn lookup_contact(&self, target: &NodeId) -> Vec<Contact>;
    /// Returns the value stored under `hash` and the contact that served it.
    fn lookup_data(&self, hash: &str) -> Result<Option<(Vec<u8>, Contact)>>;
    /// Stores `data` on the contacts closest to its digest and returns the digest.
    fn store(&self, data: &[u8]) -> Result<String>;
    fn forget_data(&self, hash: &str, contacts: &[Contact]) -> Result<()>;
    fn join_network(&self, bootstrap: &Contact, max_retries: usize) -> bool;
}

pub struct Kademlia {
    network: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    config: Config,
}

impl Kademlia {
    pub fn new(network: Arc<dyn Transport>, store: Arc<dyn Store>, config: Config) -> Self {
        Kademlia {
            network,
            store,
            config,
        }
    }

    fn lookup_contact_aux(&self, candidates: &CandidateList, contacts: Vec<Contact>) {
        let me = self.network.me().id;
        let claimed: Vec<Contact> = contacts
            .into_iter()
            .filter(|contact| contact.id != me)
            .filter(|contact| candidates.check(&contact.id))
            .take(self.config.alpha)
            .collect();
        if claimed.is_empty() {
            return
        }

        thread::scope(|scope| {
            for contact in claimed {
                let spawned = Builder::new()
                    .name("dht.lookup".to_string())
                    .spawn_scoped(scope, move || self.query_candidate(candidates, contact));
                if let Err(err) = spawned {
                    cwarn!(LOOKUP, "Cannot spawn a lookup thread: {}", err);
                }
            }
        });
    }

    fn query_candidate(&self, candidates: &CandidateList, contact: Contact) {
        let target = *candidates.target();
        let found = rpc::find_node(&*self.network, &contact, &target);
        let closest = match found.iter().map(|found| found.id.distance(&target)).min() {
            Some(closest) => closest,
            None => {
                ctrace!(LOOKUP, "{} returned no contacts", contact);
                return
            }
        };
        if contact.id.distance(&target).less(&closest) {
            ctrace!(LOOKUP, "{} is closer to {} than anything it returned", contact, target);
            return
        }

        ctrace!(LOOKUP, "{} returned {} contacts", contact, found.len());
        candidates.add_multiple(found.clone());
        self.lookup_contact_aux(candidates, found);
    }

    /// Asks `bootstrap` for the contacts closest to this node and pings them.
    /// Returns how many contacts were received and how many answered. This node
    /// is neither pinged nor counted when the bootstrap returns it.
    fn join_network_aux(&self, bootstrap: &Contact) -> (usize, usize) {
        let me = self.network.me().id;
        let contacts = rpc::find_node(&*self.network, bootstrap, &me);
        let routing_table = self.network.routing_table();
        let alive = AtomicUsize::new(0);

        thread::scope(|scope| {
            for contact in contacts.iter().filter(|contact| contact.id != me) {
                let alive = &alive;
                let routing_table = &routing_table;
                let spawned = Builder::new().name("dht.join".to_string()).spawn_scoped(scope, move || {
                    if rpc::ping(&*self.network, contact) {
                        routing_table.add_contact(contact.clone());
                        alive.fetch_add(1, Ordering::SeqCst);
                    }
                });
                if let Err(err) = spawned {
                    cwarn!(DHT, "Cannot spawn a ping thread: {}", err);
                }
            }
        });
        (contacts.len(), alive.into_inner())
    }
}

impl KademliaApi for Kademlia {
    fn me(&self) -> Contact {
        self.network.me().clone()
    }

    fn network(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.network)
    }

    fn data_store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    fn lookup_contact(&self, target: &NodeId) -> Vec<Contact> {
        let candidates = CandidateList::new(*target, self.config.k);
        let closest = self.network.routing_table().find_closest_contacts(target, self.config.k);
        candidates.add_multiple(closest.clone());

        self.lookup_contact_aux(&candidates, closest);

        let contacts: Vec<Contact> = candidates.get_all().into_iter().map(|candidate| candidate.contact).collect();
        cdebug!(LOOKUP, "Lookup of {} found {} contacts", target, contacts.len());
        contacts
    }

    fn lookup_data(&self, hash: &str) -> Result<Option<(Vec<u8>, Contact)>> {
        let target: NodeId = hash.parse()?;
        let hash = &target.to_string();
        let contacts = self.lookup_contact(&target);
        for contact in &contacts {
            rpc::refresh_data(&*self.network, contact, hash);
        }

        let mut last_miss: Option<&Contact> = None;
        for contact in &contacts {
            match rpc::find_value(&*self.network, contact, hash) {
                Some(value) => {
                    if let Some(miss) = last_miss {
                        cdebug!(DHT, "Replicating {} to {}", hash, miss);
                        rpc::store(&*self.network, miss, hash, &value);
                    }
                    return Ok(Some((value, contact.clone())))
                }
                None => last_miss = Some(contact),
            }
        }
        cdebug!(DHT, "No value for {} among {} contacts", hash, contacts.len());
        Ok(None)
    }

    fn store(&self, data: &[u8]) -> Result<String> {
        let hash = crate::hash(data);
        let target: NodeId = hash.parse()?;
        let contacts = self.lookup_contact(&target);
        if contacts.is_empty() {
            return Err(Error::NoSuitableContacts)
        }

        for contact in &contacts {
            cdebug!(DHT, "Storing {} at {}", hash, contact);
            if !rpc::store(&*self.network, contact, &hash, data) {
                cwarn!(DHT, "Could not store {} at {}", hash, contact);
            }
        }
        Ok(hash)
    }

    fn forget_data(&self, hash: &str, contacts: &[Contact]) -> Result<()> {
        let hash = hash.parse::<NodeId>()?.to_string();
        for contact in contacts {
            rpc::forget_data(&*self.network, contact, &hash);
        }
        Ok(())
    }

    fn join_network(&self, bootstrap: &Contact, max_retries: usize) -> bool {
        cinfo!(DHT, "Joining the network via {}", bootstrap.address);
        let mut backoff = Backoff::new();
        for attempt in 0..=max_retries {
            let (received, alive) = self.join_network_aux(bootstrap);
            // The bootstrap itself is in the table once it has answered.
            if alive > 0 || self.network.routing_table().number_of_nodes() > 0 {
                cinfo!(DHT, "Joined the network with {} contacts ({} alive) from {}", received, alive, bootstrap.address);
                return true
            }
            cdebug!(DHT, "Join attempt {} received {} contacts, none alive", attempt + 1, received);
            if attempt < max_retries {
                thread::sleep(backoff.next_delay());
            }
        }
        cwarn!(DHT, "Could not join the network via {}", bootstrap.address);
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::net::{IpAddr, Ipv4Addr};
    use std::thread::JoinHandle;
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;

    use super::*;
    use crate::network::{Message, Network, Rpc};
    use crate::routing_table::{Routing, RoutingTable};
    use crate::store::DataStore;

    lazy_static! {
        static ref ZERO: NodeId = NodeId::default();
    }

    fn id(last: u8) -> NodeId {
        let mut bytes = [0u8; 20];
        bytes[19] = last;
        NodeId::new(bytes)
    }

    fn contact(last: u8) -> Contact {
        Contact::new(id(last), format!("node{:02x}", last))
    }

    /// Answers requests from fixed tables instead of the network. Every table is
    /// keyed by the address of the node the request is sent to.
    struct FakeTransport {
        me: Contact,
        routing_table: Arc<dyn Routing>,
        routes: HashMap<String, Vec<Contact>>,
        values: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
        dead: HashSet<String>,
        sent: Mutex<Vec<(Rpc, String)>>,
    }

    impl FakeTransport {
        fn new(me: Contact) -> Self {
            FakeTransport {
                routing_table: Arc::new(RoutingTable::new(me.id, 20)),
                me,
                routes: HashMap::new(),
                values: Mutex::new(HashMap::new()),
                dead: HashSet::new(),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn route(mut self, from: &Contact, to: Vec<Contact>) -> Self {
            self.routes.insert(from.address.clone(), to);
            self
        }

        fn dead(mut self, node: &Contact) -> Self {
            self.dead.insert(node.address.clone());
            self
        }

        fn hold(self, node: &Contact, hash: &str, value: &[u8]) -> Self {
            self.values.lock().entry(node.address.clone()).or_default().insert(hash.to_string(), value.to_vec());
            self
        }

        fn value_at(&self, node: &Contact, hash: &str) -> Option<Vec<u8>> {
            self.values.lock().get(&node.address).and_then(|values| values.get(hash)).cloned()
        }

        fn sent(&self, rpc: Rpc) -> Vec<String> {
            self.sent.lock().iter().filter(|(sent, _)| *sent == rpc).map(|(_, address)| address.clone()).collect()
        }
    }

    impl Transport for FakeTransport {
        fn me(&self) -> &Contact {
            &self.me
        }

        fn routing_table(&self) -> Arc<dyn Routing> {
            Arc::clone(&self.routing_table)
        }

        fn send_message_with_response(&self, message: &Message) -> Option<Message> {
            let address = message.target.address.clone();
            self.sent.lock().push((message.rpc, address.clone()));
            if self.dead.contains(&address) {
                return None
            }

            let mut response = message.clone().into_response(&message.target);
            response.body = Vec::new();
            match message.rpc {
                Rpc::FindNode => response.contacts = self.routes.get(&address).cloned().unwrap_or_default(),
                Rpc::FindValue => response.body = self.value_at(&message.target, &message.body_digest).unwrap_or_default(),
                Rpc::Store => {
                    let mut values = self.values.lock();
                    let values = values.entry(address).or_default();
                    let stored = !values.contains_key(&message.body_digest);
                    if stored {
                        values.insert(message.body_digest.clone(), message.body.clone());
                    }
                    response.body = stored.to_string().into_bytes();
                }
                _ => {}
            }
            Some(response)
        }

        fn send_message(&self, message: &Message) {
            let address = message.target.address.clone();
            self.sent.lock().push((message.rpc, address.clone()));
            if message.rpc == Rpc::DataForget {
                if let Some(values) = self.values.lock().get_mut(&address) {
                    values.remove(&message.body_digest);
                }
            }
        }
    }

    fn kademlia(transport: &Arc<FakeTransport>) -> Kademlia {
        let store =
            DataStore::new(Duration::from_secs(3600), Duration::from_secs(3600), None).expect("store must be created");
        Kademlia::new(Arc::clone(transport) as Arc<dyn Transport>, Arc::new(store), Config::default())
    }

    fn ids(contacts: &[Contact]) -> Vec<NodeId> {
        contacts.iter().map(|contact| contact.id).collect()
    }

    /// Node `me` knows only A. A knows B, B knows D and C, C knows B and D knows nobody.
    fn scenario_a() -> Arc<FakeTransport> {
        let (a, b, c, d) = (contact(0x0f), contact(0x07), contact(0x03), contact(0x01));
        let transport = FakeTransport::new(Contact::new(*ZERO, "me".to_string()))
            .route(&a, vec![b.clone()])
            .route(&b, vec![d.clone(), c.clone()])
            .route(&c, vec![b.clone()])
            .route(&d, vec![]);
        transport.routing_table.add_contact(a);
        Arc::new(transport)
    }

    #[test]
    fn lookup_contact_finds_every_node_of_the_chain() {
        let transport = scenario_a();
        let found = kademlia(&transport).lookup_contact(&ZERO);
        assert_eq!(vec![id(0x01), id(0x03), id(0x07), id(0x0f)], ids(&found));
    }

    #[test]
    fn lookup_contact_of_a_remote_node() {
        let transport = scenario_a();
        let found = kademlia(&transport).lookup_contact(&id(0x01));
        assert_eq!(vec![id(0x01), id(0x03), id(0x07), id(0x0f)], ids(&found));

        let mut queried = transport.sent(Rpc::FindNode);
        queried.sort();
        assert_eq!(vec!["node01", "node03", "node07", "node0f"], queried);
    }

    #[test]
    fn lookup_contact_on_an_empty_table() {
        let transport = Arc::new(FakeTransport::new(Contact::new(*ZERO, "me".to_string())));
        assert!(kademlia(&transport).lookup_contact(&id(1)).is_empty());
        assert!(transport.sent(Rpc::FindNode).is_empty());
    }

    #[test]
    fn checked_candidates_are_not_queried_again() {
        let transport = scenario_a();
        let kademlia = kademlia(&transport);
        let candidates = CandidateList::new(*ZERO, 20);
        candidates.add(contact(0x0f));
        assert!(candidates.check(&id(0x0f)));

        kademlia.lookup_contact_aux(&candidates, vec![contact(0x0f)]);
        assert!(transport.sent(Rpc::FindNode).is_empty());
        assert_eq!(1, candidates.len());
    }

    #[test]
    fn self_is_returned_but_never_queried() {
        let me = Contact::new(*ZERO, "me".to_string());
        let a = contact(0x0f);
        let transport = FakeTransport::new(me.clone()).route(&a, vec![me.clone()]);
        transport.routing_table.add_contact(a);
        let transport = Arc::new(transport);

        let found = kademlia(&transport).lookup_contact(&ZERO);
        assert_eq!(vec![*ZERO, id(0x0f)], ids(&found));
        assert_eq!(vec!["node0f"], transport.sent(Rpc::FindNode));
    }

    #[test]
    fn branch_stops_when_nothing_closer_is_returned() {
        let (a, far) = (contact(0x01), contact(0x80));
        let transport = FakeTransport::new(Contact::new(*ZERO, "me".to_string())).route(&a, vec![far]);
        transport.routing_table.add_contact(a);
        let transport = Arc::new(transport);

        let found = kademlia(&transport).lookup_contact(&ZERO);
        assert_eq!(vec![id(0x01)], ids(&found));
    }

    #[test]
    fn lookup_data_returns_value_and_holder() {
        let hash = crate::hash(b"My Message");
        let a = contact(0x0f);
        let transport = FakeTransport::new(Contact::new(*ZERO, "me".to_string()))
            .route(&a, vec![])
            .hold(&a, &hash, b"My Message");
        transport.routing_table.add_contact(a.clone());
        let transport = Arc::new(transport);

        let (value, holder) = kademlia(&transport).lookup_data(&hash).unwrap().unwrap();
        assert_eq!(b"My Message".to_vec(), value);
        assert_eq!(a, holder);
        assert_eq!(vec!["node0f"], transport.sent(Rpc::DataRefresh));
    }

    #[test]
    fn lookup_data_of_unknown_hash() {
        let transport = scenario_a();
        let hash = ZERO.to_string();
        assert_eq!(None, kademlia(&transport).lookup_data(&hash).unwrap());

        // Every contact was refreshed and asked for the value.
        assert_eq!(4, transport.sent(Rpc::DataRefresh).len());
        assert_eq!(4, transport.sent(Rpc::FindValue).len());
        assert!(transport.sent(Rpc::Store).is_empty());
    }

    #[test]
    fn lookup_data_replicates_to_the_last_miss() {
        let hash = crate::hash(b"data");
        let target: NodeId = hash.parse().unwrap();
        let near = Contact::new(target ^ id(0x01), "near".to_string());
        let middle = Contact::new(target ^ id(0x02), "middle".to_string());
        let holder = Contact::new(target ^ id(0x80), "holder".to_string());
        let transport = FakeTransport::new(Contact::new(NodeId::random(), "me".to_string())).hold(&holder, &hash, b"data");
        for node in &[&near, &middle, &holder] {
            transport.routing_table.add_contact((*node).clone());
        }
        let transport = Arc::new(transport);

        let (value, served_by) = kademlia(&transport).lookup_data(&hash).unwrap().unwrap();
        assert_eq!(b"data".to_vec(), value);
        assert_eq!(holder, served_by);
        assert_eq!(vec!["middle"], transport.sent(Rpc::Store));
        assert_eq!(Some(b"data".to_vec()), transport.value_at(&middle, &hash));
        assert_eq!(None, transport.value_at(&near, &hash));
    }

    #[test]
    fn lookup_data_accepts_upper_case_hash() {
        let hash = crate::hash(b"My Message");
        let a = contact(0x0f);
        let transport = FakeTransport::new(Contact::new(*ZERO, "me".to_string()))
            .route(&a, vec![])
            .hold(&a, &hash, b"My Message");
        transport.routing_table.add_contact(a.clone());
        let transport = Arc::new(transport);

        let (value, holder) = kademlia(&transport).lookup_data(&hash.to_uppercase()).unwrap().unwrap();
        assert_eq!(b"My Message".to_vec(), value);
        assert_eq!(a, holder);
    }

    #[test]
    fn lookup_data_rejects_invalid_hash() {
        let transport = scenario_a();
        match kademlia(&transport).lookup_data("not a hash") {
            Err(Error::InvalidNodeId(invalid)) => assert_eq!("not a hash", invalid),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(transport.sent.lock().is_empty());
    }

    #[test]
    fn store_without_contacts_fails() {
        let transport = Arc::new(FakeTransport::new(Contact::new(*ZERO, "me".to_string())));
        match kademlia(&transport).store(b"My Message") {
            Err(Error::NoSuitableContacts) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Node `me` knows A, B, C and D directly and none of them knows anybody.
    fn star(dead: &[u8]) -> Arc<FakeTransport> {
        let mut transport = FakeTransport::new(Contact::new(*ZERO, "me".to_string()));
        for last in &[0x0f, 0x07, 0x03, 0x01] {
            let node = contact(*last);
            transport = transport.route(&node, vec![]);
            if dead.contains(last) {
                transport = transport.dead(&node);
            }
            transport.routing_table.add_contact(node);
        }
        Arc::new(transport)
    }

    #[test]
    fn store_sends_to_every_closest_contact() {
        let transport = star(&[]);
        let hash = kademlia(&transport).store(b"abc").unwrap();
        assert_eq!("a9993e364706816aba3e25717850c26c9cd0d89d", hash);
        for last in &[0x01, 0x03, 0x07, 0x0f] {
            assert_eq!(Some(b"abc".to_vec()), transport.value_at(&contact(*last), &hash));
        }
    }

    #[test]
    fn store_survives_failing_contacts() {
        let transport = star(&[0x07]);
        let hash = kademlia(&transport).store(b"abc").unwrap();
        assert_eq!(4, transport.sent(Rpc::Store).len());
        assert_eq!(Some(b"abc".to_vec()), transport.value_at(&contact(0x0f), &hash));
        assert_eq!(None, transport.value_at(&contact(0x07), &hash));
        assert!(transport.routing_table.nodes().contains(&contact(0x07)));
    }

    #[test]
    fn forget_data_fires_to_every_contact() {
        let hash = crate::hash(b"abc");
        let (a, b) = (contact(0x0f), contact(0x07));
        let transport = Arc::new(FakeTransport::new(Contact::new(*ZERO, "me".to_string())).hold(&a, &hash, b"abc"));

        kademlia(&transport).forget_data(&hash, &[a.clone(), b]).unwrap();
        assert_eq!(vec!["node0f", "node07"], transport.sent(Rpc::DataForget));
        assert_eq!(None, transport.value_at(&a, &hash));
    }

    #[test]
    fn forget_data_accepts_upper_case_hash() {
        let hash = crate::hash(b"abc");
        let a = contact(0x0f);
        let transport = Arc::new(FakeTransport::new(Contact::new(*ZERO, "me".to_string())).hold(&a, &hash, b"abc"));

        kademlia(&transport).forget_data(&hash.to_uppercase(), &[a.clone()]).unwrap();
        assert_eq!(None, transport.value_at(&a, &hash));
    }

    #[test]
    fn forget_data_rejects_invalid_hash() {
        let transport = Arc::new(FakeTransport::new(Contact::new(*ZERO, "me".to_string())));
        assert!(kademlia(&transport).forget_data("abc", &[contact(1)]).is_err());
        assert!(transport.sent(Rpc::DataForget).is_empty());
    }

    #[test]
    fn join_network_adds_live_contacts() {
        let bootstrap = Contact::bootstrap("bootstrap".to_string());
        let (a, b) = (contact(0x0f), contact(0x07));
        let transport = Arc::new(
            FakeTransport::new(Contact::new(id(0x10), "me".to_string()))
                .route(&bootstrap, vec![a.clone(), b.clone()])
                .dead(&b),
        );
        let kademlia = kademlia(&transport);

        assert_eq!((2, 1), kademlia.join_network_aux(&bootstrap));
        assert!(kademlia.join_network(&bootstrap, 3));
        assert_eq!(vec![a.id], ids(&transport.routing_table.nodes()));
    }

    #[test]
    fn join_network_retries_when_every_contact_is_dead() {
        let bootstrap = Contact::bootstrap("bootstrap".to_string());
        let a = contact(0x0f);
        let transport = Arc::new(
            FakeTransport::new(Contact::new(id(0x10), "me".to_string())).route(&bootstrap, vec![a.clone()]).dead(&a),
        );

        assert!(!kademlia(&transport).join_network(&bootstrap, 2));
        assert_eq!(3, transport.sent(Rpc::FindNode).len());
        assert_eq!(0, transport.routing_table.number_of_nodes());
    }

    #[test]
    fn join_network_never_pings_itself() {
        let bootstrap = Contact::bootstrap("bootstrap".to_string());
        let me = Contact::new(id(0x10), "me".to_string());
        let transport = Arc::new(FakeTransport::new(me.clone()).route(&bootstrap, vec![me]));
        let kademlia = kademlia(&transport);

        assert_eq!((1, 0), kademlia.join_network_aux(&bootstrap));
        assert!(!kademlia.join_network(&bootstrap, 0));
        assert!(transport.sent(Rpc::Ping).is_empty());
        assert_eq!(0, transport.routing_table.number_of_nodes());
    }

    #[test]
    fn join_network_gives_up_on_an_empty_bootstrap() {
        let bootstrap = Contact::bootstrap("bootstrap".to_string());
        let transport =
            Arc::new(FakeTransport::new(Contact::new(id(0x10), "me".to_string())).route(&bootstrap, vec![]));

        let started = Instant::now();
        assert!(!kademlia(&transport).join_network(&bootstrap, 3));
        assert_eq!(4, transport.sent(Rpc::FindNode).len());
        // Three backoff sleeps of at least 1, 2 and 4 ms.
        assert!(Duration::from_millis(7) <= started.elapsed());
    }

    /// A node on a real UDP socket bound to an OS-assigned local port.
    struct UdpNode {
        kademlia: Kademlia,
        network: Network,
        listener: Option<JoinHandle<()>>,
    }

    impl UdpNode {
        fn start() -> Self {
            let config = Config::new(None, None, Some(Duration::from_millis(500)), None, None);
            let store: Arc<dyn Store> = Arc::new(DataStore::new(config.data_ttl, config.sweep_interval, None).unwrap());
            let network = Network::bind(
                NodeId::random(),
                &"127.0.0.1:0".parse().unwrap(),
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                Arc::clone(&store),
                &config,
            )
            .unwrap();
            let listening = network.clone();
            let listener = thread::spawn(move || listening.listen().unwrap());
            UdpNode {
                kademlia: Kademlia::new(Arc::new(network.clone()), store, config),
                network,
                listener: Some(listener),
            }
        }
    }

    impl Drop for UdpNode {
        fn drop(&mut self) {
            self.network.stop_listen();
            if let Some(listener) = self.listener.take() {
                listener.join().unwrap();
            }
        }
    }

    #[test]
    fn value_stored_by_one_node_is_found_by_another() {
        let first = UdpNode::start();
        let second = UdpNode::start();
        let bootstrap = Contact::bootstrap(first.kademlia.me().address);
        assert!(second.kademlia.join_network(&bootstrap, 0));
        assert_eq!(1, first.network.routing_table().number_of_nodes());
        assert_eq!(1, second.network.routing_table().number_of_nodes());

        let hash = second.kademlia.store(b"My Message").unwrap();
        assert_eq!(crate::hash(b"My Message"), hash);

        let (value, holder) = first.kademlia.lookup_data(&hash).unwrap().unwrap();
        assert_eq!(b"My Message".to_vec(), value);
        assert!(holder == first.kademlia.me() || holder == second.kademlia.me());
    }
}
