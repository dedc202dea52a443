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

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket as StdUdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::Builder;
use std::time::Duration;

use mio::net::UdpSocket;
use mio::{Events, Poll, PollOpt, Ready, Registration, SetReadiness, Token};
use parking_lot::Mutex;

use super::message::{Message, Rpc};
use super::Transport;
use crate::config::Config;
use crate::contact::Contact;
use crate::error::Result;
use crate::node_id::NodeId;
use crate::routing_table::{Routing, RoutingTable};
use crate::store::Store;
use crate::MAX_PACKET_SIZE;

const SOCKET_TOKEN: Token = Token(0);
const STOP_TOKEN: Token = Token(1);

/// The UDP transport of a node.
///
/// One socket receives every request and sends every response. Outgoing
/// requests use a short-lived socket each, so the response is whatever
/// arrives on that socket before the timeout.
#[derive(Clone)]
pub struct Network {
    inner: Arc<Inner>,
}

struct Inner {
    me: Contact,
    routing_table: Arc<dyn Routing>,
    store: Arc<dyn Store>,
    socket: UdpSocket,
    k: usize,
    request_timeout: Duration,
    stopped: AtomicBool,
    stop_signal: Mutex<Option<SetReadiness>>,
    verifying: Mutex<HashSet<NodeId>>,
}

impl Network {
    /// Binds the listening socket. The contact of this node advertises
    /// `advertised_ip` with the port actually bound.
    pub fn bind(
        id: NodeId,
        address: &SocketAddr,
        advertised_ip: IpAddr,
        store: Arc<dyn Store>,
        config: &Config,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(address)?;
        let local_addr = socket.local_addr()?;
        let me = Contact::new(id, SocketAddr::new(advertised_ip, local_addr.port()).to_string());
        cinfo!(NETWORK, "Bound {} as {}", local_addr, me);

        Ok(Network {
            inner: Arc::new(Inner {
                me,
                routing_table: Arc::new(RoutingTable::new(id, config.k)),
                store,
                socket,
                k: config.k,
                request_timeout: config.request_timeout,
                stopped: AtomicBool::new(false),
                stop_signal: Mutex::new(None),
                verifying: Mutex::new(HashSet::new()),
            }),
        })
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner.store)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.socket.local_addr()?)
    }

    /// Receives datagrams until `stop_listen` is called. Every datagram is
    /// handled on its own thread.
    pub fn listen(&self) -> Result<()> {
        let poll = Poll::new()?;
        let (registration, set_readiness) = Registration::new2();
        poll.register(&self.inner.socket, SOCKET_TOKEN, Ready::readable(), PollOpt::edge())?;
        poll.register(&registration, STOP_TOKEN, Ready::readable(), PollOpt::edge())?;
        *self.inner.stop_signal.lock() = Some(set_readiness);

        let mut events = Events::with_capacity(64);
        let mut buf = [0u8; MAX_PACKET_SIZE];
        while !self.inner.stopped.load(Ordering::SeqCst) {
            if let Err(err) = poll.poll(&mut events, None) {
                if err.kind() == io::ErrorKind::Interrupted {
                    continue
                }
                return Err(err.into())
            }
            for event in events.iter() {
                if event.token() == SOCKET_TOKEN {
                    self.receive_all(&mut buf);
                }
            }
        }
        poll.deregister(&self.inner.socket)?;
        cinfo!(NETWORK, "Stopped listening on {}", self.inner.me.address);
        Ok(())
    }

    pub fn stop_listen(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        if let Some(set_readiness) = self.inner.stop_signal.lock().as_ref() {
            if let Err(err) = set_readiness.set_readiness(Ready::readable()) {
                cwarn!(NETWORK, "Cannot wake up the listener: {}", err);
            }
        }
    }

    fn receive_all(&self, buf: &mut [u8]) {
        loop {
            match self.inner.socket.recv_from(buf) {
                Ok((len, from)) => {
                    let bytes = buf[..len].to_vec();
                    let inner = Arc::clone(&self.inner);
                    let spawned =
                        Builder::new().name("dht.handler".to_string()).spawn(move || handle(&inner, from, &bytes));
                    if let Err(err) = spawned {
                        cerror!(NETWORK, "Cannot spawn a handler for {}: {}", from, err);
                    }
                }
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => return,
                Err(err) => cwarn!(NETWORK, "Cannot receive a datagram: {}", err),
            }
        }
    }
}

impl Transport for Network {
    fn me(&self) -> &Contact {
        &self.inner.me
    }

    fn routing_table(&self) -> Arc<dyn Routing> {
        Arc::clone(&self.inner.routing_table)
    }

    fn send_message_with_response(&self, message: &Message) -> Option<Message> {
        request(&self.inner, message, true)
    }

    fn send_message(&self, message: &Message) {
        request(&self.inner, message, false);
    }
}

impl Inner {
    fn reply(&self, to: &SocketAddr, response: &Message) {
        let bytes = match encode(response) {
            Ok(bytes) => bytes,
            Err(err) => {
                cwarn!(NETWORK, "Cannot reply to {}: {}", to, err);
                return
            }
        };
        match self.socket.send_to(&bytes, to) {
            Ok(_) => ctrace!(NETWORK, "Replied to {}", to),
            Err(err) => cwarn!(NETWORK, "Cannot reply to {}: {}", to, err),
        }
    }

    fn exchange(&self, message: &Message, wait_response: bool) -> Result<Option<Message>> {
        let bytes = encode(message)?;
        let address = message.target.address.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, format!("cannot resolve {}", message.target.address))
        })?;
        let local: SocketAddr = if address.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = StdUdpSocket::bind(local)?;
        socket.connect(address)?;
        socket.send(&bytes)?;
        ctrace!(NETWORK, "Sent {:?} to {}", message.rpc, message.target);
        if !wait_response {
            return Ok(None)
        }

        socket.set_read_timeout(Some(self.request_timeout))?;
        let mut buf = [0u8; MAX_PACKET_SIZE];
        let len = socket.recv(&mut buf)?;
        Ok(Some(rlp::decode(&buf[..len])?))
    }
}

fn encode(message: &Message) -> io::Result<Vec<u8>> {
    let bytes = rlp::encode(message);
    if bytes.len() > MAX_PACKET_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("message of {} bytes exceeds {} bytes", bytes.len(), MAX_PACKET_SIZE),
        ))
    }
    Ok(bytes)
}

fn request(inner: &Arc<Inner>, message: &Message, wait_response: bool) -> Option<Message> {
    match inner.exchange(message, wait_response) {
        Ok(Some(response)) => {
            add_contact(inner, response.sender.clone());
            Some(response)
        }
        Ok(None) => None,
        Err(err) => {
            cdebug!(NETWORK, "{:?} to {} failed: {}", message.rpc, message.target, err);
            None
        }
    }
}

fn add_contact(inner: &Arc<Inner>, contact: Contact) {
    if let Some(head) = inner.routing_table.add_contact(contact.clone()) {
        verify_head(inner, head, contact);
    }
}

/// Pings the least-recently-seen contact of a full bucket. It stays if it
/// answers. Otherwise `newcomer` takes its place.
fn verify_head(inner: &Arc<Inner>, head: Contact, newcomer: Contact) {
    let head_id = head.id;
    if !inner.verifying.lock().insert(head_id) {
        return
    }
    let worker = Arc::clone(inner);
    let spawned = Builder::new().name("dht.verify".to_string()).spawn(move || {
        let ping = Message::new(Rpc::Ping, worker.me.clone(), head.clone(), String::new(), Vec::new(), Vec::new());
        if request(&worker, &ping, true).is_none() {
            cdebug!(ROUTING, "{} is not responding, replaced by {}", head, newcomer);
            worker.routing_table.remove_contact(&head.id);
            worker.routing_table.add_contact(newcomer);
        }
        worker.verifying.lock().remove(&head.id);
    });
    if let Err(err) = spawned {
        cerror!(ROUTING, "Cannot spawn a verifier: {}", err);
        inner.verifying.lock().remove(&head_id);
    }
}

fn find_node_target(body: &[u8]) -> Option<NodeId> {
    ::std::str::from_utf8(body).ok()?.parse().ok()
}

fn handle(inner: &Arc<Inner>, from: SocketAddr, bytes: &[u8]) {
    let message: Message = match rlp::decode(bytes) {
        Ok(message) => message,
        Err(err) => {
            cwarn!(NETWORK, "Cannot decode a datagram from {}: {}", from, err);
            return
        }
    };
    cdebug!(NETWORK, "{:?} from {}", message.rpc, message.sender);

    add_contact(inner, message.sender.clone());

    let me = &inner.me;
    let response = match message.rpc {
        Rpc::Ping => Some(message.into_response(me)),
        Rpc::Store => {
            let stored = inner.store.set(&message.body_digest, message.body.clone());
            let mut response = message.into_response(me);
            response.body = stored.to_string().into_bytes();
            Some(response)
        }
        Rpc::FindNode => {
            let target = find_node_target(&message.body);
            match target {
                Some(target) => {
                    let contacts = inner.routing_table.find_closest_contacts(&target, inner.k);
                    let mut response = message.into_response(me);
                    response.contacts = contacts;
                    Some(response)
                }
                None => {
                    cwarn!(NETWORK, "Invalid lookup target from {}", message.sender);
                    None
                }
            }
        }
        Rpc::FindValue => {
            let value = inner.store.get(&message.body_digest);
            if value.is_none() {
                cdebug!(STORE, "{} is not stored here", message.body_digest);
            }
            let mut response = message.into_response(me);
            response.body = value.unwrap_or_default();
            Some(response)
        }
        Rpc::DataRefresh => {
            inner.store.refresh(&message.body_digest);
            None
        }
        Rpc::DataForget => {
            inner.store.remove(&message.body_digest);
            None
        }
        Rpc::Response => {
            cdebug!(NETWORK, "Unexpected response from {}", from);
            None
        }
    };
    if let Some(response) = response {
        inner.reply(&from, &response);
    }
}

/// The address other hosts reach this host at, found by routing a UDP socket
/// towards a public address. No packet is sent.
pub fn outbound_ip() -> IpAddr {
    let discover = || -> io::Result<IpAddr> {
        let socket = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip())
    };
    discover().unwrap_or_else(|err| {
        cwarn!(NETWORK, "Cannot find the outbound address, falling back to localhost: {}", err);
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}
