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
extern crate clap;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

extern crate codechain_dht as cdht;
#[macro_use]
extern crate codechain_logger as clogger;
extern crate jsonrpc_core;
extern crate jsonrpc_http_server;
extern crate serde_json;

mod config;
#[cfg(test)]
mod mock;
mod rest;
mod shell;

use std::env;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use cdht::{outbound_ip, Contact, DataStore, Kademlia, KademliaApi, Network, NodeId, Store, Transport};
use clogger::LoggerConfig;
use parking_lot::{Condvar, Mutex};

const DEFAULT_CONFIG_PATH: &str = "node/config/presets/config.dev.toml";

pub fn network_start(cfg: &config::Network, store: Arc<dyn Store>, dht_config: &cdht::Config) -> Result<Network, String> {
    let address = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cfg.port);
    let network = Network::bind(NodeId::random(), &address, outbound_ip(), store, dht_config).map_err(|e| {
        error!("Cannot listen on {}: {}", address, e);
        format!("Network service error: {}", e)
    })?;
    info!("Listening on {} as {}", address, network.me());
    Ok(network)
}

pub fn rest_http_start(
    cfg: &config::Rest,
    api: Arc<dyn KademliaApi>,
) -> Result<Option<jsonrpc_http_server::Server>, String> {
    if cfg.disable {
        return Ok(None)
    }
    let address = cfg.address()?;
    match rest::start_http(&address, api) {
        Err(ref err) if err.kind() == io::ErrorKind::AddrInUse => Err(format!(
            "HTTP address {} is already in use, change it using the --rest-port option or pass --no-rest.",
            address
        )),
        Err(e) => Err(format!("HTTP server error: {:?}", e)),
        Ok(server) => {
            cinfo!(REST, "HTTP Listening on {}", server.address());
            Ok(Some(server))
        }
    }
}

fn spawn_listener(network: Network) -> Result<JoinHandle<()>, String> {
    Builder::new()
        .name("dht.listener".to_string())
        .spawn(move || {
            if let Err(err) = network.listen() {
                cerror!(NETWORK, "The listener stopped: {}", err);
            }
        })
        .map_err(|e| format!("Cannot spawn the listener: {}", e))
}

fn spawn_join(kademlia: Arc<Kademlia>, bootstrap: String, retries: usize) -> Result<JoinHandle<()>, String> {
    Builder::new()
        .name("dht.bootstrap".to_string())
        .spawn(move || {
            if !kademlia.join_network(&Contact::bootstrap(bootstrap), retries) {
                cwarn!(DHT, "This node runs without any peer");
            }
        })
        .map_err(|e| format!("Cannot spawn the bootstrap: {}", e))
}

fn main() -> Result<(), String> {
    let yaml = load_yaml!("dht-node.yml");
    let matches = clap::App::from_yaml(yaml).get_matches();

    let config_path = matches.value_of("config").unwrap_or(DEFAULT_CONFIG_PATH);
    let mut config = config::load(config_path)?;
    config.overwrite_with_env(|name| env::var(name).ok())?;
    config.operating.overwrite_with(&matches)?;
    config.network.overwrite_with(&matches)?;
    config.rest.overwrite_with(&matches)?;

    let instance_id = config.operating.instance_id.unwrap_or_else(|| {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.subsec_nanos() as usize).unwrap_or(0)
    });
    clogger::init(&LoggerConfig::new(instance_id, config.operating.verbose))
        .map_err(|e| format!("Logger must be successfully initialized: {}", e))?;

    let dht_config: cdht::Config = (&config.dht).into();
    let store = Arc::new(
        DataStore::new(dht_config.data_ttl, dht_config.sweep_interval, None)
            .map_err(|e| format!("Data store error: {}", e))?,
    );
    let network = network_start(&config.network, Arc::clone(&store) as Arc<dyn Store>, &dht_config)?;
    let kademlia = Arc::new(Kademlia::new(
        Arc::new(network.clone()) as Arc<dyn Transport>,
        Arc::clone(&store) as Arc<dyn Store>,
        dht_config,
    ));

    let rest_server = rest_http_start(&config.rest, Arc::clone(&kademlia) as Arc<dyn KademliaApi>)?;
    let listener = spawn_listener(network.clone())?;
    if let Some(bootstrap) = config.network.bootstrap() {
        spawn_join(Arc::clone(&kademlia), bootstrap.to_string(), config.network.join_retries)?;
    }

    if config.operating.shell {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        shell::run(&*kademlia, stdin.lock(), &mut stdout, true).map_err(|e| format!("Shell error: {}", e))?;
    } else {
        wait_for_exit()?;
    }

    if let Some(server) = rest_server {
        server.close();
    }
    network.stop_listen();
    if listener.join().is_err() {
        cerror!(NETWORK, "The listener panicked");
    }
    store.stop();
    Ok(())
}

fn wait_for_exit() -> Result<(), String> {
    let exit = Arc::new((Mutex::new(false), Condvar::new()));

    // Handle possible exits
    let e = Arc::clone(&exit);
    ctrlc::set_handler(move || {
        *e.0.lock() = true;
        e.1.notify_all();
    })
    .map_err(|e| format!("Cannot set the Ctrl-C handler: {}", e))?;

    // Wait for signal
    let mut exited = exit.0.lock();
    while !*exited {
        exit.1.wait(&mut exited);
    }
    Ok(())
}
