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

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "node")]
    pub operating: Operating,
    pub network: Network,
    pub dht: Dht,
    pub rest: Rest,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operating {
    pub verbose: bool,
    pub instance_id: Option<usize>,
    pub shell: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub port: u16,
    /// Address of a node already in the network. Empty when this node starts
    /// a new network.
    pub bootstrap_address: String,
    pub join_retries: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dht {
    pub k: usize,
    pub alpha: usize,
    pub request_timeout_ms: u64,
    pub data_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rest {
    pub disable: bool,
    pub interface: String,
    pub port: u16,
}

impl<'a> Into<cdht::Config> for &'a Dht {
    fn into(self) -> cdht::Config {
        cdht::Config::new(
            Some(self.k),
            Some(self.alpha),
            Some(Duration::from_millis(self.request_timeout_ms)),
            Some(Duration::from_secs(self.data_ttl_secs)),
            Some(Duration::from_secs(self.sweep_interval_secs)),
        )
    }
}

pub fn load(config_path: &str) -> Result<Config, String> {
    let toml_string = fs::read_to_string(config_path).map_err(|e| format!("Fail to read file: {:?}", e))?;
    parse(&toml_string)
}

fn parse(toml_string: &str) -> Result<Config, String> {
    toml::from_str(toml_string).map_err(|e| format!("Error while parse TOML: {:?}", e))
}

impl Config {
    /// Applies the `KADEMLIA_*` environment variables. `var` returns the value
    /// of a variable, if set.
    pub fn overwrite_with_env<F>(&mut self, var: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>, {
        if let Some(verbose) = var("KADEMLIA_VERBOSE") {
            self.operating.verbose = parse_bool(&verbose).ok_or("Invalid KADEMLIA_VERBOSE")?;
        }
        if let Some(port) = var("KADEMLIA_PORT") {
            self.network.port = port.parse().map_err(|_| "Invalid KADEMLIA_PORT")?;
        }
        if let Some(bootstrap) = var("KADEMLIA_BOOTSTRAP_NODE") {
            self.network.bootstrap_address = bootstrap;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl Operating {
    pub fn overwrite_with(&mut self, matches: &clap::ArgMatches) -> Result<(), String> {
        if matches.is_present("verbose") {
            self.verbose = true;
        }
        if let Some(instance_id) = matches.value_of("instance-id") {
            self.instance_id = Some(instance_id.parse().map_err(|e| format!("{}", e))?);
        }
        if matches.is_present("no-shell") {
            self.shell = false;
        }
        Ok(())
    }
}

impl Network {
    pub fn overwrite_with(&mut self, matches: &clap::ArgMatches) -> Result<(), String> {
        if let Some(port) = matches.value_of("port") {
            self.port = port.parse().map_err(|_| "Invalid port")?;
        }
        if let Some(bootstrap) = matches.value_of("bootstrap") {
            self.bootstrap_address = bootstrap.to_string();
        }
        if let Some(retries) = matches.value_of("join-retries") {
            self.join_retries = retries.parse().map_err(|_| "Invalid join-retries")?;
        }
        Ok(())
    }

    pub fn bootstrap(&self) -> Option<&str> {
        if self.bootstrap_address.is_empty() {
            None
        } else {
            Some(&self.bootstrap_address)
        }
    }
}

impl Rest {
    pub fn overwrite_with(&mut self, matches: &clap::ArgMatches) -> Result<(), String> {
        if matches.is_present("no-rest") {
            self.disable = true;
        }
        if let Some(interface) = matches.value_of("rest-interface") {
            self.interface = interface.to_string();
        }
        if let Some(port) = matches.value_of("rest-port") {
            self.port = port.parse().map_err(|_| "Invalid rest-port")?;
        }
        Ok(())
    }

    pub fn address(&self) -> Result<SocketAddr, String> {
        let interface: IpAddr = self.interface.parse().map_err(|_| format!("Invalid rest interface {}", self.interface))?;
        Ok(SocketAddr::new(interface, self.port))
    }
}
