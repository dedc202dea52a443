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

use cdht::network::rpc;
use cdht::{Contact, KademliaApi, NodeId};

pub type Action = fn(&dyn KademliaApi, &str) -> Result<String, String>;

pub struct Command {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
    pub action: Action,
}

pub fn all() -> Vec<Command> {
    vec![
        Command {
            name: "forget",
            args: "[hash]",
            description: "Forgets the data object stored under the hash.",
            action: forget,
        },
        Command {
            name: "get",
            args: "[hash]",
            description: "Downloads the data object stored under the hash.",
            action: get,
        },
        Command {
            name: "help",
            args: "",
            description: "Lists the available commands.",
            action: help,
        },
        Command {
            name: "put",
            args: "[text]",
            description: "Uploads the text and prints its hash.",
            action: put,
        },
        Command {
            name: "exit",
            args: "",
            description: "Exits the shell.",
            action: exit,
        },
        Command {
            name: "ping",
            args: "[address]",
            description: "DEBUG: Sends a ping to the address.",
            action: ping,
        },
        Command {
            name: "whoami",
            args: "",
            description: "DEBUG: Looks up this node.",
            action: lookup_me,
        },
        Command {
            name: "routes",
            args: "",
            description: "DEBUG: Prints the routing table.",
            action: routes,
        },
        Command {
            name: "lookup",
            args: "",
            description: "DEBUG: Looks up this node.",
            action: lookup_me,
        },
    ]
}

/// Strips one pair of surrounding double quotes.
fn remove_double_quotes(arg: &str) -> &str {
    if arg.len() >= 2 && arg.starts_with('"') && arg.ends_with('"') {
        &arg[1..arg.len() - 1]
    } else {
        arg
    }
}

fn expect_argument(args: &str) -> Result<&str, String> {
    if args.is_empty() {
        return Err("expected 1 argument, but got 0".to_string())
    }
    Ok(remove_double_quotes(args))
}

pub fn put(api: &dyn KademliaApi, args: &str) -> Result<String, String> {
    let text = expect_argument(args)?;
    api.store(text.as_bytes()).map_err(|err| err.to_string())
}

pub fn get(api: &dyn KademliaApi, args: &str) -> Result<String, String> {
    let hash = remove_double_quotes(args);
    match api.lookup_data(hash).map_err(|err| err.to_string())? {
        Some((value, holder)) => {
            cdebug!(SHELL, "{} served {}", holder, hash);
            Ok(String::from_utf8_lossy(&value).into_owned())
        }
        None => Err("data not found".to_string()),
    }
}

fn forget(api: &dyn KademliaApi, args: &str) -> Result<String, String> {
    let hash = expect_argument(args)?;
    let target: NodeId = hash.parse().map_err(|err: cdht::Error| err.to_string())?;
    let contacts = api.lookup_contact(&target);
    api.forget_data(hash, &contacts).map_err(|err| err.to_string())?;
    Ok(format!("Successfully forgot data object with hash {}", hash))
}

fn help(_: &dyn KademliaApi, _: &str) -> Result<String, String> {
    Ok(usage(&all()))
}

fn usage(commands: &[Command]) -> String {
    let structure = |command: &Command| format!("{} {}", command.name, command.args);
    let width = commands.iter().map(|command| structure(command).len()).max().unwrap_or(0);

    let mut usage = "Available commands:\n".to_string();
    for command in commands {
        usage.push_str(&format!("  {:width$}   {}\n", structure(command), command.description, width = width));
    }
    usage
}

fn exit(_: &dyn KademliaApi, _: &str) -> Result<String, String> {
    Ok("Goodbye!".to_string())
}

fn ping(api: &dyn KademliaApi, args: &str) -> Result<String, String> {
    let contact = Contact::bootstrap(remove_double_quotes(args).to_string());
    if rpc::ping(&*api.network(), &contact) {
        Ok("Node is alive".to_string())
    } else {
        Ok("Node is dead".to_string())
    }
}

fn lookup_me(api: &dyn KademliaApi, _: &str) -> Result<String, String> {
    let contacts = api.lookup_contact(&api.me().id);
    Ok(list(format!("Received {} nodes:\n", contacts.len()), &contacts))
}

fn routes(api: &dyn KademliaApi, _: &str) -> Result<String, String> {
    let routing_table = api.network().routing_table();
    let header = format!("I am {}\n\n{} nodes in routing table:\n", api.me(), routing_table.number_of_nodes());
    Ok(list(header, &routing_table.nodes()))
}

fn list(mut header: String, contacts: &[Contact]) -> String {
    for contact in contacts {
        header.push_str(&format!("   {}\n", contact));
    }
    header
}
