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

mod message;
pub mod rpc;
mod udp;

use std::sync::Arc;

pub use self::message::{Message, Rpc};
pub use self::udp::{outbound_ip, Network};
use crate::contact::Contact;
use crate::routing_table::Routing;

pub trait Transport: Send + Sync {
    fn me(&self) -> &Contact;
    fn routing_table(&self) -> Arc<dyn Routing>;
    /// Sends `message` to its target and waits for the answer. Returns `None`
    /// when nothing arrives before the request timeout.
    fn send_message_with_response(&self, message: &Message) -> Option<Message>;
    fn send_message(&self, message: &Message);
}
