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

use std::io;
use std::thread::{Builder, JoinHandle};
use std::time::Duration;

/// Runs a task periodically on its own thread until stopped.
pub struct Sweeper {
    quit: crossbeam::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub fn spawn<F>(name: &str, interval: Duration, mut task: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static, {
        let (quit, quit_receiver) = crossbeam::bounded(1);
        let ticker = crossbeam::tick(interval);
        let join = Builder::new().name(name.to_string()).spawn(move || loop {
            crossbeam::select! {
                recv(ticker) -> _ => task(),
                recv(quit_receiver) -> msg => {
                    if let Err(crossbeam::RecvError) = msg {
                        cwarn!(STORE, "The quit channel for the sweeper had been closed.");
                    }
                    return
                }
            }
        })?;
        Ok(Sweeper {
            quit,
            join: Some(join),
        })
    }

    pub fn stop(&mut self) {
        if let Some(join) = self.join.take() {
            // The thread may already be gone, in which case the send fails.
            let _ = self.quit.send(());
            if join.join().is_err() {
                cerror!(STORE, "The sweeper thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.join.is_some()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
