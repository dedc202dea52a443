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

use std::env;
use std::thread;

use colored::Colorize;
use env_logger::filter::{Builder as FilterBuilder, Filter};
use log::{LevelFilter, Log, Metadata, Record};

pub struct Config {
    pub instance_id: usize,
    /// Without it nothing is printed unless RUST_LOG asks for it.
    pub verbose: bool,
}

impl Config {
    pub fn new(instance_id: usize, verbose: bool) -> Self {
        Self {
            instance_id,
            verbose,
        }
    }
}

pub struct Logger {
    instance_id: usize,
    filter: Filter,
    stderr_is_tty: bool,
}

impl Logger {
    pub fn new(config: &Config) -> Self {
        let mut builder = FilterBuilder::new();
        builder.filter(None, default_level(config.verbose));

        if let Ok(rust_log) = env::var("RUST_LOG") {
            builder.parse(&rust_log);
        }

        let stderr_is_tty = atty::is(atty::Stream::Stderr);

        Self {
            instance_id: config.instance_id,
            filter: builder.build(),
            stderr_is_tty,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        self.filter.filter()
    }
}

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Off
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.filter.matches(record) {
            return
        }

        let thread_name = thread::current().name().unwrap_or_default().to_string();
        let timestamp = time::strftime("%Y-%m-%d %H:%M:%S.%f %Z", &time::now()).unwrap_or_default();

        let (timestamp, thread_name) = if self.stderr_is_tty {
            (timestamp.bold(), thread_name.blue().bold())
        } else {
            (timestamp.normal(), thread_name.normal())
        };
        eprintln!(
            "#{} {} {} {} {}  {}",
            self.instance_id,
            timestamp,
            thread_name,
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
