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

pub mod commands;

use std::io::{self, BufRead, Write};

use cdht::KademliaApi;

use self::commands::Command;

/// Reads commands from `input` line by line and writes their results to
/// `output` until `exit` or the end of the input.
pub fn run<R, W>(api: &dyn KademliaApi, mut input: R, output: &mut W, friendly: bool) -> io::Result<()>
where
    R: BufRead,
    W: Write, {
    if friendly {
        writeln!(output, "Hello! This is your shell speaking!")?;
        writeln!(output, "Type 'help' for a list of commands.")?;
    }

    let commands = commands::all();
    let mut line = String::new();
    loop {
        if friendly {
            write!(output, ">>> ")?;
            output.flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(())
        }

        let (name, args) = split_command(&line);
        if name.is_empty() {
            continue
        }
        match find(&commands, name) {
            Some(command) => {
                cdebug!(SHELL, "Running {} {:?}", name, args);
                match (command.action)(api, args) {
                    Ok(result) => writeln!(output, "{}", result)?,
                    Err(err) => writeln!(output, "Error: {}", err)?,
                }
                if command.name == "exit" {
                    return Ok(())
                }
            }
            None => writeln!(output, "Command not found. Type 'help' for a list of commands")?,
        }
    }
}

fn find<'a>(commands: &'a [Command], name: &str) -> Option<&'a Command> {
    commands.iter().find(|command| command.name == name)
}

/// Splits a line at its first space into the command name and its arguments.
fn split_command(input: &str) -> (&str, &str) {
    let input = input.trim_end_matches(|c| c == '\r' || c == '\n');
    match input.find(' ') {
        Some(index) => (&input[..index], &input[index + 1..]),
        None => (input, ""),
    }
}
