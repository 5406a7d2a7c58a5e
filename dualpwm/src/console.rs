//! Line-based access to the device attributes.
//!
//! `<name>` prints an attribute, `<name> <value>` or `<name>=<value>` writes it,
//! `list` prints all of them and `quit` ends the session.

use std::io::{self, BufRead, Write};
use dualpwm_driver::attr::{Attribute, AttributeStore};
use log::debug;

#[derive(Debug, Eq, PartialEq)]
enum Command<'a> {
    Quit,
    List,
    Get(&'a str),
    Set(&'a str, &'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line {
            "quit" | "exit" => Command::Quit,
            "list" => Command::List,
            _ => match line.split_once(['=', ' ']) {
                Some((name, value)) => Command::Set(name.trim(), value.trim()),
                None => Command::Get(line),
            },
        }
    }
}

/// Serves commands from `input` until `quit` or end of input.
pub fn run(store: &dyn AttributeStore, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = Command::parse(line);
        debug!("{:?}", command);
        match command {
            Command::Quit => break,
            Command::List => {
                for attribute in Attribute::ALL {
                    match store.get(attribute.name()) {
                        Ok(value) => write!(output, "{} = {}", attribute, value)?,
                        Err(err) => writeln!(output, "{}: error: {}", attribute, err)?,
                    }
                }
            }
            Command::Get(name) => match store.get(name) {
                Ok(value) => write!(output, "{}", value)?,
                Err(err) => writeln!(output, "error: {}", err)?,
            },
            Command::Set(name, value) => {
                if let Err(err) = store.set(name, value) {
                    writeln!(output, "error: {}", err)?;
                }
            }
        }
        output.flush()?;
    }
    Ok(())
}
