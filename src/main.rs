// TestbedBinding: Reserving lab devices for abstract testbeds
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::{path::PathBuf, sync::Arc};

use binding_proto::{Binding, Testbed};
use clap::Parser;

use testbed_binding::{Binder, BindingConfig, Protocol};

/// Reserve the devices of a lab for a testbed, and print the reservation as JSON.
#[derive(Debug, Parser)]
struct Cli {
    /// The testbed that should be reserved (TOML or JSON).
    #[clap(long, short)]
    testbed: PathBuf,
    /// The binding describing the lab (TOML or JSON).
    #[clap(long, short)]
    binding: PathBuf,
    /// Configuration file (TOML). The default configuration is used if omitted.
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// Maximum time in seconds to search for a dynamic reservation.
    #[clap(long)]
    timeout: Option<u64>,
    /// Print the dial target of this protocol for every device. Can be given multiple times.
    #[clap(long = "protocol", short = 'p')]
    protocols: Vec<Protocol>,
}

fn main() {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match args.config.as_ref() {
        Some(path) => BindingConfig::from_file(path)?,
        None => BindingConfig::default(),
    };
    if let Some(timeout) = args.timeout {
        config.solve_timeout_secs = Some(timeout);
    }

    let testbed = Testbed::from_file(&args.testbed)?;
    let binding = Binding::from_file(&args.binding)?;

    let mut binder = Binder::new(binding, Arc::new(config));
    let reservation = binder.reserve(&testbed)?;
    let summary = reservation.summary(&args.protocols);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    binder.release()?;

    Ok(())
}
