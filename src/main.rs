// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use std::process;

use log::error;

use speccollect::config::Config;
use speccollect::logging;
use speccollect::pipeline::acceptor::Acceptor;
use speccollect::shutdown::Shutdown;

fn main() {
    let config = Config::from_args();
    logging::init(config.verbosity);

    let shutdown = Shutdown::install();

    let acceptor = match Acceptor::start(&config) {
        Ok(acceptor) => acceptor,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    acceptor.run(&shutdown);
}
