// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use flexi_logger::Logger;

//==============================================================================
// Logging
//==============================================================================

/// Initializes process-wide structured logging.
///
/// Verbosity from repeated `-v` flags sets the default filter level
/// (`warn` at 0, up to `trace` at 3+); `RUST_LOG` still overrides this if
/// set, so an operator can filter by module or stage (`RECP`, `DCMP`,
/// `STOR`, `ACPT`) without recompiling.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Logger::try_with_env_or_str(default_level)
        .expect("valid default log spec")
        .start()
        .expect("failed to initialize logger");
}
