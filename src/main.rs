//! layercfg: print the configuration merged from files, environment and flags.

use anyhow::Result;

fn main() -> Result<()> {
    layercfg::cli::run()
}
