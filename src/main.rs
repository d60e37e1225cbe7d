//
// main.rs
// dcm2jpeg
//
// Entry point that hands off execution to the CLI layer.
//

use dcm2jpeg::cli;

fn main() -> anyhow::Result<()> {
    // Delegate all argument parsing and dispatching to the CLI module.
    cli::run()
}
