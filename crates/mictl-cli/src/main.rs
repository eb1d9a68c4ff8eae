//! Entrypoint for the `mictl` binary.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = mictl_cli::run().await;
    process::exit(exit_code);
}
