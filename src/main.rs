//! Refreshes the uptime and GitHub statistics shown in a profile banner.

use profile_banner::{Host, run};
use std::io::{Write, stderr, stdout};

/// Default host that writes to the real process streams.
#[derive(Debug, Clone, Default)]
pub struct RealHost;

impl Host for RealHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    run(&mut RealHost, std::env::args_os()).await;
}
