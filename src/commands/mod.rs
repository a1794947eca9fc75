mod host;
mod init;
mod run;
mod update;

pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use update::{UpdateArgs, UpdateStatus, process_update};
