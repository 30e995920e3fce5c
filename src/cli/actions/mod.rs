pub mod server;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        globals: GlobalArgs,
    },
}
