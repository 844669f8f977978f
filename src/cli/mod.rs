mod add;
mod analyze;
mod colors;
mod duplicates;
pub mod server;
mod similar;

pub use add::*;
pub use analyze::*;
pub use colors::*;
pub use duplicates::*;
pub use server::*;
pub use similar::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
