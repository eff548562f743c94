mod basic;
mod interface;
mod lock;
mod mutex;
mod state;
mod status;
#[cfg(test)]
mod tests;

pub use basic::*;
pub use interface::*;
pub use lock::*;
pub(crate) use mutex::*;
pub use status::*;
