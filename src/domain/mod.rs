mod denomination;
mod ledger;
mod money;
mod receipt;
mod session;

pub use denomination::*;
pub use ledger::*;
pub use money::*;
pub use receipt::*;
pub use session::*;
