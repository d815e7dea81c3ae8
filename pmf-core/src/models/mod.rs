mod analysis;
mod question;
mod session;

pub use analysis::*;
pub use question::*;
pub use session::*;
