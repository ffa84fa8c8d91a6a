pub mod check;
pub mod classify;
pub mod report;
pub mod run;
pub mod taxonomy;

pub use check::*;
pub use classify::*;
pub use report::*;
pub use run::*;
pub use taxonomy::*;
