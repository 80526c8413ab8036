pub mod sync_run;

pub use sync_run::*;
