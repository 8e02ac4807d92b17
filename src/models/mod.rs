pub mod repo;
pub mod commit;
pub mod record;

pub use repo::*;
pub use commit::*;
pub use record::*;
