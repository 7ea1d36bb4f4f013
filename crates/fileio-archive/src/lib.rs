//! fileio archive — unpack tar/zip byte buffers and zip up folders.
//!
//! - [`unarchive`]: tar (optionally gzip-compressed) first, zip as fallback
//! - [`zip_folder`]: recursive folder → persisted temp `.zip`

pub mod error;
pub mod extract;
pub mod pack;

pub use error::ArchiveError;
pub use extract::unarchive;
pub use pack::zip_folder;
