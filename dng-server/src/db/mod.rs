//! Database access for dng-server

pub mod records;

pub use records::RecordStore;
