//! Wire types and tonic service glue for `file_storage.v1`.

#![allow(clippy::large_enum_variant)]

pub mod file_storage {
    pub mod v1 {
        include!("generated/file_storage.v1.rs");
    }
}

pub use file_storage::v1::*;
