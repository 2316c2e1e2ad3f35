mod storage_service;

pub use storage_service::StorageService;
#[cfg(test)]
pub use storage_service::MockStorageService;
