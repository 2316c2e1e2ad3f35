mod storage_file_repository;

pub use storage_file_repository::StorageFileRepository;
