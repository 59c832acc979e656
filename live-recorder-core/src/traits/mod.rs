pub mod capture_provider;
pub mod device_catalog;
pub mod file_opener;
pub mod recorder_delegate;
