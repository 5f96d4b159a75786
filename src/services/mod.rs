pub mod bank_service;
pub mod csv_import;
pub mod storage;
