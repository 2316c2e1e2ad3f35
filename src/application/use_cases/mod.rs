pub mod file_use_case;
