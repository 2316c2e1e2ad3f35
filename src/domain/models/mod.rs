pub mod file;
pub mod object_url;
