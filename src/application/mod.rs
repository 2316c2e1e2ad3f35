pub mod context;
pub mod error;
pub mod lifecycle;
pub mod repositories;
pub mod services;
pub mod use_cases;
pub mod validation;
