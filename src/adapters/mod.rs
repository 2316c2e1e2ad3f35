pub mod controllers;
pub mod dto;
pub mod presenters;
pub mod repositories;
pub mod servers;
pub mod state;
