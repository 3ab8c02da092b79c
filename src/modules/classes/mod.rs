pub mod controller;
pub mod key;
pub mod repository;
pub mod router;
pub mod service;

pub use router::init_classes_router;
