//! Presentation Layer

pub mod handlers;
pub mod router;

pub use handlers::CrudState;
pub use router::crud_router;
