//! Application Layer

pub mod crud;

pub use crud::CrudUseCase;
