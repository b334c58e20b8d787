//! Small parsing helpers shared by loaders and the engine.

pub mod birth_year;
