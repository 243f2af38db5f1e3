//! Static descriptors that entity types hand to the engine.

pub mod index;
