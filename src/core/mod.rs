//! Format handling: cartridge identification, save transformation and the
//! static registry tying extensions to both.

pub mod config;
pub mod error;
pub mod header;
pub mod identify;
pub mod io;
pub mod registry;
pub mod transform;
pub mod validation;
