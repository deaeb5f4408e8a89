#![warn(unused_extern_crates)]

mod builder;
pub use builder::*;

mod error;
pub use error::*;

mod extents;
pub use extents::*;

mod morton;
pub use morton::*;

mod pyramid;
pub use pyramid::*;

mod radix_tree;
pub use radix_tree::*;

mod validate;
pub use validate::*;

pub mod utils;

pub use glam;
