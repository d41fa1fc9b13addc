mod hash;
mod ident;
mod locator;
mod reference;

pub use hash::StableHash;
pub use ident::{Ident, IdentError};
pub use locator::Locator;
pub use reference::Reference;
