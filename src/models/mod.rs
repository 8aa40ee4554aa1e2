mod bookmark;
mod lookup;
mod summary;
mod user;

pub use bookmark::*;
pub use lookup::*;
pub use summary::*;
pub use user::*;
