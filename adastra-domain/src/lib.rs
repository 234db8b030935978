pub mod economy;
pub mod model;
pub mod rng;
mod trading;

pub use economy::*;
pub use model::*;
pub use rng::*;
pub use trading::*;
