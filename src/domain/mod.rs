pub mod forecast;
pub mod state;

pub use forecast::*;
pub use state::*;
