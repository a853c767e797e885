pub mod position;
pub mod scenario;
pub mod history;
pub mod errors;

pub use position::*;
pub use scenario::*;
pub use history::*;
pub use errors::*;
