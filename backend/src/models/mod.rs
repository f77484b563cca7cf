pub mod band;
pub mod measurement;
pub mod photometry;
pub mod time;

pub use band::*;
pub use measurement::*;
pub use photometry::*;
pub use time::*;
