pub mod requests;
pub mod responses;
pub mod status;

pub use requests::*;
pub use responses::*;
pub use status::*;
