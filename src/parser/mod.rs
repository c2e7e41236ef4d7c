pub mod binary;
pub mod converter;
pub mod helpers;
pub mod main;
pub mod options;
pub mod registry;
pub mod stream;
pub mod text;

pub use binary::*;
pub use converter::*;
pub use main::*;
pub use options::*;
pub use registry::*;
pub use stream::*;
pub use text::*;
