mod chart;
mod page;
mod server;
mod snapshot;
mod view;

pub use chart::*;
pub use page::*;
pub use server::*;
pub use snapshot::*;
pub use view::*;
