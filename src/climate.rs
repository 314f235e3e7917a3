mod fan_command;
mod reading;
mod series;

pub use fan_command::*;
pub use reading::*;
pub use series::*;
