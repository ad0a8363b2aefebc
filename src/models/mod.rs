pub mod alert_rule;
pub mod forecast;
pub mod intervention;
pub mod location;
pub mod outcome;
pub mod status;

pub use alert_rule::*;
pub use forecast::*;
pub use intervention::*;
pub use location::*;
pub use outcome::*;
pub use status::*;
