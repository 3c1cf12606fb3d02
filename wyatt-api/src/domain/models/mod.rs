mod billing;
mod budget;
mod employee;
mod ids;
mod invoice;
mod time_entry;

pub use billing::*;
pub use budget::*;
pub use employee::*;
pub use ids::*;
pub use invoice::*;
pub use time_entry::*;
