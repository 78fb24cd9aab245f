pub mod error;
pub mod patient;
pub mod appointment;
pub mod messaging;
pub mod finance;
pub mod notification;
pub mod intake;
pub mod profile;

pub use patient::*;
pub use appointment::*;
pub use messaging::*;
pub use finance::*;
pub use notification::*;
pub use intake::*;
pub use profile::*;
