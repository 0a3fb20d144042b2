pub mod completion;
pub mod journey;
pub mod learning_style;
pub mod option;
pub mod question;
pub mod tutorial;
pub mod user;

pub use completion::*;
pub use journey::*;
pub use learning_style::*;
pub use option::*;
pub use question::*;
pub use tutorial::*;
pub use user::*;
