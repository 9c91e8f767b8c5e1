pub(crate) mod health_check;
mod contact;
mod login;
mod pages;
mod videos;

pub use contact::*;
pub use health_check::*;
pub use login::*;
pub use pages::*;
pub use videos::*;
