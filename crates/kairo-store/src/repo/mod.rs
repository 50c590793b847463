pub mod users;

pub use users::{UserNew, UsersRepo};
