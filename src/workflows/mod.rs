pub mod users;
pub mod vacancy;
