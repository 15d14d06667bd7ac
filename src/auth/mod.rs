pub mod password;
pub mod roles;
pub mod session;
