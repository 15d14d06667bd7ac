pub mod prelude;

pub mod posts;
pub mod users;
