mod init;
mod serve;
mod user;

pub use init::cmd_init;
pub use serve::cmd_serve;
pub use user::{cmd_user_create, cmd_user_deactivate, cmd_user_list};
