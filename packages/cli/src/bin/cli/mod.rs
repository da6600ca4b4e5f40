pub mod init;
pub mod server;
