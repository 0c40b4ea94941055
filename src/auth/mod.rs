pub mod extract;
pub mod password;
pub mod permissions;
pub mod token;
