pub mod codec;
pub mod constants;
pub mod error;
pub mod header;
pub mod limits;
pub mod messages;
pub mod msg_id;
pub mod packet;
