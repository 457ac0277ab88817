pub mod message_receive;
pub mod ready;
