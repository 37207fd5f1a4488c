pub mod message_sent;
