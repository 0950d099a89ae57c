pub mod gateway_connection;

pub use gateway_connection::{FrameReader, GatewayConnection};
