//! Generated types and stubs for the `Courier` inter-node RPC service.

pub mod courier {
    pub mod v1 {
        tonic::include_proto!("courier.v1");
    }
}

pub use courier::v1::courier_client::CourierClient;
pub use courier::v1::courier_server::{Courier, CourierServer};
pub use courier::v1::{MessageRequest, MessageResponse};
