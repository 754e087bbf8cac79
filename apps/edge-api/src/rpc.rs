//! The Courier RPC surface: other nodes hand us payloads for sockets we own.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use courier_common::SocketId;
use courier_proto::{Courier, MessageRequest, MessageResponse};

use crate::error::HubError;
use crate::hub::Hub;

pub struct CourierService {
    hub: Arc<Hub>,
}

impl CourierService {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}

#[tonic::async_trait]
impl Courier for CourierService {
    async fn send_message(
        &self,
        request: Request<MessageRequest>,
    ) -> Result<Response<MessageResponse>, Status> {
        let request = request.into_inner();

        let socket_id: SocketId = request
            .uuid
            .parse()
            .map_err(|_| Status::invalid_argument("uuid is not a socket id"))?;

        self.hub.send_message(socket_id, request.payload).await?;

        Ok(Response::new(MessageResponse {}))
    }
}

impl From<HubError> for Status {
    fn from(err: HubError) -> Self {
        match err {
            HubError::SocketNotFound => Status::not_found(err.to_string()),
            HubError::BufferFull => Status::resource_exhausted(err.to_string()),
            HubError::AckTimeout => Status::deadline_exceeded(err.to_string()),
            HubError::Cancelled => Status::cancelled(err.to_string()),
            HubError::UnknownCid(_) => Status::not_found(err.to_string()),
        }
    }
}
