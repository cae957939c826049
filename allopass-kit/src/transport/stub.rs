//! In-memory transport for unit tests.

use std::sync::Mutex;

use crate::{
    error::Result,
    transport::{OutboundRequest, RawResponse, Transport, sealed},
};

type Responder = Box<dyn Fn(&OutboundRequest) -> Result<RawResponse> + Send + Sync>;

/// Answers every request with a fixed function and records what was sent.
pub(crate) struct StubTransport {
    responder: Responder,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl std::fmt::Debug for StubTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubTransport").finish_non_exhaustive()
    }
}

impl sealed::private::Sealed for StubTransport {}

impl StubTransport {
    pub(crate) fn new(
        responder: impl Fn(&OutboundRequest) -> Result<RawResponse> + Send + Sync + 'static,
    ) -> Self {
        Self { responder: Box::new(responder), sent: Mutex::new(Vec::new()) }
    }

    /// Responds with `body` signed by `private_key` using sha1.
    pub(crate) fn signed(private_key: &'static str, body: &'static str) -> Self {
        Self::new(move |_| {
            Ok(RawResponse {
                status: 200,
                signature: Some(crate::protocol::HashAlgorithm::Sha1.salted_hex(
                    body.as_bytes(),
                    private_key.as_bytes(),
                )),
                headers: vec![("content-type".to_owned(), "text/xml".to_owned())],
                body: body.as_bytes().to_vec(),
            })
        })
    }

    pub(crate) fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    async fn send<'a>(&'a self, request: OutboundRequest) -> Result<RawResponse> {
        let response = (self.responder)(&request);
        self.sent.lock().unwrap().push(request);
        response
    }

    fn protocol_name(&self) -> &'static str {
        "stub"
    }
}
