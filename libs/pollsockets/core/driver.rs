use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Response;
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, warn};

use crate::error::{Result, SocketError};
use crate::message::{FrameKind, WsMessage};
use crate::transport::{Endpoint, SessionEvents, Transport, TransportContext, TransportHandle};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ConnectFuture =
    Pin<Box<dyn Future<Output = tungstenite::Result<(WsStream, Response)>> + Send>>;

/// tokio-tungstenite transport driver
///
/// Each connection attempt gets a fresh context: a dedicated current-thread
/// tokio runtime plus a connection phase machine. The runtime only runs while
/// the session is inside `poll`, so all progress is cooperative by
/// construction.
#[derive(Debug, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for TungsteniteTransport {
    fn parse_endpoint(&self, url: &str) -> Result<Endpoint> {
        let request = url
            .into_client_request()
            .map_err(|e| SocketError::Config(format!("Failed to parse URL: {}", e)))?;
        let uri = request.uri();

        let tls = match uri.scheme_str() {
            Some("ws") => false,
            Some("wss") => true,
            other => {
                return Err(SocketError::Config(format!(
                    "Unsupported URL scheme: {}",
                    other.unwrap_or("none")
                )))
            }
        };
        // Uri::host() keeps the brackets on IPv6 literals; store the bare
        // address so endpoint_url can re-bracket it exactly once
        let host = uri
            .host()
            .ok_or_else(|| SocketError::Config("URL has no host".into()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().unwrap_or(if tls { 443 } else { 80 });
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(Endpoint {
            tls,
            host,
            port,
            path,
        })
    }

    fn open(
        &self,
        endpoint: &Endpoint,
        subprotocol: Option<&str>,
    ) -> Result<(Box<dyn TransportContext>, Arc<dyn TransportHandle>)> {
        let url = endpoint_url(endpoint);
        let mut request = url.as_str().into_client_request().map_err(|e| {
            SocketError::TransportStart(format!("Failed to build client request: {}", e))
        })?;

        if let Some(proto) = subprotocol {
            let value = http::header::HeaderValue::from_str(proto).map_err(|_| {
                SocketError::TransportStart(format!("Invalid subprotocol: {}", proto))
            })?;
            request
                .headers_mut()
                .insert(http::header::SEC_WEBSOCKET_PROTOCOL, value);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SocketError::TransportStart(format!("Failed to build runtime: {}", e)))?;

        let handle = Arc::new(WakeHandle::default());
        let attempt: ConnectFuture = Box::pin(connect_async(request));
        debug!("Connection attempt initiated: {}", url);

        let context = TungsteniteContext {
            runtime,
            phase: Phase::Connecting(attempt),
            handle: Arc::clone(&handle),
        };
        Ok((Box::new(context), handle))
    }
}

/// Rebuild the request URL from a parsed endpoint
fn endpoint_url(endpoint: &Endpoint) -> String {
    let scheme = if endpoint.tls { "wss" } else { "ws" };
    if endpoint.host.contains(':') {
        // Bare IPv6 address, re-bracket it
        format!(
            "{}://[{}]:{}{}",
            scheme, endpoint.host, endpoint.port, endpoint.path
        )
    } else {
        format!(
            "{}://{}:{}{}",
            scheme, endpoint.host, endpoint.port, endpoint.path
        )
    }
}

/// Shared per-connection wake state
///
/// The cheap cross-thread half of the driver: `send_*` and `disconnect` touch
/// only this, never the runtime. The `Notify` breaks the service loop out of
/// its read select so newly armed work is picked up mid-poll.
#[derive(Default)]
struct WakeHandle {
    writable: AtomicBool,
    close: Mutex<Option<(u16, String)>>,
    wake: Notify,
}

impl WakeHandle {
    fn take_writable(&self) -> bool {
        self.writable.swap(false, Ordering::AcqRel)
    }

    fn take_close(&self) -> Option<(u16, String)> {
        self.close.lock().take()
    }
}

impl TransportHandle for WakeHandle {
    fn request_writable(&self) {
        self.writable.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    fn request_close(&self, code: u16, reason: &str) {
        *self.close.lock() = Some((code, reason.to_owned()));
        self.wake.notify_one();
    }
}

enum Phase {
    Connecting(ConnectFuture),
    Open(WsStream),
    Closing(WsStream),
    Finished,
}

enum ConnectStep {
    Done(tungstenite::Result<(WsStream, Response)>),
    Woken,
    TimedOut,
}

enum ReadStep {
    Read(Option<tungstenite::Result<Message>>),
    Woken,
    TimedOut,
}

struct TungsteniteContext {
    runtime: tokio::runtime::Runtime,
    phase: Phase,
    handle: Arc<WakeHandle>,
}

impl TransportContext for TungsteniteContext {
    fn service(&mut self, timeout: Duration, sink: &mut dyn SessionEvents) -> i32 {
        if matches!(self.phase, Phase::Finished) {
            return 0;
        }
        let mut events = 0;
        let handle = Arc::clone(&self.handle);
        let phase = &mut self.phase;
        self.runtime
            .block_on(drive(phase, &handle, timeout, sink, &mut events));
        events
    }
}

/// Drive the connection phase machine until the deadline or a terminal event
async fn drive(
    phase: &mut Phase,
    handle: &WakeHandle,
    timeout: Duration,
    sink: &mut dyn SessionEvents,
    events: &mut i32,
) {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        match std::mem::replace(phase, Phase::Finished) {
            Phase::Finished => return,

            Phase::Connecting(mut attempt) => {
                if handle.take_close().is_some() {
                    debug!("Close requested while connecting, aborting attempt");
                    sink.on_closed();
                    *events += 1;
                    return;
                }
                let step = tokio::select! {
                    res = attempt.as_mut() => ConnectStep::Done(res),
                    _ = handle.wake.notified() => ConnectStep::Woken,
                    _ = &mut deadline => ConnectStep::TimedOut,
                };
                match step {
                    ConnectStep::Done(Ok((stream, _response))) => {
                        debug!("WebSocket handshake complete");
                        sink.on_established();
                        *events += 1;
                        *phase = Phase::Open(stream);
                    }
                    ConnectStep::Done(Err(e)) => {
                        error!("WebSocket handshake failed: {}", e);
                        sink.on_error(&e.to_string());
                        *events += 1;
                        return;
                    }
                    ConnectStep::Woken => {
                        *phase = Phase::Connecting(attempt);
                    }
                    ConnectStep::TimedOut => {
                        *phase = Phase::Connecting(attempt);
                        return;
                    }
                }
            }

            Phase::Open(mut stream) => {
                if let Some((code, reason)) = handle.take_close() {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = stream.send(Message::Close(Some(frame))).await {
                        debug!("Close frame send failed: {}", e);
                        sink.on_closed();
                        *events += 1;
                        return;
                    }
                    *events += 1;
                    *phase = Phase::Closing(stream);
                    continue;
                }

                if handle.take_writable() {
                    if let Some(msg) = sink.on_writable() {
                        let out = match msg {
                            WsMessage::Text(text) => Message::Text(text),
                            WsMessage::Binary(data) => Message::Binary(data),
                        };
                        // Write failures surface through the next read-side
                        // error or close event, not here.
                        if let Err(e) = stream.send(out).await {
                            debug!("Write failed, deferring to read side: {}", e);
                        }
                        *events += 1;
                    }
                    *phase = Phase::Open(stream);
                    continue;
                }

                let step = tokio::select! {
                    msg = stream.next() => ReadStep::Read(msg),
                    _ = handle.wake.notified() => ReadStep::Woken,
                    _ = &mut deadline => ReadStep::TimedOut,
                };
                match step {
                    ReadStep::Read(Some(Ok(Message::Text(text)))) => {
                        sink.on_frame(text.as_bytes(), FrameKind::Text);
                        *events += 1;
                        *phase = Phase::Open(stream);
                    }
                    ReadStep::Read(Some(Ok(Message::Binary(data)))) => {
                        sink.on_frame(&data, FrameKind::Binary);
                        *events += 1;
                        *phase = Phase::Open(stream);
                    }
                    ReadStep::Read(Some(Ok(Message::Close(_)))) => {
                        debug!("Peer initiated close");
                        let _ = stream.close(None).await;
                        sink.on_closed();
                        *events += 1;
                        return;
                    }
                    ReadStep::Read(Some(Ok(_))) => {
                        // Ping/pong control frames are handled by tungstenite
                        *phase = Phase::Open(stream);
                    }
                    ReadStep::Read(Some(Err(e))) => {
                        error!("Transport error: {}", e);
                        sink.on_error(&e.to_string());
                        *events += 1;
                        return;
                    }
                    ReadStep::Read(None) => {
                        warn!("Stream ended without close frame");
                        sink.on_closed();
                        *events += 1;
                        return;
                    }
                    ReadStep::Woken => {
                        *phase = Phase::Open(stream);
                    }
                    ReadStep::TimedOut => {
                        *phase = Phase::Open(stream);
                        return;
                    }
                }
            }

            Phase::Closing(mut stream) => {
                let step = tokio::select! {
                    msg = stream.next() => ReadStep::Read(msg),
                    _ = handle.wake.notified() => ReadStep::Woken,
                    _ = &mut deadline => ReadStep::TimedOut,
                };
                match step {
                    ReadStep::Read(Some(Ok(Message::Close(_)))) | ReadStep::Read(None) => {
                        debug!("Close handshake complete");
                        sink.on_closed();
                        *events += 1;
                        return;
                    }
                    ReadStep::Read(Some(Ok(_))) => {
                        // Late frames after our close request are dropped
                        *phase = Phase::Closing(stream);
                    }
                    ReadStep::Read(Some(Err(e))) => {
                        debug!("Error while closing, treating as closed: {}", e);
                        sink.on_closed();
                        *events += 1;
                        return;
                    }
                    ReadStep::Woken => {
                        *phase = Phase::Closing(stream);
                    }
                    ReadStep::TimedOut => {
                        *phase = Phase::Closing(stream);
                        return;
                    }
                }
            }
        }
    }
}
