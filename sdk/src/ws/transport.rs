//! Socket transport seam.
//!
//! A [`Connector`] opens one socket per session and hands back a text-frame
//! sink and stream. The production implementation runs over
//! `tokio-tungstenite`.

use std::pin::Pin;

use futures::future::{self, BoxFuture};
use futures::{FutureExt, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use super::error::WsError;

/// Outbound text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = WsError> + Send>>;

/// Inbound text frames. The stream ends when the peer closes the socket.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, WsError>> + Send>>;

/// An open socket split into its two halves.
pub struct Transport {
    /// Outbound half.
    pub sink: FrameSink,
    /// Inbound half.
    pub stream: FrameStream,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Opens sockets.
pub trait Connector: Send + Sync + 'static {
    /// Opens a socket to `url`.
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport, WsError>>;
}

/// [`Connector`] over `tokio-tungstenite`.
///
/// Only text frames are surfaced; ping, pong and binary frames are skipped
/// and a close frame ends the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<Transport, WsError>> {
        let url = url.to_string();

        async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| WsError::Connection(e.to_string()))?;

            let (sink, source) = ws_stream.split();

            let sink = sink.with(|text: String| {
                future::ready(Ok::<Message, WsError>(Message::Text(text.into())))
            });

            let stream = source
                .take_while(|item| future::ready(!matches!(item, Ok(Message::Close(_)))))
                .filter_map(|item| {
                    future::ready(match item {
                        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                        Ok(_) => None,
                        Err(e) => Some(Err(WsError::from(e))),
                    })
                });

            Ok(Transport {
                sink: Box::pin(sink),
                stream: Box::pin(stream),
            })
        }
        .boxed()
    }
}
