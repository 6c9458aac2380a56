use std::pin::Pin;

use crate::error::Result;
use crate::frame::ProtocolFrame;

/// A boxed async stream, used for transport frame delivery.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// The frame sequence a transport tier hands to the negotiator.
///
/// `Err` items are connection-level failures (the tier is dead); malformed
/// frames never appear here — transports drop them before yielding.
pub type FrameStream = BoxStream<'static, Result<ProtocolFrame>>;
