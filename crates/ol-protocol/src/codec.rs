//! Tokio codec for framed sync events

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::event::SyncEvent;
use crate::frame::{FrameHeader, MAX_PAYLOAD_SIZE};

/// Codec for encoding/decoding sync events as frames
#[derive(Debug, Default)]
pub struct EventCodec {
    /// Current header being decoded (if any)
    pending_header: Option<FrameHeader>,
}

impl EventCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            pending_header: None,
        }
    }
}

impl Decoder for EventCodec {
    type Item = SyncEvent;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Try to decode header if we don't have one
        let header = match self.pending_header.take() {
            Some(h) => h,
            None => match FrameHeader::decode(src)? {
                Some(h) => h,
                None => return Ok(None), // Need more data
            },
        };

        // Check payload length
        let payload_len = header.payload_length as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        // Check if we have enough data for the payload
        if src.len() < payload_len {
            // Save header and wait for more data
            self.pending_header = Some(header);
            return Ok(None);
        }

        // Extract payload
        let payload_bytes = src.split_to(payload_len).freeze();

        // Deserialize event
        let event: SyncEvent = bincode::deserialize(&payload_bytes)?;

        Ok(Some(event))
    }
}

impl Encoder<SyncEvent> for EventCodec {
    type Error = ProtocolError;

    fn encode(&mut self, event: SyncEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        // Serialize the event
        let payload = bincode::serialize(&event)?;
        let payload_len = payload.len();

        // Check payload size
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        // Encode header
        let header = FrameHeader::new(event.event_type(), payload_len as u32);
        header.encode(dst);

        // Append payload
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::HEADER_SIZE;
    use crate::order::{Order, OrderId, OrderLineItem};

    fn sample_order(id: u64) -> Order {
        Order::new(
            OrderId::new(id),
            vec![OrderLineItem::new("takoyaki", "Takoyaki", 2, 140)],
            1_700_000_000_000,
        )
    }

    #[test]
    fn test_codec_roundtrip() {
        let mut codec = EventCodec::new();

        let event = SyncEvent::NewOrder(sample_order(1));

        // Encode
        let mut buf = BytesMut::new();
        codec.encode(event.clone(), &mut buf).unwrap();

        // Decode
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, event);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_cancel_event() {
        let mut codec = EventCodec::new();

        let mut buf = BytesMut::new();
        codec
            .encode(SyncEvent::CancelOrder(OrderId::new(42)), &mut buf)
            .unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        if let SyncEvent::CancelOrder(id) = decoded {
            assert_eq!(id, OrderId::new(42));
        } else {
            panic!("Expected CancelOrder event");
        }
    }

    #[test]
    fn test_codec_partial_read() {
        let mut codec = EventCodec::new();

        let mut full_buf = BytesMut::new();
        codec.encode(SyncEvent::PeerCount(3), &mut full_buf).unwrap();

        // Split the buffer to simulate partial read
        let mut partial = full_buf.split_to(HEADER_SIZE - 1);

        // Should return None (need more data)
        assert!(codec.decode(&mut partial).unwrap().is_none());

        // Add the rest
        partial.extend_from_slice(&full_buf);

        // Now it should decode
        let decoded = codec.decode(&mut partial).unwrap().unwrap();
        if let SyncEvent::PeerCount(count) = decoded {
            assert_eq!(count, 3);
        } else {
            panic!("Expected PeerCount event");
        }
    }

    #[test]
    fn test_codec_header_then_payload_split() {
        let mut codec = EventCodec::new();

        let event = SyncEvent::CompleteOrder(sample_order(9));
        let mut full_buf = BytesMut::new();
        codec.encode(event.clone(), &mut full_buf).unwrap();

        // Feed exactly the header first
        let mut partial = full_buf.split_to(HEADER_SIZE);
        assert!(codec.decode(&mut partial).unwrap().is_none());

        // Feed the payload
        partial.extend_from_slice(&full_buf);
        let decoded = codec.decode(&mut partial).unwrap().unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_codec_back_to_back_frames() {
        let mut codec = EventCodec::new();

        let mut buf = BytesMut::new();
        codec.encode(SyncEvent::NewOrder(sample_order(1)), &mut buf).unwrap();
        codec.encode(SyncEvent::PeerCount(2), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(first, SyncEvent::NewOrder(_)));
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(second, SyncEvent::PeerCount(2)));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
