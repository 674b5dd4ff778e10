use crate::{
    constants::{HEADER_LEN, LEN_PREFIX},
    error::ProtoError,
    header::Header,
    limits::{MAX_FRAME, MAX_PAYLOAD},
    messages::Message,
    packet::PacketView,
};

/// Encode a message that implements the [`Message`] trait into a frame.
///
/// The header is constructed automatically from the message type's
/// `msg_id()`; `seq` carries the sender's tick counter.
pub fn encode_message<T: Message>(payload: &T, seq: u32) -> Result<Vec<u8>, ProtoError> {
    let payload_bytes = postcard::to_stdvec(payload)?;
    if payload_bytes.len() > MAX_PAYLOAD {
        return Err(ProtoError::PayloadTooLarge(payload_bytes.len()));
    }

    let mut header = Header::new(T::msg_id() as u8);
    header.seq = seq;
    header.payload_len = payload_bytes.len() as u32;

    let frame_len = HEADER_LEN + payload_bytes.len();

    let mut out = Vec::with_capacity(LEN_PREFIX + frame_len);
    out.extend_from_slice(&(frame_len as u32).to_le_bytes());

    let mut hbuf = [0u8; HEADER_LEN];
    header.encode_into(&mut hbuf);
    out.extend_from_slice(&hbuf);
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Decode as many complete frames as the buffer holds.
///
/// Returns the decoded views and the number of bytes consumed. A partial
/// trailing frame consumes nothing and is left for the next read; a
/// malformed frame (bad length, bad magic/version) is a hard error and the
/// caller must treat the link as dead.
///
/// An unrecognized msg id is *not* an error at this layer: the view is
/// returned with the raw id in its header so the consumer can drop it with
/// a diagnostic.
pub fn try_decode_frames<'a>(in_buf: &'a [u8]) -> Result<(Vec<PacketView<'a>>, usize), ProtoError> {
    let mut frames = Vec::new();
    let mut offset = 0usize;

    loop {
        if in_buf.len().saturating_sub(offset) < LEN_PREFIX {
            break;
        }
        let len_bytes = &in_buf[offset..offset + LEN_PREFIX];
        let frame_len =
            u32::from_le_bytes(len_bytes.try_into().expect("slice length is 4")) as usize;

        if frame_len < HEADER_LEN {
            return Err(ProtoError::LengthMismatch);
        }
        if frame_len > MAX_FRAME {
            return Err(ProtoError::FrameTooLarge(frame_len));
        }

        let total_needed = LEN_PREFIX + frame_len;
        if in_buf.len().saturating_sub(offset) < total_needed {
            break;
        }

        let frame = &in_buf[offset + LEN_PREFIX..offset + total_needed];
        let (h, payload) = Header::decode(frame)?;

        frames.push(PacketView::new(h, payload));
        offset += total_needed;
    }

    Ok((frames, offset))
}

/// Decode a frame's payload as a specific message type.
///
/// Fails with `UnexpectedMsgId` if the header's id does not match the
/// requested type, so callers dispatch on the id first.
pub fn decode_payload<T: Message>(packet: &PacketView<'_>) -> Result<T, ProtoError> {
    if packet.header.msg_id != T::msg_id() as u8 {
        return Err(ProtoError::UnexpectedMsgId(packet.header.msg_id));
    }
    Ok(postcard::from_bytes(packet.payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::session::{GameSelect, Handshake};
    use crate::messages::tictactoe::Move;
    use crate::msg_id::MsgId;

    #[test]
    fn encode_decode_round_trip() {
        let msg = Handshake {
            username: "alice".to_string(),
        };
        let frame = encode_message(&msg, 7).unwrap();

        let (views, consumed) = try_decode_frames(&frame).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].msg_id(), Some(MsgId::Handshake));
        assert_eq!(views[0].header.seq, 7);

        let decoded: Handshake = decode_payload(&views[0]).unwrap();
        assert_eq!(decoded.username, "alice");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let (views, consumed) = try_decode_frames(&[]).unwrap();
        assert!(views.is_empty());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn concatenated_frames_decode_in_order() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&encode_message(&GameSelect { index: 0 }, 0).unwrap());
        buf.extend_from_slice(
            &encode_message(
                &Move {
                    row: 1,
                    col: 2,
                    piece: 1,
                },
                1,
            )
            .unwrap(),
        );
        buf.extend_from_slice(&encode_message(&GameSelect { index: 2 }, 2).unwrap());

        let (views, consumed) = try_decode_frames(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].msg_id(), Some(MsgId::GameSelect));
        assert_eq!(views[1].msg_id(), Some(MsgId::Move));
        assert_eq!(views[2].msg_id(), Some(MsgId::GameSelect));

        let first: GameSelect = decode_payload(&views[0]).unwrap();
        let last: GameSelect = decode_payload(&views[2]).unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(last.index, 2);
    }

    #[test]
    fn partial_frame_is_left_in_buffer() {
        let frame = encode_message(
            &Handshake {
                username: "bob".to_string(),
            },
            0,
        )
        .unwrap();

        for cut in 1..frame.len() {
            let (views, consumed) = try_decode_frames(&frame[..cut]).unwrap();
            assert!(views.is_empty(), "cut at {cut} produced a partial object");
            assert_eq!(consumed, 0);
        }
    }

    #[test]
    fn unknown_msg_id_is_surfaced_not_fatal() {
        let mut frame = encode_message(&GameSelect { index: 1 }, 0).unwrap();
        // Overwrite the id byte with one no build knows.
        frame[LEN_PREFIX + 3] = 0xEE;

        let (views, consumed) = try_decode_frames(&frame).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].msg_id(), None);
        assert_eq!(views[0].header.msg_id, 0xEE);
    }

    #[test]
    fn oversized_frame_length_is_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_FRAME + 1) as u32).to_le_bytes());
        buf.extend_from_slice(&[0u8; 32]);
        assert!(matches!(
            try_decode_frames(&buf),
            Err(ProtoError::FrameTooLarge(_))
        ));
    }

    #[test]
    fn undersized_frame_length_is_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            try_decode_frames(&buf),
            Err(ProtoError::LengthMismatch)
        ));
    }

    #[test]
    fn decode_payload_checks_id() {
        let frame = encode_message(&GameSelect { index: 1 }, 0).unwrap();
        let (views, _) = try_decode_frames(&frame).unwrap();
        assert!(matches!(
            decode_payload::<Handshake>(&views[0]),
            Err(ProtoError::UnexpectedMsgId(_))
        ));
    }
}
