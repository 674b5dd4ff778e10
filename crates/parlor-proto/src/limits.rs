//! Message size limits for the session protocol.
//!
//! Single source of truth for frame caps, shared by the encoder and the
//! receive path.

/// Maximum payload size for a single message (16 KiB).
///
/// Every parlor message is control-sized; the worst case is a `SnakeFrame`
/// carrying two full-board snake bodies, which stays well under this cap.
pub const MAX_PAYLOAD: usize = 16 * 1024;

/// Maximum frame size (header + payload).
///
/// This is the absolute maximum size of a single framed message and is
/// enforced on both encode and decode to avoid unbounded allocations.
pub const MAX_FRAME: usize = crate::constants::HEADER_LEN + MAX_PAYLOAD;

/// Receive buffer cap.
///
/// Sized to hold one maximum-size frame plus margin for a partial
/// follow-up frame.
pub const RX_BUFFER_SIZE: usize = MAX_FRAME + 8 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rx_buffer_larger_than_max_frame() {
        assert!(RX_BUFFER_SIZE > MAX_FRAME);
    }
}
