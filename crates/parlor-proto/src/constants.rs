/// Magic bytes at the beginning of every frame.
/// Used to quickly reject unrelated or corrupted data.
pub const MAGIC: [u8; 2] = *b"PL";

/// Wire-format protocol version.
/// Bump this only for breaking changes to the header layout or message formats.
pub const VERSION: u8 = 1;

/// Fixed header length in bytes (wire format).
pub const HEADER_LEN: usize = 12;

/// Framing prefix length in bytes.
///
/// TCP is a byte stream, so each message is framed as
/// `[u32 frame_len_le][Header][Payload]`,
/// where `frame_len_le` is the length of `[Header][Payload]` in bytes.
pub const LEN_PREFIX: usize = 4;
