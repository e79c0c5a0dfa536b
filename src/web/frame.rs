//! Framed-block encoding for the HTTP responses.
//!
//! Each artwork is sent as one byte-exact block of terminal control
//! sequences: reset the screen, print the artwork name on its own line,
//! then the raw ANSI frame. Clients are expected to be terminals piping
//! the body straight through (`curl host:8080`).

use bytes::{BufMut, Bytes, BytesMut};

/// Hide the cursor, clear the screen, home the cursor, select the palette
/// foreground. Also used once as the full-screen prelude of a slideshow
/// response.
pub const RESET: &[u8] = b"\x1B[?25l\x1B[2J\x1B[H\x1B[38;5;16m";

/// Move to the next line and return the cursor to the left margin.
pub const LINE_RETURN: &[u8] = b"\x1B[E\x1B[100D";

/// Encode one framed block: reset, line return, indented name, line
/// return, frame payload.
pub fn frame_block(name: &str, frame: &[u8]) -> Bytes {
    let mut block = BytesMut::with_capacity(
        RESET.len() + 2 * LINE_RETURN.len() + 3 + name.len() + frame.len(),
    );
    block.put_slice(RESET);
    block.put_slice(LINE_RETURN);
    block.put_slice(b"   ");
    block.put_slice(name.as_bytes());
    block.put_slice(LINE_RETURN);
    block.put_slice(frame);
    block.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout_is_byte_exact() {
        let block = frame_block("scrooge", b"ANSI");
        let expected = [
            &b"\x1B[?25l\x1B[2J\x1B[H\x1B[38;5;16m"[..],
            b"\x1B[E\x1B[100D",
            b"   scrooge",
            b"\x1B[E\x1B[100D",
            b"ANSI",
        ]
        .concat();
        assert_eq!(block.as_ref(), expected.as_slice());
    }

    #[test]
    fn empty_frame_still_carries_the_name() {
        let block = frame_block("blank", b"");
        assert!(block.ends_with(b"   blank\x1B[E\x1B[100D"));
    }
}
