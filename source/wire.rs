// Length-delimited framing. Every frame is
//
//   offset  size  field
//   0       4     padded body length, big-endian
//   4       4     zero padding
//   8       ...   NUL-terminated text, zero-padded to a multiple of 8
//
// so the whole frame is always a multiple of 8 bytes. The advertised length
// counts the padded body, not the text; the text ends at the first NUL.
// Received padding may hold anything, sent padding is zero.

use byteorder::{BigEndian, ByteOrder as _};
use std::io::{self, Read, Write};

pub const HEADER_LENGTH: usize = 8;
pub const ALIGNMENT: usize = 8;
/// Bodies advertised above this are a protocol error, not an allocation.
pub const MAX_BODY_LENGTH: usize = 1 << 20;

fn align(length: usize) -> usize {
  (length + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Lays out one frame around `text`; the NUL terminator comes from the zero
/// fill.
pub fn encode(text: &[u8]) -> Vec<u8> {
  let body = align(text.len() + 1);
  let mut frame = vec![0; HEADER_LENGTH + body];
  BigEndian::write_u32(&mut frame[..4], body as u32);
  frame[HEADER_LENGTH..HEADER_LENGTH + text.len()].copy_from_slice(text);
  frame
}

/// Reads until `buffer` is full, retrying interrupted reads. The count comes
/// back short only when the peer closed the stream, 0 meaning it closed
/// before sending anything.
pub fn read_full<R: Read>(stream: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
  let mut filled = 0;
  while filled < buffer.len() {
    match stream.read(&mut buffer[filled..]) {
      Ok(0) => break,
      Ok(count) => filled += count,
      Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
      Err(error) => return Err(error),
    }
  }
  Ok(filled)
}

/// Writes the whole buffer; interrupted and zero-length writes are transient.
pub fn write_full<W: Write>(stream: &mut W, buffer: &[u8]) -> io::Result<()> {
  let mut written = 0;
  while written < buffer.len() {
    match stream.write(&buffer[written..]) {
      Ok(count) => written += count,
      Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
      Err(error) => return Err(error),
    }
  }
  Ok(())
}

/// Frames `text` and sends the whole thing.
pub fn write_frame<W: Write>(stream: &mut W, text: &[u8]) -> io::Result<()> {
  let frame = encode(text);
  log::debug!("> {}", escape(&frame));
  write_full(stream, &frame)
}

/// Receives one frame and extracts its text. `None` means the peer closed
/// the stream at a frame boundary; anywhere else is an error.
pub fn read_frame<R: Read>(stream: &mut R) -> io::Result<Option<Vec<u8>>> {
  let mut header = [0; HEADER_LENGTH];
  match read_full(stream, &mut header)? {
    0 => return Ok(None),
    HEADER_LENGTH => (),
    _ => {
      return Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "truncated frame header",
      ))
    }
  }
  let length = BigEndian::read_u32(&header[..4]) as usize;
  if length == 0 || length > MAX_BODY_LENGTH {
    return Err(io::Error::new(
      io::ErrorKind::InvalidData,
      format!("bad frame length {length}"),
    ));
  }
  let mut body = vec![0; length];
  if read_full(stream, &mut body)? != length {
    return Err(io::Error::new(
      io::ErrorKind::UnexpectedEof,
      "truncated frame body",
    ));
  }
  log::debug!("< {}{}", escape(&header), escape(&body));
  match memchr::memchr(0, &body) {
    Some(end) => {
      body.truncate(end);
      Ok(Some(body))
    }
    None => Err(io::Error::new(
      io::ErrorKind::InvalidData,
      "unterminated frame text",
    )),
  }
}

/// Printable rendition of raw frame bytes for the debug log.
fn escape(bytes: &[u8]) -> String {
  let mut string = String::new();
  for byte in bytes {
    string += &std::ascii::escape_default(*byte).to_string();
  }
  string
}
