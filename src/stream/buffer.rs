/// Accumulates raw response bytes across network chunks and yields complete
/// newline-terminated lines.
///
/// The buffer holds undecoded bytes so a multi-byte UTF-8 sequence split
/// across two chunks is never decoded early; decoding happens per complete
/// line, and a newline byte can never occur inside a multi-byte sequence.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one network chunk and returns every line it completed, in
    /// order and without their terminating newlines. Whatever follows the
    /// last newline stays buffered as the start of the next line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let Some(last_newline) = self.buf.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buf.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buf, rest);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Number of buffered bytes that never saw a terminating newline. When
    /// the stream ends these are discarded unparsed.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buffer: &mut LineBuffer, chunks: &[&[u8]]) -> Vec<String> {
        chunks.iter().flat_map(|chunk| buffer.push(chunk)).collect()
    }

    #[test]
    fn yields_complete_lines_and_retains_the_tail() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"data: Hel"), Vec::<String>::new());
        assert_eq!(buffer.push(b"lo\ndata: world\n"), vec!["data: Hello", "data: world"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn blank_lines_come_through_as_empty_strings() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"data: foo\n\n\ndata: bar\n"), vec!["data: foo", "", "", "data: bar"]);
    }

    #[test]
    fn unterminated_tail_is_reported_not_yielded() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.push(b"data: complete\ndata: partial"), vec!["data: complete"]);
        assert_eq!(buffer.pending(), "data: partial".len());
    }

    #[test]
    fn any_chunk_boundary_matches_single_chunk_delivery() {
        let input = "data: \u{4f60}\u{597d}\nevent: error\n\ndata: caf\u{e9} au lait\n".as_bytes();

        let mut whole = LineBuffer::new();
        let expected = whole.push(input);

        // Split at every byte boundary, including mid multi-byte character.
        for split in 0..=input.len() {
            let mut buffer = LineBuffer::new();
            let lines = collect(&mut buffer, &[&input[..split], &input[split..]]);
            assert_eq!(lines, expected, "split at byte {split}");
            assert_eq!(buffer.pending(), 0);
        }
    }

    #[test]
    fn three_way_splits_inside_one_character_reassemble() {
        // "你" is three bytes; deliver them one at a time.
        let input = "data: \u{4f60}\n".as_bytes();
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();
        for byte in input {
            lines.extend(buffer.push(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["data: \u{4f60}"]);
    }
}
