use super::*;

struct Chunks<'a> {
    chunks: std::collections::VecDeque<&'a [u8]>,
}

impl<'a> Read for Chunks<'a> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let Some(chunk) = self.chunks.pop_front() else {
            return Err(std::io::Error::from(std::io::ErrorKind::WouldBlock));
        };
        buf[..chunk.len()].copy_from_slice(chunk);
        Ok(chunk.len())
    }
}

fn read_all(mut chunks: Chunks) -> (MessageBuffer, Vec<IoOutcome>) {
    let mut buf = MessageBuffer::new();
    let mut outcomes = Vec::new();
    loop {
        match buf.read(&mut chunks) {
            Ok(IoOutcome::WouldBlock) if chunks.chunks.is_empty() => {
                outcomes.push(IoOutcome::WouldBlock);
                break;
            }
            Ok(o) => {
                let done = matches!(o, IoOutcome::Ok | IoOutcome::InvalidInput | IoOutcome::Eof);
                outcomes.push(o);
                if done {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    (buf, outcomes)
}

#[test]
fn read_whole_batch_in_one_chunk() {
    let chunks = Chunks { chunks: vec![b"HELLO 0 TEST IDENT\n".as_ref()].into() };
    let (_buf, outcomes) = read_all(chunks);
    assert_eq!(outcomes.last(), Some(&IoOutcome::Ok));
}

#[test]
fn partial_io_tolerance_matches_unsplit_case() {
    let whole = b"HELLO 0 TEST IDENT ;\nMODULE-REPO\n".as_ref();
    let unsplit = Chunks { chunks: vec![whole].into() };
    let (mut buf_unsplit, _) = read_all(unsplit);

    // Split the same byte stream into single-byte reads.
    let mut byte_chunks: std::collections::VecDeque<&[u8]> =
        (0..whole.len()).map(|i| &whole[i..i + 1]).collect();
    let mut split = Chunks { chunks: std::mem::take(&mut byte_chunks) };
    let mut buf_split = MessageBuffer::new();
    loop {
        match buf_split.read(&mut split) {
            Ok(IoOutcome::Ok) => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }

    let mut words_unsplit = Vec::new();
    let mut words_split = Vec::new();
    loop {
        let u = buf_unsplit.lex(&mut words_unsplit);
        let s = buf_split.lex(&mut words_split);
        if matches!(u, LexOutcome::NoMessage) {
            assert!(matches!(s, LexOutcome::NoMessage));
            break;
        }
    }
    assert_eq!(words_unsplit, words_split);
}

#[test]
fn lex_strips_continuation_marker() {
    let mut buf = MessageBuffer::new();
    buf.extend_from_slice(b"HELLO 0 TEST IDENT ;\n");
    let mut words = Vec::new();
    let outcome = buf.lex(&mut words);
    assert!(matches!(outcome, LexOutcome::Message));
    assert_eq!(words, vec![Word::from("HELLO"), Word::from("0"), Word::from("TEST"), Word::from("IDENT")]);
    assert!(matches!(buf.lex(&mut Vec::new()), LexOutcome::NoMessage));
}

#[test]
fn lex_reports_malformed_line_with_raw_text() {
    let mut buf = MessageBuffer::new();
    buf.extend_from_slice(b"MODULE-IMPORT 'unterminated\n");
    let mut words = Vec::new();
    match buf.lex(&mut words) {
        LexOutcome::Malformed(line) => {
            assert_eq!(line.as_bytes(), b"MODULE-IMPORT 'unterminated");
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
}

#[test]
fn multiple_lines_in_one_batch_lex_in_order() {
    let mut buf = MessageBuffer::new();
    buf.extend_from_slice(b"HELLO 0 A B ;\nMODULE-REPO\n");
    let mut first = Vec::new();
    let mut second = Vec::new();
    assert!(matches!(buf.lex(&mut first), LexOutcome::Message));
    assert!(matches!(buf.lex(&mut second), LexOutcome::Message));
    assert!(matches!(buf.lex(&mut Vec::new()), LexOutcome::NoMessage));
    assert_eq!(first, vec![Word::from("HELLO"), Word::from("0"), Word::from("A"), Word::from("B")]);
    assert_eq!(second, vec![Word::from("MODULE-REPO")]);
}

#[test]
fn appending_builds_continuation_and_terminal_lines() {
    let mut buf = MessageBuffer::new();
    buf.begin_line();
    buf.append_word(b"HELLO", false);
    buf.append_integer(0);
    buf.append_word(b"default", false);
    buf.begin_line();
    buf.append_word(b"MODULE-REPO", false);
    buf.append_word(b"cmi.cache", false);
    buf.finish_batch();
    assert_eq!(buf.as_bytes(), b"HELLO 0 default ;\nMODULE-REPO cmi.cache\n");
}

#[test]
fn emitted_batch_round_trips_through_lex() {
    let mut buf = MessageBuffer::new();
    buf.begin_line();
    buf.append_word(b"MODULE-EXPORT", false);
    buf.append_word(b"weird word; with stuff", false);
    buf.finish_batch();
    let bytes = buf.as_bytes().to_vec();

    let mut incoming = MessageBuffer::new();
    incoming.extend_from_slice(&bytes);
    let mut words = Vec::new();
    assert!(matches!(incoming.lex(&mut words), LexOutcome::Message));
    assert_eq!(words, vec![Word::from("MODULE-EXPORT"), Word::new(b"weird word; with stuff".to_vec())]);
}

#[test]
fn write_resumes_after_partial_write() {
    struct OneByteThenBlock {
        allowed: usize,
        written: Vec<u8>,
    }
    impl Write for OneByteThenBlock {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.allowed == 0 {
                return Err(std::io::Error::from(std::io::ErrorKind::WouldBlock));
            }
            let n = buf.len().min(self.allowed);
            self.written.extend_from_slice(&buf[..n]);
            self.allowed -= n;
            Ok(n)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let mut buf = MessageBuffer::new();
    buf.extend_from_slice(b"HELLO 0 default\n");
    let mut sink = OneByteThenBlock { allowed: 4, written: Vec::new() };
    let outcome = buf.write(&mut sink).unwrap();
    assert_eq!(outcome, IoOutcome::WouldBlock);
    sink.allowed = 100;
    let outcome = buf.write(&mut sink).unwrap();
    assert_eq!(outcome, IoOutcome::Ok);
    assert_eq!(sink.written, b"HELLO 0 default\n");
}

#[test]
fn continuation_marker_with_tab_and_extra_spaces_is_recognized() {
    let mut buf = MessageBuffer::new();
    let mut stream =
        std::io::Cursor::new(b"HELLO 0 A B\t;\nMODULE-REPO  ;\nMODULE-EXPORT foo\n".to_vec());
    let outcome = buf.read(&mut stream).unwrap();
    assert_eq!(outcome, IoOutcome::Ok);

    let mut words = Vec::new();
    assert!(matches!(buf.lex(&mut words), LexOutcome::Message));
    assert_eq!(words, vec![Word::from("HELLO"), Word::from("0"), Word::from("A"), Word::from("B")]);
}

#[test]
fn read_detects_pipelined_batch_in_single_read() {
    let mut buf = MessageBuffer::new();
    let mut stream = std::io::Cursor::new(b"HELLO 0 A B\nMODULE-REPO\n".to_vec());
    let outcome = buf.read(&mut stream).unwrap();
    assert_eq!(outcome, IoOutcome::InvalidInput);
}

#[test]
fn eof_on_zero_byte_read() {
    let mut buf = MessageBuffer::new();
    let mut stream = std::io::Cursor::new(Vec::<u8>::new());
    assert_eq!(buf.read(&mut stream).unwrap(), IoOutcome::Eof);
}
