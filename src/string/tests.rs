use super::quote::{quote_into, tokenize_line};

fn roundtrip(word: &[u8]) {
    let mut quoted = Vec::new();
    quote_into(word, &mut quoted);
    // quote_into always produces exactly one token, so feeding it straight
    // back through the line tokenizer should recover the original bytes.
    let tokens = tokenize_line(&quoted).expect("quoted form must parse");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].bytes, word);
    assert!(tokens[0].was_quoted);
}

#[test]
fn roundtrip_printable() {
    roundtrip(b"hello world");
    roundtrip(b"foo:bar/baz.h");
}

#[test]
fn roundtrip_escapes() {
    roundtrip(b"'\\ \n\t\x01");
    roundtrip(b"");
    roundtrip(b"\x7f");
}

#[test]
fn roundtrip_all_bytes() {
    let all: Vec<u8> = (0u8..=255).collect();
    roundtrip(&all);
}

#[test]
fn underscore_escape_is_legacy_space_synonym() {
    let tokens = tokenize_line(b"'a\\_b'").unwrap();
    assert_eq!(tokens[0].bytes, b"a b");
}

#[test]
fn unquoted_word_not_requiring_quotes_is_emitted_verbatim() {
    let mut out = Vec::new();
    super::quote::write_word(b"foo-bar_1.2/3%x", false, &mut out);
    assert_eq!(out, b"foo-bar_1.2/3%x");
}

#[test]
fn empty_word_always_quoted() {
    let mut out = Vec::new();
    super::quote::write_word(b"", false, &mut out);
    assert_eq!(out, b"''");
}

#[test]
fn malformed_unterminated_quote() {
    assert!(tokenize_line(b"'unterminated").is_err());
}

#[test]
fn malformed_control_byte_in_quotes() {
    assert!(tokenize_line(b"'a\x01b'").is_err());
}

#[test]
fn malformed_bad_hex_escape() {
    assert!(tokenize_line(b"'\\zz'").is_err());
}

#[test]
fn two_words_split_on_whitespace_runs() {
    let tokens = tokenize_line(b"foo   bar\tbaz").unwrap();
    let words: Vec<_> = tokens.iter().map(|t| t.bytes.clone()).collect();
    assert_eq!(words, vec![b"foo".to_vec(), b"bar".to_vec(), b"baz".to_vec()]);
}

#[test]
fn bare_semicolon_is_distinguishable_from_quoted() {
    let tokens = tokenize_line(b"; ';'").unwrap();
    assert!(tokens[0].bytes == b";" && !tokens[0].was_quoted);
    assert!(tokens[1].bytes == b";" && tokens[1].was_quoted);
}
