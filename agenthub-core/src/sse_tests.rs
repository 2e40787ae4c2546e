use super::*;
use futures::stream;

fn ok_chunks(chunks: &[&str]) -> impl Stream<Item = Result<Vec<u8>, String>> + Send {
    let owned: Vec<Result<Vec<u8>, String>> =
        chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
    stream::iter(owned)
}

async fn decode(chunks: &[&str]) -> Vec<String> {
    decode_stream(ok_chunks(chunks), |e: String| format!("error: {}", e))
        .collect()
        .await
}

// ============================================================================
// Line classification
// ============================================================================

#[test]
fn test_parse_data_line_unquotes() {
    assert_eq!(
        parse_line(r#"data: "hello world""#),
        SseLine::Data("hello world".to_string())
    );
}

#[test]
fn test_parse_data_line_unescapes() {
    assert_eq!(
        parse_line(r#"data: "line one\nsaid \"hi\" C:\\tmp""#),
        SseLine::Data("line one\nsaid \"hi\" C:\\tmp".to_string())
    );
}

#[test]
fn test_parse_plain_text_payload() {
    assert_eq!(
        parse_line("data: just text"),
        SseLine::Data("just text".to_string())
    );
    assert_eq!(parse_line("data:tight"), SseLine::Data("tight".to_string()));
}

#[test]
fn test_parse_done_sentinel() {
    assert_eq!(parse_line("data: [DONE]"), SseLine::Done);
    assert_eq!(parse_line("data: [DONE]\r"), SseLine::Done);
}

#[test]
fn test_parse_ignored_lines() {
    assert_eq!(parse_line("event: message"), SseLine::Ignored);
    assert_eq!(parse_line(": keep-alive"), SseLine::Ignored);
    assert_eq!(parse_line("id: 42"), SseLine::Ignored);
    assert_eq!(parse_line(""), SseLine::Ignored);
}

#[test]
fn test_parse_strips_carriage_return() {
    assert_eq!(
        parse_line("data: \"x\"\r"),
        SseLine::Data("x".to_string())
    );
}

#[test]
fn test_unescape_keeps_unknown_sequences() {
    assert_eq!(unescape_payload(r"tab\there"), r"tab\there");
    assert_eq!(unescape_payload(r"trailing\"), r"trailing\");
    assert_eq!(unescape_payload("\""), "\"");
}

// ============================================================================
// Line reassembly
// ============================================================================

#[test]
fn test_line_decoder_split_across_chunks() {
    let mut decoder = LineDecoder::new();
    assert!(decoder.push(b"data: \"hel").is_empty());
    assert_eq!(decoder.push(b"lo\"\ndata: "), vec!["data: \"hello\""]);
    assert_eq!(decoder.push(b"x\n\n"), vec!["data: x", ""]);
    assert!(decoder.finish().is_none());
}

#[test]
fn test_line_decoder_split_utf8() {
    let bytes = "data: 世界\n".as_bytes();
    let mut decoder = LineDecoder::new();
    assert!(decoder.push(&bytes[..8]).is_empty());
    assert_eq!(decoder.push(&bytes[8..]), vec!["data: 世界"]);
}

#[test]
fn test_line_decoder_finish_returns_tail() {
    let mut decoder = LineDecoder::new();
    decoder.push(b"data: tail");
    assert_eq!(decoder.finish(), Some("data: tail".to_string()));
    assert!(decoder.finish().is_none());
}

// ============================================================================
// Stream decoding
// ============================================================================

#[tokio::test]
async fn test_decode_concatenates_until_done() {
    let chunks = decode(&[
        "data: \"a\\nb\"\n\n",
        "data: \"c\"\n\n",
        "data: [DONE]\n\n",
        "data: \"after\"\n\n",
    ])
    .await;

    assert_eq!(chunks, vec!["a\nb", "c"]);
    assert_eq!(chunks.concat(), "a\nbc");
}

#[tokio::test]
async fn test_decode_ignores_event_lines() {
    let chunks = decode(&["event: start\ndata: \"x\"\n\nevent: end\n"]).await;
    assert_eq!(chunks, vec!["x"]);
}

#[tokio::test]
async fn test_decode_preserves_order_with_arbitrary_splits() {
    let body = "data: \"one\"\n\ndata: \"two\"\n\ndata: \"three\"\n\ndata: [DONE]\n\n";
    let pieces: Vec<&str> = body
        .as_bytes()
        .chunks(3)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();

    let chunks = decode(&pieces).await;
    assert_eq!(chunks, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_decode_flushes_unterminated_last_line() {
    let chunks = decode(&["data: \"a\"\n", "data: \"b\""]).await;
    assert_eq!(chunks, vec!["a", "b"]);
}

#[tokio::test]
async fn test_decode_error_becomes_single_chunk() {
    let input = stream::iter(vec![
        Ok(b"data: \"partial\"\n".to_vec()),
        Err("connection reset".to_string()),
        Ok(b"data: \"never\"\n".to_vec()),
    ]);

    let chunks: Vec<String> = decode_stream(input, |e: String| format!("[stream error: {}]", e))
        .collect()
        .await;

    assert_eq!(chunks, vec!["partial", "[stream error: connection reset]"]);
}

#[tokio::test]
async fn test_collect_text() {
    let text = collect_text(decode_stream(
        ok_chunks(&["data: \"Hello, \"\n", "data: \"world\"\n", "data: [DONE]\n"]),
        |e: String| e,
    ))
    .await;
    assert_eq!(text, "Hello, world");
}
