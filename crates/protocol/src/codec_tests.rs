use super::*;
use crate::{BatchInfo, Document, TestRecord};
use std::io::Cursor;

fn sample_frames() -> Vec<Document> {
    vec![
        Document::Test(TestRecord::new(8, 1, 77)),
        Document::BatchInfo(BatchInfo::new(77)),
    ]
}

#[test]
fn frames_are_read_back_in_order_then_end() {
    let mut buf = Vec::new();
    let mut written = 0;
    for doc in sample_frames() {
        written += write_frame(&mut buf, &doc).expect("write frame");
    }
    assert_eq!(written, buf.len());

    let mut cursor = Cursor::new(buf);
    let mut seen = Vec::new();
    let mut consumed = 0;
    loop {
        match read_frame::<_, Document>(&mut cursor).expect("read frame") {
            FrameRead::Frame(doc, n) => {
                consumed += n;
                seen.push(doc);
            }
            FrameRead::End => break,
            FrameRead::Torn => panic!("unexpected torn frame"),
        }
    }

    assert_eq!(seen, sample_frames());
    assert_eq!(consumed, written);
}

#[test]
fn truncated_payload_is_torn() {
    let frame = encode_frame(&Document::Test(TestRecord::new(32, 5, 9))).expect("encode");

    for cut in [1, FRAME_HEADER_LEN - 1, FRAME_HEADER_LEN, frame.len() - 1] {
        let mut cursor = Cursor::new(frame[..cut].to_vec());
        let got = read_frame::<_, Document>(&mut cursor).expect("read frame");
        assert!(
            matches!(got, FrameRead::Torn),
            "cut at {cut} should be torn, got {got:?}"
        );
    }
}

#[test]
fn checksum_mismatch_is_torn() {
    let mut frame = encode_frame(&Document::BatchInfo(BatchInfo::new(3))).expect("encode");
    let last = frame.len() - 1;
    frame[last] ^= 0xff;

    let mut cursor = Cursor::new(frame);
    let got = read_frame::<_, Document>(&mut cursor).expect("read frame");
    assert!(matches!(got, FrameRead::Torn));
}

#[test]
fn oversized_length_prefix_is_torn_without_allocating() {
    let mut frame = Vec::new();
    frame.extend_from_slice(&u32::MAX.to_be_bytes());
    frame.extend_from_slice(&0u32.to_be_bytes());

    let mut cursor = Cursor::new(frame);
    let got = read_frame::<_, Document>(&mut cursor).expect("read frame");
    assert!(matches!(got, FrameRead::Torn));
}

#[test]
fn empty_input_is_end() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let got = read_frame::<_, Document>(&mut cursor).expect("read frame");
    assert!(matches!(got, FrameRead::End));
}
