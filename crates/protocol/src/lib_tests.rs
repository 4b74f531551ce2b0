use super::*;

#[test]
fn test_record_payload_has_exact_length() {
    for num_bytes in [0usize, 1, 50, 1024] {
        let rec = TestRecord::new(num_bytes, 1, 2);
        assert_eq!(rec.payload.len(), num_bytes);
        assert!(rec.payload.chars().all(|c| c == PAYLOAD_FILLER));
    }
}

#[test]
fn test_record_carries_ids_and_kind() {
    let rec = TestRecord::new(4, 42, 1_700_000_000_000_000_000);

    assert_eq!(rec.kind, TEST_RECORD_KIND);
    assert_eq!(rec.sequence_id, 42);
    assert_eq!(rec.batch_id, 1_700_000_000_000_000_000);
}

#[test]
fn document_batch_id_reads_either_variant() {
    let rec: Document = TestRecord::new(1, 1, 9).into();
    let info: Document = BatchInfo::new(9).into();

    assert_eq!(rec.batch_id(), 9);
    assert_eq!(info.batch_id(), 9);
    assert!(rec.as_test().is_some());
    assert!(info.as_test().is_none());
}
