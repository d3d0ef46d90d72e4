use buffer_diff::{Chunk, ChunkIdentity, ChunkSet, ChunkSetError, Side};
use pretty_assertions::assert_eq;

#[test]
fn test_empty_chunk_set() {
    let chunks = ChunkSet::empty();

    assert!(chunks.is_empty());
    assert_eq!(chunks.len(), 0);
    assert_eq!(chunks, ChunkSet::default());
    assert_eq!(chunks.to_string(), "");
}

#[test]
fn test_valid_chunks_are_kept_in_order() {
    let chunks = ChunkSet::from_chunks(
        vec![Chunk::new(0, 2, 0, 0), Chunk::new(4, 4, 2, 5)],
        6,
        7,
    )
    .unwrap();

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks.chunk(1), Some(&Chunk::new(4, 4, 2, 5)));
    assert_eq!(chunks.get(ChunkIdentity::new(4, 4)), Some(&Chunk::new(4, 4, 2, 5)));
    assert_eq!(chunks.get(ChunkIdentity::new(1, 2)), None);
    assert_eq!(chunks.to_string(), "-[0..2) +[0..0)\n-[4..4) +[2..5)");
}

#[test]
fn test_reversed_range_is_rejected() {
    let err = ChunkSet::from_chunks(vec![Chunk::new(0, 1, 3, 2)], 5, 5).unwrap_err();

    assert_eq!(
        err,
        ChunkSetError::ReversedRange {
            index: 0,
            side: Side::Working
        }
    );
}

#[test]
fn test_empty_chunk_is_rejected() {
    let err = ChunkSet::from_chunks(vec![Chunk::new(3, 3, 3, 3)], 5, 5).unwrap_err();

    assert_eq!(err, ChunkSetError::EmptyChunk { index: 0 });
}

#[test]
fn test_out_of_bounds_is_rejected() {
    let err = ChunkSet::from_chunks(vec![Chunk::new(0, 9, 0, 1)], 5, 5).unwrap_err();

    assert_eq!(
        err,
        ChunkSetError::OutOfBounds {
            index: 0,
            side: Side::Baseline,
            end: 9,
            len: 5
        }
    );
    assert_eq!(err.to_string(), "chunk 0 ends at 9 past the baseline text length 5");
}

#[test]
fn test_overlap_is_rejected() {
    let err = ChunkSet::from_chunks(
        vec![Chunk::new(0, 2, 0, 3), Chunk::new(4, 5, 2, 4)],
        10,
        10,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ChunkSetError::Unordered {
            previous: 0,
            index: 1,
            side: Side::Working
        }
    );
}

#[test]
fn test_duplicate_identity_is_rejected() {
    let err = ChunkSet::from_chunks(
        vec![Chunk::new(2, 2, 0, 1), Chunk::new(2, 2, 1, 2)],
        4,
        4,
    )
    .unwrap_err();

    assert!(matches!(err, ChunkSetError::DuplicateIdentity { index: 1, .. }));
}

#[test]
fn test_vec_conversion_validates() {
    let chunks = vec![Chunk::new(0, 2, 0, 0), Chunk::new(4, 4, 2, 5)];

    let set = ChunkSet::try_from(chunks.clone()).unwrap();
    assert_eq!(Vec::from(set), chunks);

    let unordered = vec![Chunk::new(4, 4, 2, 5), Chunk::new(0, 2, 0, 0)];
    assert!(matches!(
        ChunkSet::try_from(unordered),
        Err(ChunkSetError::Unordered { previous: 0, index: 1, .. })
    ));
    assert_eq!(
        ChunkSet::try_from(vec![Chunk::new(3, 3, 1, 1)]),
        Err(ChunkSetError::EmptyChunk { index: 0 })
    );
}
