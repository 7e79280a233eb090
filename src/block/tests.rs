use super::*;

#[test]
fn insert_into_empty_store() {
    let mut store = BlockStore::new();
    store.insert(0, b"hello").unwrap();
    assert_eq!(store.to_vec(), b"hello");
    assert_eq!(store.len(), 5);
    assert_eq!(store.newline_count(), 0);
}

#[test]
fn insert_tracks_newlines() {
    let mut store = BlockStore::from_bytes(b"abc\ndef\n");
    assert_eq!(store.newline_count(), 2);
    store.insert(4, b"xyz\n").unwrap();
    assert_eq!(store.to_vec(), b"abc\nxyz\ndef\n");
    assert_eq!(store.newline_count(), 3);
}

#[test]
fn delete_returns_removed_bytes() {
    let mut store = BlockStore::from_bytes(b"abc\ndef\n");
    let removed = store.delete(4, 3).unwrap();
    assert_eq!(removed, b"def");
    assert_eq!(store.to_vec(), b"abc\n\n");
    assert_eq!(store.newline_count(), 2);
}

#[test]
fn insert_then_delete_round_trips() {
    let mut store = BlockStore::from_bytes(b"The quick brown fox");
    store.insert(4, b"very ").unwrap();
    assert_eq!(store.to_vec(), b"The very quick brown fox");
    let removed = store.delete(4, 5).unwrap();
    assert_eq!(removed, b"very ");
    assert_eq!(store.to_vec(), b"The quick brown fox");
}

#[test]
fn oversized_insert_splits_blocks() {
    let mut store = BlockStore::new();
    let chunk = vec![b'a'; MAX_BLOCK_SIZE + 1];
    store.insert(0, &chunk).unwrap();
    assert!(store.block_count() > 1);
    assert_eq!(store.len(), chunk.len());
    assert_eq!(store.to_vec(), chunk);
}

#[test]
fn oversized_insert_splits_into_many_blocks_not_just_one() {
    // A single insert far larger than one split's worth (e.g. `exec`'s
    // `Buffer` output action replacing a region with a large child's
    // stdout) must leave every block `<= MAX_BLOCK_SIZE`, not just the
    // first split's head while the tail stays oversized.
    let mut store = BlockStore::new();
    let chunk = vec![b'a'; MAX_BLOCK_SIZE * 4 + 37];
    store.insert(0, &chunk).unwrap();
    assert_eq!(store.to_vec(), chunk);
    assert_eq!(store.len(), chunk.len());
    for block in &store.blocks {
        assert!(block.len() <= MAX_BLOCK_SIZE, "block of {} bytes exceeds MAX_BLOCK_SIZE", block.len());
    }
}

#[test]
fn deletes_merge_small_neighbors() {
    let mut store = BlockStore::new();
    // Force two undersized adjacent blocks by splitting manually via two inserts
    // that each individually stay under TARGET_BLOCK_SIZE after the merge.
    store.insert(0, b"abc").unwrap();
    store.insert(3, b"def").unwrap();
    assert_eq!(store.to_vec(), b"abcdef");
    store.delete(0, 3).unwrap();
    assert_eq!(store.to_vec(), b"def");
}

#[test]
fn bytes_in_spans_block_boundaries() {
    let mut store = BlockStore::new();
    store.insert(0, &vec![b'a'; TARGET_BLOCK_SIZE]).unwrap();
    store.insert(TARGET_BLOCK_SIZE, b"BOUNDARY").unwrap();
    let slice = store.bytes_in(TARGET_BLOCK_SIZE - 4..TARGET_BLOCK_SIZE + 4);
    assert_eq!(slice, b"aaaaBOUN");
}

#[test]
fn iter_next_byte_walks_whole_store() {
    let store = BlockStore::from_bytes(b"xyz");
    let mut it = store.iter_at(0);
    let mut collected = Vec::new();
    while let Some((b, next)) = it.next_byte(&store) {
        collected.push(b);
        it = next;
    }
    assert_eq!(collected, b"xyz");
}

#[test]
fn iter_prev_byte_is_inverse_of_next() {
    let store = BlockStore::from_bytes(b"xyz");
    let end = store.iter_at(3);
    let (b, back) = end.prev_byte(&store).unwrap();
    assert_eq!(b, b'z');
    assert_eq!(back.byte_offset(&store), 2);
}

#[test]
fn codepoint_iteration_handles_multibyte_utf8() {
    let text = "a\u{00e9}\u{4e2d}b"; // a, e-acute, CJK, b
    let store = BlockStore::from_bytes(text.as_bytes());
    let mut it = store.iter_at(0);
    let mut chars = Vec::new();
    while let Some((ch, next)) = it.next_codepoint(&store) {
        chars.push(ch);
        it = next;
    }
    assert_eq!(chars, text.chars().collect::<Vec<_>>());
}

#[test]
fn prev_codepoint_reassembles_multibyte_utf8() {
    let text = "\u{4e2d}x";
    let store = BlockStore::from_bytes(text.as_bytes());
    let end = store.iter_at(store.len());
    let (ch, back) = end.prev_codepoint(&store).unwrap();
    assert_eq!(ch, 'x');
    let (ch2, _) = back.prev_codepoint(&store).unwrap();
    assert_eq!(ch2, '\u{4e2d}');
}

#[test]
fn invalid_utf8_falls_back_to_single_byte() {
    let store = BlockStore::from_bytes(&[0xFF, b'a']);
    let it = store.iter_at(0);
    let (ch, next) = it.next_codepoint(&store).unwrap();
    assert_eq!(ch as u32, 0xFF);
    let (ch2, _) = next.next_codepoint(&store).unwrap();
    assert_eq!(ch2, 'a');
}

#[test]
fn bol_eol_and_line_navigation() {
    let store = BlockStore::from_bytes(b"abc\ndef\nghi");
    let mid = store.iter_at(5); // inside "def"
    assert_eq!(mid.bol(&store).byte_offset(&store), 4);
    assert_eq!(mid.eol(&store).byte_offset(&store), 7);
    let next = mid.next_line(&store).unwrap();
    assert_eq!(next.byte_offset(&store), 8);
    let prev = mid.prev_line(&store).unwrap();
    assert_eq!(prev.byte_offset(&store), 0);
}

#[test]
fn skip_bytes_stops_at_end() {
    let store = BlockStore::from_bytes(b"abc");
    let it = store.iter_at(0);
    let moved = it.skip_bytes(&store, 100);
    assert_eq!(moved.byte_offset(&store), 3);
}

#[test]
fn delete_out_of_bounds_is_rejected() {
    let mut store = BlockStore::from_bytes(b"abc");
    assert!(store.delete(2, 5).is_err());
}

#[test]
fn insert_out_of_bounds_is_rejected() {
    let mut store = BlockStore::from_bytes(b"abc");
    assert!(store.insert(10, b"x").is_err());
}

#[test]
fn newlines_before_counts_only_preceding_lines() {
    let store = BlockStore::from_bytes(b"abc\ndef\nghi");
    assert_eq!(store.newlines_before(0), 0);
    assert_eq!(store.newlines_before(3), 0);
    assert_eq!(store.newlines_before(4), 1);
    assert_eq!(store.newlines_before(8), 2);
    assert_eq!(store.newlines_before(100), 2);
}

#[test]
fn newlines_before_spans_block_boundary() {
    let chunk = vec![b'a'; TARGET_BLOCK_SIZE];
    let mut bytes = chunk.clone();
    bytes.push(b'\n');
    bytes.extend_from_slice(b"tail\n");
    let store = BlockStore::from_bytes(&bytes);
    assert!(store.block_count() > 1);
    assert_eq!(store.newlines_before(bytes.len()), 2);
    assert_eq!(store.newlines_before(TARGET_BLOCK_SIZE), 0);
}
