use docmind_core::error::Error;
use docmind_core::types::Chunk;
use docmind_core::Chunker;

fn sample_document() -> String {
    let para = "The water filter must be cleaned every week. Replace the ceramic element \
                after six months of use! Does the pump need priming? Only after storage.\n";
    let mut text = String::new();
    for i in 0..40 {
        text.push_str(&format!("Section {i}.\n"));
        text.push_str(para);
        if i % 3 == 0 {
            text.push('\n');
        }
    }
    text
}

/// Rebuild the source by appending only the part of each chunk that the
/// previous chunks have not covered yet.
fn reconstruct(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut covered = 0usize;
    for c in chunks {
        assert!(c.start_offset <= covered, "gap before chunk {}", c.sequence_index);
        out.extend(c.text.chars().skip(covered - c.start_offset));
        covered = covered.max(c.start_offset + c.char_len());
    }
    out
}

#[test]
fn reconstructs_source_for_many_parameter_pairs() {
    let text = sample_document();
    for (size, overlap) in [(1000, 200), (200, 0), (120, 119), (64, 16), (37, 5), (1, 0), (5000, 10)] {
        let chunker = Chunker::new(size, overlap).expect("valid params");
        let chunks: Vec<Chunk> = chunker.split(&text, "manual.txt").collect();
        assert_eq!(reconstruct(&chunks), text, "size={size} overlap={overlap}");
        assert!(chunks.iter().all(|c| c.char_len() <= size), "size={size} overlap={overlap}");
    }
}

#[test]
fn sequence_indices_are_dense_and_doc_id_is_kept() {
    let text = sample_document();
    let chunks: Vec<Chunk> = Chunker::default().split(&text, "manual.txt").collect();
    assert!(chunks.len() > 1);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.sequence_index, i);
        assert_eq!(c.source_doc_id, "manual.txt");
    }
    for pair in chunks.windows(2) {
        assert!(pair[1].start_offset > pair[0].start_offset, "starts strictly increase");
    }
}

#[test]
fn consecutive_chunks_overlap() {
    let text = sample_document();
    let chunks: Vec<Chunk> = Chunker::new(300, 60).expect("valid").split(&text, "d").collect();
    for pair in chunks.windows(2) {
        let prev_end = pair[0].start_offset + pair[0].char_len();
        assert!(pair[1].start_offset < prev_end, "chunk {} shares text with its predecessor", pair[1].sequence_index);
    }
}

#[test]
fn twenty_five_hundred_chars_without_boundaries() {
    let text: String = std::iter::repeat("abcdefghij").take(250).collect();
    let chunks: Vec<Chunk> = Chunker::new(1000, 200).expect("valid").split(&text, "d").collect();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.iter().map(|c| c.start_offset).collect::<Vec<_>>(), vec![0, 800, 1600]);
}

#[test]
fn short_text_is_one_chunk() {
    let chunks: Vec<Chunk> = Chunker::default().split("Short text", "a.txt").collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Short text");
    assert_eq!(chunks[0].start_offset, 0);
}

#[test]
fn invalid_overlap_is_a_configuration_error() {
    let err = Chunker::new(100, 100).expect_err("overlap == size");
    assert!(matches!(err, Error::Configuration(_)));
}
