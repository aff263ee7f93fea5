use ragcore::{Chunk, CorpusLoader, Error, IndexOptions, RetrievalConfig, RetrievalQuery, VectorIndex};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write_corpus(dir: &Path) {
    fs::write(
        dir.join("Doc1_lapse_playbook.md"),
        "grace period extension for missed payment\n\nloyalty discount for long tenure\n",
    )
    .unwrap();
    fs::write(dir.join("Doc2_competition.md"), "competitor price comparison").unwrap();
}

fn build(dir: &Path) -> VectorIndex {
    let config = RetrievalConfig { docs_dir: dir.to_path_buf(), ..RetrievalConfig::default() };
    VectorIndex::open(&config).unwrap()
}

#[test]
fn missed_payment_query_cites_grace_period() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    assert_eq!(idx.len(), 3);

    let hits = idx.retrieve("customer missed payment needs extension", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source_label, "[Doc1]");
    assert!(hits[0].chunk_text.contains("grace period extension"));
    assert!(hits[0].chunk_text.starts_with("Source: [Doc1] (Doc1_lapse_playbook.md)\n"));
    assert!(hits[0].score > 0.05 && hits[0].score <= 1.0);
}

#[test]
fn unrelated_query_returns_nothing() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    let hits = idx.retrieve("completely unrelated aerospace engineering term", 3).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn directory_without_documents_is_queryable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.csv"), "a,b\n1,2").unwrap();
    let idx = build(dir.path());
    assert!(idx.is_empty());
    assert!(idx.retrieve("anything", 5).unwrap().is_empty());

    let missing = build(&dir.path().join("does-not-exist"));
    for k in 1..4 {
        assert!(missing.retrieve("anything", k).unwrap().is_empty());
    }
}

#[test]
fn repeated_queries_are_identical() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    let first = idx.retrieve("long tenure customer discount", 3).unwrap();
    for _ in 0..5 {
        assert_eq!(idx.retrieve("long tenure customer discount", 3).unwrap(), first);
    }
    assert_eq!(first[0].source_label, "[Doc1]");
    assert!(first[0].chunk_text.contains("loyalty discount"));
}

#[test]
fn results_respect_k_and_threshold() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    // Every chunk shares the header term "source", so all of them score something.
    for k in 1..6 {
        let hits = idx.retrieve("source payment discount price", k).unwrap();
        assert!(hits.len() <= k.min(idx.len()));
        assert!(hits.iter().all(|h| h.score > 0.05));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn chunk_body_ranks_its_own_chunk_first() {
    let chunks = vec![
        Chunk::new("premium payment reminder sent by email", "[Doc1]", "Doc1_a.md"),
        Chunk::new("premium payment reminder sent by phone call", "[Doc2]", "Doc2_b.md"),
        Chunk::new("agents should log every renewal conversation", "[Doc3]", "Doc3_c.md"),
    ];
    let idx = VectorIndex::build(chunks, IndexOptions::default());
    let own = idx.chunks()[0].body().to_string();
    let hits = idx.retrieve(&own, 3).unwrap();
    assert_eq!(hits[0].source_label, "[Doc1]");
    assert!(hits.len() >= 2);
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn zero_k_is_an_argument_error() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    assert!(matches!(idx.retrieve("payment", 0), Err(Error::InvalidK(0))));
}

#[test]
fn discovery_mixes_recursive_and_top_level_rules() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("leads/nested")).unwrap();
    fs::write(root.join("leads/nested/Doc9_deep.md"), "deep markdown").unwrap();
    fs::write(root.join("top.md"), "top markdown").unwrap();
    fs::write(root.join("legacy.txt"), "legacy text").unwrap();
    fs::write(root.join("leads/ignored.txt"), "nested legacy text").unwrap();
    fs::write(root.join(".hidden.md"), "hidden").unwrap();

    let corpus = CorpusLoader::default().load(root).unwrap();
    let names: Vec<&str> = corpus.chunks.iter().map(|c| c.origin_file.as_str()).collect();
    assert_eq!(names, vec!["Doc9_deep.md", "top.md", "legacy.txt"]);
    assert_eq!(corpus.chunks[0].source_label, "[Doc9]");
    assert_eq!(corpus.files.len(), 3);
}

#[test]
fn undecodable_file_aborts_with_its_path() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    fs::write(dir.path().join("broken.md"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

    let err = CorpusLoader::default().load(dir.path()).unwrap_err();
    match &err {
        Error::CorpusAccess { path, .. } => assert!(path.ends_with("broken.md")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("broken.md"));
}

struct LapseContext {
    payment_status: &'static str,
    tenure_years: u32,
}

impl RetrievalQuery for LapseContext {
    fn to_retrieval_query(&self) -> String {
        let mut parts = Vec::new();
        if self.payment_status == "Missed" {
            parts.push("customer missed payment");
        }
        if self.tenure_years > 5 {
            parts.push("long tenure");
        }
        parts.join(" ")
    }
}

#[test]
fn structured_context_is_queried_through_its_string() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = build(dir.path());
    let ctx = LapseContext { payment_status: "Missed", tenure_years: 1 };
    let hits = idx.retrieve_for(&ctx, 1).unwrap();
    assert!(hits[0].chunk_text.contains("missed payment"));
}

#[test]
fn concurrent_queries_see_the_same_index() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<VectorIndex>();

    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let idx = Arc::new(build(dir.path()));
    let expected = idx.retrieve("competitor price", 2).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let idx = Arc::clone(&idx);
            std::thread::spawn(move || idx.retrieve("competitor price", 2).unwrap())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
    assert_eq!(expected[0].source_label, "[Doc2]");
}

#[test]
fn windows_line_endings_split_into_paragraphs() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Doc1_a.md"), "grace period\r\n\r\nloyalty discount\r\n").unwrap();

    let corpus = CorpusLoader::default().load(dir.path()).unwrap();
    let bodies: Vec<&str> = corpus.chunks.iter().map(|c| c.body()).collect();
    assert_eq!(bodies, vec!["grace period", "loyalty discount"]);
}

#[cfg(unix)]
#[test]
fn symlinked_documents_are_discovered_by_both_rules() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    let target = target_dir.path().join("shared.txt");
    fs::write(&target, "linked paragraph").unwrap();
    symlink(&target, dir.path().join("Doc1_link.md")).unwrap();
    symlink(&target, dir.path().join("legacy.txt")).unwrap();

    let corpus = CorpusLoader::default().load(dir.path()).unwrap();
    let names: Vec<&str> = corpus.chunks.iter().map(|c| c.origin_file.as_str()).collect();
    assert_eq!(names, vec!["Doc1_link.md", "legacy.txt"]);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_aborts_with_its_path() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can still list the directory; nothing to check then.
    let listable = fs::read_dir(&locked).is_ok();
    let result = CorpusLoader::default().load(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    if listable {
        assert!(result.is_ok());
        return;
    }

    match result.unwrap_err() {
        Error::CorpusAccess { path, .. } => assert!(path.ends_with("locked")),
        other => panic!("unexpected error: {other}"),
    }
}
