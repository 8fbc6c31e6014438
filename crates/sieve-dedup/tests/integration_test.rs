//! Integration tests for sieve-dedup.
//!
//! Tests end-to-end workflows, including real file I/O.

use sieve_dedup::io::{read_jsonl, write_audit, write_documents};
use sieve_dedup::io::IoError;
use sieve_dedup::{
    AuditEntry, DedupConfig, Deduplicator, Document, ExactResolver, FingerprintAlgorithm,
    FuzzyResolver, FuzzySharding, Paragraph, RemovalReason, RemovedRecord, SieveError, Stage,
};
use std::io::Write;
use tempfile::TempDir;

/// Create a test dataset with known exact duplicates.
fn create_test_documents(num_docs: usize, duplicate_ratio: f64) -> Vec<Document> {
    let num_unique = (num_docs as f64 * (1.0 - duplicate_ratio)) as usize;
    let mut docs = Vec::with_capacity(num_docs);

    for i in 0..num_unique {
        docs.push(Document::new(
            i as u64,
            format!(
                "Unique document {i} opens with its own words.\n\nIts body paragraph {i} is different from the others."
            ),
            format!("http://example.com/{i}"),
        ));
    }

    // Copies of earlier documents
    for i in num_unique..num_docs {
        let source = docs[i % num_unique].text.clone();
        docs.push(Document::new(i as u64, source, format!("http://mirror.com/{i}")));
    }

    docs
}

fn dedup(config: DedupConfig) -> Deduplicator {
    Deduplicator::new(config).unwrap()
}

#[test]
fn test_exact_conservation() {
    let docs = create_test_documents(200, 0.25);
    let outcome = dedup(DedupConfig::default()).exact_dedup(docs);

    assert_eq!(outcome.report.input, 200);
    assert_eq!(outcome.documents.len() + outcome.audit.len(), 200);
    assert!(outcome.report.is_conserved());
    assert_eq!(outcome.documents.len(), 150);
}

#[test]
fn test_fuzzy_conservation() {
    let docs = create_test_documents(200, 0.3);
    let outcome = dedup(DedupConfig::default())
        .fuzzy_dedup(docs)
        .unwrap();

    assert_eq!(outcome.report.input, 400);
    assert!(outcome.report.is_conserved());
    assert_eq!(outcome.report.removed, outcome.audit.len());
    let per_shard: usize = outcome.report.shards.iter().map(|s| s.after).sum();
    assert_eq!(per_shard, outcome.report.surviving);
}

#[test]
fn test_exact_idempotence() {
    let d = dedup(DedupConfig::default());
    let first = d.exact_dedup(create_test_documents(100, 0.5));
    let kept: Vec<_> = first.documents.iter().map(|d| d.id).collect();

    let second = d.exact_dedup(first.documents);
    assert!(second.audit.is_empty());
    assert_eq!(second.documents.iter().map(|d| d.id).collect::<Vec<_>>(), kept);
}

#[test]
fn test_identical_texts_share_a_shard() {
    for shard_count in [1, 2, 3, 8, 13, 64] {
        for algorithm in [FingerprintAlgorithm::Xxh3, FingerprintAlgorithm::Blake3] {
            let resolver = ExactResolver::new(shard_count, algorithm).unwrap();
            let docs = resolver.fingerprint(vec![
                Document::new(0, "same body", "a"),
                Document::new(1, "other body", "b"),
                Document::new(2, "same body", "c"),
            ]);

            assert_eq!(docs[0].shard, docs[2].shard);
            assert_eq!(docs[0].fingerprint, docs[2].fingerprint);
            assert!(docs.iter().all(|d| d.shard.unwrap() < shard_count));
        }
    }
}

#[test]
fn test_exact_result_independent_of_shard_count() {
    let expected: Vec<_> = dedup(DedupConfig::default().with_shard_count(1))
        .exact_dedup(create_test_documents(120, 0.4))
        .documents
        .iter()
        .map(|d| d.id)
        .collect();

    for shard_count in [2, 5, 16] {
        let ids: Vec<_> = dedup(DedupConfig::default().with_shard_count(shard_count))
            .exact_dedup(create_test_documents(120, 0.4))
            .documents
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, expected, "shard_count = {shard_count}");
    }
}

#[test]
fn test_identical_token_sets_cluster() {
    let trials = 1000;
    let mut clustered = 0;

    for seed in 0..trials {
        let config = DedupConfig::default()
            .with_seed(seed)
            .with_fuzzy_sharding(FuzzySharding::Single);
        let resolver = FuzzyResolver::new(&config).unwrap();
        let paragraphs = vec![
            Paragraph::new(0, 0, "the cat sat on the mat today", ""),
            Paragraph::new(1, 0, "Today the CAT sat   on the mat", ""),
        ];
        let resolution = resolver.resolve(paragraphs).unwrap();
        if resolution.paragraphs.len() == 1 {
            clustered += 1;
        }
    }

    assert!(
        clustered as f64 / trials as f64 >= 0.95,
        "only {clustered}/{trials} trials clustered"
    );
}

#[test]
fn test_removed_middle_paragraph_rejoins_neighbours() {
    let docs = vec![
        Document::new(1, "another document\n\nDuplicated MIDDLE text", "u1"),
        Document::new(0, "kept paragraph zero\n\nduplicated middle text\n\nkept paragraph two", "u0"),
    ];

    let out = dedup(DedupConfig::default().with_fuzzy_sharding(FuzzySharding::Single))
        .run(docs)
        .unwrap();

    let doc0 = out.documents.iter().find(|d| d.id == 0).unwrap();
    assert_eq!(doc0.text, "kept paragraph zero kept paragraph two");
    assert_eq!(doc0.url, "u0");
}

#[test]
fn test_scenario_byte_identical_documents() {
    let docs = vec![
        Document::new(1, "Hello world. This is a test.", "http://d1"),
        Document::new(2, "Hello world. This is a test.", "http://d2"),
    ];
    let out = dedup(DedupConfig::default()).run(docs).unwrap();

    assert_eq!(out.documents.len(), 1);
    assert_eq!(out.documents[0].id, 1);

    let entries: Vec<&AuditEntry> = out.audit.iter().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].stage, Stage::ExactDedup);
    assert_eq!(entries[0].reason, RemovalReason::ExactDuplicate { survivor: 1 });
    assert!(matches!(&entries[0].record, RemovedRecord::Document(d) if d.id == 2));
}

#[test]
fn test_scenario_near_identical_paragraphs() {
    let docs = vec![
        Document::new(3, "The quick brown fox jumps.\n\nOnly in three.", "http://d3"),
        Document::new(4, "the quick brown FOX jumps.", "http://d4"),
    ];
    let out = dedup(DedupConfig::default().with_fuzzy_sharding(FuzzySharding::Single))
        .run(docs)
        .unwrap();

    assert_eq!(out.documents.len(), 1);
    assert_eq!(out.documents[0].text, "The quick brown fox jumps. Only in three.");
    assert_eq!(out.reports[1].cascaded_documents, vec![4]);
    assert_eq!(out.stats.cascaded_documents, 1);
    assert_eq!(
        out.audit.iter().next().unwrap().reason,
        RemovalReason::FuzzyDuplicate {
            survivor_doc: 3,
            survivor_paragraph: 0
        }
    );
}

/// Fraction of seeds under which the two texts end up in one cluster.
fn cluster_rate(a: &str, b: &str, threshold: f64, seeds: u64) -> f64 {
    let clustered = (0..seeds)
        .filter(|&seed| {
            let config = DedupConfig::default()
                .with_seed(seed)
                .with_threshold(threshold)
                .with_fuzzy_sharding(FuzzySharding::Single);
            let resolver = FuzzyResolver::new(&config).unwrap();
            let pair = vec![Paragraph::new(0, 0, a, ""), Paragraph::new(1, 0, b, "")];
            resolver.resolve(pair).unwrap().paragraphs.len() == 1
        })
        .count();
    clustered as f64 / seeds as f64
}

#[test]
fn test_literal_fox_pair_below_threshold() {
    // {the, quick, brown, fox} shared out of 6 distinct words: Jaccard 4/6.
    let jumps = "The quick brown fox jumps.";
    let leaps = "The quick brown fox leaps.";

    let docs = vec![
        Document::new(3, jumps, "http://d3"),
        Document::new(4, leaps, "http://d4"),
    ];
    let out = dedup(DedupConfig::default().with_fuzzy_sharding(FuzzySharding::Single))
        .run(docs)
        .unwrap();
    assert_eq!(out.documents.len(), 2);
    assert_eq!(out.reports[1].removed, 0);

    // 9x13 bands at 0.8: about 0.045 per seed.
    let strict = cluster_rate(jumps, leaps, 0.8, 200);
    assert!(strict < 0.15, "clustered under {strict} of seeds at 0.8");

    // 25x5 bands at 0.5: about 0.97 per seed.
    let loose = cluster_rate(jumps, leaps, 0.5, 200);
    assert!(loose >= 0.9, "clustered under only {loose} of seeds at 0.5");
}

#[test]
fn test_repeated_id_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("input.jsonl");
    std::fs::write(
        &input_path,
        "{\"text\": \"alpha one\\n\\nbeta two\", \"url\": \"http://a\"}\n{\"id\": 0, \"text\": \"gamma three\"}\n",
    )
    .unwrap();

    assert!(matches!(
        read_jsonl(&input_path, "text").unwrap_err(),
        IoError::DuplicateId { id: 0, line: 2 }
    ));

    let docs = vec![
        Document::new(0, "alpha one\n\nbeta two", "http://a"),
        Document::new(0, "gamma three", ""),
    ];
    let err = dedup(DedupConfig::default().with_fuzzy_sharding(FuzzySharding::Single))
        .run(docs)
        .unwrap_err();
    assert_eq!(err, SieveError::DuplicateId(0));
}

#[test]
fn test_first_band_sharding_finds_cross_shard_duplicates() {
    let mut docs = Vec::new();
    for i in 0..32 {
        docs.push(Document::new(
            i,
            format!("repeated boilerplate footer line\n\nunique words for entry {i} alpha{i} beta{i}"),
            "",
        ));
    }
    let out = dedup(DedupConfig::default().with_fuzzy_sharding(FuzzySharding::FirstBand))
        .run(docs)
        .unwrap();

    // All 32 footers land in one shard, so 31 are removed.
    let fuzzy = &out.reports[1];
    assert!(fuzzy.removed >= 31, "{fuzzy:?}");
    assert_eq!(out.documents.len(), 32);
    assert!(out.documents[1..]
        .iter()
        .all(|d| !d.text.contains("boilerplate")));
}

#[test]
fn test_output_preserves_input_order() {
    let docs = create_test_documents(80, 0.25);
    let out = dedup(DedupConfig::default()).run(docs).unwrap();

    let ids: Vec<_> = out.documents.iter().map(|d| d.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[test]
fn test_jsonl_roundtrip_dedup() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("input.jsonl");
    let output_path = temp_dir.path().join("output.jsonl");
    let audit_path = temp_dir.path().join("removed.jsonl");

    let mut file = std::fs::File::create(&input_path).unwrap();
    writeln!(file, r#"{{"id": 10, "text": "Same text.", "url": "http://a"}}"#).unwrap();
    writeln!(file, r#"{{"id": 11, "text": "Same text.", "url": "http://b"}}"#).unwrap();
    writeln!(file, r#"{{"id": 12, "text": "Something else entirely.\n\nSecond part."}}"#).unwrap();
    drop(file);

    let docs = read_jsonl(&input_path, "text").unwrap();
    let out = dedup(DedupConfig::default()).run(docs).unwrap();

    assert_eq!(write_documents(&output_path, &out.documents).unwrap(), 2);
    assert_eq!(write_audit(&audit_path, &out.audit).unwrap(), 1);

    let cleaned = read_jsonl(&output_path, "text").unwrap();
    assert_eq!(cleaned.len(), 2);
    assert_eq!(cleaned[0].id, 10);
    assert_eq!(cleaned[0].url, "http://a");
    assert_eq!(cleaned[1].text, "Something else entirely. Second part.");

    let audit = std::fs::read_to_string(&audit_path).unwrap();
    let entry: AuditEntry = serde_json::from_str(audit.lines().next().unwrap()).unwrap();
    assert_eq!(entry.reason, RemovalReason::ExactDuplicate { survivor: 10 });
}

#[test]
fn test_invalid_configuration_rejected() {
    for config in [
        DedupConfig::default().with_shard_count(0),
        DedupConfig::default().with_permutations(0),
        DedupConfig::default().with_threshold(0.0),
    ] {
        assert!(Deduplicator::new(config).is_err());
    }
}
