use mnemolite::{FileInput, MnemoLiteCore};
use mnemolite_search::{SearchFilters, SearchOptions};
use mnemolite_store::ChunkFilters;

fn core() -> MnemoLiteCore {
    MnemoLiteCore::ephemeral().unwrap()
}

/// Scenario: a Python file with one syntax error in the middle still gets
/// indexed — the parser fails, the pipeline falls back to fixed-size
/// chunks covering the whole file, and the content is still lexically
/// searchable afterward.
#[tokio::test]
async fn chunking_falls_back_on_syntax_error_without_propagating() {
    let core = core();
    let mut source = String::new();
    for i in 0..10 {
        source.push_str(&format!("def fn_{i}(a, b):\n    return a + b\n\n"));
    }
    source.push_str("def broken(:\n    pass\n");

    let file = FileInput {
        path: "pkg/broken.py".to_string(),
        content: source.into_bytes(),
        commit_hash: None,
    };

    let summary = core.index("repo", vec![file]).await.unwrap();
    assert_eq!(summary.indexed_files, 1);
    assert!(summary.per_file_errors.is_empty());
    assert!(summary.indexed_chunks >= 1);

    let response = core
        .search("repo", "fn_3", SearchFilters::default(), 5, SearchOptions::default())
        .await
        .unwrap();
    assert!(!response.hits.is_empty());
}

/// Scenario: an empty file indexes cleanly to zero chunks, not an error.
#[tokio::test]
async fn empty_file_indexes_to_zero_chunks() {
    let core = core();
    let file = FileInput {
        path: "pkg/empty.py".to_string(),
        content: Vec::new(),
        commit_hash: None,
    };
    let summary = core.index("repo", vec![file]).await.unwrap();
    assert_eq!(summary.indexed_files, 1);
    assert_eq!(summary.indexed_chunks, 0);
}

/// Round-trip: reindexing a file with the same content and commit hash
/// produces the same set of `name_path`s as a fresh index of that file
/// alone into an empty repository.
#[tokio::test]
async fn reindex_round_trips_name_paths() {
    let content = b"def add(a, b):\n    \"\"\"Adds two numbers.\"\"\"\n    return a + b\n".to_vec();

    let fresh = core();
    fresh
        .index(
            "repo",
            vec![FileInput { path: "a.py".to_string(), content: content.clone(), commit_hash: Some("h1".to_string()) }],
        )
        .await
        .unwrap();
    let mut fresh_paths: Vec<String> = fresh
        .list_chunks("repo", &ChunkFilters::default(), 100, 0)
        .unwrap()
        .into_iter()
        .map(|c| c.name_path)
        .collect();
    fresh_paths.sort();

    let reindexed = core();
    reindexed
        .index(
            "repo",
            vec![FileInput { path: "a.py".to_string(), content: b"def old(): pass\n".to_vec(), commit_hash: Some("h0".to_string()) }],
        )
        .await
        .unwrap();
    reindexed
        .reindex_file("repo", FileInput { path: "a.py".to_string(), content, commit_hash: Some("h1".to_string()) })
        .await
        .unwrap();
    let mut reindexed_paths: Vec<String> = reindexed
        .list_chunks("repo", &ChunkFilters::default(), 100, 0)
        .unwrap()
        .into_iter()
        .map(|c| c.name_path)
        .collect();
    reindexed_paths.sort();

    assert_eq!(fresh_paths, reindexed_paths);
}

/// Idempotence: `index` followed by a second `index` with the same inputs
/// produces no additional chunks, nodes, or edges. Chunk ids are content-
/// addressed (repository + path + byte range + name) and `upsert_batch`
/// upserts by id, and a batch's graph build fully replaces the prior graph
/// rather than adding to it, so a repeat call converges rather than grows.
#[tokio::test]
async fn indexing_the_same_file_twice_does_not_duplicate_anything() {
    let core = core();
    let file = FileInput {
        path: "a.py".to_string(),
        content: b"def helper():\n    return 1\n\n\ndef main():\n    return helper()\n".to_vec(),
        commit_hash: None,
    };

    let first = core.index("repo", vec![file.clone()]).await.unwrap();
    let first_stats = core.graph_stats("repo").unwrap();
    let first_chunks = core.list_chunks("repo", &ChunkFilters::default(), 100, 0).unwrap().len();

    let second = core.index("repo", vec![file]).await.unwrap();
    let second_stats = core.graph_stats("repo").unwrap();
    let second_chunks = core.list_chunks("repo", &ChunkFilters::default(), 100, 0).unwrap().len();

    assert_eq!(first.indexed_chunks, second.indexed_chunks);
    assert_eq!(first_chunks, second_chunks);
    assert_eq!(first_stats.node_count, second_stats.node_count);
    assert_eq!(first_stats.edge_count, second_stats.edge_count);
}

/// Built-in filtering stays at edge-creation time: `sum` is filtered from
/// the call graph but still appears in the chunk's own recorded metadata.
#[tokio::test]
async fn builtin_callees_are_filtered_from_edges_but_kept_in_metadata() {
    let core = core();
    let file = FileInput {
        path: "a.py".to_string(),
        content: b"def f(xs):\n    return sum(xs)\n".to_vec(),
        commit_hash: None,
    };
    core.index("repo", vec![file]).await.unwrap();

    let chunks = core.list_chunks("repo", &ChunkFilters::default(), 10, 0).unwrap();
    let f = chunks.iter().find(|c| c.name == "f").unwrap();
    assert!(f.metadata.calls.iter().any(|c| c == "sum"));

    let stats = core.graph_stats("repo").unwrap();
    assert_eq!(stats.edge_count, 0);
}

/// `delete_repository` clears chunks and the repository's graph together;
/// a stats lookup afterward is not-found rather than an empty-but-present
/// graph.
#[tokio::test]
async fn delete_repository_clears_chunks_and_graph() {
    let core = core();
    let file = FileInput { path: "a.py".to_string(), content: b"def f():\n    pass\n".to_vec(), commit_hash: None };
    core.index("repo", vec![file]).await.unwrap();
    assert!(core.graph_stats("repo").is_ok());

    let report = core.delete_repository("repo").unwrap();
    assert_eq!(report.deleted_chunks, 1);
    assert!(core.list_chunks("repo", &ChunkFilters::default(), 10, 0).unwrap().is_empty());
    assert!(core.graph_stats("repo").is_err());
}
