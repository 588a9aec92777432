use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use wiki_sync::directory::{
    BodyRepresentation, DirectoryError, MockPageDirectory, NewPage, Page, PageDirectory,
    PageUpdate,
};
use wiki_sync::source::Document;
use wiki_sync::synchronise::{ensure_container, publish_all, synchronise, DocumentOutcome};

/// Stateful in-memory page directory for multi-run tests. Enforces the
/// read-before-increment contract: an update must set exactly current + 1.
struct InMemoryDirectory {
    pages: Mutex<HashMap<String, StoredPage>>,
    next_id: Mutex<i64>,
    create_calls: Mutex<usize>,
    update_calls: Mutex<usize>,
}

#[derive(Clone)]
struct StoredPage {
    id: String,
    title: String,
    body: String,
    representation: BodyRepresentation,
    version: i64,
    ancestors: Vec<String>,
}

impl InMemoryDirectory {
    fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            next_id: Mutex::new(100),
            create_calls: Mutex::new(0),
            update_calls: Mutex::new(0),
        }
    }

    fn page(&self, title: &str) -> Option<StoredPage> {
        self.pages.lock().unwrap().get(title).cloned()
    }

    fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }

    fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    fn update_calls(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }
}

#[async_trait]
impl PageDirectory for InMemoryDirectory {
    async fn find_by_title(&self, title: &str) -> Result<Vec<Page>, DirectoryError> {
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(title)
            .map(|p| Page {
                id: p.id.clone(),
                title: p.title.clone(),
                version: Some(p.version),
                ancestors: p.ancestors.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn create_page<'a>(&self, req: NewPage<'a>) -> Result<Page, DirectoryError> {
        *self.create_calls.lock().unwrap() += 1;
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let stored = StoredPage {
            id: next_id.to_string(),
            title: req.title.to_string(),
            body: req.body.to_string(),
            representation: req.representation,
            version: 1,
            ancestors: req.ancestors.to_vec(),
        };
        let mut pages = self.pages.lock().unwrap();
        if pages.contains_key(req.title) {
            return Err(format!("duplicate page created for title {}", req.title).into());
        }
        pages.insert(req.title.to_string(), stored.clone());
        Ok(Page {
            id: stored.id,
            title: stored.title,
            version: Some(1),
            ancestors: stored.ancestors,
        })
    }

    async fn update_page<'a>(&self, req: PageUpdate<'a>) -> Result<Page, DirectoryError> {
        *self.update_calls.lock().unwrap() += 1;
        let mut pages = self.pages.lock().unwrap();
        let stored = pages
            .values_mut()
            .find(|p| p.id == req.id)
            .ok_or_else(|| format!("no page with id {}", req.id))?;
        if req.version != stored.version + 1 {
            return Err(format!(
                "version conflict on {}: current {}, update set {}",
                stored.title, stored.version, req.version
            )
            .into());
        }
        stored.body = req.body.to_string();
        stored.representation = req.representation;
        stored.version = req.version;
        stored.ancestors = req.ancestors.to_vec();
        Ok(Page {
            id: stored.id.clone(),
            title: stored.title.clone(),
            version: Some(stored.version),
            ancestors: stored.ancestors.clone(),
        })
    }
}

fn docs(entries: &[(&str, &str)]) -> Vec<Document> {
    entries
        .iter()
        .map(|(title, content)| Document {
            title: title.to_string(),
            content: content.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn first_run_creates_container_and_document_pages() {
    let directory = InMemoryDirectory::new();
    let documents = docs(&[("Guide", "# Guide"), ("Intro", "# Intro")]);

    let report = synchronise(&directory, "Sample", &documents)
        .await
        .expect("run should succeed against an empty space");

    assert_eq!(report.outcome("Intro"), Some(&DocumentOutcome::Published));
    assert_eq!(report.outcome("Guide"), Some(&DocumentOutcome::Published));

    let container = directory.page("Sample").expect("container should exist");
    assert!(container.ancestors.is_empty(), "container has no parent");
    assert_eq!(container.representation, BodyRepresentation::Storage);
    assert_eq!(container.body, "<h1>Sample</h1>");

    for title in ["Intro", "Guide"] {
        let page = directory.page(title).expect("document page should exist");
        assert_eq!(page.version, 1, "created pages start at version 1");
        assert_eq!(
            page.ancestors,
            vec![container.id.clone()],
            "document pages hang under the container"
        );
        assert_eq!(page.representation, BodyRepresentation::Wiki);
    }
}

#[tokio::test]
async fn second_run_is_idempotent_and_bumps_each_version_by_one() {
    let directory = InMemoryDirectory::new();
    let documents = docs(&[("Guide", "# Guide"), ("Intro", "# Intro")]);

    synchronise(&directory, "Sample", &documents)
        .await
        .expect("first run should succeed");
    let creates_after_first = directory.create_calls();

    let report = synchronise(&directory, "Sample", &documents)
        .await
        .expect("second run should succeed");

    assert_eq!(report.published_count(), 2);
    assert_eq!(
        directory.create_calls(),
        creates_after_first,
        "second run must not create any page"
    );
    assert_eq!(directory.page_count(), 3, "one container plus two documents");

    // Update is unconditional: unchanged content still bumps the version.
    assert_eq!(directory.page("Intro").unwrap().version, 2);
    assert_eq!(directory.page("Guide").unwrap().version, 2);
    assert_eq!(directory.page("Sample").unwrap().version, 1);
}

#[tokio::test]
async fn changed_content_is_written_and_versions_stay_monotonic() {
    let directory = InMemoryDirectory::new();
    synchronise(
        &directory,
        "Sample",
        &docs(&[("Guide", "# Guide"), ("Intro", "# Intro")]),
    )
    .await
    .expect("first run should succeed");

    synchronise(
        &directory,
        "Sample",
        &docs(&[("Guide", "# Guide v2"), ("Intro", "# Intro")]),
    )
    .await
    .expect("second run should succeed");

    let guide = directory.page("Guide").unwrap();
    assert_eq!(guide.body, "# Guide v2");
    assert_eq!(guide.version, 2);

    let intro = directory.page("Intro").unwrap();
    assert_eq!(intro.body, "# Intro");
    assert_eq!(intro.version, 2, "update runs even for unchanged content");
}

#[tokio::test]
async fn n_runs_yield_creation_version_plus_n_minus_one() {
    let directory = InMemoryDirectory::new();
    let documents = docs(&[("Intro", "# Intro")]);

    for _ in 0..4 {
        synchronise(&directory, "Sample", &documents)
            .await
            .expect("every run should succeed");
    }

    // Creation sets 1, each of the three later runs updates once.
    assert_eq!(directory.page("Intro").unwrap().version, 4);
    assert_eq!(directory.update_calls(), 3);
}

#[tokio::test]
async fn empty_document_is_still_published() {
    let directory = InMemoryDirectory::new();
    let report = synchronise(&directory, "Sample", &docs(&[("Empty", "")]))
        .await
        .expect("run should succeed");

    assert_eq!(report.outcome("Empty"), Some(&DocumentOutcome::Published));
    assert_eq!(directory.page("Empty").unwrap().body, "");
}

#[tokio::test]
async fn container_failure_aborts_the_run() {
    let mut directory = MockPageDirectory::new();
    directory
        .expect_find_by_title()
        .withf(|title| title == "Sample")
        .return_once(|_| Err("boom: space unreachable".into()));
    // No document may be touched after a container failure.
    directory.expect_create_page().never();
    directory.expect_update_page().never();

    let err = synchronise(&directory, "Sample", &docs(&[("Intro", "# Intro")]))
        .await
        .expect_err("container failure must abort the run");

    let msg = err.to_string();
    assert!(
        msg.contains("Sample"),
        "error should carry the project name, got: {msg}"
    );
}

#[tokio::test]
async fn one_failing_document_does_not_abort_the_rest() {
    let mut directory = MockPageDirectory::new();

    directory
        .expect_find_by_title()
        .withf(|title| title == "Sample")
        .return_once(|_| {
            Ok(vec![Page {
                id: "10".to_string(),
                title: "Sample".to_string(),
                version: Some(1),
                ancestors: vec![],
            }])
        });

    // A succeeds, B fails on lookup, C succeeds.
    directory
        .expect_find_by_title()
        .withf(|title| title == "A" || title == "C")
        .times(2)
        .returning(|_| Ok(vec![]));
    directory
        .expect_find_by_title()
        .withf(|title| title == "B")
        .return_once(|_| Err("remote error for B".into()));

    directory
        .expect_create_page()
        .withf(|req: &NewPage<'_>| req.title == "A" || req.title == "C")
        .times(2)
        .returning(|req: NewPage<'_>| {
            Ok(Page {
                id: format!("id-{}", req.title),
                title: req.title.to_string(),
                version: Some(1),
                ancestors: req.ancestors.to_vec(),
            })
        });

    let report = synchronise(
        &directory,
        "Sample",
        &docs(&[("A", "# A"), ("B", "# B"), ("C", "# C")]),
    )
    .await
    .expect("run succeeds despite a per-document failure");

    assert_eq!(report.outcome("A"), Some(&DocumentOutcome::Published));
    assert_eq!(report.outcome("C"), Some(&DocumentOutcome::Published));
    match report.outcome("B") {
        Some(DocumentOutcome::Failed(reason)) => {
            assert!(reason.contains("remote error for B"), "got: {reason}");
        }
        other => panic!("expected B to fail, got {other:?}"),
    }
}

#[tokio::test]
async fn ensure_container_reuses_existing_page_without_creating() {
    let mut directory = MockPageDirectory::new();
    directory
        .expect_find_by_title()
        .withf(|title| title == "Sample")
        .times(2)
        .returning(|_| {
            Ok(vec![Page {
                id: "77".to_string(),
                title: "Sample".to_string(),
                version: Some(1),
                ancestors: vec![],
            }])
        });
    directory.expect_create_page().never();

    let first = ensure_container(&directory, "Sample").await.unwrap();
    let second = ensure_container(&directory, "Sample").await.unwrap();
    assert_eq!(first, "77");
    assert_eq!(second, "77");
}

#[tokio::test]
async fn duplicate_title_matches_resolve_to_first() {
    let mut directory = MockPageDirectory::new();
    directory
        .expect_find_by_title()
        .withf(|title| title == "Intro")
        .return_once(|_| {
            Ok(vec![
                Page {
                    id: "1".to_string(),
                    title: "Intro".to_string(),
                    version: Some(4),
                    ancestors: vec![],
                },
                Page {
                    id: "2".to_string(),
                    title: "Intro".to_string(),
                    version: Some(9),
                    ancestors: vec![],
                },
            ])
        });
    directory
        .expect_update_page()
        .withf(|req: &PageUpdate<'_>| req.id == "1" && req.version == 5)
        .return_once(|req: PageUpdate<'_>| {
            Ok(Page {
                id: req.id.to_string(),
                title: req.title.to_string(),
                version: Some(req.version),
                ancestors: req.ancestors.to_vec(),
            })
        });

    let report = publish_all(&directory, &docs(&[("Intro", "# Intro")]), "10").await;
    assert_eq!(report.outcome("Intro"), Some(&DocumentOutcome::Published));
}

#[tokio::test]
async fn missing_remote_version_updates_to_one() {
    let mut directory = MockPageDirectory::new();
    directory
        .expect_find_by_title()
        .withf(|title| title == "Intro")
        .return_once(|_| {
            Ok(vec![Page {
                id: "5".to_string(),
                title: "Intro".to_string(),
                version: None,
                ancestors: vec![],
            }])
        });
    directory
        .expect_update_page()
        .withf(|req: &PageUpdate<'_>| req.version == 1 && req.ancestors == ["10".to_string()])
        .return_once(|req: PageUpdate<'_>| {
            Ok(Page {
                id: req.id.to_string(),
                title: req.title.to_string(),
                version: Some(req.version),
                ancestors: req.ancestors.to_vec(),
            })
        });

    let report = publish_all(&directory, &docs(&[("Intro", "# Intro")]), "10").await;
    assert_eq!(report.outcome("Intro"), Some(&DocumentOutcome::Published));
}
