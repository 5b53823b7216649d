//! ワイプのシナリオテスト
//!
//! スコープ解決からオーケストレーターの実行までを、インメモリストアで通しで検証する。

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use thesisflow_domain::{
    Category,
    clock::FixedClock,
    scope::{ScopeInput, ScopeResolver},
};
use thesisflow_infra::{
    mock::{InMemoryBlobStore, InMemoryDocumentStore, InMemoryIdentityProvider},
    wipe::{WipeConfig, WipeOrchestrator},
};

const YEAR: &str = "year/2024-2025";

struct World {
    documents: Arc<InMemoryDocumentStore>,
    identity:  Arc<InMemoryIdentityProvider>,
    blobs:     Arc<InMemoryBlobStore>,
    resolver:  ScopeResolver,
    sut:       WipeOrchestrator,
}

fn world() -> World {
    let documents = Arc::new(InMemoryDocumentStore::new());
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap());

    World {
        sut: WipeOrchestrator::new(
            documents.clone(),
            identity.clone(),
            blobs.clone(),
            WipeConfig {
                batch_size: 2,
                ..WipeConfig::default()
            },
        ),
        documents,
        identity,
        blobs,
        resolver: ScopeResolver::new(Arc::new(clock)),
    }
}

fn input(department: Option<&str>, course: Option<&str>) -> ScopeInput {
    ScopeInput {
        year:       None,
        department: department.map(String::from),
        course:     course.map(String::from),
    }
}

#[tokio::test]
async fn test_学科を指定したthesisワイプは他学科の論文を残す() {
    let w = world();
    let t1 = format!("{YEAR}/departments/cs/groups/g1/thesis/t1");
    let t2 = format!("{YEAR}/departments/math/groups/g2/thesis/t2");
    w.documents.insert(t1.clone());
    w.documents.insert(format!("{t1}/chats/c1"));
    w.documents.insert(format!("{t1}/chapters/ch1"));
    w.documents.insert(t2.clone());
    w.documents.insert(format!("{t2}/chats/c2"));

    let scope = w.resolver.resolve(input(Some("cs"), None)).unwrap();
    let outcome = w.sut.execute(Category::Thesis, &scope).await.unwrap();

    assert_eq!(outcome.documents.deleted_count, 3);
    assert_eq!(outcome.scope_description, "cs");
    assert_eq!(w.documents.paths(), vec![t2.clone(), format!("{t2}/chats/c2")]);
}

#[tokio::test]
async fn test_学科csのthesisワイプはコース配下の論文だけを1件削除する() {
    let w = world();
    let t1 = format!("{YEAR}/departments/cs/courses/bscs/groups/g1/thesis/t1");
    let t2 = format!("{YEAR}/departments/math/groups/g2/thesis/t2");
    w.documents.insert(t1);
    w.documents.insert(t2.clone());

    let scope = w.resolver.resolve(input(Some("cs"), None)).unwrap();
    let outcome = w.sut.execute(Category::Thesis, &scope).await.unwrap();

    assert_eq!(outcome.documents.deleted_count, 1);
    assert_eq!(outcome.scope_description, "cs");
    assert_eq!(w.documents.paths(), vec![t2]);
}

#[tokio::test]
async fn test_groupワイプはグループ配下をまとめて削除し再実行では0件() {
    let w = world();
    let group = format!("{YEAR}/departments/computer-science/courses/bscs/groups/g1");
    for child in [
        "audits/a1",
        "proposals/p1",
        "join/j1",
        "calendar/cal1",
        "thesis/t1",
        "thesis/t1/submissions/s1",
    ] {
        w.documents.insert(format!("{group}/{child}"));
    }
    w.documents.insert(group.clone());
    let other_course = format!("{YEAR}/departments/computer-science/courses/bsit/groups/g9");
    w.documents.insert(other_course.clone());

    let scope = w
        .resolver
        .resolve(input(Some("Computer Science"), Some("BSCS")))
        .unwrap();
    let first = w.sut.execute(Category::Group, &scope).await.unwrap();
    let second = w.sut.execute(Category::Group, &scope).await.unwrap();

    assert_eq!(first.documents.deleted_count, 7);
    assert_eq!(first.scope_description, "Computer Science/BSCS");
    assert_eq!(second.documents.deleted_count, 0);
    assert_eq!(w.documents.paths(), vec![other_course]);
}

#[tokio::test]
async fn test_スコープなしのuserワイプは全学科のユーザーと全アカウントを削除する() {
    let w = world();
    w.documents.insert(format!("{YEAR}/departments/cs/users/u1"));
    w.documents.insert(format!("{YEAR}/departments/math/users/u2"));
    w.documents.insert("year/2023-2024/departments/cs/users/u0");
    for i in 0..5 {
        w.identity.add_account(format!("uid-{i}"));
    }

    let scope = w.resolver.resolve(input(None, None)).unwrap();
    let outcome = w.sut.execute(Category::User, &scope).await.unwrap();

    assert_eq!(outcome.scope_description, "all");
    assert_eq!(outcome.documents.deleted_count, 2);
    assert_eq!(outcome.identity.unwrap().succeeded, 5);
    assert!(w.identity.account_ids().is_empty());
    assert_eq!(
        w.documents.paths(),
        vec!["year/2023-2024/departments/cs/users/u0".to_string()]
    );
}

#[tokio::test]
async fn test_fileワイプはドキュメントとファイル実体を同じスコープで削除する() {
    let w = world();
    w.documents.insert(format!("{YEAR}/departments/cs/courses/bscs/files/f1"));
    w.documents.insert(format!("{YEAR}/departments/cs/courses/bsit/files/f2"));
    w.blobs.put("2024-2025/cs/bscs/f1.pdf");
    w.blobs.put("2024-2025/cs/bsit/f2.pdf");

    let scope = w.resolver.resolve(input(Some("CS"), Some("BSCS"))).unwrap();
    let outcome = w.sut.execute(Category::File, &scope).await.unwrap();

    assert_eq!(outcome.documents.deleted_count, 1);
    assert_eq!(outcome.blobs.unwrap().deleted_count, 1);
    assert_eq!(w.blobs.keys(), vec!["2024-2025/cs/bsit/f2.pdf".to_string()]);
}
