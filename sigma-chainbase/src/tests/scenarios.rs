// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use super::tools::*;
use crate::{index_key, Database, ObjectId, StoreError};
use assert_matches::assert_matches;

#[test]
fn create_and_lookup() {
    let mut db = library();
    let dune = add_book(&mut db, "dune", "herbert", 412);
    let emma = add_book(&mut db, "emma", "austen", 474);
    assert_eq!(dune.to_raw(), 0);
    assert_eq!(emma.to_raw(), 1);
    assert_eq!(db.get(emma).unwrap().title, "emma");
    assert_eq!(
        db.get_by(BY_TITLE, &index_key!("dune")).unwrap().id,
        dune
    );
    assert!(db.find(ObjectId::<Book>::new(7)).unwrap().is_none());
    assert_matches!(
        db.get_by(BY_TITLE, &index_key!("ulysses")),
        Err(StoreError::NotFoundByKey(_))
    );
    assert_eq!(db.count::<Book>().unwrap(), 2);
    assert_eq!(titles_by_author(&db), vec!["emma", "dune"]);
}

#[test]
fn unique_index_is_enforced() {
    let mut db = library();
    add_book(&mut db, "dune", "herbert", 412);
    let emma = add_book(&mut db, "emma", "austen", 474);
    let before = db.fingerprint().unwrap();

    let duplicate = db.create(|id| Book {
        id,
        title: "dune".to_string(),
        author: "someone".to_string(),
        pages: 1,
    });
    assert_matches!(duplicate, Err(StoreError::ConstraintViolation(_)));

    let renamed = db.modify(emma, |book| book.title = "dune".to_string());
    assert_matches!(renamed, Err(StoreError::ConstraintViolation(_)));
    assert_eq!(db.fingerprint().unwrap(), before);

    db.modify(emma, |book| book.pages = 500).unwrap();
    assert_eq!(db.get(emma).unwrap().pages, 500);
}

#[test]
fn identity_cannot_change() {
    let mut db = library();
    let dune = add_book(&mut db, "dune", "herbert", 412);
    assert_matches!(
        db.modify(dune, |book| book.id = ObjectId::new(9)),
        Err(StoreError::IdentityChanged(_))
    );
    assert_matches!(
        db.create(|_| Book {
            id: ObjectId::new(42),
            title: "it".to_string(),
            author: "king".to_string(),
            pages: 1,
        }),
        Err(StoreError::IdentityChanged(_))
    );
    assert_eq!(db.get(dune).unwrap().id, dune);
}

#[test]
fn discard_restores_everything() {
    let mut db = library();
    let dune = add_book(&mut db, "dune", "herbert", 412);
    let emma = add_book(&mut db, "emma", "austen", 474);
    let before = db.fingerprint().unwrap();
    {
        let mut session = db.start_session();
        add_book(&mut session, "ulysses", "joyce", 730);
        session
            .modify(dune, |book| book.author = "frank herbert".to_string())
            .unwrap();
        session.remove(emma).unwrap();
        session
            .create(|id| Shelf {
                id,
                label: "classics".to_string(),
            })
            .unwrap();
        session.discard().unwrap();
    }
    assert_eq!(db.fingerprint().unwrap(), before);
    assert_eq!(titles_by_author(&db), vec!["emma", "dune"]);
    assert_eq!(db.revision(), 0);
    // the id of the discarded creation is handed out again
    assert_eq!(add_book(&mut db, "it", "king", 1100).to_raw(), 2);
}

#[test]
fn dropped_session_is_discarded() {
    let mut db = library();
    add_book(&mut db, "dune", "herbert", 412);
    let before = db.fingerprint().unwrap();
    {
        let mut session = db.start_session();
        add_book(&mut session, "emma", "austen", 474);
    }
    assert_eq!(db.fingerprint().unwrap(), before);
    assert_eq!(db.undo_revisions().count(), 0);
}

#[test]
fn commit_merges_into_parent() {
    let mut db = library();
    let dune = add_book(&mut db, "dune", "herbert", 412);
    let before = db.fingerprint().unwrap();

    let mut block = db.start_session();
    {
        let mut trx = block.start_session();
        trx.modify(dune, |book| book.pages = 896).unwrap();
        add_book(&mut trx, "emma", "austen", 474);
        trx.commit().unwrap();
    }
    {
        let mut trx = block.start_session();
        add_book(&mut trx, "it", "king", 1100);
        trx.discard().unwrap();
    }
    assert_eq!(block.get(dune).unwrap().pages, 896);
    assert_eq!(block.count::<Book>().unwrap(), 2);
    assert_eq!(block.revision(), 1);
    block.discard().unwrap();

    assert_eq!(db.fingerprint().unwrap(), before);
}

#[test]
fn pushed_sessions_undo_in_order() {
    let mut db = library();
    let dune = add_book(&mut db, "dune", "herbert", 412);
    let genesis = db.fingerprint().unwrap();

    let mut first = db.start_session();
    first.modify(dune, |book| book.pages = 1).unwrap();
    first.push();
    let after_first = db.fingerprint().unwrap();

    let mut second = db.start_session();
    second.modify(dune, |book| book.pages = 2).unwrap();
    second.remove(dune).unwrap();
    second.push();

    assert_eq!(db.revision(), 2);
    assert_eq!(db.undo_revisions().collect::<Vec<_>>(), vec![1, 2]);
    db.undo().unwrap();
    assert_eq!(db.fingerprint().unwrap(), after_first);
    db.undo().unwrap();
    assert_eq!(db.fingerprint().unwrap(), genesis);
    assert_matches!(db.undo(), Err(StoreError::NoUndoSession));
}

#[test]
fn committed_revisions_cannot_be_undone() {
    let mut db = library();
    for (title, pages) in [("a-book", 1), ("b-book", 2), ("c-book", 3)] {
        let mut session = db.start_session();
        add_book(&mut session, title, "anon", pages);
        session.push();
    }
    db.commit(2);
    assert_eq!(db.undo_revisions().collect::<Vec<_>>(), vec![3]);
    db.undo_all().unwrap();
    assert_eq!(db.count::<Book>().unwrap(), 2);
    assert_eq!(db.revision(), 2);
    assert_matches!(db.undo(), Err(StoreError::NoUndoSession));
}

#[test]
fn squash_oldest_keeps_newest() {
    let mut db = library();
    for title in ["a-book", "b-book", "c-book"] {
        let mut session = db.start_session();
        add_book(&mut session, title, "anon", 1);
        session.push();
    }
    db.squash_oldest(2);
    db.undo_all().unwrap();
    assert_eq!(
        db.iter::<Book>()
            .unwrap()
            .map(|book| book.title.as_str())
            .collect::<Vec<_>>(),
        vec!["a-book", "b-book"]
    );
}

#[test]
fn squash_of_single_state_is_permanent() {
    let mut db = library();
    let mut session = db.start_session();
    add_book(&mut session, "dune", "herbert", 412);
    session.commit().unwrap();
    assert_eq!(db.revision(), 0);
    assert_matches!(db.undo(), Err(StoreError::NoUndoSession));
    assert_eq!(db.count::<Book>().unwrap(), 1);
}

#[test]
fn prefix_iteration() {
    let mut db = library();
    add_book(&mut db, "persuasion", "austen", 249);
    add_book(&mut db, "dune", "herbert", 412);
    add_book(&mut db, "emma", "austen", 474);
    add_book(&mut db, "sense", "austen", 409);
    let prefix = index_key!("austen");
    let titles: Vec<_> = db
        .iter_by_prefix(BY_AUTHOR, &prefix)
        .unwrap()
        .map(|book| book.title.clone())
        .collect();
    assert_eq!(titles, vec!["persuasion", "sense", "emma"]);
}

fn books_of<'a>(db: &'a Database, author: &str) -> Vec<&'a Book> {
    let prefix = index_key!(author);
    db.iter_by_prefix(BY_AUTHOR, &prefix).unwrap().collect()
}

#[test]
fn prefix_results_outlive_the_prefix() {
    let mut db = library();
    add_book(&mut db, "emma", "austen", 474);
    add_book(&mut db, "dune", "herbert", 412);
    let books = books_of(&db, "austen");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "emma");
    assert!(books_of(&db, "tolkien").is_empty());
}

#[test]
fn table_registration() {
    let mut db = library();
    assert_matches!(
        db.add_table::<Book>(),
        Err(StoreError::TableAlreadyRegistered(_))
    );
    let mut bare = Database::new();
    assert_matches!(bare.count::<Book>(), Err(StoreError::UnknownTable(_)));
    let session = bare.start_session();
    session.push();
    bare.add_table::<Book>().unwrap();
    add_book(&mut bare, "dune", "herbert", 412);
    bare.undo().unwrap();
    assert_eq!(bare.count::<Book>().unwrap(), 0);
    let _ = db.fingerprint().unwrap();
}

#[test]
fn revision_is_settable_only_without_sessions() {
    let mut db = library();
    db.set_revision(10).unwrap();
    let session = db.start_session();
    assert_eq!(session.revision(), 11);
    session.push();
    assert_matches!(db.set_revision(3), Err(StoreError::UndoStackNotEmpty));
    assert!(StoreError::UndoStackNotEmpty.is_fatal());
    assert!(!StoreError::NotFound(String::new()).is_fatal());
}
