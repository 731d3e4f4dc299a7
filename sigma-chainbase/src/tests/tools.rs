// Copyright (c) 2022 SIGMA LABS <dev@sigmaengine.io>

use crate::{index_key, Database, Index, IndexDef, IndexKey, Object, ObjectId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: ObjectId<Book>,
    pub title: String,
    pub author: String,
    pub pages: u64,
}

pub const BY_TITLE: Index<Book> = Index::at(0);
pub const BY_AUTHOR: Index<Book> = Index::at(1);

impl Object for Book {
    const TABLE_ID: u16 = 1;
    const TABLE_NAME: &'static str = "book";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef::unique("by_title"),
        IndexDef::non_unique("by_author"),
    ];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        vec![
            index_key!(self.title.as_str()),
            index_key!(self.author.as_str(), self.pages),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shelf {
    pub id: ObjectId<Shelf>,
    pub label: String,
}

impl Object for Shelf {
    const TABLE_ID: u16 = 2;
    const TABLE_NAME: &'static str = "shelf";
    const INDEXES: &'static [IndexDef] = &[];

    fn id(&self) -> ObjectId<Self> {
        self.id
    }

    fn index_keys(&self) -> Vec<IndexKey> {
        Vec::new()
    }
}

pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn library() -> Database {
    init_logs();
    let mut db = Database::new();
    db.add_table::<Book>().unwrap();
    db.add_table::<Shelf>().unwrap();
    db
}

pub fn add_book(db: &mut Database, title: &str, author: &str, pages: u64) -> ObjectId<Book> {
    db.create(|id| Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        pages,
    })
    .unwrap()
}

pub fn titles_by_author(db: &Database) -> Vec<String> {
    db.iter_by(BY_AUTHOR)
        .unwrap()
        .map(|book| book.title.clone())
        .collect()
}
