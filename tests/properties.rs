use proptest::prelude::*;

use techflow::structures::{CommentMap, NewsItem};
use techflow::ContentStore;

#[derive(Debug, Clone)]
enum Op {
    Add,
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Add), (0usize..32).prop_map(Op::Delete)]
}

fn item(n: usize) -> NewsItem {
    serde_json::from_value(serde_json::json!({
        "id": format!("n{}", n),
        "title": format!("Item {}", n),
        "date": "2024-01-01"
    }))
    .unwrap()
}

proptest! {
    #[test]
    fn list_is_additions_minus_deletions_newest_first(ops in prop::collection::vec(op(), 0..64)) {
        let mut store = ContentStore::from_parts(Vec::new(), CommentMap::default());
        // model: newest first
        let mut expected: Vec<String> = Vec::new();
        let mut next = 0;
        for op in ops {
            match op {
                Op::Add => {
                    store.add_news(item(next)).unwrap();
                    expected.insert(0, format!("n{}", next));
                    next += 1;
                }
                Op::Delete(n) => {
                    let id = format!("n{}", n);
                    let present = expected.iter().position(|e| *e == id);
                    prop_assert_eq!(store.delete_news(&id), present.is_some());
                    if let Some(index) = present {
                        expected.remove(index);
                    }
                }
            }
        }
        let ids: Vec<String> = store.list_news().iter().map(|n| n.id.clone()).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn deleting_unknown_comment_keeps_every_thread(
        threads in prop::collection::vec(0usize..5, 1..6),
        news_pick in 0usize..8,
        comment_pick in 5usize..10,
    ) {
        let mut store = ContentStore::from_parts(Vec::new(), CommentMap::default());
        for (t, len) in threads.iter().enumerate() {
            for c in 0..*len {
                store.add_comment(&format!("n{}", t), techflow::structures::Comment {
                    id: c.to_string(),
                    author: "a".into(),
                    text: "t".into(),
                    date: chrono::Utc::now(),
                }).unwrap();
            }
        }
        let before: Vec<usize> = (0..threads.len()).map(|t| store.comment_count(&format!("n{}", t))).collect();
        let news_key = format!("n{}", news_pick);
        prop_assert!(!store.delete_comment(&news_key, &comment_pick.to_string()));
        let after: Vec<usize> = (0..threads.len()).map(|t| store.comment_count(&format!("n{}", t))).collect();
        prop_assert_eq!(before, after);
    }
}
