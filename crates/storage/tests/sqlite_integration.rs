use storage::repository::{Storage, StorageError};
use trivia_core::model::{
    AnswerDocument, AnswerKey, CategoryDocument, CategoryId, Locale, LocalizedText,
    QuestionDocument, QuestionId,
};

fn category(id: &str, limit: Option<u32>) -> CategoryDocument {
    CategoryDocument {
        id: CategoryId::new(id),
        title: LocalizedText::en("Roasting").with(Locale::Es, "Tueste"),
        slug: id.to_string(),
        description: None,
        parent_id: None,
        color: None,
        icon: None,
        order: 0,
        time_limit_secs: limit,
        image_url: None,
    }
}

fn question(id: &str, category_id: &str) -> QuestionDocument {
    QuestionDocument {
        id: QuestionId::new(id),
        category_id: CategoryId::new(category_id),
        text: LocalizedText::en("What does first crack signal?"),
        answers: vec![
            AnswerDocument {
                key: AnswerKey::new("a"),
                text: LocalizedText::en("A light roast"),
            },
            AnswerDocument {
                key: AnswerKey::new("b"),
                text: LocalizedText::en("Burnt beans"),
            },
            AnswerDocument {
                key: AnswerKey::new("c"),
                text: LocalizedText::en("Green beans"),
            },
        ],
        correct_answer_index: 0,
        explanation: None,
        image_url: Some("https://cdn.example.com/roast.png".into()),
        time_limit_secs: None,
    }
}

#[tokio::test]
async fn sqlite_storage_serves_questions_through_trait_objects() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_traits?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage.content.upsert_category(&category("roast", None)).await.unwrap();
    for id in ["q3", "q1", "q2"] {
        storage.content.upsert_question(&question(id, "roast")).await.unwrap();
    }

    let questions = storage
        .questions
        .questions_for_category(&CategoryId::new("roast"), Locale::Es)
        .await
        .expect("questions");
    let ids: Vec<_> = questions.iter().map(|q| q.id().as_str()).collect();
    assert_eq!(ids, ["q1", "q2", "q3"]);

    // Spanish missing everywhere: English fallback, default limit.
    assert_eq!(questions[0].text(), "What does first crack signal?");
    assert_eq!(questions[0].time_limit_secs(), 20);
    assert_eq!(
        questions[0].image_url().map(|url| url.host_str()),
        Some(Some("cdn.example.com"))
    );

    let category = storage
        .categories
        .get_category(&CategoryId::new("roast"), Locale::Es)
        .await
        .unwrap()
        .expect("category");
    assert_eq!(category.title(), "Tueste");
}

#[tokio::test]
async fn sqlite_rejects_documents_that_fail_validation() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_invalid?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.content.upsert_category(&category("roast", Some(15))).await.unwrap();

    let mut single_answer = question("q1", "roast");
    single_answer.answers.truncate(1);
    let err = storage.content.upsert_question(&single_answer).await.unwrap_err();
    assert!(matches!(err, StorageError::Invalid(_)));

    let questions = storage
        .questions
        .questions_for_category(&CategoryId::new("roast"), Locale::En)
        .await
        .unwrap();
    assert!(questions.is_empty());
}

#[tokio::test]
async fn sqlite_preferences_survive_reconnect() {
    let url = "sqlite:file:memdb_storage_prefs?mode=memory&cache=shared";
    let first = Storage::sqlite(url).await.expect("storage");
    first.preferences.set_preference("app.locale", "es").await.unwrap();

    let second = Storage::sqlite(url).await.expect("storage");
    assert_eq!(
        second.preferences.get_preference("app.locale").await.unwrap().as_deref(),
        Some("es")
    );
    drop(first);
}
