// src/services/normalizer.rs

//! Total conversion of untrusted JSON into a [`PreviewBook`].
//!
//! Never fails: anything that does not fit the schema is replaced by a
//! default or dropped.

use serde_json::Value;

use crate::models::{LessonType, PreviewBook, PreviewChapter, PreviewLesson, UNKNOWN_BOOK_TITLE};

/// Normalize an arbitrary parsed value into a well-formed preview.
pub fn normalize_preview(payload: &Value) -> PreviewBook {
    let book_title = non_blank_str(payload.get("bookTitle"))
        .unwrap_or(UNKNOWN_BOOK_TITLE)
        .to_string();

    let chapters = array_of(payload.get("chapters"))
        .iter()
        .enumerate()
        .map(|(index, chapter)| normalize_chapter(index, chapter))
        .collect();

    PreviewBook {
        book_title,
        chapters,
    }
}

fn normalize_chapter(index: usize, chapter: &Value) -> PreviewChapter {
    let chapter_title = non_blank_str(chapter.get("chapterTitle"))
        .map(str::to_string)
        .unwrap_or_else(|| PreviewBook::default_chapter_title(index));

    let lessons = array_of(chapter.get("lessons"))
        .iter()
        .filter_map(normalize_lesson)
        .collect();

    PreviewChapter {
        chapter_title,
        lessons,
    }
}

fn normalize_lesson(lesson: &Value) -> Option<PreviewLesson> {
    let lesson_type = lesson
        .get("type")
        .and_then(Value::as_str)
        .and_then(LessonType::parse)
        .unwrap_or_default();

    let items: Vec<String> = array_of(lesson.get("items"))
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return None;
    }

    Some(PreviewLesson { lesson_type, items })
}

/// The string itself when it has non-whitespace content.
fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn array_of(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
