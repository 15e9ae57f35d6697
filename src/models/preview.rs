//! Preview document produced by an import analysis.
//!
//! Field names serialize in camelCase because the backend import endpoint
//! consumes this exact shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Title used when the source gives no usable book title.
pub const UNKNOWN_BOOK_TITLE: &str = "Unknown";

/// Kind of lesson a group of items belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Vocabulary,
    Grammar,
    Listening,
    Speaking,
    #[default]
    Reading,
    Writing,
}

impl LessonType {
    /// Every accepted lesson type, in schema order.
    pub const ALL: [LessonType; 6] = [
        LessonType::Vocabulary,
        LessonType::Grammar,
        LessonType::Listening,
        LessonType::Speaking,
        LessonType::Reading,
        LessonType::Writing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Vocabulary => "vocabulary",
            LessonType::Grammar => "grammar",
            LessonType::Listening => "listening",
            LessonType::Speaking => "speaking",
            LessonType::Reading => "reading",
            LessonType::Writing => "writing",
        }
    }

    /// Exact, case-sensitive match against the schema values.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of items of one lesson type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLesson {
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub items: Vec<String>,
}

impl PreviewLesson {
    /// Comma-joined items, cut to at most `max_graphemes` visible characters.
    pub fn item_preview(&self, max_graphemes: usize) -> String {
        let joined = self.items.join(", ");
        let graphemes: Vec<&str> = joined.graphemes(true).collect();
        if graphemes.len() <= max_graphemes {
            return joined;
        }
        let mut cut = graphemes[..max_graphemes].concat();
        cut.push('…');
        cut
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewChapter {
    pub chapter_title: String,
    pub lessons: Vec<PreviewLesson>,
}

/// Direction of a single-step chapter move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Aggregate counts over a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewStats {
    pub chapters: usize,
    pub lessons: usize,
    pub items: usize,
}

/// Root artifact of one import: an editable, not-yet-persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBook {
    pub book_title: String,
    pub chapters: Vec<PreviewChapter>,
}

impl PreviewBook {
    /// Title given to the chapter at a 0-based position when it has none.
    pub fn default_chapter_title(index: usize) -> String {
        format!("Chapter {}", index + 1)
    }

    /// Whether the book carries a usable title.
    pub fn has_title(&self) -> bool {
        !self.book_title.trim().is_empty()
    }

    /// Swap the chapter at `index` with its neighbour in `direction`.
    ///
    /// Returns `false` and leaves the book untouched when either position
    /// is out of range.
    pub fn move_chapter(&mut self, index: usize, direction: MoveDirection) -> bool {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        };
        match target {
            Some(target) if index < self.chapters.len() && target < self.chapters.len() => {
                let chapter = self.chapters.remove(index);
                self.chapters.insert(target, chapter);
                true
            }
            _ => false,
        }
    }

    /// Rename the chapter at `index`; a blank title falls back to the
    /// positional default.
    pub fn rename_chapter(&mut self, index: usize, title: &str) -> bool {
        let Some(chapter) = self.chapters.get_mut(index) else {
            return false;
        };
        chapter.chapter_title = if title.trim().is_empty() {
            Self::default_chapter_title(index)
        } else {
            title.to_string()
        };
        true
    }

    pub fn stats(&self) -> PreviewStats {
        let lessons = self.chapters.iter().map(|c| c.lessons.len()).sum();
        let items = self
            .chapters
            .iter()
            .flat_map(|c| &c.lessons)
            .map(|l| l.items.len())
            .sum();
        PreviewStats {
            chapters: self.chapters.len(),
            lessons,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(title: &str) -> PreviewChapter {
        PreviewChapter {
            chapter_title: title.to_string(),
            lessons: vec![PreviewLesson {
                lesson_type: LessonType::Vocabulary,
                items: vec!["a".to_string(), "b".to_string()],
            }],
        }
    }

    fn sample_book() -> PreviewBook {
        PreviewBook {
            book_title: "Book".to_string(),
            chapters: vec![chapter("One"), chapter("Two"), chapter("Three")],
        }
    }

    fn titles(book: &PreviewBook) -> Vec<&str> {
        book.chapters
            .iter()
            .map(|c| c.chapter_title.as_str())
            .collect()
    }

    #[test]
    fn test_move_chapter_up() {
        let mut book = sample_book();
        assert!(book.move_chapter(1, MoveDirection::Up));
        assert_eq!(titles(&book), ["Two", "One", "Three"]);
    }

    #[test]
    fn test_move_chapter_down() {
        let mut book = sample_book();
        assert!(book.move_chapter(0, MoveDirection::Down));
        assert_eq!(titles(&book), ["Two", "One", "Three"]);
    }

    #[test]
    fn test_move_chapter_out_of_range_is_noop() {
        let mut book = sample_book();
        assert!(!book.move_chapter(0, MoveDirection::Up));
        assert!(!book.move_chapter(2, MoveDirection::Down));
        assert!(!book.move_chapter(7, MoveDirection::Up));
        assert_eq!(titles(&book), ["One", "Two", "Three"]);
    }

    #[test]
    fn test_rename_blank_uses_position_default() {
        let mut book = sample_book();
        assert!(book.rename_chapter(2, "   "));
        assert_eq!(book.chapters[2].chapter_title, "Chapter 3");

        assert!(book.rename_chapter(0, "Greetings"));
        assert_eq!(book.chapters[0].chapter_title, "Greetings");

        assert!(!book.rename_chapter(3, "Nope"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let book = PreviewBook {
            book_title: "A".to_string(),
            chapters: vec![chapter("C1")],
        };
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["bookTitle"], "A");
        assert_eq!(json["chapters"][0]["chapterTitle"], "C1");
        assert_eq!(json["chapters"][0]["lessons"][0]["type"], "vocabulary");
        assert_eq!(json["chapters"][0]["lessons"][0]["items"][1], "b");
    }

    #[test]
    fn test_lesson_type_parse_is_exact() {
        assert_eq!(LessonType::parse("grammar"), Some(LessonType::Grammar));
        assert_eq!(LessonType::parse("Grammar"), None);
        assert_eq!(LessonType::parse("foo"), None);
    }

    #[test]
    fn test_stats() {
        let stats = sample_book().stats();
        assert_eq!(
            stats,
            PreviewStats {
                chapters: 3,
                lessons: 3,
                items: 6
            }
        );
    }

    #[test]
    fn test_item_preview_truncates_by_grapheme() {
        let lesson = PreviewLesson {
            lesson_type: LessonType::Vocabulary,
            items: vec!["café".to_string(), "naïve".to_string()],
        };
        assert_eq!(lesson.item_preview(100), "café, naïve");
        assert_eq!(lesson.item_preview(4), "café…");
    }
}
