//! Stateless page slicing over an already-ordered sequence.

use std::num::NonZeroUsize;

use serde::Serialize;

/// Number of posts per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
  Some(n) => n,
  None => unreachable!(),
};

/// A requested 1-based page number. Always at least 1; may exceed the number
/// of pages actually available, in which case [`paginate`] clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroUsize);

impl PageNumber {
  pub const FIRST: Self = Self(NonZeroUsize::MIN);

  /// Clamp any integer to a valid page number; non-positive becomes 1.
  pub fn new(n: i64) -> Self {
    usize::try_from(n)
      .ok()
      .and_then(NonZeroUsize::new)
      .map_or(Self::FIRST, Self)
  }

  /// Interpret a raw `?page=` value. Absent, non-numeric and non-positive
  /// input all mean the first page. A positive number too large to represent
  /// saturates, so it still lands on the last page.
  pub fn parse(raw: Option<&str>) -> Self {
    let Some(raw) = raw else { return Self::FIRST };
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
      Ok(n) => Self::new(n),
      Err(_) if is_positive_integer(trimmed) => Self(NonZeroUsize::MAX),
      Err(_) => {
        tracing::debug!(raw, "unparsable page number; using first page");
        Self::FIRST
      }
    }
  }

  pub fn get(self) -> usize { self.0.get() }
}

impl Default for PageNumber {
  fn default() -> Self { Self::FIRST }
}

/// One page of an ordered sequence plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
  pub items:        Vec<T>,
  /// The page actually returned, after clamping.
  pub number:       usize,
  pub has_next:     bool,
  pub has_previous: bool,
  pub total_pages:  usize,
  pub total_items:  usize,
}

fn is_positive_integer(s: &str) -> bool {
  let digits = s.strip_prefix('+').unwrap_or(s);
  !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Slice `items` into pages of `page_size` and return page `requested`.
///
/// A request past the last page yields the last page. An empty sequence has
/// exactly one (empty) page.
pub fn paginate<T>(
  items: Vec<T>,
  page_size: NonZeroUsize,
  requested: PageNumber,
) -> Page<T> {
  let size = page_size.get();
  let total_items = items.len();
  let total_pages = total_items.div_ceil(size).max(1);
  let number = requested.get().min(total_pages);

  let start = (number - 1) * size;
  let items: Vec<T> = items.into_iter().skip(start).take(size).collect();

  Page {
    items,
    number,
    has_next: number < total_pages,
    has_previous: number > 1,
    total_pages,
    total_items,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn size(n: usize) -> NonZeroUsize { NonZeroUsize::new(n).unwrap() }

  #[test]
  fn three_items_two_per_page() {
    let first = paginate(vec![3, 2, 1], size(2), PageNumber::new(1));
    assert_eq!(first.items, [3, 2]);
    assert!(first.has_next);
    assert!(!first.has_previous);
    assert_eq!(first.total_pages, 2);

    let second = paginate(vec![3, 2, 1], size(2), PageNumber::new(2));
    assert_eq!(second.items, [1]);
    assert!(!second.has_next);
    assert!(second.has_previous);
  }

  #[test]
  fn pages_concatenate_to_the_sequence() {
    let seq: Vec<u32> = (0..23).collect();
    for page_size in 1..=25 {
      let first = paginate(seq.clone(), size(page_size), PageNumber::FIRST);
      let mut joined = Vec::new();
      for n in 1..=first.total_pages {
        let page = paginate(seq.clone(), size(page_size), PageNumber::new(n as i64));
        assert!(page.items.len() <= page_size);
        assert_eq!(page.number, n);
        joined.extend(page.items);
      }
      assert_eq!(joined, seq, "page_size = {page_size}");
    }
  }

  #[test]
  fn non_positive_and_garbage_mean_first_page() {
    let seq: Vec<u32> = (0..15).collect();
    let first = paginate(seq.clone(), size(10), PageNumber::FIRST);
    for raw in [
      None,
      Some("0"),
      Some("-3"),
      Some("abc"),
      Some(""),
      Some("2.5"),
      Some("-99999999999999999999"),
    ] {
      let page = paginate(seq.clone(), size(10), PageNumber::parse(raw));
      assert_eq!(page, first, "raw = {raw:?}");
    }
  }

  #[test]
  fn surrounding_whitespace_is_ignored() {
    assert_eq!(PageNumber::parse(Some(" 2 ")).get(), 2);
  }

  #[test]
  fn beyond_last_page_clamps() {
    let seq: Vec<u32> = (0..20).collect();
    let last = paginate(seq.clone(), size(10), PageNumber::new(2));
    let beyond = paginate(seq.clone(), size(10), PageNumber::new(3));
    let far = paginate(seq.clone(), size(10), PageNumber::parse(Some("999999999999")));
    let overflowing =
      paginate(seq, size(10), PageNumber::parse(Some("99999999999999999999")));
    assert_eq!(beyond, last);
    assert_eq!(far, last);
    assert_eq!(overflowing, last);
    assert_eq!(overflowing.number, 2);
    assert_eq!(last.items.len(), 10);
  }

  #[test]
  fn empty_sequence_has_one_empty_page() {
    let page = paginate(Vec::<u32>::new(), DEFAULT_PAGE_SIZE, PageNumber::new(5));
    assert!(page.items.is_empty());
    assert_eq!(page.number, 1);
    assert_eq!(page.total_pages, 1);
    assert!(!page.has_next);
    assert!(!page.has_previous);
  }
}
