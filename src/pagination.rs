//! Batching of cards into page-sized runs.

use crate::geometry::LayoutError;

/// Split `items` into consecutive pages holding at most `capacity` entries each.
///
/// Order is preserved, nothing is dropped or repeated and the final page is
/// never empty. No input means no pages.
pub fn paginate<T>(items: &[T], capacity: usize) -> Result<Vec<&[T]>, LayoutError> {
    if capacity == 0 {
        return Err(LayoutError::ZeroCapacity);
    }
    let mut pages = Vec::with_capacity(page_count(items.len(), capacity));
    let mut idx = 0;
    while idx < items.len() {
        let on_page = capacity.min(items.len() - idx);
        pages.push(&items[idx..idx + on_page]);
        idx += on_page;
    }
    Ok(pages)
}

/// Number of pages needed for `len` items.
pub fn page_count(len: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    len.div_ceil(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_sizes_follow_capacity() {
        for capacity in 1..=7usize {
            for len in 0..=30usize {
                let items: Vec<usize> = (0..len).collect();
                let pages = paginate(&items, capacity).unwrap();
                assert_eq!(pages.len(), page_count(len, capacity));
                if let Some((last, full)) = pages.split_last() {
                    assert!(full.iter().all(|p| p.len() == capacity));
                    let expected_last = if len % capacity == 0 {
                        capacity
                    } else {
                        len % capacity
                    };
                    assert_eq!(last.len(), expected_last);
                }
                let joined: Vec<usize> = pages.concat();
                assert_eq!(joined, items);
            }
        }
    }

    #[test]
    fn empty_input_gives_no_pages() {
        let items: [u8; 0] = [];
        assert!(paginate(&items, 12).unwrap().is_empty());
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let items = [1, 2, 3, 4];
        let pages = paginate(&items, 2).unwrap();
        assert_eq!(pages, vec![&[1, 2][..], &[3, 4][..]]);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(paginate(&[1, 2], 0), Err(LayoutError::ZeroCapacity));
    }
}
