use crate::utils::error::{IbmiError, Result};

/// 每句 INSERT 最多帶的資料列數
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 依序切成最多 `size` 筆的區塊，最後一塊放餘數
pub fn chunk<T>(items: Vec<T>, size: usize) -> Result<Vec<Vec<T>>> {
    if size == 0 {
        return Err(IbmiError::ValidationError {
            message: "Chunk size must be greater than zero".to_string(),
        });
    }

    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(size).collect());
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_counts_and_order() {
        for (n, size) in [(1, 1), (999, 1000), (1000, 1000), (1001, 1000), (2500, 1000), (7, 3)] {
            let items: Vec<usize> = (0..n).collect();
            let chunks = chunk(items.clone(), size).unwrap();

            assert_eq!(chunks.len(), n.div_ceil(size));
            assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
            assert_eq!(chunks.concat(), items);
        }
    }

    #[test]
    fn test_chunk_sizes_for_2500() {
        let chunks = chunk((0..2500).collect::<Vec<_>>(), 1000).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
    }

    #[test]
    fn test_chunk_empty_and_zero() {
        assert!(chunk(Vec::<u8>::new(), 10).unwrap().is_empty());
        assert!(chunk(vec![1, 2, 3], 0).is_err());
    }
}
